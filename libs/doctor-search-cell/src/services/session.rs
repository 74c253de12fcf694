use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;
use shared_models::{AnalyticsEvent, AnalyticsService, FetchError};

use crate::models::{DoctorPage, DoctorRecord, FilterCriteria, SearchQuery, SearchResultSet};
use crate::services::catalog::DoctorCatalog;
use crate::services::pagination::{Completion, FetchTicket, PaginationController};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Search session has shut down")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub results_ceiling: usize,
    pub fetch_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            results_ceiling: crate::services::pagination::DEFAULT_RESULTS_CEILING,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            results_ceiling: config.results_ceiling,
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

/// Everything the presentation layer observes about a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub query: SearchQuery,
    pub criteria: FilterCriteria,
    pub results: SearchResultSet,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub last_error: Option<FetchError>,
}

impl SessionSnapshot {
    pub fn is_settled(&self) -> bool {
        !self.is_loading && !self.is_loading_more
    }

    fn of(controller: &PaginationController) -> Self {
        Self {
            query: controller.query().clone(),
            criteria: controller.criteria().clone(),
            results: controller.result_set(),
            is_loading: controller.is_loading(),
            is_loading_more: controller.is_loading_more(),
            last_error: controller.last_error().cloned(),
        }
    }
}

enum Command {
    Search {
        query: SearchQuery,
        criteria: FilterCriteria,
        ack: oneshot::Sender<()>,
    },
    ApplyFilters {
        criteria: FilterCriteria,
        ack: oneshot::Sender<()>,
    },
    LoadMore {
        ack: oneshot::Sender<()>,
    },
}

struct FetchDone {
    ticket: FetchTicket,
    result: Result<DoctorPage, FetchError>,
}

/// Owns one session's state. All mutation happens on the task running
/// [`SearchSession::run`]; catalog calls run in spawned tasks and report back
/// through the completion channel.
pub struct SearchSession {
    controller: PaginationController,
    catalog: Arc<dyn DoctorCatalog>,
    analytics: Arc<dyn AnalyticsService>,
    fetch_timeout: Duration,
    state: watch::Sender<SessionSnapshot>,
    done_tx: mpsc::UnboundedSender<FetchDone>,
    in_flight: Vec<JoinHandle<()>>,
}

impl SearchSession {
    /// Start the session task and return a handle to it. The task ends once
    /// every handle has been dropped.
    pub fn spawn(
        catalog: Arc<dyn DoctorCatalog>,
        analytics: Arc<dyn AnalyticsService>,
        config: SessionConfig,
    ) -> SearchSessionHandle {
        let controller = PaginationController::new(config.results_ceiling);
        let (state, state_rx) = watch::channel(SessionSnapshot::of(&controller));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let session = Self {
            controller,
            catalog,
            analytics,
            fetch_timeout: config.fetch_timeout,
            state,
            done_tx,
            in_flight: Vec::new(),
        };
        tokio::spawn(session.run(commands_rx, done_rx));

        SearchSessionHandle {
            commands: commands_tx,
            state: state_rx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut done: mpsc::UnboundedReceiver<FetchDone>,
    ) {
        debug!("Search session started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(fetch) = done.recv() => self.handle_completion(fetch),
            }
        }

        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
        debug!("Search session stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let ack = match command {
            Command::Search { query, criteria, ack } => {
                self.analytics.log_event(AnalyticsEvent::Search, search_parameters(&query, &criteria));
                let ticket = self.controller.begin_search(query, criteria);
                self.cancel_in_flight();
                self.dispatch(ticket);
                ack
            }
            Command::ApplyFilters { criteria, ack } => {
                self.analytics.log_event(AnalyticsEvent::ApplyFilters, criteria_parameters(&criteria));
                let ticket = self.controller.begin_apply_filters(criteria);
                self.cancel_in_flight();
                self.dispatch(ticket);
                ack
            }
            Command::LoadMore { ack } => {
                if let Some(ticket) = self.controller.begin_load_more() {
                    let mut parameters = Map::new();
                    parameters.insert("page".to_string(), json!(ticket.page));
                    self.analytics.log_event(AnalyticsEvent::LoadMore, parameters);
                    self.dispatch(ticket);
                }
                ack
            }
        };

        self.publish();
        // The caller may have stopped waiting; the command still applies.
        let _ = ack.send(());
    }

    fn handle_completion(&mut self, fetch: FetchDone) {
        let FetchDone { ticket, result } = fetch;

        match self.controller.complete(&ticket, result, Utc::now()) {
            Completion::Applied { kind, added } => {
                info!(
                    "Applied page {} ({:?}): {} new, {} total",
                    ticket.page,
                    kind,
                    added,
                    self.controller.doctors().len()
                );
            }
            Completion::Failed(error) => {
                warn!("Doctor fetch for page {} failed: {}", ticket.page, error);
                let mut parameters = Map::new();
                parameters.insert("page".to_string(), json!(ticket.page));
                self.analytics.log_error(&error, parameters);
            }
            Completion::Discarded => {
                debug!("Discarded stale completion from generation {}", ticket.generation);
                return;
            }
        }

        self.in_flight.retain(|handle| !handle.is_finished());
        self.publish();
    }

    #[instrument(skip(self, ticket), fields(generation = ticket.generation, page = ticket.page))]
    fn dispatch(&mut self, ticket: FetchTicket) {
        let catalog = Arc::clone(&self.catalog);
        let done_tx = self.done_tx.clone();
        let limit = self.fetch_timeout;

        debug!("Dispatching {:?} fetch", ticket.kind);
        let handle = tokio::spawn(async move {
            let result = match timeout(limit, catalog.fetch_doctors(&ticket.query, ticket.page)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit.as_millis() as u64)),
            };
            // A closed channel means the session is gone; nothing left to update.
            let _ = done_tx.send(FetchDone { ticket, result });
        });
        self.in_flight.push(handle);
    }

    /// Abort fetches belonging to earlier generations; their results would be discarded anyway.
    fn cancel_in_flight(&mut self) {
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
    }

    fn publish(&self) {
        self.state.send_replace(SessionSnapshot::of(&self.controller));
    }
}

fn search_parameters(query: &SearchQuery, criteria: &FilterCriteria) -> Map<String, Value> {
    let mut parameters = criteria_parameters(criteria);
    parameters.insert("query".to_string(), json!(query.text));
    parameters.insert("location".to_string(), json!(query.location));
    if let Some(ref specialty) = query.specialty {
        parameters.insert("specialty".to_string(), json!(specialty.id));
    }
    if let Some(ref insurance) = query.insurance {
        parameters.insert("insurance".to_string(), json!(insurance.name));
    }
    parameters
}

fn criteria_parameters(criteria: &FilterCriteria) -> Map<String, Value> {
    let mut parameters = Map::new();
    parameters.insert("sort".to_string(), json!(criteria.sort_option.label()));
    parameters.insert("minimum_rating".to_string(), json!(criteria.minimum_rating));
    parameters
}

/// Cloneable handle used by the presentation layer.
#[derive(Clone)]
pub struct SearchSessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionSnapshot>,
}

impl SearchSessionHandle {
    pub async fn search(&self, query: SearchQuery, criteria: FilterCriteria) -> Result<(), SessionError> {
        self.send(|ack| Command::Search { query, criteria, ack }).await
    }

    pub async fn apply_filters(&self, criteria: FilterCriteria) -> Result<(), SessionError> {
        self.send(|ack| Command::ApplyFilters { criteria, ack }).await
    }

    /// Silently does nothing when no further page can be loaded.
    pub async fn load_more(&self) -> Result<(), SessionError> {
        self.send(|ack| Command::LoadMore { ack }).await
    }

    async fn send(&self, command: impl FnOnce(oneshot::Sender<()>) -> Command) -> Result<(), SessionError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(command(ack_tx))
            .map_err(|_| SessionError::Closed)?;
        ack_rx.await.map_err(|_| SessionError::Closed)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn current_results(&self) -> Vec<DoctorRecord> {
        self.state.borrow().results.doctors.clone()
    }

    pub fn can_load_more(&self) -> bool {
        self.state.borrow().results.can_load_more
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.state.borrow().is_loading_more
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.state.borrow().last_error.clone()
    }

    /// Change notifications for every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Wait until neither the initial search nor a load-more is running.
    pub async fn wait_until_settled(&self) -> Result<SessionSnapshot, SessionError> {
        let mut state = self.state.clone();
        let snapshot = state
            .wait_for(SessionSnapshot::is_settled)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(snapshot.clone())
    }
}
