use chrono::{DateTime, Utc};
use tracing::debug;

use shared_models::FetchError;

use crate::models::{DoctorPage, DoctorRecord, FilterCriteria, SearchQuery, SearchResultSet};
use crate::services::{filter::filter, sort::sort};

pub const DEFAULT_RESULTS_CEILING: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page of a new search or filter change.
    Replace,
    /// A further page appended to the accumulator.
    Append,
}

/// A fetch the caller must run against the catalog and hand back to
/// [`PaginationController::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
    pub kind: FetchKind,
    pub query: SearchQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied { kind: FetchKind, added: usize },
    Failed(FetchError),
    /// The ticket belonged to a superseded search.
    Discarded,
}

/// Page cursor, accumulator and loading flags of one search session.
///
/// Every `begin_*` call that resets the accumulator starts a new generation;
/// completions carrying an older generation are dropped without touching state.
#[derive(Debug, Clone)]
pub struct PaginationController {
    query: SearchQuery,
    criteria: FilterCriteria,
    doctors: Vec<DoctorRecord>,
    current_page: u32,
    total_pages: u32,
    can_load_more: bool,
    is_loading: bool,
    is_loading_more: bool,
    last_error: Option<FetchError>,
    generation: u64,
    ceiling: usize,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_CEILING)
    }
}

impl PaginationController {
    pub fn new(ceiling: usize) -> Self {
        Self {
            query: SearchQuery::default(),
            criteria: FilterCriteria::default(),
            doctors: Vec::new(),
            current_page: 1,
            total_pages: 1,
            can_load_more: false,
            is_loading: false,
            is_loading_more: false,
            last_error: None,
            generation: 0,
            ceiling,
        }
    }

    pub fn begin_search(&mut self, query: SearchQuery, criteria: FilterCriteria) -> FetchTicket {
        self.query = query;
        self.criteria = criteria;
        self.reset()
    }

    /// Same as a search, keeping the current query.
    pub fn begin_apply_filters(&mut self, criteria: FilterCriteria) -> FetchTicket {
        self.criteria = criteria;
        self.reset()
    }

    /// `None` when a fetch is already running or no further page exists.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if self.is_loading || self.is_loading_more {
            debug!("Load more ignored: fetch already in flight");
            return None;
        }
        if self.current_page >= self.total_pages || !self.can_load_more {
            debug!(
                "Load more ignored: page {}/{} with {} results",
                self.current_page, self.total_pages, self.doctors.len()
            );
            return None;
        }

        self.current_page += 1;
        self.is_loading_more = true;
        self.last_error = None;

        Some(self.ticket(FetchKind::Append))
    }

    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<DoctorPage, FetchError>,
        now: DateTime<Utc>,
    ) -> Completion {
        if ticket.generation != self.generation {
            return Completion::Discarded;
        }

        match ticket.kind {
            FetchKind::Replace => self.is_loading = false,
            FetchKind::Append => self.is_loading_more = false,
        }

        match result {
            Ok(page) => {
                let ordered = sort(filter(page.doctors, &self.criteria, now), self.criteria.sort_option);
                let added = ordered.len();

                match ticket.kind {
                    FetchKind::Replace => self.doctors = ordered,
                    FetchKind::Append => self.doctors.extend(ordered),
                }

                self.total_pages = page.total_pages.max(1);
                self.can_load_more =
                    self.doctors.len() < self.ceiling && self.current_page < self.total_pages;

                Completion::Applied { kind: ticket.kind, added }
            }
            Err(error) => {
                // Results stay as they were; the failed page can be requested again.
                if ticket.kind == FetchKind::Append {
                    self.current_page = self.current_page.saturating_sub(1).max(1);
                }
                self.last_error = Some(error.clone());
                Completion::Failed(error)
            }
        }
    }

    fn reset(&mut self) -> FetchTicket {
        self.generation += 1;
        self.current_page = 1;
        self.total_pages = 1;
        self.doctors.clear();
        self.can_load_more = false;
        self.is_loading = true;
        self.is_loading_more = false;
        self.last_error = None;

        self.ticket(FetchKind::Replace)
    }

    fn ticket(&self, kind: FetchKind) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            page: self.current_page,
            kind,
            query: self.query.clone(),
        }
    }

    pub fn result_set(&self) -> SearchResultSet {
        SearchResultSet {
            doctors: self.doctors.clone(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            can_load_more: self.can_load_more,
        }
    }

    pub fn doctors(&self) -> &[DoctorRecord] {
        &self.doctors
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn can_load_more(&self) -> bool {
        self.can_load_more
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.is_loading_more
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
