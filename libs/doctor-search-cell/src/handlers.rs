use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::AnalyticsService;

use crate::models::{FilterCriteria, Insurance, Specialty};
use crate::services::{
    CareType, DoctorCatalog, SearchQueryBuilder, SearchSession, SearchSessionHandle,
    SessionConfig, SessionSnapshot,
};

struct SessionEntry {
    handle: SearchSessionHandle,
    last_touched: Instant,
}

/// Shared state for the search routes: collaborators injected once at startup
/// and the live sessions keyed by id.
pub struct SearchAppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<dyn DoctorCatalog>,
    pub analytics: Arc<dyn AnalyticsService>,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SearchAppState {
    pub fn new(
        config: Arc<AppConfig>,
        catalog: Arc<dyn DoctorCatalog>,
        analytics: Arc<dyn AnalyticsService>,
    ) -> Self {
        Self {
            config,
            catalog,
            analytics,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Looks up a session and marks it as used.
    async fn session(&self, session_id: Uuid) -> Result<SearchSessionHandle, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&session_id)
            .ok_or_else(|| AppError::NotFound(format!("Search session {} not found", session_id)))?;
        entry.last_touched = Instant::now();
        Ok(entry.handle.clone())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions untouched for at least `max_idle`. Dropping the last
    /// handle stops the session task. Returns how many were removed.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_touched.elapsed() < max_idle);
        before - sessions.len()
    }

    /// Periodically evicts idle sessions. The loop ends once the state itself
    /// has been dropped.
    pub fn spawn_session_sweeper(
        state: &Arc<Self>,
        every: Duration,
        max_idle: Duration,
    ) -> JoinHandle<()> {
        let state: Weak<Self> = Arc::downgrade(state);

        tokio::spawn(async move {
            let mut sweep_interval = interval(every);

            loop {
                sweep_interval.tick().await;

                let Some(state) = state.upgrade() else {
                    debug!("Session sweeper stopping: state dropped");
                    break;
                };

                let evicted = state.evict_idle(max_idle).await;
                if evicted > 0 {
                    info!("Evicted {} idle search sessions", evicted);
                }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct InsuranceSelection {
    pub name: String,
    pub plan_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub text: String,
    pub location: Option<String>,
    pub specialty_id: Option<String>,
    pub insurance: Option<InsuranceSelection>,
    pub care_type: Option<CareType>,
    pub criteria: FilterCriteria,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

// ==============================================================================
// SESSION HANDLERS
// ==============================================================================

pub async fn create_session(
    State(state): State<Arc<SearchAppState>>,
) -> (StatusCode, Json<SessionCreated>) {
    let handle = SearchSession::spawn(
        Arc::clone(&state.catalog),
        Arc::clone(&state.analytics),
        SessionConfig::from(state.config.as_ref()),
    );
    let session_id = Uuid::new_v4();
    state.sessions.write().await.insert(
        session_id,
        SessionEntry {
            handle,
            last_touched: Instant::now(),
        },
    );

    info!("Created search session {}", session_id);
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

pub async fn get_session(
    State(state): State<Arc<SearchAppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.session(session_id).await?;
    Ok(Json(session.snapshot()))
}

pub async fn delete_session(
    State(state): State<Arc<SearchAppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions
        .write()
        .await
        .remove(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("Search session {} not found", session_id)))?;

    debug!("Removed search session {}", session_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search(
    State(state): State<Arc<SearchAppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SearchRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let session = state.session(session_id).await?;

    let specialty = match request.specialty_id {
        Some(ref id) => Some(
            Specialty::find(id)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown specialty: {}", id)))?,
        ),
        None => None,
    };

    let mut builder = SearchQueryBuilder::new()
        .text(request.text)
        .specialty(specialty)
        .insurance(request.insurance.map(|i| Insurance::new(i.name, i.plan_type.as_deref())));
    if let Some(location) = request.location {
        builder = builder.location(location);
    }
    if let Some(care_type) = request.care_type {
        builder = builder.care_type(care_type);
    }

    session.search(builder.build(), request.criteria)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(session.snapshot())))
}

pub async fn apply_filters(
    State(state): State<Arc<SearchAppState>>,
    Path(session_id): Path<Uuid>,
    Json(criteria): Json<FilterCriteria>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let session = state.session(session_id).await?;

    session.apply_filters(criteria)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(session.snapshot())))
}

pub async fn load_more(
    State(state): State<Arc<SearchAppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let session = state.session(session_id).await?;

    session.load_more()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(session.snapshot())))
}

// ==============================================================================
// CATALOG HANDLERS
// ==============================================================================

pub async fn get_doctor(
    State(state): State<Arc<SearchAppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.catalog.get_doctor(&doctor_id).await?;

    let mut parameters = Map::new();
    parameters.insert("doctor_id".to_string(), json!(doctor.id));
    state.analytics.log_screen_view("doctor_detail", parameters);

    Ok(Json(json!({
        "doctor": doctor,
        "formatted_address": doctor.address.formatted(),
        "next_available": doctor.earliest_available(),
    })))
}

pub async fn list_specialties() -> Json<Vec<Specialty>> {
    Json(Specialty::all())
}

pub async fn list_popular_insurances() -> Json<Vec<Insurance>> {
    Json(Insurance::popular())
}
