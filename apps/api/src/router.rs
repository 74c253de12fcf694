use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};
use tracing::info;

use doctor_search_cell::{
    doctor_search_routes, DoctorCatalog, MockDoctorCatalog, RemoteDoctorCatalog, SearchAppState,
};
use shared_config::AppConfig;
use shared_models::TracingAnalytics;

/// Picks the remote catalog only when it is selected and has a base URL.
pub fn build_catalog(config: &AppConfig) -> Arc<dyn DoctorCatalog> {
    if config.use_mock_catalog || !config.is_configured() {
        info!("Using mock doctor catalog ({} ms latency)", config.mock_latency_ms);
        Arc::new(MockDoctorCatalog::from_config(config))
    } else {
        info!("Using remote doctor catalog at {}", config.api_base_url);
        Arc::new(RemoteDoctorCatalog::new(config))
    }
}

pub fn create_state(config: Arc<AppConfig>) -> Arc<SearchAppState> {
    let catalog = build_catalog(&config);
    Arc::new(SearchAppState::new(config, catalog, Arc::new(TracingAnalytics)))
}

pub fn create_router(state: Arc<SearchAppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "MedMatch search API is running!" }))
        .merge(doctor_search_routes(state))
}
