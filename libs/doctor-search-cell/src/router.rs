use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{self, SearchAppState};

pub fn doctor_search_routes(state: Arc<SearchAppState>) -> Router {
    // Search sessions: one per result list on screen
    let session_routes = Router::new()
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/{session_id}", get(handlers::get_session).delete(handlers::delete_session))
        .route("/sessions/{session_id}/search", post(handlers::search))
        .route("/sessions/{session_id}/filters", post(handlers::apply_filters))
        .route("/sessions/{session_id}/more", post(handlers::load_more));

    // Read-only catalog lookups
    let catalog_routes = Router::new()
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .route("/specialties", get(handlers::list_specialties))
        .route("/insurances/popular", get(handlers::list_popular_insurances));

    Router::new()
        .merge(session_routes)
        .merge(catalog_routes)
        .with_state(state)
}
