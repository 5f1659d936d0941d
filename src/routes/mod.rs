/// Application routes configuration
use crate::handlers::{
    delete_observation, get_challenges, get_equipment, get_plan, get_stats, get_tonight, health,
    list_sessions, my_observations, nearby_observations, put_equipment, put_report, save_session,
    sync_observations, AppState,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Observation log
        .route("/api/observations/sync", post(sync_observations))
        .route("/api/observations/mine", get(my_observations))
        .route("/api/observations/nearby", get(nearby_observations))
        .route("/api/observations/:id", delete(delete_observation))
        // Sky report and derived views
        .route("/api/report", put(put_report))
        .route("/api/tonight", get(get_tonight))
        .route("/api/plan", get(get_plan))
        // Progress
        .route("/api/stats", get(get_stats))
        .route("/api/challenges", get(get_challenges))
        // Device settings
        .route("/api/equipment", get(get_equipment).put(put_equipment))
        .route("/api/sessions", get(list_sessions).post(save_session))
        .with_state(state)
}
