pub mod health;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::auth::require_session;
use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Any signed-in role
        .route("/api/v1/score", post(handlers::handle_score_preview))
        // Student portal
        .route(
            "/api/v1/student/matches",
            get(handlers::handle_list_student_matches),
        )
        .route(
            "/api/v1/student/matches/run",
            post(handlers::handle_run_student_matches),
        )
        // Employer portal
        .route(
            "/api/v1/employer/jobs/:job_id/matches",
            get(handlers::handle_list_job_matches),
        )
        .route(
            "/api/v1/employer/jobs/:job_id/matches/run",
            post(handlers::handle_run_job_matches),
        )
        .route(
            "/api/v1/employer/jobs/:job_id/matches/:student_id",
            patch(handlers::handle_update_match_status),
        )
        // Admin
        .route(
            "/api/v1/admin/matches/rescore",
            post(handlers::handle_rescore_all),
        )
        .route(
            "/api/v1/admin/jobs/:job_id/matches",
            delete(handlers::handle_delete_job_matches),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        // Routes below are not behind the session layer
        .route("/health", get(health::health_handler))
        .with_state(state)
}
