pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;
use crate::users::handlers::handle_sync_user;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Users
        .route("/api/v1/users/sync", post(handle_sync_user))
        // Interviews
        .route(
            "/api/v1/interviews",
            get(handlers::handle_list_interviews).post(handlers::handle_create_interview),
        )
        .route(
            "/api/v1/interviews/stream",
            get(handlers::handle_interview_stream),
        )
        .route(
            "/api/v1/interviews/:id",
            get(handlers::handle_get_interview)
                .put(handlers::handle_update_interview)
                .delete(handlers::handle_delete_interview),
        )
        // Answers
        .route(
            "/api/v1/interviews/:id/evaluate",
            post(handlers::handle_evaluate),
        )
        .route(
            "/api/v1/interviews/:id/answers",
            get(handlers::handle_list_answers).post(handlers::handle_submit_answer),
        )
        .with_state(state)
}
