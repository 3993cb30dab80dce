use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, patch, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/auth/exists", get(handlers::user_exists))
        .route("/api/entries", get(handlers::list_entries).post(handlers::add_entry))
        .route("/api/entries/date/:date", get(handlers::entry_by_date))
        .route(
            "/api/entries/:id",
            patch(handlers::update_entry).delete(handlers::delete_entry),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/chart", get(handlers::get_chart))
        .with_state(state)
}
