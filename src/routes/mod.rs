use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod auth;
pub mod contact;
pub mod courses;
pub mod docs;
pub mod exams;
pub mod health;
pub mod results;
pub mod session;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(auth::router())
        .merge(exams::router())
        .merge(results::router())
        .merge(courses::router())
        .merge(contact::router())
        .merge(admin::router(state.clone()))
        .merge(docs::router());

    api_router.with_state(state)
}
