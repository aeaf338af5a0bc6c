use axum::Router;

use crate::state::SharedState;

pub mod cars;
pub mod docs;
mod extract;
pub mod health;

/// Full HTTP surface: car registry, health probe and API docs.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(cars::router())
        .merge(health::router())
        .merge(docs::router())
        .with_state(state)
}
