//! Verifile server
//!
//! Stores uploaded batches and serves each file with a Merkle inclusion
//! proof against the batch's root hash.

pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::{AppError, Result};
pub use state::{AppState, StateError};

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/health", routes::health::router())
        .nest("/files", routes::files::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
