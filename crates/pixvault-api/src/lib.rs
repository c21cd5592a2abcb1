//! Pixvault API Library
//!
//! HTTP surface of the media store: upload intake, variant reads, health
//! checks and the OpenAPI document, plus application setup.

mod api_doc;
mod handlers;
mod telemetry;
mod utils;

pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
