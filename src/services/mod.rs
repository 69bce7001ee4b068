// Service exports
pub mod api;
pub mod ports;

use thiserror::Error;

pub use api::PetApiClient;
pub use ports::{CandidateSource, DecisionRecorder, FavoriteStore, EventSink, SessionEvent};

/// Errors that can occur when talking to the pet backend
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: missing or expired token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}
