//! crates/dream_university_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the external collaborators.
//! The catalog and the counsellor live behind these ports so the funnel can be
//! driven against the remote backend, a direct LLM, or in-memory fakes.

use async_trait::async_trait;

use crate::domain::University;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, LLM SDKs).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("The call did not settle within {0} ms")]
    Timeout(u64),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetches the full university catalog.
    async fn fetch_universities(&self) -> PortResult<Vec<University>>;
}

#[async_trait]
pub trait CounsellorService: Send + Sync {
    /// Sends one message to the counsellor and returns its reply verbatim.
    async fn send_message(&self, message: &str) -> PortResult<String>;
}
