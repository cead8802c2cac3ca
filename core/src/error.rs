//! Error types for the catalog client.
//!
//! # Design
//! `ApiError` is internal to the fetch path: `CatalogClient::fetch_*`
//! logs it and substitutes the empty result, so the list controller never
//! sees one. The `parse_*` methods still return it so the failure shape is
//! testable on its own.

use thiserror::Error;

/// Errors produced while executing or parsing a catalog request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body did not match the expected envelope.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("page size must be between 1 and 100, got {0}")]
    InvalidPageSize(u64),
}

/// The session task has stopped and no longer accepts commands.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("list session has shut down")]
pub struct SessionClosed;
