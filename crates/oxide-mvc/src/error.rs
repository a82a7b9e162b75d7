//! Error types for dispatch and rendering.

use thiserror::Error;

/// Errors raised while configuring an application or rendering a response.
#[derive(Debug, Error)]
pub enum MvcError {
    /// Route table error.
    #[error("router error: {0}")]
    Router(#[from] oxide_router::RouterError),

    /// The response content type has no format mapping.
    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    /// No template for the resolved (app, name, format).
    #[error("no such template: {0}")]
    TemplateNotFound(String),

    /// Template engine error.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML encoding error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Malformed `multipart/form-data` body.
    #[error("multipart error: {0}")]
    Multipart(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request body exceeded the configured maximum.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Invalid or missing session configuration.
    #[error("session configuration error: {0}")]
    Session(String),

    /// Error returned by a controller or middleware.
    #[error("{0}")]
    Handler(String),
}

impl MvcError {
    /// Creates a handler error from any message.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

/// Result type alias for MVC operations.
pub type Result<T> = std::result::Result<T, MvcError>;
