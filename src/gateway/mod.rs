//! Backend gateway: the sole mediator between the front-end core and the
//! remote options-data service.
//!
//! The gateway is stateless; every call is independent and retry policy
//! belongs to the caller.

mod client;
mod models;

pub use client::HttpGateway;
pub use models::{PageSlice, ResultSet, Row};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by gateway calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network failure, non-2xx status, or an undecodable response body.
    #[error("{0}")]
    Transport(String),

    /// The backend reported zero rows. A valid (if unhelpful) outcome,
    /// distinct from failure: callers render "no data" instead of an error.
    #[error("backend returned no rows")]
    EmptyResult,
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// Operations against the remote options-data backend.
///
/// All four calls may suspend and may fail with `GatewayError::Transport`.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Trigger a one-shot server-side computation.
    ///
    /// The result is an opaque structured object, forwarded verbatim to the
    /// presentation sink.
    async fn run_computation(&self) -> Result<Value, GatewayError>;

    /// Trigger the backend to recompute its authoritative dataset and return
    /// the resulting rows. Fails with `EmptyResult` on zero rows.
    async fn run_refresh(&self) -> Result<ResultSet, GatewayError>;

    /// Fetch one page of the preview dataset. Read-only and idempotent;
    /// safe to call repeatedly with the same arguments.
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PageSlice, GatewayError>;

    /// Trigger a server-side bulk export. The gateway learns only
    /// success or failure, never the destination.
    async fn export_dataset(&self) -> Result<(), GatewayError>;
}
