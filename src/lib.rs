//! Chainview Front-End Core
//!
//! Control logic for driving a remote options-data backend: a reqwest
//! gateway over the backend's HTTP API, a cancellable recurring refresh
//! controller, and a paginated result viewer. Rendering goes through a
//! single serialized presentation sink.

pub mod config;
pub mod gateway;
pub mod poller;
pub mod sink;
pub mod viewer;

// Re-export commonly used types for convenience
pub use gateway::{BackendGateway, GatewayError, HttpGateway, PageSlice, ResultSet};
pub use poller::{LoopPhase, RecurringTask, RefreshController, RefreshTask};
pub use sink::{ConsoleSink, PresentationSink, SinkHandle};
pub use viewer::{LoadPhase, PageViewer};
