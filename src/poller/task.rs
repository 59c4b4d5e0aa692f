use async_trait::async_trait;

use crate::gateway::{BackendGateway, GatewayError, ResultSet};

/// Strategy for what one loop iteration does.
///
/// The controller owns scheduling, cancellation, and sink updates; a task
/// only produces the next result set. Future operation types plug in here
/// and reuse the same controller.
#[async_trait]
pub trait RecurringTask: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Perform the remote operation for this iteration.
    async fn run(&self, gateway: &dyn BackendGateway) -> Result<ResultSet, GatewayError>;
}

/// Default task: ask the backend to rebuild its contract dataset and return
/// the resulting rows.
pub struct RefreshTask;

#[async_trait]
impl RecurringTask for RefreshTask {
    fn name(&self) -> &'static str {
        "refresh"
    }

    async fn run(&self, gateway: &dyn BackendGateway) -> Result<ResultSet, GatewayError> {
        gateway.run_refresh().await
    }
}
