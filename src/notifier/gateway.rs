//! Read-only seam between the notifier and whatever stores orders.

use crate::model::{Order, OrderId};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// The store could not answer; worth trying again later.
    #[error("store unreachable: {0}")]
    Unavailable(String),
}

/// Looks orders up by id.
///
/// Implementations must be free of side effects: no writes, no audit stamps.
/// A missing order is `Ok(None)`, not an error.
#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, GatewayError>;
}
