//! Error types for the completion notifier.

use crate::messaging::PublishError;
use crate::model::OrderId;
use crate::notifier::GatewayError;
use thiserror::Error;

/// Why a completion event could not be turned into a notification.
///
/// Every variant leaves the outbound channel untouched except `PublishFailure`,
/// where the transport itself refused the message.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The store has no record for the completed order.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order exists but names no customer.
    #[error("Order {0} has no customer to notify")]
    MissingCustomer(OrderId),

    /// The store could not be read.
    #[error("Order store unavailable while resolving order {order_id}: {source}")]
    StoreUnavailable {
        order_id: OrderId,
        #[source]
        source: GatewayError,
    },

    /// The outbound transport did not accept the notification.
    #[error("Publishing notification for order {order_id} failed: {source}")]
    PublishFailure {
        order_id: OrderId,
        #[source]
        source: PublishError,
    },
}

impl NotifyError {
    /// Infrastructure failures that a later redelivery may get past.
    ///
    /// Missing orders and customers are data problems; redelivering will not fix them.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NotifyError::StoreUnavailable { .. } | NotifyError::PublishFailure { .. }
        )
    }
}
