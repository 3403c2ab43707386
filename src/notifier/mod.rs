//! # Completion Notifier
//!
//! Turns "order N is complete" into "notify customer C about order N".
//!
//! ## Flow
//!
//! ```text
//! OrderId ──get_order──▶ Order ──customer──▶ NotificationMessage ──publish──▶ notify channel
//! ```
//!
//! One store read happens before at most one publish. The notifier keeps no state
//! between calls: no cache, no retry counters, no locks. Redelivering the same id simply
//! runs the flow again and publishes a second, identical notification, which downstream
//! consumers are expected to tolerate.
//!
//! ## Structure
//!
//! - [`gateway`] - [`OrderGateway`], the read-only store seam
//! - [`message`] - [`NotificationMessage`] and its wire mapping
//! - [`error`] - [`NotifyError`]
//! - [`config`] - [`NotifierConfig`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! let notifier = CompletionNotifier::new(order_client, broker, NotifierConfig::new("notifyOrders"));
//! let sent = notifier.handle(OrderId(42)).await?;
//! assert_eq!(sent.customer, "alice");
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod message;

pub use config::*;
pub use error::*;
pub use gateway::*;
pub use message::*;

use crate::messaging::{Consumer, PublishError, Publisher};
use crate::model::OrderId;
use async_trait::async_trait;
use tracing::{info, instrument};

/// Resolves completed orders and publishes customer notifications.
pub struct CompletionNotifier<G: OrderGateway, P: Publisher> {
    gateway: G,
    publisher: P,
    config: NotifierConfig,
}

impl<G: OrderGateway, P: Publisher> CompletionNotifier<G, P> {
    pub fn new(gateway: G, publisher: P, config: NotifierConfig) -> Self {
        Self {
            gateway,
            publisher,
            config,
        }
    }

    pub fn notify_channel(&self) -> &str {
        &self.config.notify_channel
    }

    /// Handle one completion event.
    ///
    /// Returns the notification that was handed to the transport. On `Err` nothing was
    /// published, unless the error is `PublishFailure`, in which case the transport
    /// refused the one attempt that was made.
    ///
    /// An order whose customer is empty or whitespace is reported as
    /// [`NotifyError::MissingCustomer`] rather than published with a blank header.
    #[instrument(skip(self), fields(channel = %self.config.notify_channel))]
    pub async fn handle(&self, order_id: OrderId) -> Result<NotificationMessage, NotifyError> {
        info!(%order_id, "We've finished an order");

        let order = self
            .gateway
            .get_order(order_id)
            .await
            .map_err(|source| NotifyError::StoreUnavailable { order_id, source })?
            .ok_or(NotifyError::OrderNotFound(order_id))?;

        if order.customer.trim().is_empty() {
            return Err(NotifyError::MissingCustomer(order_id));
        }

        let notification = NotificationMessage::new(order_id, order.customer);
        let message = notification
            .to_message()
            .map_err(|e| NotifyError::PublishFailure {
                order_id,
                source: PublishError::from(e),
            })?;

        info!(customer = %notification.customer, "Notify the customer");
        self.publisher
            .publish(&self.config.notify_channel, message)
            .await
            .map_err(|source| NotifyError::PublishFailure { order_id, source })?;

        Ok(notification)
    }
}

#[async_trait]
impl<G: OrderGateway, P: Publisher> Consumer for CompletionNotifier<G, P> {
    type Payload = OrderId;
    type Error = NotifyError;

    async fn accept(&self, order_id: OrderId) -> Result<(), NotifyError> {
        self.handle(order_id).await.map(|_| ())
    }

    fn is_retryable(error: &NotifyError) -> bool {
        error.is_transient()
    }
}
