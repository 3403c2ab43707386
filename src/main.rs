//! # Completion Notifier demo
//!
//! Runs the whole pipeline in one process:
//! 1. Start the [`NotificationSystem`] from environment settings.
//! 2. Create an order for `alice` and walk it to `Brewed`.
//! 3. Signal completion on the inbound channel.
//! 4. Wait for the customer notification on the outbound channel.

use completion_notifier::lifecycle::tracing::setup_tracing;
use completion_notifier::lifecycle::{NotificationSystem, Settings};
use completion_notifier::model::{OrderCreate, OrderState};
use completion_notifier::notifier::NotificationMessage;
use std::error::Error;
use std::time::Duration;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_tracing();

    let settings = Settings::from_env()?;
    let wait = settings.delivery.timeout * settings.delivery.max_attempts;
    let system = NotificationSystem::start(settings);
    let mut notifications = system.broker.subscribe(system.notify_channel());

    let span = tracing::info_span!("order_processing");
    let order_id = async {
        let id = system
            .order_client
            .create_order(OrderCreate {
                customer: "alice".to_string(),
            })
            .await?;
        for state in [OrderState::Paid, OrderState::Brewing, OrderState::Brewed] {
            system.order_client.update_state(id, state).await?;
        }
        info!(order_id = %id, "Order brewed");
        system.complete_order(id).await?;
        Ok::<_, Box<dyn Error>>(id)
    }
    .instrument(span)
    .await?;

    match tokio::time::timeout(wait, notifications.recv()).await {
        Ok(Some(message)) => match NotificationMessage::from_message(&message) {
            Some(sent) => info!(order_id = %sent.order_id, customer = %sent.customer, "Customer notified"),
            None => warn!(?message, "Unreadable notification"),
        },
        Ok(None) => warn!(%order_id, "Notification channel closed"),
        Err(_) => warn!(%order_id, ?wait, "No notification received"),
    }

    let report = system.shutdown().await?;
    info!(
        acknowledged = report.acknowledged,
        dead_lettered = report.dead_lettered,
        "Application completed successfully"
    );
    Ok(())
}
