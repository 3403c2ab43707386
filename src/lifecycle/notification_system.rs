use crate::clients::OrderClient;
use crate::lifecycle::Settings;
use crate::messaging::{Binding, BindingReport, InMemoryBroker, Message, PublishError, Publisher};
use crate::model::OrderId;
use crate::notifier::CompletionNotifier;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, instrument};

/// Errors raised while stopping a [`NotificationSystem`].
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("{task} task failed: {source}")]
    TaskFailed {
        task: &'static str,
        #[source]
        source: JoinError,
    },
}

/// Runtime orchestrator for the completion notifier.
///
/// Owns one [`InMemoryBroker`], the order store actor and the binding that feeds
/// completion events from `finished_channel` into a [`CompletionNotifier`].
///
/// # Example
///
/// ```ignore
/// let system = NotificationSystem::start(Settings::from_env()?);
/// let mut notifications = system.broker.subscribe(system.notify_channel());
///
/// let id = system.order_client.create_order(OrderCreate { customer: "alice".into() }).await?;
/// system.complete_order(id).await?;
///
/// let message = notifications.recv().await;
/// system.shutdown().await?;
/// ```
pub struct NotificationSystem {
    /// Store client, for the upstream stages that create and advance orders.
    pub order_client: OrderClient,

    /// Transport shared by every channel in the system.
    pub broker: InMemoryBroker,

    settings: Settings,
    store_handle: JoinHandle<()>,
    binding_handle: JoinHandle<BindingReport>,
}

impl NotificationSystem {
    /// Spawns the store actor and the binding. Must be called inside a Tokio runtime.
    pub fn start(settings: Settings) -> Self {
        let broker = InMemoryBroker::new();

        let (store, order_client) = crate::order_actor::new(settings.buffer_size);
        let store_handle = tokio::spawn(store.run());

        let notifier = CompletionNotifier::new(
            order_client.clone(),
            broker.clone(),
            settings.notifier.clone(),
        );
        let binding = Binding::new(
            settings.finished_channel.clone(),
            broker.subscribe(&settings.finished_channel),
            notifier,
            broker.clone(),
            settings.delivery.clone(),
        );
        let binding_handle = tokio::spawn(binding.run());

        info!(
            inbound = %settings.finished_channel,
            outbound = %settings.notifier.notify_channel,
            "Notification system started"
        );

        Self {
            order_client,
            broker,
            settings,
            store_handle,
            binding_handle,
        }
    }

    pub fn notify_channel(&self) -> &str {
        &self.settings.notifier.notify_channel
    }

    pub fn finished_channel(&self) -> &str {
        &self.settings.finished_channel
    }

    /// Publishes a completion event for `id` on the inbound channel, as the
    /// upstream brewing stage would.
    #[instrument(skip(self))]
    pub async fn complete_order(&self, id: OrderId) -> Result<(), PublishError> {
        let event = Message::encode(&id)?;
        self.broker.publish(&self.settings.finished_channel, event).await
    }

    /// Gracefully shuts down the system.
    ///
    /// Inbound subscriptions end first so in-flight deliveries can still reach the
    /// store and publish. Then the broker closes, the store's last client is dropped
    /// and the store actor is awaited.
    pub async fn shutdown(self) -> Result<BindingReport, SystemError> {
        info!("Shutting down system...");

        self.broker.unsubscribe_all(&self.settings.finished_channel);
        let report = self.binding_handle.await.map_err(|source| {
            error!(error = %source, "Binding task failed");
            SystemError::TaskFailed {
                task: "binding",
                source,
            }
        })?;

        self.broker.close();
        drop(self.order_client);
        self.store_handle.await.map_err(|source| {
            error!(error = %source, "Store task failed");
            SystemError::TaskFailed {
                task: "order store",
                source,
            }
        })?;

        info!(
            acknowledged = report.acknowledged,
            dead_lettered = report.dead_lettered,
            "System shutdown complete."
        );
        Ok(report)
    }
}
