//! In-process broker for the demo binary and tests.

use crate::messaging::{Message, PublishError, Publisher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Default)]
struct ChannelState {
    log: Vec<Message>,
    subscribers: Vec<mpsc::UnboundedSender<Message>>,
}

#[derive(Default)]
struct BrokerState {
    channels: HashMap<String, ChannelState>,
    closed: bool,
}

/// Named channels with an append-only log and push delivery to subscribers.
///
/// Clones share the same channels. Every published message is appended to the
/// channel's log (see [`InMemoryBroker::published`]) and pushed to each live
/// subscriber. Subscriptions only see messages published after they were created.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to `channel`.
    ///
    /// The receiver ends once [`InMemoryBroker::close`] runs and buffered messages are drained.
    /// Subscribing to a closed broker yields a receiver that is already finished.
    pub fn subscribe(&self, channel: &str) -> mpsc::UnboundedReceiver<Message> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.lock();
        if !state.closed {
            state
                .channels
                .entry(channel.to_string())
                .or_default()
                .subscribers
                .push(sender);
        }
        receiver
    }

    /// Every message accepted on `channel`, in publish order.
    pub fn published(&self, channel: &str) -> Vec<Message> {
        self.lock()
            .channels
            .get(channel)
            .map(|c| c.log.clone())
            .unwrap_or_default()
    }

    /// End every subscription to `channel`. Publishing to it still succeeds.
    pub fn unsubscribe_all(&self, channel: &str) {
        if let Some(target) = self.lock().channels.get_mut(channel) {
            target.subscribers.clear();
        }
    }

    /// Stop accepting messages and end every subscription.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        for channel in state.channels.values_mut() {
            channel.subscribers.clear();
        }
    }
}

#[async_trait]
impl Publisher for InMemoryBroker {
    async fn publish(&self, channel: &str, message: Message) -> Result<(), PublishError> {
        let mut state = self.lock();
        if state.closed {
            return Err(PublishError::ChannelClosed(channel.to_string()));
        }
        let target = state.channels.entry(channel.to_string()).or_default();
        target
            .subscribers
            .retain(|subscriber| subscriber.send(message.clone()).is_ok());
        target.log.push(message);
        debug!(channel, log_len = target.log.len(), "Published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fans_out_to_subscribers_and_logs() {
        let broker = InMemoryBroker::new();
        let mut first = broker.subscribe("orders");
        let mut second = broker.subscribe("orders");

        broker.publish("orders", Message::new("1")).await.unwrap();

        assert_eq!(first.recv().await.unwrap().payload(), b"1");
        assert_eq!(second.recv().await.unwrap().payload(), b"1");
        assert_eq!(broker.published("orders").len(), 1);
        assert!(broker.published("other").is_empty());
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let broker = InMemoryBroker::new();
        drop(broker.subscribe("orders"));

        broker.publish("orders", Message::new("1")).await.unwrap();
        assert_eq!(broker.published("orders").len(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_all_leaves_other_channels_open() {
        let broker = InMemoryBroker::new();
        let mut orders = broker.subscribe("orders");
        let mut other = broker.subscribe("other");

        broker.unsubscribe_all("orders");
        assert!(orders.recv().await.is_none());

        broker.publish("orders", Message::new("1")).await.unwrap();
        broker.publish("other", Message::new("2")).await.unwrap();
        assert_eq!(other.recv().await.unwrap().payload(), b"2");
        assert_eq!(broker.published("orders").len(), 1);
    }

    #[tokio::test]
    async fn close_ends_subscriptions_and_rejects_publishes() {
        let broker = InMemoryBroker::new();
        let mut subscription = broker.subscribe("orders");
        broker.publish("orders", Message::new("1")).await.unwrap();

        broker.close();

        // Buffered messages are still delivered before the stream ends.
        assert!(subscription.recv().await.is_some());
        assert!(subscription.recv().await.is_none());

        let result = broker.publish("orders", Message::new("2")).await;
        assert!(matches!(result, Err(PublishError::ChannelClosed(c)) if c == "orders"));
        assert!(broker.subscribe("orders").recv().await.is_none());
    }
}
