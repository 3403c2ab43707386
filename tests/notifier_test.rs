use completion_notifier::clients::OrderClient;
use completion_notifier::framework::mock::MockClient;
use completion_notifier::framework::FrameworkError;
use completion_notifier::messaging::{
    Binding, DeliverySettings, InMemoryBroker, Message, Publisher, ATTEMPTS_HEADER,
    EXCEPTION_HEADER,
};
use completion_notifier::model::{Order, OrderCreate, OrderId, OrderState};
use completion_notifier::notifier::{
    CompletionNotifier, NotificationMessage, NotifierConfig, NotifyError,
};
use chrono::Utc;
use std::time::Duration;

const NOTIFY: &str = "notifyOrders";
const FINISHED: &str = "finishedOrders";

fn fast_delivery(max_attempts: u32) -> DeliverySettings {
    DeliverySettings {
        max_attempts,
        backoff_initial: Duration::from_millis(1),
        backoff_max: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        timeout: Duration::from_secs(1),
    }
}

/// Real Order store actor behind a real notifier.
///
/// Pattern 2: Actor + Notifier
/// - Real store (exercises creation, updates and lookups)
/// - In-memory broker for asserting what went out
#[tokio::test]
async fn test_notifier_with_real_store() {
    let (store, order_client) = completion_notifier::order_actor::new(8);
    let store_handle = tokio::spawn(store.run());

    let id = order_client
        .create_order(OrderCreate {
            customer: "alice".to_string(),
        })
        .await
        .expect("Failed to create order");
    let brewed = order_client
        .update_state(id, OrderState::Brewed)
        .await
        .expect("Failed to advance order");
    assert!(brewed.update_time >= brewed.create_time);

    let broker = InMemoryBroker::new();
    let notifier = CompletionNotifier::new(
        order_client.clone(),
        broker.clone(),
        NotifierConfig::new(NOTIFY),
    );

    let sent = notifier.handle(id).await.expect("Notification failed");
    assert_eq!(sent, NotificationMessage::new(id, "alice"));

    let published = broker.published(NOTIFY);
    assert_eq!(published.len(), 1);
    assert_eq!(NotificationMessage::from_message(&published[0]), Some(sent));

    // Unknown ids leave the channel untouched.
    let err = notifier.handle(OrderId(999)).await.unwrap_err();
    assert!(matches!(err, NotifyError::OrderNotFound(OrderId(999))));
    assert_eq!(broker.published(NOTIFY).len(), 1);

    drop(notifier);
    drop(order_client);
    store_handle.await.expect("Store task failed");
}

/// Notifier behind a binding with a mocked store.
///
/// Pattern 1: Mocks
/// - The first lookup fails, the redelivery succeeds
/// - Verifies the binding, not the notifier, retries
#[tokio::test]
async fn test_binding_redelivers_when_store_is_unavailable() {
    let mut mock = MockClient::<Order>::new();
    mock.expect_get(OrderId(42))
        .return_err(FrameworkError::ActorClosed);
    mock.expect_get(OrderId(42))
        .return_ok(Some(Order::new(OrderId(42), "alice", Utc::now())));

    let broker = InMemoryBroker::new();
    let notifier = CompletionNotifier::new(
        OrderClient::new(mock.client()),
        broker.clone(),
        NotifierConfig::new(NOTIFY),
    );
    let binding = Binding::new(
        FINISHED,
        broker.subscribe(FINISHED),
        notifier,
        broker.clone(),
        fast_delivery(3),
    );
    let handle = tokio::spawn(binding.run());

    broker
        .publish(FINISHED, Message::encode(&OrderId(42)).unwrap())
        .await
        .unwrap();
    broker.unsubscribe_all(FINISHED);
    let report = handle.await.expect("Binding task failed");

    assert_eq!(report.acknowledged, 1);
    assert_eq!(report.dead_lettered, 0);
    assert_eq!(broker.published(NOTIFY).len(), 1);
    assert!(broker.published("finishedOrders.dlq").is_empty());
    mock.verify();
}

/// A missing order is a data problem: one attempt, then the dead-letter channel.
#[tokio::test]
async fn test_missing_order_is_dead_lettered_without_redelivery() {
    let mut mock = MockClient::<Order>::new();
    mock.expect_get(OrderId(7)).return_ok(None);

    let broker = InMemoryBroker::new();
    let notifier = CompletionNotifier::new(
        OrderClient::new(mock.client()),
        broker.clone(),
        NotifierConfig::new(NOTIFY),
    );
    let binding = Binding::new(
        FINISHED,
        broker.subscribe(FINISHED),
        notifier,
        broker.clone(),
        fast_delivery(3),
    );
    let handle = tokio::spawn(binding.run());

    broker
        .publish(FINISHED, Message::encode(&OrderId(7)).unwrap())
        .await
        .unwrap();
    broker.unsubscribe_all(FINISHED);
    let report = handle.await.expect("Binding task failed");

    assert_eq!(report.dead_lettered, 1);
    assert!(broker.published(NOTIFY).is_empty());
    let parked = broker.published("finishedOrders.dlq");
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].header(ATTEMPTS_HEADER), Some("1"));
    assert_eq!(parked[0].header(EXCEPTION_HEADER), Some("Order not found: 7"));
    assert_eq!(parked[0].decode::<OrderId>().unwrap(), OrderId(7));
    // Exactly one lookup: the mock would record a second, unexpected get.
    mock.verify();
}
