//! # Mock Framework
//!
//! Utilities for testing store consumers (such as the completion notifier) without
//! spawning a [`ResourceActor`](crate::framework::ResourceActor).
//!
//! Two styles are available:
//!
//! - [`MockClient`]: queue expectations up front (`expect_get(..).return_ok(..)`), hand the
//!   client to the code under test, then call [`MockClient::verify`].
//! - [`create_mock_client`] plus [`expect_get`]: drive the other end of the channel by hand,
//!   which lets a test hold a reply back or drop it on purpose.
//!
//! Error injection is the main reason to reach for a mock: a real actor never answers
//! with `ActorDropped`, but a store behind a network hop can.

use crate::framework::{FrameworkError, ResourceClient, ResourceRequest, StoreEntity};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request and the reply to send back.
enum Expectation<T: StoreEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
    },
    Update {
        id: T::Id,
        response: Result<T, FrameworkError>,
    },
}

struct MockState<T: StoreEntity> {
    expectations: VecDeque<Expectation<T>>,
    failures: Vec<String>,
}

type SharedState<T> = Arc<Mutex<MockState<T>>>;

fn lock<T: StoreEntity>(state: &SharedState<T>) -> MutexGuard<'_, MockState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock client with expectation tracking for fluent testing.
///
/// Requests are matched against expectations in FIFO order. A request that does not
/// match (wrong kind, wrong id, or no expectation left) has its reply channel dropped,
/// so the caller sees [`FrameworkError::ActorDropped`], and the mismatch is reported by
/// [`MockClient::verify`].
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<Order>::new();
/// mock.expect_get(OrderId(42)).return_ok(Some(order));
///
/// let client = mock.client();
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockClient<T: StoreEntity> {
    client: ResourceClient<T>,
    state: SharedState<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: StoreEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StoreEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let state = Arc::new(Mutex::new(MockState {
            expectations: VecDeque::new(),
            failures: Vec::new(),
        }));
        let task_state = state.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&task_state).expectations.pop_front();

                match (request, expectation) {
                    (
                        ResourceRequest::Get { id, respond_to },
                        Some(Expectation::Get {
                            id: expected,
                            response,
                        }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Create { respond_to, .. },
                        Some(Expectation::Create { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Update { id, respond_to, .. },
                        Some(Expectation::Update {
                            id: expected,
                            response,
                        }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        let failure = format!(
                            "unexpected {} (expected {})",
                            describe_request(&request),
                            expectation
                                .as_ref()
                                .map_or_else(|| "nothing".to_string(), describe_expectation),
                        );
                        lock(&task_state).failures.push(failure);
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            state,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` operation for `id`.
    pub fn expect_get(&mut self, id: T::Id) -> GetExpectationBuilder<T> {
        GetExpectationBuilder {
            id,
            state: self.state.clone(),
        }
    }

    /// Expects a `create` operation.
    pub fn expect_create(&mut self) -> CreateExpectationBuilder<T> {
        CreateExpectationBuilder {
            state: self.state.clone(),
        }
    }

    /// Expects an `update` operation for `id`.
    pub fn expect_update(&mut self, id: T::Id) -> UpdateExpectationBuilder<T> {
        UpdateExpectationBuilder {
            id,
            state: self.state.clone(),
        }
    }

    /// Verifies that every expectation was consumed and no request was unexpected.
    ///
    /// # Panics
    /// Panics listing the unmet expectations or mismatched requests.
    pub fn verify(&self) {
        let state = lock(&self.state);
        if !state.failures.is_empty() {
            panic!("Mock received unexpected requests: {:?}", state.failures);
        }
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }
}

fn describe_request<T: StoreEntity>(request: &ResourceRequest<T>) -> String {
    match request {
        ResourceRequest::Get { id, .. } => format!("get({id})"),
        ResourceRequest::Create { params, .. } => format!("create({params:?})"),
        ResourceRequest::Update { id, .. } => format!("update({id})"),
    }
}

fn describe_expectation<T: StoreEntity>(expectation: &Expectation<T>) -> String {
    match expectation {
        Expectation::Get { id, .. } => format!("get({id})"),
        Expectation::Create { .. } => "create".to_string(),
        Expectation::Update { id, .. } => format!("update({id})"),
    }
}

/// Builder for `get` expectations.
pub struct GetExpectationBuilder<T: StoreEntity> {
    id: T::Id,
    state: SharedState<T>,
}

impl<T: StoreEntity> GetExpectationBuilder<T> {
    /// Replies with `value` (use `None` to simulate a missing record).
    pub fn return_ok(self, value: Option<T>) {
        self.push(Ok(value));
    }

    /// Replies with an error.
    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Option<T>, FrameworkError>) {
        lock(&self.state).expectations.push_back(Expectation::Get {
            id: self.id,
            response,
        });
    }
}

/// Builder for `create` expectations.
pub struct CreateExpectationBuilder<T: StoreEntity> {
    state: SharedState<T>,
}

impl<T: StoreEntity> CreateExpectationBuilder<T> {
    /// Replies with the assigned id.
    pub fn return_ok(self, id: T::Id) {
        lock(&self.state)
            .expectations
            .push_back(Expectation::Create { response: Ok(id) });
    }

    /// Replies with an error.
    pub fn return_err(self, error: FrameworkError) {
        lock(&self.state).expectations.push_back(Expectation::Create {
            response: Err(error),
        });
    }
}

/// Builder for `update` expectations.
pub struct UpdateExpectationBuilder<T: StoreEntity> {
    id: T::Id,
    state: SharedState<T>,
}

impl<T: StoreEntity> UpdateExpectationBuilder<T> {
    /// Replies with the updated record.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Replies with an error.
    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, FrameworkError>) {
        lock(&self.state).expectations.push_back(Expectation::Update {
            id: self.id,
            response,
        });
    }
}

// =============================================================================
// RAW CHANNEL HELPERS
// =============================================================================

/// Creates a client whose requests land on a receiver the test controls.
///
/// Use this when the test needs to decide *when* (or whether) a reply is sent.
pub fn create_mock_client<T: StoreEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Waits for the next request and returns it if it is a `get`.
pub async fn expect_get<T: StoreEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Order, OrderCreate, OrderId, OrderState, OrderUpdate};
    use chrono::Utc;

    #[tokio::test]
    async fn test_raw_mock_client() {
        let (client, mut receiver) = create_mock_client::<Order>(10);

        let get_task = tokio::spawn(async move { client.get(OrderId(5)).await });

        let (id, responder) = expect_get(&mut receiver)
            .await
            .expect("Expected Get request");
        assert_eq!(id, OrderId(5));
        responder.send(Ok(None)).unwrap();

        let result = get_task.await.unwrap();
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_mock_client_with_expectations() {
        let mut mock = MockClient::<Order>::new();

        let order = Order::new(OrderId(1), "alice", Utc::now());
        let mut brewed = order.clone();
        brewed.state = OrderState::Brewed;

        mock.expect_create().return_ok(OrderId(1));
        mock.expect_get(OrderId(1)).return_ok(Some(order));
        mock.expect_update(OrderId(1)).return_ok(brewed);

        let client = mock.client();

        let id = client
            .create(OrderCreate {
                customer: "alice".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(id, OrderId(1));

        let fetched = client.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.customer, "alice");

        let updated = client
            .update(id, OrderUpdate { state: OrderState::Brewed })
            .await
            .unwrap();
        assert_eq!(updated.state, OrderState::Brewed);

        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_client_injects_errors() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_get(OrderId(1)).return_err(FrameworkError::ActorClosed);

        let result = mock.client().get(OrderId(1)).await;
        assert!(matches!(result, Err(FrameworkError::ActorClosed)));
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "unexpected get(2)")]
    async fn test_mock_client_flags_wrong_id() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_get(OrderId(1)).return_ok(None);

        let result = mock.client().get(OrderId(2)).await;
        assert!(matches!(result, Err(FrameworkError::ActorDropped)));
        mock.verify();
    }
}
