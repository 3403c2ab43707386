//! # Order Client
//!
//! High-level API over the order store actor. Besides the write operations used by
//! upstream stages (and by tests), it is the production [`OrderGateway`]: the read-only
//! view the completion notifier resolves orders through.
use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{Order, OrderCreate, OrderId, OrderState, OrderUpdate};
use crate::notifier::{GatewayError, OrderGateway};
use crate::order_actor::OrderError;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Order store actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<OrderId, OrderError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Move an order to `state`; the store refreshes its update time.
    #[instrument(skip(self))]
    pub async fn update_state(&self, id: OrderId, state: OrderState) -> Result<Order, OrderError> {
        self.update(id, OrderUpdate { state }).await
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            FrameworkError::EntityError(source) => match source.downcast::<OrderError>() {
                Ok(order_error) => *order_error,
                Err(other) => OrderError::ValidationError(other.to_string()),
            },
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                OrderError::ActorCommunicationError(e.to_string())
            }
        }
    }
}

#[async_trait]
impl OrderGateway for OrderClient {
    /// Read-only lookup; a missing order is `Ok(None)`, a broken channel is `Unavailable`.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, GatewayError> {
        self.inner
            .get(id)
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockClient;
    use chrono::Utc;

    #[tokio::test]
    async fn test_gateway_maps_channel_failures_to_unavailable() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_get(OrderId(3)).return_err(FrameworkError::ActorDropped);
        let client = OrderClient::new(mock.client());

        let result = client.get_order(OrderId(3)).await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
        mock.verify();
    }

    #[tokio::test]
    async fn test_gateway_returns_missing_orders_as_none() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_get(OrderId(99)).return_ok(None);
        let client = OrderClient::new(mock.client());

        assert_eq!(client.get_order(OrderId(99)).await, Ok(None));
        mock.verify();
    }

    #[tokio::test]
    async fn test_entity_errors_keep_their_type() {
        let (actor, generic) = crate::framework::ResourceActor::<Order>::new(4);
        tokio::spawn(actor.run());
        let client = OrderClient::new(generic);

        let result = client
            .create_order(OrderCreate {
                customer: String::new(),
            })
            .await;
        assert!(matches!(result, Err(OrderError::ValidationError(_))));

        let result = client.update_state(OrderId(8), OrderState::Paid).await;
        assert_eq!(result, Err(OrderError::NotFound("8".to_string())));

        let id = client
            .create_order(OrderCreate {
                customer: "bob".to_string(),
            })
            .await
            .unwrap();
        let order = client.get(id).await.unwrap().unwrap();
        assert_eq!(order.customer, "bob");
        assert!(order.update_time >= order.create_time);
        assert!(order.create_time <= Utc::now());
    }
}
