use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Orders.
///
/// Serializes as a bare number, which is also the wire shape of completion
/// events and notification payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Preparation stage of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderState {
    #[default]
    Init,
    Paid,
    Brewing,
    Brewed,
    Taken,
    Cancelled,
}

/// Represents a customer order held by the order store.
///
/// # Store Framework
/// This struct implements the [`StoreEntity`](crate::framework::StoreEntity) trait,
/// allowing it to be managed by a [`ResourceActor`](crate::framework::ResourceActor).
///
/// See [`impl StoreEntity for Order`](#impl-StoreEntity-for-Order) for details on:
/// - Creation parameters ([`OrderCreate`])
/// - Update parameters ([`OrderUpdate`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: String,
    pub state: OrderState,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Payload for creating a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub customer: String,
}

/// Payload for moving an order to another state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub state: OrderState,
}

impl Order {
    /// Creates a new Order instance stamped with `now` as both audit times.
    ///
    /// # Arguments
    /// * `id` - Identifier assigned by the store
    /// * `customer` - Customer who placed the order
    /// * `now` - Creation instant supplied by the store's clock
    pub fn new(id: OrderId, customer: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            customer: customer.into(),
            state: OrderState::Init,
            create_time: now,
            update_time: now,
        }
    }

    /// Records a mutation at `now`.
    ///
    /// A clock that runs backwards never pulls `update_time` below `create_time`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.update_time = now.max(self.create_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn order_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&OrderId(42)).unwrap();
        assert_eq!(json, "42");
        let back: OrderId = serde_json::from_str("42").unwrap();
        assert_eq!(back, OrderId(42));
    }

    #[test]
    fn touch_never_moves_update_time_before_create_time() {
        let created = Utc::now();
        let mut order = Order::new(OrderId(1), "alice", created);

        order.touch(created - Duration::seconds(30));
        assert_eq!(order.update_time, created);

        let later = created + Duration::seconds(5);
        order.touch(later);
        assert_eq!(order.update_time, later);
        assert_eq!(order.create_time, created);
    }
}
