//! StoreEntity trait implementation for the Order domain type.
//!
//! See the trait implementation on [`Order`] for method documentation.

use crate::framework::StoreEntity;
use crate::model::{Order, OrderCreate, OrderId, OrderState, OrderUpdate};
use crate::order_actor::OrderError;
use chrono::{DateTime, Utc};

impl StoreEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Update = OrderUpdate;
    type Error = OrderError;

    /// Creates a new Order, rejecting a blank customer.
    fn from_create_params(
        id: OrderId,
        params: OrderCreate,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if params.customer.trim().is_empty() {
            return Err(OrderError::ValidationError(
                "customer must not be blank".to_string(),
            ));
        }
        Ok(Self::new(id, params.customer, now))
    }

    /// Moves the order to a new state.
    ///
    /// Taken and cancelled orders are final.
    fn apply_update(&mut self, update: OrderUpdate) -> Result<(), OrderError> {
        if matches!(self.state, OrderState::Taken | OrderState::Cancelled) {
            return Err(OrderError::ValidationError(format!(
                "order {} is already {:?}",
                self.id, self.state
            )));
        }
        self.state = update.state;
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        Order::touch(self, now);
    }
}
