use crate::messaging::Message;
use crate::model::OrderId;

/// Header naming the customer to notify.
pub const CUSTOMER_HEADER: &str = "customer";

/// "Notify this customer about this order."
///
/// On the wire the payload is the bare order id and the customer travels in the
/// [`CUSTOMER_HEADER`] header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub order_id: OrderId,
    pub customer: String,
}

impl NotificationMessage {
    pub fn new(order_id: OrderId, customer: impl Into<String>) -> Self {
        Self {
            order_id,
            customer: customer.into(),
        }
    }

    pub fn to_message(&self) -> Result<Message, serde_json::Error> {
        Ok(Message::encode(&self.order_id)?.with_header(CUSTOMER_HEADER, self.customer.as_str()))
    }

    /// Read a notification back off the wire. `None` if either part is missing.
    pub fn from_message(message: &Message) -> Option<Self> {
        let order_id = message.decode().ok()?;
        let customer = message.header(CUSTOMER_HEADER)?;
        Some(Self::new(order_id, customer))
    }
}
