//! # Messaging
//!
//! Transport primitives the notifier is wired to.
//!
//! ```text
//!  upstream ──publish──▶ [finishedOrders] ──Binding──▶ Consumer::accept
//!                                              │ retry / timeout
//!                                              └──▶ [finishedOrders.dlq]
//!  Consumer ──publish──▶ [notifyOrders] ──▶ downstream subscribers
//! ```
//!
//! - [`Message`]: JSON payload plus string headers.
//! - [`Publisher`]: anything that can hand a message to a named channel.
//! - [`InMemoryBroker`]: in-process broker with per-channel logs, used by the demo and tests.
//! - [`Binding`] / [`Consumer`]: the delivery loop that owns redelivery and dead-lettering,
//!   so consumers never retry on their own.

pub mod binding;
pub mod broker;
pub mod message;
pub mod publisher;

pub use binding::*;
pub use broker::*;
pub use message::*;
pub use publisher::*;
