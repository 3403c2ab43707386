//! Startup and shutdown: settings, tracing and the [`NotificationSystem`] that wires
//! the store, broker, binding and notifier together.

pub mod config;
pub mod notification_system;
pub mod tracing;

pub use config::*;
pub use notification_system::*;
