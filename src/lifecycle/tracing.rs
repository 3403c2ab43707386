//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the process-wide subscriber. Call it once, first thing in
//! `main`; tests leave it out and run without a subscriber.
//!
//! ## Configuration
//!
//! Compact format, module paths hidden (`with_target(false)`), level taken from
//! `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info cargo run     # one line per completion event
//! RUST_LOG=debug cargo run    # payloads, store requests, broker publishes
//! RUST_LOG=completion_notifier::messaging=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - **Store**: actor startup and shutdown, every create/get/update with `id`
//! - **Notifier**: `handle{order_id=42 channel="notifyOrders"}` span around the
//!   "We've finished an order" and "Notify the customer" lines
//! - **Binding**: one `delivery` span per inbound message, with `attempt` on each
//!   redelivery and dead-letter warning
//!
//! ## Example
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO Binding started channel="finishedOrders"
//! INFO delivery:handle: We've finished an order order_id=1 channel="notifyOrders"
//! INFO delivery:handle: Notify the customer customer=alice order_id=1 channel="notifyOrders"
//! INFO Binding stopped channel="finishedOrders" acknowledged=1 dead_lettered=0
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
