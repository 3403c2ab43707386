#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Completion Notifier
//!
//! > **Tell the customer when their order is done.**
//!
//! When an upstream stage reports that order `N` is finished, this crate looks the order
//! up, finds who placed it and publishes a notification carrying the order id with the
//! customer in a `customer` header. Delivery concerns (redelivery, timeouts, dead
//! letters) live in the transport binding, not in the notifier.
//!
//! ## 🏗️ Design
//!
//! ### Store as an actor
//! Orders live in a generic `ResourceActor<T>` running in its own Tokio task. It owns
//! its map outright, so there are no locks; callers talk to it through a cloneable
//! client over an mpsc channel with oneshot replies.
//!
//! ### Seams, not singletons
//! The notifier depends on two traits: [`OrderGateway`](notifier::OrderGateway) for
//! reads and [`Publisher`](messaging::Publisher) for the outbound channel. Production
//! wires in [`OrderClient`](clients::OrderClient) and
//! [`InMemoryBroker`](messaging::InMemoryBroker); tests swap in a
//! [`MockClient`](framework::mock::MockClient) or a refusing publisher.
//!
//! ### Errors
//! Each component has its own `thiserror` enum. [`NotifyError`](notifier::NotifyError)
//! tells the binding whether a failure is transient, which decides between
//! redelivery and the dead-letter channel.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Generic store actor, its client and the mock client.
//! - **Key items**: [`StoreEntity`](framework::StoreEntity), [`ResourceActor`](framework::ResourceActor).
//!
//! ### 2. The Data ([`model`], [`order_actor`])
//! [`Order`](model::Order) with its audit timestamps, and the rules the store applies to it.
//!
//! ### 3. The Interface ([`clients`])
//! [`OrderClient`](clients::OrderClient): typed store API and the production gateway.
//!
//! ### 4. The Transport ([`messaging`])
//! Messages, publishers, the in-memory broker and the consumer binding.
//!
//! ### 5. The Logic ([`notifier`])
//! [`CompletionNotifier`](notifier::CompletionNotifier).
//!
//! ### 6. The Orchestrator ([`lifecycle`])
//! Settings, tracing and [`NotificationSystem`](lifecycle::NotificationSystem).
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod clients;
pub mod framework;
pub mod lifecycle;
pub mod messaging;
pub mod model;
pub mod notifier;
pub mod order_actor;
