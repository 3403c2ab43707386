//! Generic in-process record store built on a single actor.
//!
//! # Main Components
//!
//! - [`StoreEntity`] - Trait that record types implement to be managed by the actor
//! - [`ResourceActor`] - Generic actor that owns the records and stamps audit times
//! - [`ResourceClient`] - Cloneable, type-safe handle used to talk to the actor
//! - [`FrameworkError`] - Common error types
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test store consumers without spawning an actor.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use core::*;
