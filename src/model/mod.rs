//! Pure data structures implementing the [`StoreEntity`](crate::framework::StoreEntity) trait.

pub mod order;

pub use order::*;
