//! Configuration types
//!
//! Board-agnostic printer configuration, stored as postcard binary data.

#[cfg(feature = "serde")]
pub mod store;
pub mod types;

pub use types::*;
