//! Namespaced result cache with per-entry TTL.
//!
//! [`ResultCache`] sits in front of a [`CacheStore`]. The in-process [`MemoryStore`]
//! is the default backend; anything speaking `GET` / `SET EX` / `DEL` can implement the
//! trait.

pub mod error;
pub mod namespace;
pub mod result_cache;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{CacheError, CacheResult};
pub use namespace::{CacheNamespace, CacheTtls};
pub use result_cache::{CacheStats, ResultCache};
#[cfg(any(test, feature = "mock"))]
pub use store::UnavailableStore;
pub use store::{CacheStore, MemoryStore};
