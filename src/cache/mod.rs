//! In-memory response cache and fallback-chained fetching
//!
//! `CacheManager` keeps API responses for the lifetime of the process with a
//! per-entry TTL. `FallbackChain` layers ordered upstream providers and a
//! static default on top of it, so callers always get a value.

mod fallback;
mod manager;

pub use fallback::{batch_key, resolve_batch, FallbackChain, ProviderFuture, Source, Sourced};
pub use manager::{CacheManager, CachedData, GOVERNANCE_TTL, MARKET_TTL};
