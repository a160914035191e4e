//! A spatial region cache for geographic feature data.
//!
//! `covercache` sits in front of a geometry-indexed feature source and serves
//! rectangular ("envelope") region queries without always reaching the
//! source. It tracks which sub-regions of space are already materialized
//! locally, computes the minimal uncached remainder of a query region,
//! fetches only that remainder, and merges it with cached data — all under
//! concurrent access, with a hard invariant between registered coverage and
//! actually stored features.
//!
//! The main entry point is [`FeatureCache`]; coverage bookkeeping and feature
//! storage are strategy traits ([`CoverageTracker`], [`FeatureStorage`])
//! selected at construction, and the backing source is any
//! [`FeatureSource`] implementation.
//!
//! ```no_run
//! use covercache::{FeatureCache, MemorySource};
//! use covercache_core::{CacheConfig, Envelope};
//! use std::sync::Arc;
//!
//! # async fn example(source: Arc<MemorySource>) -> anyhow::Result<()> {
//! let cache = FeatureCache::new(source, CacheConfig::default())?;
//! let features = cache.get(&Envelope::new(0.0, 0.0, 10.0, 10.0)?).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod source;
pub mod storage;
pub mod tracker;

pub use cache::*;
pub use source::*;
pub use storage::*;
pub use tracker::*;
