//! The backing data source boundary.
//!
//! A [`FeatureSource`] is whatever sits behind the cache: a remote feature
//! service, a database, another cache. The cache requires only three things
//! from it: predicate fetches (envelope-intersects and OR-combinations
//! thereof at minimum), a schema to validate the geometry attribute against,
//! and a broadcast channel of change events.

mod memory;
pub use memory::*;

use anyhow::Result;
use async_trait::async_trait;
use covercache_core::{Envelope, FeatureSchema, FeatureSet, Predicate};
use std::fmt::Debug;
use tokio::sync::broadcast;

/// A change event of the backing source: all features within `bounds` may
/// have been added, modified or removed.
#[derive(Clone, Copy, Debug)]
pub struct SourceChange {
	pub bounds: Envelope,
}

/// The geometry-indexed data source the cache sits in front of.
#[async_trait]
pub trait FeatureSource: Debug + Send + Sync {
	/// Fetches all features matching `predicate`.
	///
	/// # Errors
	///
	/// Any error is treated as source unavailability; the cache falls back
	/// to cached data where it can.
	async fn fetch(&self, predicate: &Predicate) -> Result<FeatureSet>;

	/// The schema of the features this source serves.
	fn schema(&self) -> &FeatureSchema;

	/// Subscribes to change events. The cache subscribes once at
	/// construction and reacts by invalidating the affected region.
	fn changes(&self) -> broadcast::Receiver<SourceChange>;
}
