//! The cache access coordinator.
//!
//! [`FeatureCache`] orchestrates one logical "get by envelope" request:
//! check coverage under the shared lock, upgrade to the exclusive lock with a
//! mandatory re-check, fetch exactly the uncovered remainder from the
//! backing source, merge with cached data, and materialize the new coverage —
//! rolling the registration back if storage rejects the insert as oversized.
//!
//! The pair (coverage tracker, feature storage) is one unit of consistency
//! behind a single readers-writer lock. The remainder fetch happens while
//! holding the exclusive lock, so concurrent cache access is serialized
//! behind a slow source; that trade-off buys the guarantee that no two tasks
//! ever race to materialize overlapping regions.

mod stats;
pub use stats::*;

use crate::{
	CoverageTracker, FeatureSource, FeatureStorage, ListTracker, MemoryStorage, OversizedInsertion, SourceChange,
};
use anyhow::{Context, Result};
use covercache_core::{CacheConfig, Envelope, Feature, FeatureSet, Predicate, SpatialSplit, split};
use itertools::Itertools;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::{Arc, Weak};
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

/// A caching layer in front of a [`FeatureSource`].
///
/// Envelope queries ([`get`](FeatureCache::get)) are answered from local
/// storage whenever the requested region is fully covered; otherwise only the
/// uncovered remainder is fetched from the source. Coverage bookkeeping and
/// storage are strategy traits chosen at construction; [`new`](FeatureCache::new)
/// wires up the defaults ([`ListTracker`] + [`MemoryStorage`]).
///
/// The cache subscribes to the source's change events once at construction
/// and reacts by invalidating the affected region — the next reader pays the
/// cache-miss cost. Construction therefore requires a running tokio runtime.
pub struct FeatureCache {
	inner: Arc<CacheInner>,
	listener: Mutex<Option<JoinHandle<()>>>,
}

struct CacheInner {
	state: RwLock<CacheState>,
	stats: CacheStats,
	source: Arc<dyn FeatureSource>,
	config: CacheConfig,
}

/// Tracker and storage form one unit of consistency: every mutation of
/// either happens under the exclusive lock on this pair.
struct CacheState {
	tracker: Box<dyn CoverageTracker>,
	storage: Box<dyn FeatureStorage>,
}

impl FeatureCache {
	/// Creates a cache over `source` with the default strategies: a
	/// [`ListTracker`] and a [`MemoryStorage`] bounded by
	/// `config.max_features`.
	pub fn new(source: Arc<dyn FeatureSource>, config: CacheConfig) -> Result<FeatureCache> {
		let storage = Box::new(MemoryStorage::new(config.max_features));
		Self::with_strategies(source, Box::new(ListTracker::new()), storage, config)
	}

	/// Creates a cache with explicit coverage and storage strategies.
	///
	/// Validates the source schema's geometry attribute and subscribes to
	/// the source's change events.
	pub fn with_strategies(
		source: Arc<dyn FeatureSource>,
		tracker: Box<dyn CoverageTracker>,
		storage: Box<dyn FeatureStorage>,
		config: CacheConfig,
	) -> Result<FeatureCache> {
		source.schema().check().context("Cannot cache this feature source")?;

		let inner = Arc::new(CacheInner {
			state: RwLock::new(CacheState { tracker, storage }),
			stats: CacheStats::default(),
			source,
			config,
		});
		let listener = spawn_change_listener(&inner);

		Ok(FeatureCache {
			inner,
			listener: Mutex::new(Some(listener)),
		})
	}

	/// Returns all features intersecting `envelope`, fetching the uncovered
	/// remainder from the source if necessary.
	///
	/// If the source fails, whatever is cached for `envelope` is returned
	/// instead (best-effort availability); the error propagates only when
	/// nothing at all is cached for the region.
	pub async fn get(&self, envelope: &Envelope) -> Result<FeatureSet> {
		self.inner.get(envelope).await
	}

	/// Storage-only read: returns the cached features intersecting
	/// `envelope` without ever touching the source.
	pub async fn peek(&self, envelope: &Envelope) -> FeatureSet {
		self.inner.state.read().await.storage.query(envelope)
	}

	/// Seeds the cache with externally fetched features, registering
	/// `envelope` as covered.
	///
	/// The caller asserts that `features` are the complete source content
	/// for `envelope`. An oversized insertion is surfaced (there is no
	/// cached fallback to offer on this path) and leaves coverage unchanged.
	pub async fn put(&self, features: Vec<Feature>, envelope: Envelope) -> Result<()> {
		self.inner.put(FeatureSet::from(features), envelope).await
	}

	/// Like [`put`](FeatureCache::put), with the coverage envelope inferred
	/// as the union bounds of the features' geometries. An empty `features`
	/// is a no-op.
	pub async fn put_features(&self, features: Vec<Feature>) -> Result<()> {
		let set = FeatureSet::from(features);
		match set.bounds() {
			Some(envelope) => self.inner.put(set, envelope).await,
			None => Ok(()),
		}
	}

	/// Invalidates `envelope`: evicts stored features and drops the coverage
	/// guarantee of every region intersecting it. No re-fetch happens; the
	/// next reader pays the miss.
	pub async fn remove(&self, envelope: &Envelope) {
		self.inner.remove(envelope).await;
	}

	/// Empties storage and coverage registry atomically.
	pub async fn clear(&self) {
		self.inner.clear().await;
	}

	/// Runs an arbitrary predicate query through the cache.
	///
	/// The predicate is split into a spatial restriction and a residual:
	/// a provably empty predicate short-circuits, a single-envelope
	/// restriction goes through [`get`](FeatureCache::get) with the residual
	/// applied afterwards, and a predicate with no isolatable envelope is
	/// delegated to the source as-is, bypassing the cache.
	pub async fn get_features(&self, predicate: &Predicate) -> Result<FeatureSet> {
		let (spatial, residual) = split(predicate)?;
		match spatial {
			SpatialSplit::Exclude => Ok(FeatureSet::new()),
			SpatialSplit::Include => {
				log::debug!("no envelope restriction in {predicate:?}, delegating to the source");
				let fetched = self.inner.source.fetch(predicate).await?;
				self.inner.stats.record_fetch(fetched.len() as u64);
				Ok(fetched)
			}
			SpatialSplit::Envelope(envelope) => {
				let features = self.inner.get(&envelope).await?;
				Ok(match residual {
					Predicate::Include => features,
					residual => features.filter(&residual),
				})
			}
		}
	}

	/// A point-in-time copy of the cache counters.
	#[must_use]
	pub fn stats(&self) -> StatsSnapshot {
		self.inner.stats.snapshot()
	}

	#[must_use]
	pub fn config(&self) -> &CacheConfig {
		&self.inner.config
	}

	/// Unsubscribes from change notifications and empties the cache. The
	/// cache keeps working afterwards but no longer reacts to source
	/// changes.
	pub async fn dispose(&self) {
		if let Some(handle) = self.listener.lock().take() {
			handle.abort();
		}
		self.inner.clear().await;
	}
}

impl Drop for FeatureCache {
	fn drop(&mut self) {
		if let Some(handle) = self.listener.lock().take() {
			handle.abort();
		}
	}
}

impl Debug for FeatureCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FeatureCache")
			.field("config", &self.inner.config)
			.field("stats", &self.inner.stats.snapshot())
			.finish()
	}
}

impl CacheInner {
	async fn get(&self, query: &Envelope) -> Result<FeatureSet> {
		// fast path: fully covered, shared lock suffices
		{
			let state = self.state.read().await;
			if state.tracker.uncovered(query).is_empty() {
				self.stats.record_hit();
				return Ok(state.storage.query(query));
			}
		}

		// The read-to-write upgrade is two separate acquisitions, so the
		// re-check below is required, not an optimization: another writer
		// may have materialized this region in between.
		let mut state = self.state.write().await;
		let remainder = state.tracker.uncovered(query);
		if remainder.is_empty() {
			self.stats.record_hit();
			return Ok(state.storage.query(query));
		}
		self.stats.record_miss();

		let cached = state.storage.query(query);
		let fetched = match self.source.fetch(&remainder_predicate(&remainder)).await {
			Ok(fetched) => fetched,
			Err(err) => {
				if cached.is_empty() {
					return Err(err)
						.with_context(|| format!("source fetch for {query:?} failed with nothing cached to fall back on"));
				}
				log::warn!(
					"source fetch for {query:?} failed, serving {} cached features: {err:#}",
					cached.len()
				);
				return Ok(cached);
			}
		};
		self.stats.record_fetch(fetched.len() as u64);
		log::debug!(
			"fetched {} features for uncovered [{}] of {query:?}",
			fetched.len(),
			remainder.iter().map(|e| format!("{e:?}")).join(", ")
		);

		let mut merged = cached;
		merged.merge(fetched.clone());

		if let Err(err) = materialize(&mut state, &remainder, fetched) {
			if err.downcast_ref::<OversizedInsertion>().is_none() {
				return Err(err);
			}
			// the fetched data is still returned; it just is not persisted
			log::warn!("fetched data for {query:?} not cached: {err}");
		}

		Ok(merged)
	}

	async fn put(&self, features: FeatureSet, envelope: Envelope) -> Result<()> {
		let mut state = self.state.write().await;
		let regions = state.tracker.uncovered(&envelope);
		materialize(&mut state, &regions, features).with_context(|| format!("Failed to seed the cache for {envelope:?}"))
	}

	async fn remove(&self, envelope: &Envelope) {
		let mut state = self.state.write().await;
		// a region intersecting the changed bounds can no longer guarantee
		// completeness (an affected feature may straddle the border), so the
		// whole region is dropped, not just the overlap
		let stale: Vec<Envelope> = state
			.tracker
			.regions()
			.into_iter()
			.filter(|region| region.touches(envelope))
			.collect();
		for region in &stale {
			state.tracker.unregister(region);
		}
		let evicted = state.storage.evict(envelope);
		if !stale.is_empty() || evicted > 0 {
			log::debug!(
				"invalidated {envelope:?}: dropped {} regions, evicted {evicted} features",
				stale.len()
			);
		}
	}

	async fn clear(&self) {
		let mut state = self.state.write().await;
		state.tracker.clear();
		state.storage.clear();
	}
}

/// Registers `regions` and stores `features` as one step. If storage rejects
/// the insert, the registration is rolled back before the error is returned,
/// leaving coverage exactly as it was — registry and storage never disagree.
fn materialize(state: &mut CacheState, regions: &[Envelope], features: FeatureSet) -> Result<()> {
	for region in regions {
		state.tracker.register(*region);
	}
	if let Err(err) = state.storage.insert(features.into_vec()) {
		for region in regions {
			state.tracker.unregister(region);
		}
		return Err(err);
	}
	Ok(())
}

/// The fetch predicate for the uncovered remainder: a single envelope
/// restriction, or an OR-combination when the remainder has several parts.
fn remainder_predicate(remainder: &[Envelope]) -> Predicate {
	if let [single] = remainder {
		Predicate::intersects(*single)
	} else {
		Predicate::or(remainder.iter().map(|e| Predicate::intersects(*e)).collect())
	}
}

fn spawn_change_listener(inner: &Arc<CacheInner>) -> JoinHandle<()> {
	let weak: Weak<CacheInner> = Arc::downgrade(inner);
	let mut receiver = inner.source.changes();
	tokio::spawn(async move {
		loop {
			let event = receiver.recv().await;
			let Some(inner) = weak.upgrade() else {
				break;
			};
			match event {
				Ok(SourceChange { bounds }) => {
					log::debug!("source changed within {bounds:?}, invalidating");
					inner.remove(&bounds).await;
				}
				Err(broadcast::error::RecvError::Lagged(missed)) => {
					// events were dropped, the set of stale regions is unknown
					log::warn!("change listener lagged by {missed} events, clearing the cache");
					inner.clear().await;
				}
				Err(broadcast::error::RecvError::Closed) => break,
			}
		}
	})
}
