use super::{FeatureSource, SourceChange};
use anyhow::{Result, ensure};
use async_trait::async_trait;
use covercache_core::{Envelope, Feature, FeatureSchema, FeatureSet, Predicate};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// An in-memory [`FeatureSource`], used as the reference implementation and
/// as the test double for the cache: it counts fetches, can be switched into
/// a failing state, and publishes change events when its content is
/// modified.
pub struct MemorySource {
	schema: FeatureSchema,
	features: Mutex<FeatureSet>,
	fetch_count: AtomicUsize,
	failing: AtomicBool,
	changes: broadcast::Sender<SourceChange>,
}

impl MemorySource {
	#[must_use]
	pub fn new(schema: FeatureSchema) -> Self {
		let (changes, _) = broadcast::channel(64);
		Self {
			schema,
			features: Mutex::new(FeatureSet::new()),
			fetch_count: AtomicUsize::new(0),
			failing: AtomicBool::new(false),
			changes,
		}
	}

	#[must_use]
	pub fn with_features(schema: FeatureSchema, features: Vec<Feature>) -> Self {
		let source = Self::new(schema);
		source.features.lock().merge(FeatureSet::from(features));
		source
	}

	/// Number of `fetch` calls served so far (failed attempts included).
	#[must_use]
	pub fn fetch_count(&self) -> usize {
		self.fetch_count.load(Ordering::Relaxed)
	}

	/// Makes subsequent `fetch` calls fail until reset.
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::Relaxed);
	}

	/// Replaces or inserts features and publishes a change event covering
	/// their old and new bounds.
	pub fn apply_change(&self, features: Vec<Feature>) {
		let incoming = FeatureSet::from(features);
		let Some(mut bounds) = incoming.bounds() else {
			return;
		};
		{
			let mut stored = self.features.lock();
			// the event must cover the previous positions too
			for id in incoming.ids() {
				if let Some(old) = stored.get(id) {
					bounds = bounds.extended(&old.envelope());
				}
			}
			stored.merge(incoming);
		}
		self.publish_change(bounds);
	}

	/// Removes features within `bounds` and publishes a change event.
	pub fn remove_within(&self, bounds: &Envelope) {
		{
			let mut stored = self.features.lock();
			let keep: Vec<Feature> = stored
				.iter()
				.filter(|f| !f.envelope().touches(bounds))
				.cloned()
				.collect();
			*stored = FeatureSet::from(keep);
		}
		self.publish_change(*bounds);
	}

	fn publish_change(&self, bounds: Envelope) {
		// nobody listening is fine, the next reader pays the miss anyway
		let _ = self.changes.send(SourceChange { bounds });
	}
}

#[async_trait]
impl FeatureSource for MemorySource {
	async fn fetch(&self, predicate: &Predicate) -> Result<FeatureSet> {
		self.fetch_count.fetch_add(1, Ordering::Relaxed);
		ensure!(!self.failing.load(Ordering::Relaxed), "source is unavailable");
		Ok(self.features.lock().filter(predicate))
	}

	fn schema(&self) -> &FeatureSchema {
		&self.schema
	}

	fn changes(&self) -> broadcast::Receiver<SourceChange> {
		self.changes.subscribe()
	}
}

impl Debug for MemorySource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemorySource")
			.field("schema", &self.schema.name)
			.field("len", &self.features.lock().len())
			.field("fetch_count", &self.fetch_count.load(Ordering::Relaxed))
			.finish()
	}
}
