use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing cache counters.
///
/// Counters are bumped inside the coordinator's critical sections and read
/// lock-free; approximate values are sufficient for observability.
#[derive(Debug, Default)]
pub struct CacheStats {
	source_fetches: AtomicU64,
	features_fetched: AtomicU64,
	hits: AtomicU64,
	misses: AtomicU64,
}

impl CacheStats {
	pub(crate) fn record_fetch(&self, features: u64) {
		self.source_fetches.fetch_add(1, Ordering::Relaxed);
		self.features_fetched.fetch_add(features, Ordering::Relaxed);
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_miss(&self) {
		self.misses.fetch_add(1, Ordering::Relaxed);
	}

	#[must_use]
	pub fn snapshot(&self) -> StatsSnapshot {
		StatsSnapshot {
			source_fetches: self.source_fetches.load(Ordering::Relaxed),
			features_fetched: self.features_fetched.load(Ordering::Relaxed),
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
		}
	}
}

/// A point-in-time copy of the cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
	/// Number of fetch calls issued to the backing source.
	pub source_fetches: u64,
	/// Total number of features those fetches returned.
	pub features_fetched: u64,
	/// Envelope queries answered entirely from storage.
	pub hits: u64,
	/// Envelope queries that needed a source fetch.
	pub misses: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counters_accumulate() {
		let stats = CacheStats::default();
		stats.record_hit();
		stats.record_miss();
		stats.record_fetch(5);
		stats.record_fetch(0);

		assert_eq!(
			stats.snapshot(),
			StatsSnapshot {
				source_fetches: 2,
				features_fetched: 5,
				hits: 1,
				misses: 1,
			}
		);
	}
}
