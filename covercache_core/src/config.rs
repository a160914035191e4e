/// Configuration for a feature cache instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
	/// Maximum number of features the cache storage may hold. Insertions
	/// that would exceed this bound are rejected as oversized.
	pub max_features: usize,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self { max_features: 100_000 }
	}
}

impl CacheConfig {
	#[must_use]
	pub fn with_max_features(max_features: usize) -> Self {
		Self { max_features }
	}
}
