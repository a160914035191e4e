use super::{FeatureStorage, OversizedInsertion};
use anyhow::Result;
use covercache_core::{Envelope, Feature, FeatureSet};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// In-memory feature storage with a fixed capacity bound.
///
/// Features are kept in a map by id; spatial queries scan all entries, which
/// is adequate for the feature counts a capacity-bounded cache holds. An
/// insertion that would exceed the capacity is rejected as a whole, leaving
/// the store untouched — the cache never evicts on its own, the coordinator
/// decides what leaves the cache and when.
pub struct MemoryStorage {
	features: BTreeMap<u64, Feature>,
	max_features: usize,
}

impl MemoryStorage {
	#[must_use]
	pub fn new(max_features: usize) -> Self {
		Self {
			features: BTreeMap::new(),
			max_features,
		}
	}
}

impl FeatureStorage for MemoryStorage {
	fn insert(&mut self, features: Vec<Feature>) -> Result<()> {
		let added = features.iter().filter(|f| !self.features.contains_key(&f.id)).count();
		let attempted = self.features.len() + added;
		if attempted > self.max_features {
			return Err(OversizedInsertion {
				attempted,
				capacity: self.max_features,
			}
			.into());
		}
		for feature in features {
			self.features.insert(feature.id, feature);
		}
		Ok(())
	}

	fn query(&self, envelope: &Envelope) -> FeatureSet {
		FeatureSet::from(
			self
				.features
				.values()
				.filter(|f| f.envelope().touches(envelope))
				.cloned()
				.collect::<Vec<_>>(),
		)
	}

	fn evict(&mut self, envelope: &Envelope) -> usize {
		let before = self.features.len();
		self.features.retain(|_, f| !f.envelope().touches(envelope));
		before - self.features.len()
	}

	fn clear(&mut self) {
		self.features.clear();
	}

	fn len(&self) -> usize {
		self.features.len()
	}
}

impl Debug for MemoryStorage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryStorage")
			.field("len", &self.features.len())
			.field("max_features", &self.max_features)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn env(x0: f64, y0: f64, x1: f64, y1: f64) -> Envelope {
		Envelope::new(x0, y0, x1, y1).unwrap()
	}

	#[test]
	fn insert_and_query_by_envelope() {
		let mut storage = MemoryStorage::new(10);
		storage
			.insert(vec![
				Feature::new_point(1, 1.0, 1.0),
				Feature::new_point(2, 5.0, 5.0),
				Feature::new_point(3, 9.0, 9.0),
			])
			.unwrap();

		assert_eq!(storage.len(), 3);
		assert_eq!(storage.query(&env(0.0, 0.0, 6.0, 6.0)).ids(), [1, 2]);
		// point exactly on the query border matches
		assert_eq!(storage.query(&env(9.0, 9.0, 10.0, 10.0)).ids(), [3]);
	}

	#[test]
	fn insert_replaces_by_id_without_counting_twice() {
		let mut storage = MemoryStorage::new(2);
		storage
			.insert(vec![Feature::new_point(1, 0.0, 0.0), Feature::new_point(2, 1.0, 1.0)])
			.unwrap();
		// replacing both features does not exceed the capacity
		storage
			.insert(vec![Feature::new_point(1, 2.0, 2.0), Feature::new_point(2, 3.0, 3.0)])
			.unwrap();
		assert_eq!(storage.len(), 2);
		assert_eq!(storage.query(&env(2.0, 2.0, 3.0, 3.0)).ids(), [1, 2]);
	}

	#[test]
	fn oversized_insert_is_rejected_without_mutation() {
		let mut storage = MemoryStorage::new(2);
		storage.insert(vec![Feature::new_point(1, 0.0, 0.0)]).unwrap();

		let err = storage
			.insert(vec![Feature::new_point(2, 1.0, 1.0), Feature::new_point(3, 2.0, 2.0)])
			.unwrap_err();
		let oversize = err.downcast_ref::<OversizedInsertion>().unwrap();
		assert_eq!(oversize.attempted, 3);
		assert_eq!(oversize.capacity, 2);

		// nothing was stored
		assert_eq!(storage.len(), 1);
		assert!(storage.query(&env(1.0, 1.0, 2.0, 2.0)).is_empty());
	}

	#[test]
	fn evict_removes_touching_features() {
		let mut storage = MemoryStorage::new(10);
		storage
			.insert(vec![
				Feature::new_point(1, 1.0, 1.0),
				Feature::new_point(2, 5.0, 5.0),
				Feature::new_point(3, 9.0, 9.0),
			])
			.unwrap();

		assert_eq!(storage.evict(&env(0.0, 0.0, 5.0, 5.0)), 2);
		assert_eq!(storage.len(), 1);
		assert_eq!(storage.query(&env(0.0, 0.0, 10.0, 10.0)).ids(), [3]);
	}

	#[test]
	fn clear_empties_the_store() {
		let mut storage = MemoryStorage::new(10);
		storage.insert(vec![Feature::new_point(1, 0.0, 0.0)]).unwrap();
		storage.clear();
		assert!(storage.is_empty());
	}
}
