use super::{Envelope, Feature};
use crate::predicate::Predicate;
use std::{
	collections::{BTreeMap, btree_map},
	fmt::Debug,
};

/// An order-irrelevant collection of features, keyed by id.
///
/// Supports id-based union ([`merge`](FeatureSet::merge)), sub-selection by
/// predicate ([`filter`](FeatureSet::filter)) and bounding-envelope
/// computation. Iteration order is by id, which keeps tests deterministic.
#[derive(Clone, Default, PartialEq)]
pub struct FeatureSet {
	features: BTreeMap<u64, Feature>,
}

impl FeatureSet {
	pub fn new() -> FeatureSet {
		FeatureSet {
			features: BTreeMap::new(),
		}
	}

	/// Inserts a feature, replacing any existing feature with the same id.
	pub fn insert(&mut self, feature: Feature) {
		self.features.insert(feature.id, feature);
	}

	/// Unions `other` into `self`. On id conflicts the feature from `other`
	/// wins — the caller passes the fresher data second.
	pub fn merge(&mut self, other: FeatureSet) {
		for (id, feature) in other.features {
			self.features.insert(id, feature);
		}
	}

	/// Returns the subset of features matching `predicate`.
	#[must_use]
	pub fn filter(&self, predicate: &Predicate) -> FeatureSet {
		FeatureSet {
			features: self
				.features
				.iter()
				.filter(|(_, f)| predicate.matches(f))
				.map(|(id, f)| (*id, f.clone()))
				.collect(),
		}
	}

	/// The union bounds of all feature envelopes, or `None` for an empty set.
	#[must_use]
	pub fn bounds(&self) -> Option<Envelope> {
		self
			.features
			.values()
			.map(|f| f.envelope())
			.reduce(|acc, e| acc.extended(&e))
	}

	#[must_use]
	pub fn get(&self, id: u64) -> Option<&Feature> {
		self.features.get(&id)
	}

	#[must_use]
	pub fn contains_id(&self, id: u64) -> bool {
		self.features.contains_key(&id)
	}

	pub fn iter(&self) -> btree_map::Values<'_, u64, Feature> {
		self.features.values()
	}

	#[must_use]
	pub fn ids(&self) -> Vec<u64> {
		self.features.keys().copied().collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.features.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.features.is_empty()
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<Feature> {
		self.features.into_values().collect()
	}
}

impl From<Vec<Feature>> for FeatureSet {
	fn from(features: Vec<Feature>) -> Self {
		FeatureSet {
			features: features.into_iter().map(|f| (f.id, f)).collect(),
		}
	}
}

impl IntoIterator for FeatureSet {
	type Item = Feature;
	type IntoIter = btree_map::IntoValues<u64, Feature>;
	fn into_iter(self) -> Self::IntoIter {
		self.features.into_values()
	}
}

impl Debug for FeatureSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FeatureSet")
			.field("len", &self.features.len())
			.field("ids", &self.ids())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::GeoValue;

	#[test]
	fn insert_replaces_by_id() {
		let mut set = FeatureSet::new();
		set.insert(Feature::new_point(1, 0.0, 0.0));
		set.insert(Feature::new_point(1, 5.0, 5.0));
		assert_eq!(set.len(), 1);
		assert_eq!(set.get(1).unwrap().envelope().as_tuple(), (5.0, 5.0, 5.0, 5.0));
	}

	#[test]
	fn merge_later_wins() {
		let mut a = FeatureSet::from(vec![
			Feature::new_point(1, 0.0, 0.0),
			Feature::new_point(2, 1.0, 1.0),
		]);
		let b = FeatureSet::from(vec![
			Feature::new_point(2, 9.0, 9.0),
			Feature::new_point(3, 2.0, 2.0),
		]);
		a.merge(b);
		assert_eq!(a.ids(), [1, 2, 3]);
		assert_eq!(a.get(2).unwrap().envelope().as_tuple(), (9.0, 9.0, 9.0, 9.0));
	}

	#[test]
	fn filter_by_predicate() {
		let mut big = Feature::new_point(1, 0.0, 0.0);
		big.set_property("size".to_string(), 10);
		let mut small = Feature::new_point(2, 1.0, 1.0);
		small.set_property("size".to_string(), 2);

		let set = FeatureSet::from(vec![big, small]);
		let filtered = set.filter(&Predicate::gt("size", GeoValue::from(5)));
		assert_eq!(filtered.ids(), [1]);
	}

	#[test]
	fn bounds_of_empty_and_filled() {
		assert_eq!(FeatureSet::new().bounds(), None);

		let set = FeatureSet::from(vec![
			Feature::new_point(1, 0.0, 0.0),
			Feature::new_point(2, 4.0, -2.0),
		]);
		assert_eq!(set.bounds().unwrap().as_tuple(), (0.0, -2.0, 4.0, 0.0));
	}
}
