use super::CoverageTracker;
use covercache_core::Envelope;

/// The default coverage strategy: an exact list of registered envelopes.
///
/// `register` coalesces by containment — regions contained by a newcomer are
/// dropped, so repeated registration of growing envelopes does not accumulate
/// redundant entries. Overlapping-but-not-contained regions are kept
/// separately; [`uncovered`](CoverageTracker::uncovered) handles arbitrary
/// overlap by iterated rectangle subtraction.
#[derive(Clone, Debug, Default)]
pub struct ListTracker {
	regions: Vec<Envelope>,
}

impl ListTracker {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

impl CoverageTracker for ListTracker {
	fn uncovered(&self, query: &Envelope) -> Vec<Envelope> {
		let mut remainder = vec![*query];
		for region in &self.regions {
			remainder = remainder.iter().flat_map(|r| r.subtract(region)).collect();
			if remainder.is_empty() {
				break;
			}
		}
		remainder
	}

	fn register(&mut self, region: Envelope) {
		self.regions.retain(|r| !region.contains(r));
		self.regions.push(region);
	}

	fn unregister(&mut self, region: &Envelope) {
		let index = self
			.regions
			.iter()
			.position(|r| r == region)
			.unwrap_or_else(|| panic!("unregister of a region that was never registered: {region:?}"));
		self.regions.remove(index);
	}

	fn clear(&mut self) {
		self.regions.clear();
	}

	fn regions(&self) -> Vec<Envelope> {
		self.regions.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn env(x0: f64, y0: f64, x1: f64, y1: f64) -> Envelope {
		Envelope::new(x0, y0, x1, y1).unwrap()
	}

	#[test]
	fn empty_tracker_leaves_query_unchanged() {
		let tracker = ListTracker::new();
		let query = env(0.0, 0.0, 10.0, 10.0);
		assert_eq!(tracker.uncovered(&query), vec![query]);
	}

	#[test]
	fn identical_region_is_fully_covered() {
		let mut tracker = ListTracker::new();
		let region = env(0.0, 0.0, 10.0, 10.0);
		tracker.register(region);
		assert!(tracker.uncovered(&region).is_empty());
	}

	#[test]
	fn contained_query_is_fully_covered() {
		let mut tracker = ListTracker::new();
		tracker.register(env(0.0, 0.0, 10.0, 10.0));
		assert!(tracker.uncovered(&env(2.0, 2.0, 4.0, 4.0)).is_empty());
	}

	#[test]
	fn straddling_query_returns_l_shaped_remainder() {
		let mut tracker = ListTracker::new();
		tracker.register(env(0.0, 0.0, 10.0, 10.0));

		let remainder = tracker.uncovered(&env(5.0, 5.0, 15.0, 15.0));
		assert_eq!(remainder.len(), 2);
		assert_eq!(remainder[0].as_tuple(), (10.0, 5.0, 15.0, 15.0));
		assert_eq!(remainder[1].as_tuple(), (5.0, 10.0, 10.0, 15.0));
	}

	#[test]
	fn uncovered_union_is_exact_without_overlap() {
		let mut tracker = ListTracker::new();
		tracker.register(env(0.0, 0.0, 4.0, 10.0));
		tracker.register(env(6.0, 0.0, 10.0, 10.0));
		tracker.register(env(0.0, 0.0, 10.0, 2.0));

		let query = env(0.0, 0.0, 10.0, 10.0);
		let remainder = tracker.uncovered(&query);

		// exactly the middle gap above the bottom band
		let gap: f64 = remainder.iter().map(Envelope::area).sum();
		assert_eq!(gap, 2.0 * 8.0);
		for (i, piece) in remainder.iter().enumerate() {
			assert!(query.contains(piece));
			for registered in tracker.regions() {
				assert!(piece.intersected(&registered).is_none());
			}
			for other in remainder.iter().skip(i + 1) {
				assert!(!piece.intersects(other));
			}
		}
	}

	#[rstest]
	#[case(env(20.0, 20.0, 30.0, 30.0), 1)] // disjoint
	#[case(env(0.0, 0.0, 10.0, 10.0), 0)] // identical
	#[case(env(-5.0, -5.0, 15.0, 15.0), 4)] // query contains the region
	fn uncovered_piece_count(#[case] query: Envelope, #[case] expected: usize) {
		let mut tracker = ListTracker::new();
		tracker.register(env(0.0, 0.0, 10.0, 10.0));
		assert_eq!(tracker.uncovered(&query).len(), expected);
	}

	#[test]
	fn register_coalesces_contained_regions() {
		let mut tracker = ListTracker::new();
		tracker.register(env(2.0, 2.0, 4.0, 4.0));
		tracker.register(env(6.0, 6.0, 8.0, 8.0));
		tracker.register(env(0.0, 0.0, 10.0, 10.0));
		assert_eq!(tracker.regions(), vec![env(0.0, 0.0, 10.0, 10.0)]);
	}

	#[test]
	fn unregister_restores_coverage_state() {
		let mut tracker = ListTracker::new();
		let a = env(0.0, 0.0, 10.0, 10.0);
		let b = env(10.0, 0.0, 20.0, 10.0);
		tracker.register(a);

		let before = tracker.uncovered(&env(0.0, 0.0, 20.0, 10.0));
		tracker.register(b);
		assert!(tracker.uncovered(&env(0.0, 0.0, 20.0, 10.0)).is_empty());

		tracker.unregister(&b);
		assert_eq!(tracker.uncovered(&env(0.0, 0.0, 20.0, 10.0)), before);
	}

	#[test]
	#[should_panic(expected = "never registered")]
	fn unregister_of_unknown_region_panics() {
		let mut tracker = ListTracker::new();
		tracker.register(env(0.0, 0.0, 1.0, 1.0));
		tracker.unregister(&env(5.0, 5.0, 6.0, 6.0));
	}

	#[test]
	fn clear_drops_everything() {
		let mut tracker = ListTracker::new();
		tracker.register(env(0.0, 0.0, 1.0, 1.0));
		tracker.clear();
		assert!(tracker.regions().is_empty());
		let q = env(0.0, 0.0, 1.0, 1.0);
		assert_eq!(tracker.uncovered(&q), vec![q]);
	}
}
