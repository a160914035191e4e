//! Region coverage tracking.
//!
//! A [`CoverageTracker`] maintains the set of envelopes whose features are
//! guaranteed to be fully present in cache storage, and answers the one
//! question the cache coordinator needs: *which part of this query is not
//! covered yet?*
//!
//! Tracking strategies are interchangeable behind the trait: the default
//! [`ListTracker`] keeps an exact list of registered envelopes, the
//! [`GridTracker`] quantizes coverage onto a fixed raster.

mod grid;
pub use grid::*;

mod list;
pub use list::*;

use covercache_core::Envelope;
use std::fmt::Debug;

/// Bookkeeping of which regions of space are fully materialized in storage.
///
/// The coordinator calls `register` and `unregister` only under its exclusive
/// lock, always in matching pairs: `unregister` is the exact inverse of a
/// prior `register` with the same argument, used to roll back a failed
/// materialization. Unregistering a region that was never registered is an
/// invariant violation and may panic.
pub trait CoverageTracker: Debug + Send + Sync {
	/// Returns the minimal list of sub-rectangles of `query` not already
	/// covered by any registered region.
	///
	/// Deterministic and side-effect-free. An empty result means `query` is
	/// fully covered; a query disjoint from all coverage returns `[query]`
	/// unchanged.
	fn uncovered(&self, query: &Envelope) -> Vec<Envelope>;

	/// Adds `region` to the coverage set.
	fn register(&mut self, region: Envelope);

	/// Removes the coverage guarantee for `region`.
	fn unregister(&mut self, region: &Envelope);

	/// Drops all coverage.
	fn clear(&mut self);

	/// The currently registered regions, in registration order.
	fn regions(&self) -> Vec<Envelope>;
}
