//! Feature storage behind the coverage registry.
//!
//! Storage and coverage tracking together form one unit of consistency; the
//! coordinator mutates both only under its exclusive lock. Storage engines
//! are pluggable behind [`FeatureStorage`]; the crate ships the in-memory
//! [`MemoryStorage`].

mod memory;
pub use memory::*;

use anyhow::Result;
use covercache_core::{Envelope, Feature, FeatureSet};
use std::fmt::{self, Debug, Display};

/// Raised by a storage engine when an insertion would exceed its configured
/// capacity. The coordinator reacts by rolling back the coverage
/// registration that accompanied the insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OversizedInsertion {
	/// Number of features the storage would have held after the insert.
	pub attempted: usize,
	/// The configured capacity bound.
	pub capacity: usize,
}

impl Display for OversizedInsertion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"insertion of {} features exceeds the storage capacity of {}",
			self.attempted, self.capacity
		)
	}
}

impl std::error::Error for OversizedInsertion {}

/// A store of features, queryable by envelope.
///
/// `insert` must be atomic: either all features are stored or, on an
/// oversize rejection, none are.
pub trait FeatureStorage: Debug + Send + Sync {
	/// Inserts features, replacing existing features with the same id.
	///
	/// # Errors
	///
	/// Returns [`OversizedInsertion`] (without mutating) when the resulting
	/// size would exceed the configured capacity.
	fn insert(&mut self, features: Vec<Feature>) -> Result<()>;

	/// Returns all stored features whose envelope touches `envelope`.
	fn query(&self, envelope: &Envelope) -> FeatureSet;

	/// Removes all stored features whose envelope touches `envelope`,
	/// returning how many were removed.
	fn evict(&mut self, envelope: &Envelope) -> usize;

	/// Removes everything.
	fn clear(&mut self);

	/// Number of stored features.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
