use super::Predicate;
use crate::types::{Envelope, GeoValue};
use anyhow::Result;
use std::fmt::{self, Display};

/// The spatial part of a split predicate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpatialSplit {
	/// The predicate can be proven to match nothing; short-circuit to an
	/// empty result.
	Exclude,
	/// No useful single-envelope restriction can be isolated; the whole
	/// query must be delegated to the backing source, bypassing the cache.
	Include,
	/// Exactly one envelope restriction.
	Envelope(Envelope),
}

/// Raised when a predicate cannot be classified at all (malformed input).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedPredicate {
	pub reason: String,
}

impl Display for UnsupportedPredicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unsupported predicate: {}", self.reason)
	}
}

impl std::error::Error for UnsupportedPredicate {}

impl UnsupportedPredicate {
	fn err(reason: impl Into<String>) -> anyhow::Error {
		anyhow::Error::new(UnsupportedPredicate { reason: reason.into() })
	}
}

/// Decomposes `predicate` into an indexable spatial restriction and the
/// residual logic that must be evaluated against materialized features.
///
/// The spatial part is:
/// * [`SpatialSplit::Exclude`] when the predicate matches nothing,
/// * [`SpatialSplit::Envelope`] when exactly one envelope restriction can be
///   isolated — conjunctions intersect their envelope bounds, a disjunction
///   whose clauses all restrict to the *same* envelope lifts it out,
/// * [`SpatialSplit::Include`] otherwise (no restriction isolatable).
///
/// The residual may be [`Predicate::Include`], meaning the envelope
/// restriction alone is exhaustive.
///
/// # Errors
///
/// Returns [`UnsupportedPredicate`] for malformed input: a comparison with an
/// empty property name or a NaN bound.
pub fn split(predicate: &Predicate) -> Result<(SpatialSplit, Predicate)> {
	validate(predicate)?;
	Ok(extract(&simplify(predicate.clone())))
}

fn validate(predicate: &Predicate) -> Result<()> {
	match predicate {
		Predicate::Include | Predicate::Exclude | Predicate::Intersects(_) => Ok(()),
		Predicate::Compare { property, value, .. } => {
			if property.is_empty() {
				return Err(UnsupportedPredicate::err("comparison with empty property name"));
			}
			let is_nan = match value {
				GeoValue::Double(v) => v.is_nan(),
				GeoValue::Float(v) => v.is_nan(),
				_ => false,
			};
			if is_nan {
				return Err(UnsupportedPredicate::err(format!(
					"comparison on {property:?} with NaN bound"
				)));
			}
			Ok(())
		}
		Predicate::And(children) | Predicate::Or(children) => children.iter().try_for_each(validate),
		Predicate::Not(child) => validate(child),
	}
}

/// Constant folding: resolves `Include`/`Exclude` literals, flattens nested
/// connectives and unwraps single-child connectives and double negation.
fn simplify(predicate: Predicate) -> Predicate {
	match predicate {
		Predicate::And(children) => {
			let mut flat = Vec::new();
			for child in children {
				match simplify(child) {
					Predicate::Exclude => return Predicate::Exclude,
					Predicate::Include => {}
					Predicate::And(nested) => flat.extend(nested),
					other => flat.push(other),
				}
			}
			match flat.len() {
				0 => Predicate::Include,
				1 => flat.pop().unwrap(),
				_ => Predicate::And(flat),
			}
		}
		Predicate::Or(children) => {
			let mut flat = Vec::new();
			for child in children {
				match simplify(child) {
					Predicate::Include => return Predicate::Include,
					Predicate::Exclude => {}
					Predicate::Or(nested) => flat.extend(nested),
					other => flat.push(other),
				}
			}
			match flat.len() {
				0 => Predicate::Exclude,
				1 => flat.pop().unwrap(),
				_ => Predicate::Or(flat),
			}
		}
		Predicate::Not(child) => match simplify(*child) {
			Predicate::Include => Predicate::Exclude,
			Predicate::Exclude => Predicate::Include,
			Predicate::Not(inner) => *inner,
			other => Predicate::not(other),
		},
		leaf => leaf,
	}
}

fn extract(predicate: &Predicate) -> (SpatialSplit, Predicate) {
	match predicate {
		Predicate::Include => (SpatialSplit::Include, Predicate::Include),
		Predicate::Exclude => (SpatialSplit::Exclude, Predicate::Include),
		Predicate::Intersects(envelope) => (SpatialSplit::Envelope(*envelope), Predicate::Include),
		Predicate::Compare { .. } | Predicate::Not(_) => (SpatialSplit::Include, predicate.clone()),
		Predicate::And(children) => {
			let mut bound: Option<Envelope> = None;
			let mut residuals = Vec::new();
			for child in children {
				let (spatial, residual) = extract(child);
				match spatial {
					SpatialSplit::Exclude => return (SpatialSplit::Exclude, Predicate::Include),
					SpatialSplit::Include => residuals.push(residual),
					SpatialSplit::Envelope(envelope) => {
						bound = Some(match bound {
							None => envelope,
							Some(acc) => match acc.clipped(&envelope) {
								Some(clip) => clip,
								// conjoined restrictions with no common area
								None => return (SpatialSplit::Exclude, Predicate::Include),
							},
						});
						if residual != Predicate::Include {
							residuals.push(residual);
						}
					}
				}
			}
			let residual = simplify(Predicate::And(residuals));
			match bound {
				Some(envelope) => (SpatialSplit::Envelope(envelope), residual),
				None => (SpatialSplit::Include, residual),
			}
		}
		Predicate::Or(children) => {
			let mut clauses: Vec<(Envelope, Predicate)> = Vec::new();
			for child in children {
				let (spatial, residual) = extract(child);
				match spatial {
					// a clause matching nothing contributes nothing
					SpatialSplit::Exclude => {}
					SpatialSplit::Include => return (SpatialSplit::Include, predicate.clone()),
					SpatialSplit::Envelope(envelope) => clauses.push((envelope, residual)),
				}
			}
			let Some((first, _)) = clauses.first() else {
				return (SpatialSplit::Exclude, Predicate::Include);
			};
			if clauses.iter().all(|(e, _)| e == first) {
				let envelope = *first;
				let residual = simplify(Predicate::Or(clauses.into_iter().map(|(_, r)| r).collect()));
				(SpatialSplit::Envelope(envelope), residual)
			} else {
				// disjunction of differing spatial clauses: not isolatable
				(SpatialSplit::Include, predicate.clone())
			}
		}
	}
}
