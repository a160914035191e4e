//! The query predicate model.
//!
//! A [`Predicate`] is a tree distinguishing a *spatial restriction* (an
//! envelope-intersects test) from a *residual* (attribute comparisons and
//! boolean combinations). [`split`] decomposes a predicate into the one
//! envelope restriction the cache can index, plus the residual logic that is
//! evaluated in-memory against materialized features.

mod split;
pub use split::*;

use crate::types::{Envelope, Feature, GeoValue};
use std::cmp::Ordering;

/// Comparison operator of an attribute predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
}

impl CompareOp {
	fn evaluate(self, ordering: Ordering) -> bool {
		match self {
			CompareOp::Eq => ordering == Ordering::Equal,
			CompareOp::Ne => ordering != Ordering::Equal,
			CompareOp::Lt => ordering == Ordering::Less,
			CompareOp::Le => ordering != Ordering::Greater,
			CompareOp::Gt => ordering == Ordering::Greater,
			CompareOp::Ge => ordering != Ordering::Less,
		}
	}
}

/// A query predicate over features.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
	/// Matches every feature.
	Include,
	/// Matches no feature.
	Exclude,
	/// Matches features whose geometry envelope touches the given envelope.
	Intersects(Envelope),
	/// Compares a named attribute against a constant value. A missing or
	/// incomparable attribute never matches, for any operator.
	Compare {
		property: String,
		op: CompareOp,
		value: GeoValue,
	},
	And(Vec<Predicate>),
	Or(Vec<Predicate>),
	Not(Box<Predicate>),
}

impl Predicate {
	pub fn intersects(envelope: Envelope) -> Predicate {
		Predicate::Intersects(envelope)
	}

	pub fn compare(property: &str, op: CompareOp, value: GeoValue) -> Predicate {
		Predicate::Compare {
			property: property.to_string(),
			op,
			value,
		}
	}

	pub fn eq(property: &str, value: GeoValue) -> Predicate {
		Predicate::compare(property, CompareOp::Eq, value)
	}

	pub fn gt(property: &str, value: GeoValue) -> Predicate {
		Predicate::compare(property, CompareOp::Gt, value)
	}

	pub fn lt(property: &str, value: GeoValue) -> Predicate {
		Predicate::compare(property, CompareOp::Lt, value)
	}

	pub fn and(predicates: Vec<Predicate>) -> Predicate {
		Predicate::And(predicates)
	}

	pub fn or(predicates: Vec<Predicate>) -> Predicate {
		Predicate::Or(predicates)
	}

	#[allow(clippy::should_implement_trait)]
	pub fn not(predicate: Predicate) -> Predicate {
		Predicate::Not(Box::new(predicate))
	}

	/// Evaluates this predicate against a single feature, in memory.
	///
	/// The spatial test uses the feature's geometry envelope, borders
	/// included: a point lying exactly on the query border matches.
	#[must_use]
	pub fn matches(&self, feature: &Feature) -> bool {
		match self {
			Predicate::Include => true,
			Predicate::Exclude => false,
			Predicate::Intersects(envelope) => feature.envelope().touches(envelope),
			Predicate::Compare { property, op, value } => feature
				.properties
				.get(property)
				.and_then(|v| v.compare(value))
				.is_some_and(|ordering| op.evaluate(ordering)),
			Predicate::And(children) => children.iter().all(|p| p.matches(feature)),
			Predicate::Or(children) => children.iter().any(|p| p.matches(feature)),
			Predicate::Not(child) => !child.matches(feature),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Feature;
	use rstest::rstest;

	fn feature() -> Feature {
		let mut f = Feature::new_point(7, 3.0, 3.0);
		f.set_property("name".to_string(), "Weser");
		f.set_property("length".to_string(), 452);
		f
	}

	fn env(x0: f64, y0: f64, x1: f64, y1: f64) -> Envelope {
		Envelope::new(x0, y0, x1, y1).unwrap()
	}

	#[test]
	fn literals() {
		let f = feature();
		assert!(Predicate::Include.matches(&f));
		assert!(!Predicate::Exclude.matches(&f));
	}

	#[test]
	fn intersects_uses_feature_envelope() {
		let f = feature();
		assert!(Predicate::intersects(env(0.0, 0.0, 10.0, 10.0)).matches(&f));
		// exactly on the border still matches
		assert!(Predicate::intersects(env(3.0, 3.0, 10.0, 10.0)).matches(&f));
		assert!(!Predicate::intersects(env(4.0, 4.0, 10.0, 10.0)).matches(&f));
	}

	#[rstest]
	#[case(CompareOp::Eq, 452, true)]
	#[case(CompareOp::Ne, 452, false)]
	#[case(CompareOp::Ne, 500, true)]
	#[case(CompareOp::Lt, 500, true)]
	#[case(CompareOp::Le, 452, true)]
	#[case(CompareOp::Gt, 452, false)]
	#[case(CompareOp::Ge, 452, true)]
	fn comparisons(#[case] op: CompareOp, #[case] value: i32, #[case] expected: bool) {
		let p = Predicate::compare("length", op, GeoValue::from(value));
		assert_eq!(p.matches(&feature()), expected);
	}

	#[test]
	fn missing_property_never_matches() {
		let f = feature();
		for op in [
			CompareOp::Eq,
			CompareOp::Ne,
			CompareOp::Lt,
			CompareOp::Le,
			CompareOp::Gt,
			CompareOp::Ge,
		] {
			assert!(!Predicate::compare("width", op, GeoValue::from(1)).matches(&f));
		}
	}

	#[test]
	fn incomparable_types_never_match() {
		// "name" is a string, the bound is numeric
		let p = Predicate::eq("name", GeoValue::from(1));
		assert!(!p.matches(&feature()));
	}

	#[test]
	fn boolean_combinations() {
		let f = feature();
		let yes = Predicate::eq("name", GeoValue::from("Weser"));
		let no = Predicate::eq("name", GeoValue::from("Elbe"));

		assert!(Predicate::and(vec![yes.clone(), Predicate::Include]).matches(&f));
		assert!(!Predicate::and(vec![yes.clone(), no.clone()]).matches(&f));
		assert!(Predicate::or(vec![no.clone(), yes.clone()]).matches(&f));
		assert!(!Predicate::or(vec![no.clone(), Predicate::Exclude]).matches(&f));
		assert!(Predicate::not(no).matches(&f));
		assert!(!Predicate::not(yes).matches(&f));

		// empty connectives: neutral elements
		assert!(Predicate::and(vec![]).matches(&f));
		assert!(!Predicate::or(vec![]).matches(&f));
	}
}
