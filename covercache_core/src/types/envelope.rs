use anyhow::{Result, ensure};
use covercache_derive::context;
use std::fmt::Debug;

/// An axis-aligned rectangle in the working coordinate space, defined by its
/// minimum and maximum x and y coordinates.
///
/// `Envelope` is the unit of spatial bookkeeping throughout the cache: queries
/// are envelopes, coverage is a set of envelopes, and fetch remainders are
/// envelopes. It is an immutable value type; every operation that "changes"
/// an envelope returns a new one.
///
/// Coordinates must be finite and ordered (`x_min <= x_max`,
/// `y_min <= y_max`). Degenerate envelopes (zero width or height) are valid
/// and describe points or segments.
///
/// # Examples
///
/// ```
/// use covercache_core::Envelope;
///
/// let a = Envelope::new(0.0, 0.0, 10.0, 10.0).unwrap();
/// let b = Envelope::new(5.0, 5.0, 15.0, 15.0).unwrap();
/// assert!(a.intersects(&b));
/// assert_eq!(a.intersected(&b).unwrap().as_tuple(), (5.0, 5.0, 10.0, 10.0));
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct Envelope {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
}

impl Envelope {
	/// Creates a new `Envelope` from four coordinates: `x_min, y_min, x_max, y_max`.
	///
	/// # Errors
	///
	/// Returns an error if any coordinate is not finite, or if the minimum
	/// exceeds the maximum on either axis.
	///
	/// # Examples
	/// ```
	/// use covercache_core::Envelope;
	///
	/// let e = Envelope::new(-10.0, -5.0, 10.0, 5.0).unwrap();
	/// assert_eq!(e.as_tuple(), (-10.0, -5.0, 10.0, 5.0));
	/// assert!(Envelope::new(10.0, 0.0, -10.0, 5.0).is_err());
	/// ```
	#[context("Failed to create Envelope ({x_min}, {y_min}, {x_max}, {y_max})")]
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Envelope> {
		ensure!(
			x_min.is_finite() && y_min.is_finite() && x_max.is_finite() && y_max.is_finite(),
			"all coordinates must be finite"
		);
		ensure!(x_min <= x_max, "x_min ({x_min}) must be <= x_max ({x_max})");
		ensure!(y_min <= y_max, "y_min ({y_min}) must be <= y_max ({y_max})");
		Ok(Envelope {
			x_min,
			y_min,
			x_max,
			y_max,
		})
	}

	/// Creates a degenerate `Envelope` covering a single point.
	pub fn from_point(x: f64, y: f64) -> Result<Envelope> {
		Envelope::new(x, y, x, y)
	}

	/// Width of the envelope along the x axis.
	#[must_use]
	#[inline]
	pub fn width(&self) -> f64 {
		self.x_max - self.x_min
	}

	/// Height of the envelope along the y axis.
	#[must_use]
	#[inline]
	pub fn height(&self) -> f64 {
		self.y_max - self.y_min
	}

	/// Area of the envelope. Zero for degenerate envelopes.
	#[must_use]
	pub fn area(&self) -> f64 {
		self.width() * self.height()
	}

	/// Checks whether the point `(x, y)` lies inside the envelope (borders
	/// included).
	#[must_use]
	pub fn contains_point(&self, x: f64, y: f64) -> bool {
		x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
	}

	/// Returns whether this envelope completely contains `other` (borders
	/// included).
	///
	/// # Examples
	/// ```
	/// use covercache_core::Envelope;
	///
	/// let outer = Envelope::new(0.0, 0.0, 10.0, 10.0).unwrap();
	/// let inner = Envelope::new(2.0, 2.0, 8.0, 8.0).unwrap();
	/// assert!(outer.contains(&inner));
	/// assert!(!inner.contains(&outer));
	/// ```
	#[must_use]
	pub fn contains(&self, other: &Envelope) -> bool {
		self.x_min <= other.x_min && self.x_max >= other.x_max && self.y_min <= other.y_min && self.y_max >= other.y_max
	}

	/// Checks whether the interiors of the two envelopes share any area.
	///
	/// Envelopes that merely touch along an edge or corner do **not**
	/// intersect: there is no area to cache or fetch between them.
	#[must_use]
	pub fn intersects(&self, other: &Envelope) -> bool {
		self.x_min < other.x_max && self.x_max > other.x_min && self.y_min < other.y_max && self.y_max > other.y_min
	}

	/// Checks whether the two envelopes touch or overlap, borders included.
	///
	/// Unlike [`intersects`](Self::intersects) this is true for degenerate
	/// envelopes lying on the border, which is the right test for "does this
	/// feature belong to this region".
	#[must_use]
	pub fn touches(&self, other: &Envelope) -> bool {
		self.x_min <= other.x_max && self.x_max >= other.x_min && self.y_min <= other.y_max && self.y_max >= other.y_min
	}

	/// Returns the overlapping area of the two envelopes, or `None` if their
	/// interiors are disjoint.
	#[must_use]
	pub fn intersected(&self, other: &Envelope) -> Option<Envelope> {
		if !self.intersects(other) {
			return None;
		}
		Some(Envelope {
			x_min: self.x_min.max(other.x_min),
			y_min: self.y_min.max(other.y_min),
			x_max: self.x_max.min(other.x_max),
			y_max: self.y_max.min(other.y_max),
		})
	}

	/// Returns the overlap of the two envelopes with borders included, or
	/// `None` if they do not touch.
	///
	/// Unlike [`intersected`](Self::intersected) this may return a degenerate
	/// envelope when the inputs merely share an edge or corner. Predicate
	/// splitting uses it so that conjoined spatial restrictions meeting on a
	/// border still select features lying exactly on that border.
	#[must_use]
	pub fn clipped(&self, other: &Envelope) -> Option<Envelope> {
		if !self.touches(other) {
			return None;
		}
		Some(Envelope {
			x_min: self.x_min.max(other.x_min),
			y_min: self.y_min.max(other.y_min),
			x_max: self.x_max.min(other.x_max),
			y_max: self.y_max.min(other.y_max),
		})
	}

	/// Returns the smallest envelope containing both `self` and `other`.
	///
	/// # Examples
	/// ```
	/// use covercache_core::Envelope;
	///
	/// let a = Envelope::new(0.0, 0.0, 1.0, 1.0).unwrap();
	/// let b = Envelope::new(4.0, 2.0, 5.0, 3.0).unwrap();
	/// assert_eq!(a.extended(&b).as_tuple(), (0.0, 0.0, 5.0, 3.0));
	/// ```
	#[must_use]
	pub fn extended(&self, other: &Envelope) -> Envelope {
		Envelope {
			x_min: self.x_min.min(other.x_min),
			y_min: self.y_min.min(other.y_min),
			x_max: self.x_max.max(other.x_max),
			y_max: self.y_max.max(other.y_max),
		}
	}

	/// Subtracts `other` from `self`, returning the remainder as a list of
	/// disjoint rectangles.
	///
	/// The decomposition is a guillotine cut: the left and right slabs span
	/// the full height of `self`, the bottom and top slabs are clamped to the
	/// overlap's x-range. Properties:
	///
	/// * the produced rectangles do not overlap each other,
	/// * their union is exactly `self` minus `other`,
	/// * at most four rectangles are produced.
	///
	/// If the interiors are disjoint, the result is `[self]` unchanged; if
	/// `other` contains `self`, the result is empty.
	///
	/// # Examples
	/// ```
	/// use covercache_core::Envelope;
	///
	/// let query = Envelope::new(5.0, 5.0, 15.0, 15.0).unwrap();
	/// let covered = Envelope::new(0.0, 0.0, 10.0, 10.0).unwrap();
	/// let rest = query.subtract(&covered);
	/// // L-shaped remainder: right slab plus top-left slab
	/// assert_eq!(rest.len(), 2);
	/// assert_eq!(rest[0].as_tuple(), (10.0, 5.0, 15.0, 15.0));
	/// assert_eq!(rest[1].as_tuple(), (5.0, 10.0, 10.0, 15.0));
	/// ```
	#[must_use]
	pub fn subtract(&self, other: &Envelope) -> Vec<Envelope> {
		let clip = match self.intersected(other) {
			Some(clip) => clip,
			None => return vec![*self],
		};

		let mut remainder = Vec::new();
		if self.x_min < clip.x_min {
			remainder.push(Envelope {
				x_min: self.x_min,
				y_min: self.y_min,
				x_max: clip.x_min,
				y_max: self.y_max,
			});
		}
		if clip.x_max < self.x_max {
			remainder.push(Envelope {
				x_min: clip.x_max,
				y_min: self.y_min,
				x_max: self.x_max,
				y_max: self.y_max,
			});
		}
		if self.y_min < clip.y_min {
			remainder.push(Envelope {
				x_min: clip.x_min,
				y_min: self.y_min,
				x_max: clip.x_max,
				y_max: clip.y_min,
			});
		}
		if clip.y_max < self.y_max {
			remainder.push(Envelope {
				x_min: clip.x_min,
				y_min: clip.y_max,
				x_max: clip.x_max,
				y_max: self.y_max,
			});
		}
		remainder
	}

	/// Returns the envelope as an array `[x_min, y_min, x_max, y_max]`.
	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// Returns the envelope as a tuple `(x_min, y_min, x_max, y_max)`.
	#[must_use]
	pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
		(self.x_min, self.y_min, self.x_max, self.y_max)
	}
}

impl Debug for Envelope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Envelope({}, {}, {}, {})",
			self.x_min, self.y_min, self.x_max, self.y_max
		)
	}
}

impl TryFrom<[f64; 4]> for Envelope {
	type Error = anyhow::Error;

	fn try_from(input: [f64; 4]) -> Result<Self> {
		Envelope::new(input[0], input[1], input[2], input[3])
	}
}

impl TryFrom<Vec<f64>> for Envelope {
	type Error = anyhow::Error;

	#[context("Failed to convert {input:?} to Envelope")]
	fn try_from(input: Vec<f64>) -> Result<Self> {
		ensure!(
			input.len() == 4,
			"Envelope must have 4 elements (x_min, y_min, x_max, y_max)"
		);
		Envelope::new(input[0], input[1], input[2], input[3])
	}
}
