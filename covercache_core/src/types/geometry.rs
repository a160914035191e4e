use super::Envelope;

/// The geometry of a feature.
///
/// The cache interrogates geometry only through [`envelope`](Geometry::envelope);
/// coordinates are otherwise passed through untouched. Polygons carry their
/// exterior ring only, which is all an envelope test needs.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
	Point([f64; 2]),
	MultiPoint(Vec<[f64; 2]>),
	LineString(Vec<[f64; 2]>),
	Polygon(Vec<[f64; 2]>),
}

impl Geometry {
	/// The minimal envelope containing all coordinates of this geometry.
	///
	/// A point produces a degenerate envelope; an empty coordinate list
	/// produces a degenerate envelope at the origin.
	#[must_use]
	pub fn envelope(&self) -> Envelope {
		let coords: &[[f64; 2]] = match self {
			Geometry::Point(c) => std::slice::from_ref(c),
			Geometry::MultiPoint(cs) | Geometry::LineString(cs) | Geometry::Polygon(cs) => cs,
		};

		let first = coords.first().copied().unwrap_or([0.0, 0.0]);
		let mut envelope = Envelope {
			x_min: first[0],
			y_min: first[1],
			x_max: first[0],
			y_max: first[1],
		};
		for c in coords {
			envelope.x_min = envelope.x_min.min(c[0]);
			envelope.y_min = envelope.y_min.min(c[1]);
			envelope.x_max = envelope.x_max.max(c[0]);
			envelope.y_max = envelope.y_max.max(c[1]);
		}
		envelope
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn point_envelope_is_degenerate() {
		let g = Geometry::Point([3.0, 4.0]);
		assert_eq!(g.envelope().as_tuple(), (3.0, 4.0, 3.0, 4.0));
	}

	#[test]
	fn line_string_envelope() {
		let g = Geometry::LineString(vec![[0.0, 5.0], [2.0, -1.0], [-3.0, 2.0]]);
		assert_eq!(g.envelope().as_tuple(), (-3.0, -1.0, 2.0, 5.0));
	}

	#[test]
	fn polygon_envelope() {
		let g = Geometry::Polygon(vec![[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0], [0.0, 0.0]]);
		assert_eq!(g.envelope().as_tuple(), (0.0, 0.0, 4.0, 3.0));
	}

	#[test]
	fn empty_coordinates_fall_back_to_origin() {
		let g = Geometry::MultiPoint(vec![]);
		assert_eq!(g.envelope().as_tuple(), (0.0, 0.0, 0.0, 0.0));
	}
}
