use super::{Envelope, GeoProperties, GeoValue, Geometry};

/// A single feature: a unique identifier, a geometry and a set of named
/// attribute values.
///
/// The cache treats a feature's geometry only to test envelope membership;
/// all other attributes are passed through untouched. Identity for set
/// operations is the `id`.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
	pub id: u64,
	pub geometry: Geometry,
	pub properties: GeoProperties,
}

impl Feature {
	pub fn new(id: u64, geometry: Geometry) -> Self {
		Self {
			id,
			geometry,
			properties: GeoProperties::new(),
		}
	}

	pub fn set_properties(&mut self, properties: GeoProperties) {
		self.properties = properties;
	}

	pub fn set_property<T>(&mut self, key: String, value: T)
	where
		GeoValue: From<T>,
	{
		self.properties.insert(key, GeoValue::from(value));
	}

	/// The bounding envelope of this feature's geometry.
	#[must_use]
	pub fn envelope(&self) -> Envelope {
		self.geometry.envelope()
	}

	#[cfg(any(test, feature = "test"))]
	pub fn new_point(id: u64, x: f64, y: f64) -> Self {
		Self::new(id, Geometry::Point([x, y]))
	}

	#[cfg(any(test, feature = "test"))]
	pub fn new_example() -> Self {
		let mut feature = Self::new(13, Geometry::Point([8.8, 53.1]));
		feature.set_properties(GeoProperties::from(vec![
			("name", GeoValue::from("Bremen")),
			("population", GeoValue::from(569_396)),
			("is_nice", GeoValue::from(true)),
		]));
		feature
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn envelope_delegates_to_geometry() {
		let feature = Feature::new_point(1, 2.0, 3.0);
		assert_eq!(feature.envelope().as_tuple(), (2.0, 3.0, 2.0, 3.0));
	}

	#[test]
	fn set_property_converts() {
		let mut feature = Feature::new_example();
		feature.set_property("renamed".to_string(), "yes");
		assert_eq!(feature.properties.get("renamed"), Some(&GeoValue::from("yes")));
		assert_eq!(feature.properties.get("name"), Some(&GeoValue::from("Bremen")));
	}
}
