use anyhow::{Result, ensure};
use covercache_derive::context;

/// Schema of a feature source: the type name, the attribute carrying the
/// geometry, an optional CRS identifier and the attribute names.
///
/// The cache uses the schema only to validate the geometry attribute at
/// construction; the CRS is carried as metadata and never manipulated.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSchema {
	pub name: String,
	pub geometry_column: String,
	pub crs: Option<String>,
	pub fields: Vec<String>,
}

impl FeatureSchema {
	pub fn new(name: &str, geometry_column: &str, fields: Vec<&str>) -> Self {
		Self {
			name: name.to_string(),
			geometry_column: geometry_column.to_string(),
			crs: None,
			fields: fields.into_iter().map(str::to_string).collect(),
		}
	}

	#[must_use]
	pub fn with_crs(mut self, crs: &str) -> Self {
		self.crs = Some(crs.to_string());
		self
	}

	#[must_use]
	pub fn has_field(&self, name: &str) -> bool {
		self.fields.iter().any(|f| f == name)
	}

	/// Validates that the declared geometry attribute exists.
	#[context("Invalid schema for feature type {:?}", self.name)]
	pub fn check(&self) -> Result<()> {
		ensure!(!self.geometry_column.is_empty(), "geometry column name must not be empty");
		ensure!(
			self.has_field(&self.geometry_column),
			"geometry column {:?} is not a field of the schema",
			self.geometry_column
		);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn check_accepts_valid_schema() {
		let schema = FeatureSchema::new("roads", "geom", vec!["geom", "name", "lanes"]).with_crs("EPSG:3857");
		assert!(schema.check().is_ok());
		assert!(schema.has_field("lanes"));
		assert!(!schema.has_field("width"));
	}

	#[test]
	fn check_rejects_missing_geometry_column() {
		let schema = FeatureSchema::new("roads", "geom", vec!["name"]);
		assert!(schema.check().is_err());

		let schema = FeatureSchema::new("roads", "", vec!["name"]);
		assert!(schema.check().is_err());
	}
}
