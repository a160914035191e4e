use super::CoverageTracker;
use anyhow::{Result, ensure};
use covercache_core::Envelope;
use covercache_derive::context;
use std::fmt::Debug;

/// A coverage strategy that quantizes registration onto a fixed raster over a
/// bounded domain.
///
/// A cell counts as covered only when a registered region contains it
/// entirely, so the tracker under-reports coverage for regions that are not
/// aligned to cell borders — it may cause re-fetching, never a false
/// coverage claim. Queries reaching outside the domain report the outside
/// part as uncovered. Best suited for workloads whose query envelopes align
/// with the raster.
#[derive(Clone)]
pub struct GridTracker {
	domain: Envelope,
	cols: usize,
	rows: usize,
	cells: Vec<bool>,
}

impl GridTracker {
	#[context("Failed to create GridTracker with {cols}x{rows} cells over {domain:?}")]
	pub fn new(domain: Envelope, cols: usize, rows: usize) -> Result<Self> {
		ensure!(cols > 0, "cols must be > 0");
		ensure!(rows > 0, "rows must be > 0");
		ensure!(domain.area() > 0.0, "domain must have a positive area");
		Ok(Self {
			domain,
			cols,
			rows,
			cells: vec![false; cols * rows],
		})
	}

	fn cell_envelope(&self, col: usize, row: usize) -> Envelope {
		let cell_width = self.domain.width() / self.cols as f64;
		let cell_height = self.domain.height() / self.rows as f64;
		// pin the outermost borders to the domain to avoid float drift
		Envelope {
			x_min: self.domain.x_min + col as f64 * cell_width,
			y_min: self.domain.y_min + row as f64 * cell_height,
			x_max: if col + 1 == self.cols {
				self.domain.x_max
			} else {
				self.domain.x_min + (col + 1) as f64 * cell_width
			},
			y_max: if row + 1 == self.rows {
				self.domain.y_max
			} else {
				self.domain.y_min + (row + 1) as f64 * cell_height
			},
		}
	}

	fn run_envelope(&self, row: usize, col_start: usize, col_end: usize) -> Envelope {
		let first = self.cell_envelope(col_start, row);
		let last = self.cell_envelope(col_end, row);
		first.extended(&last)
	}

	fn set_contained_cells(&mut self, region: &Envelope, covered: bool) {
		for row in 0..self.rows {
			for col in 0..self.cols {
				if region.contains(&self.cell_envelope(col, row)) {
					self.cells[row * self.cols + col] = covered;
				}
			}
		}
	}

	/// Calls `f` with the envelope of every maximal covered run of cells,
	/// row by row.
	fn for_each_covered_run(&self, mut f: impl FnMut(Envelope)) {
		for row in 0..self.rows {
			let mut col = 0;
			while col < self.cols {
				if self.cells[row * self.cols + col] {
					let start = col;
					while col < self.cols && self.cells[row * self.cols + col] {
						col += 1;
					}
					f(self.run_envelope(row, start, col - 1));
				} else {
					col += 1;
				}
			}
		}
	}
}

impl CoverageTracker for GridTracker {
	fn uncovered(&self, query: &Envelope) -> Vec<Envelope> {
		let mut remainder = vec![*query];
		self.for_each_covered_run(|run| {
			if !remainder.is_empty() {
				remainder = remainder.iter().flat_map(|r| r.subtract(&run)).collect();
			}
		});
		remainder
	}

	fn register(&mut self, region: Envelope) {
		self.set_contained_cells(&region, true);
	}

	fn unregister(&mut self, region: &Envelope) {
		self.set_contained_cells(region, false);
	}

	fn clear(&mut self) {
		self.cells.fill(false);
	}

	fn regions(&self) -> Vec<Envelope> {
		let mut regions = Vec::new();
		self.for_each_covered_run(|run| regions.push(run));
		regions
	}
}

impl Debug for GridTracker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GridTracker")
			.field("domain", &self.domain)
			.field("cols", &self.cols)
			.field("rows", &self.rows)
			.field("covered_cells", &self.cells.iter().filter(|c| **c).count())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn env(x0: f64, y0: f64, x1: f64, y1: f64) -> Envelope {
		Envelope::new(x0, y0, x1, y1).unwrap()
	}

	fn tracker() -> GridTracker {
		// 10x10 cells of size 1x1 over [0,10]x[0,10]
		GridTracker::new(env(0.0, 0.0, 10.0, 10.0), 10, 10).unwrap()
	}

	#[test]
	fn new_rejects_bad_parameters() {
		assert!(GridTracker::new(env(0.0, 0.0, 10.0, 10.0), 0, 10).is_err());
		assert!(GridTracker::new(env(0.0, 0.0, 0.0, 10.0), 10, 10).is_err());
	}

	#[test]
	fn aligned_registration_covers_exactly() {
		let mut t = tracker();
		let region = env(2.0, 2.0, 5.0, 5.0);
		t.register(region);
		assert!(t.uncovered(&region).is_empty());
		assert_eq!(t.uncovered(&env(0.0, 0.0, 2.0, 2.0)), vec![env(0.0, 0.0, 2.0, 2.0)]);
	}

	#[test]
	fn unaligned_registration_underestimates() {
		let mut t = tracker();
		t.register(env(0.5, 0.5, 3.5, 3.5));
		// only the fully contained cells [1,3]x[1,3] count as covered
		assert!(t.uncovered(&env(1.0, 1.0, 3.0, 3.0)).is_empty());
		assert!(!t.uncovered(&env(0.5, 0.5, 3.5, 3.5)).is_empty());
	}

	#[test]
	fn query_outside_domain_is_uncovered() {
		let mut t = tracker();
		t.register(env(0.0, 0.0, 10.0, 10.0));
		assert!(t.uncovered(&env(0.0, 0.0, 10.0, 10.0)).is_empty());

		let partly_outside = env(8.0, 8.0, 12.0, 12.0);
		let remainder = t.uncovered(&partly_outside);
		assert!(!remainder.is_empty());
		let area: f64 = remainder.iter().map(Envelope::area).sum();
		assert_eq!(area, partly_outside.area() - 4.0);
	}

	#[test]
	fn unregister_reverts_register() {
		let mut t = tracker();
		let region = env(2.0, 2.0, 5.0, 5.0);
		t.register(region);
		t.unregister(&region);
		assert_eq!(t.uncovered(&region), vec![region]);
		assert!(t.regions().is_empty());
	}

	#[test]
	fn regions_reports_row_runs() {
		let mut t = tracker();
		t.register(env(0.0, 0.0, 3.0, 1.0));
		t.register(env(5.0, 0.0, 7.0, 1.0));
		let regions = t.regions();
		assert_eq!(regions, vec![env(0.0, 0.0, 3.0, 1.0), env(5.0, 0.0, 7.0, 1.0)]);
	}

	#[test]
	fn clear_resets_all_cells() {
		let mut t = tracker();
		t.register(env(0.0, 0.0, 10.0, 10.0));
		t.clear();
		assert!(t.regions().is_empty());
	}
}
