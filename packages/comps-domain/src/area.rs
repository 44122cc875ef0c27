use serde::{Deserialize, Serialize};

/// Which area field a display area was resolved from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
	Build,
	Plot,
	Terrace,
}
impl AreaType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Build => "build",
			Self::Plot => "plot",
			Self::Terrace => "terrace",
		}
	}
}

/// Fraction of the plot below which a villa's build area stops being
/// representative and the plot takes over.
const VILLA_SMALL_BUILD_PLOT_RATIO: f64 = 0.3;

/// Resolves the display area for a record. This is the single implementation
/// used by filtering, scoring, and output alike.
///
/// Villas prefer build area unless the structure covers less than 30% of a
/// known plot; every other category falls back build -> plot -> terrace.
pub fn resolve_display_area(category: &str, build: f64, plot: f64, terrace: f64) -> (f64, AreaType) {
	if category == "villa" {
		if build > 0.0 {
			if plot > 0.0 && build < plot * VILLA_SMALL_BUILD_PLOT_RATIO {
				return (plot, AreaType::Plot);
			}

			return (build, AreaType::Build);
		}
		if plot > 0.0 {
			return (plot, AreaType::Plot);
		}

		return (terrace.max(0.0), AreaType::Terrace);
	}

	if build > 0.0 {
		return (build, AreaType::Build);
	}
	if plot > 0.0 {
		return (plot, AreaType::Plot);
	}
	if terrace > 0.0 {
		return (terrace, AreaType::Terrace);
	}

	(0.0, AreaType::Build)
}

/// Dynamic area tolerance. Small-build villas are undervalued by area alone,
/// so they carry their own ladder; everything else uses 0.3.
pub fn area_tolerance(category: &str, build_area: f64) -> f64 {
	if category == "villa" {
		if build_area < 100.0 {
			return 1.0;
		}
		if build_area <= 150.0 {
			return 0.75;
		}
	}

	0.3
}

/// The asymmetric filter bounds: `lower = min * t`, `upper = max * (2 - t)`.
pub fn area_bounds(requested_min: f64, requested_max: f64, tolerance: f64) -> (f64, f64) {
	(requested_min * tolerance, requested_max * (2.0 - tolerance))
}

pub fn within_area_bounds(
	candidate_area: f64,
	requested_min: f64,
	requested_max: f64,
	tolerance: f64,
) -> bool {
	let (lower, upper) = area_bounds(requested_min, requested_max, tolerance);

	candidate_area >= lower && candidate_area <= upper
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn small_villa_build_defers_to_plot() {
		assert_eq!(resolve_display_area("villa", 40.0, 500.0, 0.0), (500.0, AreaType::Plot));
	}

	#[test]
	fn representative_villa_build_wins() {
		assert_eq!(resolve_display_area("villa", 200.0, 500.0, 0.0), (200.0, AreaType::Build));
	}

	#[test]
	fn non_villa_falls_back_build_plot_terrace() {
		assert_eq!(resolve_display_area("apartment", 85.0, 0.0, 20.0), (85.0, AreaType::Build));
		assert_eq!(resolve_display_area("apartment", 0.0, 120.0, 20.0), (120.0, AreaType::Plot));
		assert_eq!(resolve_display_area("apartment", 0.0, 0.0, 20.0), (20.0, AreaType::Terrace));
	}

	#[test]
	fn villa_tolerance_ladder() {
		assert_eq!(area_tolerance("villa", 80.0), 1.0);
		assert_eq!(area_tolerance("villa", 140.0), 0.75);
		assert_eq!(area_tolerance("villa", 150.0), 0.75);
		assert_eq!(area_tolerance("villa", 220.0), 0.3);
		assert_eq!(area_tolerance("apartment", 80.0), 0.3);
	}

	#[test]
	fn bounds_are_asymmetric() {
		let (lower, upper) = area_bounds(100.0, 100.0, 0.3);

		assert!((lower - 30.0).abs() < 1e-9);
		assert!((upper - 170.0).abs() < 1e-9);

		let (lower, upper) = area_bounds(70.0, 130.0, 1.0);

		assert!((lower - 70.0).abs() < 1e-9);
		assert!((upper - 130.0).abs() < 1e-9);
	}

	#[test]
	fn bounds_check_is_inclusive_near_the_edges() {
		assert!(within_area_bounds(30.1, 100.0, 100.0, 0.3));
		assert!(within_area_bounds(169.9, 100.0, 100.0, 0.3));
		assert!(!within_area_bounds(29.9, 100.0, 100.0, 0.3));
		assert!(!within_area_bounds(170.1, 100.0, 100.0, 0.3));
	}
}
