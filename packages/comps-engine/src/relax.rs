use std::collections::HashSet;

use comps_catalog::index::CatalogIndex;
use comps_domain::{area, criteria::SearchCriteria, property::PropertyRecord};

use crate::tiers;

/// Fixed category adjacency used by the third relaxation step.
const RELATED_CATEGORIES: &[(&str, &[&str])] = &[
	("apartment", &["penthouse", "duplex", "studio"]),
	("bungalow", &["villa", "house"]),
	("country-house", &["villa", "house"]),
	("duplex", &["apartment", "penthouse"]),
	("house", &["villa", "bungalow", "townhouse"]),
	("penthouse", &["apartment", "duplex"]),
	("semi-detached", &["townhouse", "terraced-house"]),
	("studio", &["apartment"]),
	("terraced-house", &["townhouse", "semi-detached"]),
	("townhouse", &["terraced-house", "semi-detached", "house"]),
	("villa", &["house", "bungalow", "country-house"]),
];

/// Location-relevance tags per relaxation step. Tier candidates implicitly
/// carry 1.0; later steps are geographically and semantically looser.
const STEP_LOCATION_SCORES: [f32; 5] = [0.8, 0.6, 0.5, 0.4, 0.2];

pub fn related_categories(category: &str) -> &'static [&'static str] {
	RELATED_CATEGORIES
		.iter()
		.find(|(known, _)| *known == category)
		.map(|(_, related)| *related)
		.unwrap_or(&[])
}

struct StepState {
	max_distance: f64,
	enforce_rooms: bool,
	enforce_price: bool,
}

pub(crate) struct RelaxedCandidate {
	pub record: PropertyRecord,
	pub location_score: f32,
}

/// Progressive constraint relaxation. Steps run in order, each adding only
/// unseen references, until the target is met or every step is exhausted.
pub(crate) fn run_relaxation(
	catalog: &CatalogIndex,
	criteria: &SearchCriteria,
	subject_coordinates: Option<(f64, f64)>,
	seen: &mut HashSet<String>,
	examined: &mut HashSet<String>,
) -> Vec<RelaxedCandidate> {
	let mut collected = Vec::new();
	let Some(city) = criteria.city.as_deref() else {
		return collected;
	};

	// Step 1: widen the distance.
	let mut state = StepState { max_distance: 10.0, enforce_rooms: true, enforce_price: true };

	collect_step(
		catalog,
		criteria,
		city,
		&criteria.category,
		&state,
		subject_coordinates,
		STEP_LOCATION_SCORES[0],
		seen,
		examined,
		&mut collected,
	);

	if seen.len() >= criteria.target_count {
		return collected;
	}

	// Step 2: drop the bedroom/bathroom window.
	state.enforce_rooms = false;

	collect_step(
		catalog,
		criteria,
		city,
		&criteria.category,
		&state,
		subject_coordinates,
		STEP_LOCATION_SCORES[1],
		seen,
		examined,
		&mut collected,
	);

	// Step 3: substitute each related category, stopping at the target.
	for related in related_categories(&criteria.category) {
		if seen.len() >= criteria.target_count {
			return collected;
		}

		collect_step(
			catalog,
			criteria,
			city,
			related,
			&state,
			subject_coordinates,
			STEP_LOCATION_SCORES[2],
			seen,
			examined,
			&mut collected,
		);
	}

	if seen.len() >= criteria.target_count {
		return collected;
	}

	// Step 4: drop the price band, widen the distance again.
	state.enforce_price = false;
	state.max_distance = 15.0;

	collect_step(
		catalog,
		criteria,
		city,
		&criteria.category,
		&state,
		subject_coordinates,
		STEP_LOCATION_SCORES[3],
		seen,
		examined,
		&mut collected,
	);

	if seen.len() >= criteria.target_count {
		return collected;
	}

	// Step 5, last resort: same city and transaction type only.
	for candidate in catalog.find_by_city_transaction(city, criteria.transaction) {
		if seen.len() >= criteria.target_count {
			break;
		}
		if candidate.reference == criteria.exclude_ref {
			continue;
		}

		examined.insert(candidate.reference.clone());

		if !seen.insert(candidate.reference.clone()) {
			continue;
		}

		collected.push(RelaxedCandidate {
			record: candidate.clone(),
			location_score: STEP_LOCATION_SCORES[4],
		});
	}

	collected
}

#[allow(clippy::too_many_arguments)]
fn collect_step(
	catalog: &CatalogIndex,
	criteria: &SearchCriteria,
	city: &str,
	category: &str,
	state: &StepState,
	subject_coordinates: Option<(f64, f64)>,
	location_score: f32,
	seen: &mut HashSet<String>,
	examined: &mut HashSet<String>,
	collected: &mut Vec<RelaxedCandidate>,
) {
	for candidate in catalog.find_candidates(city, category, criteria.transaction) {
		if seen.len() >= criteria.target_count {
			break;
		}
		if candidate.reference == criteria.exclude_ref {
			continue;
		}

		examined.insert(candidate.reference.clone());

		if seen.contains(&candidate.reference) {
			continue;
		}
		if !tiers::within_radius(subject_coordinates, candidate.coordinates, state.max_distance) {
			continue;
		}
		if state.enforce_rooms
			&& !(criteria.bedrooms_match(candidate.bedrooms)
				&& criteria.bathrooms_match(candidate.bathrooms))
		{
			continue;
		}
		if state.enforce_price && !criteria.price_in_band(candidate.price) {
			continue;
		}

		let (candidate_area, _) = area::resolve_display_area(
			&candidate.category,
			candidate.build_area,
			candidate.plot_area,
			candidate.terrace_area,
		);

		if !criteria.area_in_band(candidate_area) {
			continue;
		}

		seen.insert(candidate.reference.clone());
		collected.push(RelaxedCandidate { record: candidate.clone(), location_score });
	}
}

#[cfg(test)]
mod tests {
	use comps_testkit::PropertyBuilder;

	use super::*;
	use comps_domain::property::{Condition, TransactionType};

	fn criteria(target: usize) -> SearchCriteria {
		SearchCriteria {
			transaction: TransactionType::Sale,
			category: "villa".to_string(),
			city: Some("Marbella".to_string()),
			district: None,
			development: None,
			street: None,
			bedrooms: 4,
			bathrooms: 3,
			condition: Condition::Good,
			price: 1_000_000.0,
			price_min: 700_000.0,
			price_max: 1_300_000.0,
			area: 0.0,
			area_min: 0.0,
			area_max: 0.0,
			area_tolerance: 1.0,
			features: Vec::new(),
			exclude_ref: "SUBJECT".to_string(),
			target_count: target,
		}
	}

	#[test]
	fn related_category_lookup_is_symmetric_enough() {
		assert!(related_categories("villa").contains(&"house"));
		assert!(related_categories("house").contains(&"villa"));
		assert!(related_categories("castle").is_empty());
	}

	#[test]
	fn dropping_rooms_admits_mismatched_layouts() {
		let catalog = CatalogIndex::build(vec![
			PropertyBuilder::new("BIG")
				.category("villa")
				.city("Marbella")
				.bedrooms(8)
				.bathrooms(7)
				.price(1_000_000.0)
				.build(),
		]);
		let mut seen = HashSet::new();
		let mut examined = HashSet::new();
		let collected =
			run_relaxation(&catalog, &criteria(1), None, &mut seen, &mut examined);

		assert_eq!(collected.len(), 1);
		assert_eq!(collected[0].record.reference, "BIG");
		// Admitted by step 2, after the room window is dropped.
		assert!((collected[0].location_score - 0.6).abs() < f32::EPSILON);
	}

	#[test]
	fn related_categories_fill_before_the_price_band_drops() {
		let catalog = CatalogIndex::build(vec![
			PropertyBuilder::new("HOUSE-1")
				.category("house")
				.city("Marbella")
				.bedrooms(4)
				.bathrooms(3)
				.price(1_000_000.0)
				.build(),
			PropertyBuilder::new("PRICY-VILLA")
				.category("villa")
				.city("Marbella")
				.bedrooms(4)
				.bathrooms(3)
				.price(4_000_000.0)
				.build(),
		]);
		let mut seen = HashSet::new();
		let mut examined = HashSet::new();
		let collected =
			run_relaxation(&catalog, &criteria(1), None, &mut seen, &mut examined);

		assert_eq!(collected.len(), 1);
		assert_eq!(collected[0].record.reference, "HOUSE-1");
		assert!((collected[0].location_score - 0.5).abs() < f32::EPSILON);
	}

	#[test]
	fn the_last_resort_ignores_everything_but_city_and_transaction() {
		let catalog = CatalogIndex::build(vec![
			PropertyBuilder::new("ODD")
				.category("plot")
				.city("Marbella")
				.bedrooms(0)
				.bathrooms(0)
				.price(50_000.0)
				.build(),
			PropertyBuilder::new("RENTAL")
				.category("villa")
				.city("Marbella")
				.transaction(TransactionType::LongLet)
				.price(3_000.0)
				.build(),
		]);
		let mut seen = HashSet::new();
		let mut examined = HashSet::new();
		let collected =
			run_relaxation(&catalog, &criteria(1), None, &mut seen, &mut examined);

		assert_eq!(collected.len(), 1);
		assert_eq!(collected[0].record.reference, "ODD");
		assert!((collected[0].location_score - 0.2).abs() < f32::EPSILON);
	}

	#[test]
	fn steps_only_add_unseen_references() {
		let catalog = CatalogIndex::build(vec![
			PropertyBuilder::new("V-1")
				.category("villa")
				.city("Marbella")
				.bedrooms(4)
				.bathrooms(3)
				.price(1_000_000.0)
				.build(),
		]);
		let mut seen = HashSet::from(["V-1".to_string()]);
		let mut examined = HashSet::new();
		let collected =
			run_relaxation(&catalog, &criteria(2), None, &mut seen, &mut examined);

		assert!(collected.is_empty());
	}
}
