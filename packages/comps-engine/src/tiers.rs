use std::collections::{HashMap, HashSet};

use comps_catalog::index::CatalogIndex;
use comps_domain::{area, criteria::SearchCriteria, property::PropertyRecord};

/// The geographic-specificity ladder, tightest first. Radii are in km.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Tier {
	Street,
	Development,
	District,
	Neighbors,
	City,
	Wide,
}

const TIERS: &[(Tier, f64)] = &[
	(Tier::Street, 1.0),
	(Tier::Development, 2.0),
	(Tier::District, 2.0),
	(Tier::Neighbors, 3.0),
	(Tier::City, 5.0),
	(Tier::Wide, 8.0),
];

pub(crate) struct TierSearchOutcome {
	/// Unique survivors in tier order; earlier tiers are geographically
	/// tighter, which is what breaks score ties later.
	pub candidates: Vec<PropertyRecord>,
	pub seen: HashSet<String>,
	pub examined: HashSet<String>,
}

/// Runs the tier ladder until the running unique count reaches the target.
/// Index intersection is necessary but not sufficient: every tier post-filters
/// on an exact (case-insensitive) address component match.
pub(crate) fn run_tiered_search(
	catalog: &CatalogIndex,
	criteria: &SearchCriteria,
	subject_coordinates: Option<(f64, f64)>,
	neighbors: &HashMap<String, Vec<String>>,
) -> TierSearchOutcome {
	let mut outcome = TierSearchOutcome {
		candidates: Vec::new(),
		seen: HashSet::new(),
		examined: HashSet::new(),
	};
	let Some(city) = criteria.city.as_deref() else {
		return outcome;
	};

	for (tier, radius) in TIERS {
		if outcome.seen.len() >= criteria.target_count {
			break;
		}
		if !tier_applies(*tier, criteria, neighbors) {
			continue;
		}

		let candidates = catalog.find_candidates(city, &criteria.category, criteria.transaction);

		match tier {
			Tier::Neighbors => {
				let Some(adjacent) = adjacency(criteria, neighbors) else {
					continue;
				};

				for neighbor in adjacent {
					if outcome.seen.len() >= criteria.target_count {
						break;
					}

					collect_tier(
						&mut outcome,
						&candidates,
						criteria,
						subject_coordinates,
						*radius,
						|candidate| {
							component_eq(candidate.development.as_deref(), Some(neighbor.as_str()))
						},
					);
				}
			},
			_ => {
				let tier = *tier;

				collect_tier(
					&mut outcome,
					&candidates,
					criteria,
					subject_coordinates,
					*radius,
					|candidate| tier_component_matches(tier, criteria, candidate),
				);
			},
		}
	}

	outcome
}

fn tier_applies(
	tier: Tier,
	criteria: &SearchCriteria,
	neighbors: &HashMap<String, Vec<String>>,
) -> bool {
	match tier {
		Tier::Street => criteria.street.is_some(),
		Tier::Development => criteria.development.is_some(),
		Tier::District => criteria.district.is_some(),
		Tier::Neighbors => adjacency(criteria, neighbors).is_some(),
		Tier::City => criteria.city.is_some(),
		Tier::Wide => true,
	}
}

fn adjacency<'a>(
	criteria: &SearchCriteria,
	neighbors: &'a HashMap<String, Vec<String>>,
) -> Option<&'a Vec<String>> {
	let development = criteria.development.as_deref()?;

	neighbors.get(&development.trim().to_lowercase()).filter(|adjacent| !adjacent.is_empty())
}

fn tier_component_matches(tier: Tier, criteria: &SearchCriteria, candidate: &PropertyRecord) -> bool {
	match tier {
		Tier::Street => component_eq(candidate.street.as_deref(), criteria.street.as_deref()),
		Tier::Development =>
			component_eq(candidate.development.as_deref(), criteria.development.as_deref()),
		Tier::District => component_eq(candidate.district.as_deref(), criteria.district.as_deref()),
		Tier::City => component_eq(candidate.city.as_deref(), criteria.city.as_deref()),
		// Neighbors matches per adjacent name at the call site; the wide tier
		// has no component filter at all.
		Tier::Neighbors | Tier::Wide => true,
	}
}

fn collect_tier<F>(
	outcome: &mut TierSearchOutcome,
	candidates: &[&PropertyRecord],
	criteria: &SearchCriteria,
	subject_coordinates: Option<(f64, f64)>,
	radius: f64,
	component_filter: F,
) where
	F: Fn(&PropertyRecord) -> bool,
{
	for candidate in candidates {
		if candidate.reference == criteria.exclude_ref {
			continue;
		}

		outcome.examined.insert(candidate.reference.clone());

		if outcome.seen.contains(&candidate.reference) {
			continue;
		}
		if !within_radius(subject_coordinates, candidate.coordinates, radius) {
			continue;
		}
		if !component_filter(candidate) {
			continue;
		}
		if !passes_criteria(criteria, candidate) {
			continue;
		}

		outcome.seen.insert(candidate.reference.clone());
		outcome.candidates.push((*candidate).clone());
	}
}

pub(crate) fn passes_criteria(criteria: &SearchCriteria, candidate: &PropertyRecord) -> bool {
	let (candidate_area, _) = area::resolve_display_area(
		&candidate.category,
		candidate.build_area,
		candidate.plot_area,
		candidate.terrace_area,
	);

	criteria.bedrooms_match(candidate.bedrooms)
		&& criteria.bathrooms_match(candidate.bathrooms)
		&& criteria.price_in_band(candidate.price)
		&& criteria.area_in_band(candidate_area)
}

/// Records without coordinates on either side are never excluded by radius.
pub(crate) fn within_radius(
	subject: Option<(f64, f64)>,
	candidate: Option<(f64, f64)>,
	radius_km: f64,
) -> bool {
	match (subject, candidate) {
		(Some(subject), Some(candidate)) => haversine_km(subject, candidate) <= radius_km,
		_ => true,
	}
}

pub(crate) fn component_eq(candidate: Option<&str>, subject: Option<&str>) -> bool {
	match (candidate, subject) {
		(Some(candidate), Some(subject)) =>
			candidate.trim().to_lowercase() == subject.trim().to_lowercase(),
		_ => false,
	}
}

fn haversine_km((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> f64 {
	const R: f64 = 6_371.0;

	let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
	let (delta_phi, delta_lambda) = ((lat2 - lat1).to_radians(), (lon2 - lon1).to_radians());
	let a = (delta_phi / 2.0).sin().powi(2)
		+ phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

	2.0 * R * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
	use comps_testkit::PropertyBuilder;

	use super::*;
	use comps_domain::property::{Condition, TransactionType};

	fn criteria() -> SearchCriteria {
		SearchCriteria {
			transaction: TransactionType::Sale,
			category: "villa".to_string(),
			city: Some("Marbella".to_string()),
			district: Some("Nueva Andalucia".to_string()),
			development: Some("Las Brisas".to_string()),
			street: Some("Calle Azahar".to_string()),
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
			target_count: 12,
		}
	}

	fn villa(reference: &str) -> PropertyBuilder {
		PropertyBuilder::new(reference)
			.category("villa")
			.city("Marbella")
			.bedrooms(4)
			.bathrooms(3)
			.price(1_000_000.0)
	}

	#[test]
	fn tighter_tiers_come_first_and_duplicates_collapse() {
		let catalog = CatalogIndex::build(vec![
			villa("CITY-1").district("Elviria").build(),
			villa("STREET-1")
				.district("Nueva Andalucia")
				.street("Calle Azahar")
				.build(),
			villa("DISTRICT-1").district("Nueva Andalucia").build(),
		]);
		let outcome = run_tiered_search(&catalog, &criteria(), None, &HashMap::new());
		let references: Vec<&str> =
			outcome.candidates.iter().map(|record| record.reference.as_str()).collect();

		// STREET-1 matches the street, district, and city tiers but appears
		// once, from the tightest tier.
		assert_eq!(references, vec!["STREET-1", "DISTRICT-1", "CITY-1"]);
		assert_eq!(outcome.examined.len(), 3);
	}

	#[test]
	fn the_subject_never_matches_itself() {
		let catalog = CatalogIndex::build(vec![
			villa("SUBJECT").street("Calle Azahar").district("Nueva Andalucia").build(),
			villa("OTHER").street("Calle Azahar").district("Nueva Andalucia").build(),
		]);
		let outcome = run_tiered_search(&catalog, &criteria(), None, &HashMap::new());

		assert!(!outcome.seen.contains("SUBJECT"));
		assert!(!outcome.examined.contains("SUBJECT"));
		assert_eq!(outcome.candidates.len(), 1);
	}

	#[test]
	fn search_stops_once_the_target_is_reached() {
		let mut records = Vec::new();

		for ordinal in 0..12 {
			records.push(
				villa(&format!("STREET-{ordinal:02}"))
					.street("Calle Azahar")
					.district("Nueva Andalucia")
					.build(),
			);
		}

		records.push(villa("CITY-EXTRA").district("Elviria").build());

		let catalog = CatalogIndex::build(records);
		let outcome = run_tiered_search(&catalog, &criteria(), None, &HashMap::new());

		assert_eq!(outcome.candidates.len(), 12);
		assert!(!outcome.seen.contains("CITY-EXTRA"));
	}

	#[test]
	fn neighboring_developments_fill_after_the_district() {
		let neighbors = HashMap::from([(
			"las brisas".to_string(),
			vec!["aloha".to_string(), "la quinta".to_string()],
		)]);
		let catalog = CatalogIndex::build(vec![
			villa("NEIGHBOR-1").development("Aloha").district("Aloha Hills").build(),
			villa("NEIGHBOR-2").development("La Quinta").district("Benahavis Border").build(),
		]);
		let mut criteria = criteria();

		criteria.street = None;
		criteria.district = None;

		let outcome = run_tiered_search(&catalog, &criteria, None, &neighbors);
		let references: Vec<&str> =
			outcome.candidates.iter().map(|record| record.reference.as_str()).collect();

		assert_eq!(references, vec!["NEIGHBOR-1", "NEIGHBOR-2"]);
	}

	#[test]
	fn radius_excludes_distant_coordinates_only_when_both_are_known() {
		let subject = Some((36.4900, -4.9500));
		let catalog = CatalogIndex::build(vec![
			// Roughly 50 km up the coast; outside every tier radius.
			villa("FAR").street("Calle Azahar").coordinates(36.85, -4.55).build(),
			villa("NEAR").street("Calle Azahar").coordinates(36.4910, -4.9490).build(),
			villa("UNKNOWN").street("Calle Azahar").build(),
		]);
		let outcome = run_tiered_search(&catalog, &criteria(), subject, &HashMap::new());
		let references: Vec<&str> =
			outcome.candidates.iter().map(|record| record.reference.as_str()).collect();

		assert!(references.contains(&"NEAR"));
		assert!(references.contains(&"UNKNOWN"));
		assert!(!references.contains(&"FAR"));
	}

	#[test]
	fn haversine_matches_known_distances() {
		// Marbella to Malaga is roughly 47 km.
		let marbella = (36.5101, -4.8824);
		let malaga = (36.7213, -4.4213);
		let distance = haversine_km(marbella, malaga);

		assert!((40.0..55.0).contains(&distance), "distance was {distance}");
	}
}
