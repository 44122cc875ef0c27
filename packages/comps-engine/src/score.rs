use time::OffsetDateTime;

use comps_domain::{area, criteria::SearchCriteria, property::PropertyRecord};

const BASE_SCORE: f32 = 1.0;
const BEDROOM_EXACT: f32 = 2.0;
const BATHROOM_EXACT: f32 = 1.5;
const CATEGORY_EXACT: f32 = 1.0;

/// Weighted similarity between the subject's criteria and one candidate.
/// Additive and unbounded; every candidate starts at the base score.
pub fn score_candidate(
	criteria: &SearchCriteria,
	candidate: &PropertyRecord,
	now: OffsetDateTime,
) -> f32 {
	let mut score = BASE_SCORE;

	if candidate.bedrooms == criteria.bedrooms {
		score += BEDROOM_EXACT;
	}
	if candidate.bathrooms == criteria.bathrooms {
		score += BATHROOM_EXACT;
	}

	score += condition_similarity(criteria, candidate);
	score += area_similarity(criteria, candidate);
	score += price_similarity(criteria, candidate);
	score += feature_overlap(criteria, candidate);

	if candidate.category.eq_ignore_ascii_case(&criteria.category) {
		score += CATEGORY_EXACT;
	}

	score += recency_bonus(candidate, now);

	score
}

fn condition_similarity(criteria: &SearchCriteria, candidate: &PropertyRecord) -> f32 {
	match criteria.condition.steps_from(candidate.condition) {
		0 => 2.0,
		1 => 1.5,
		2 => 1.0,
		3 => 0.5,
		_ => 0.1,
	}
}

fn area_similarity(criteria: &SearchCriteria, candidate: &PropertyRecord) -> f32 {
	let (candidate_area, _) = area::resolve_display_area(
		&candidate.category,
		candidate.build_area,
		candidate.plot_area,
		candidate.terrace_area,
	);

	relative_band_bonus(candidate_area, criteria.area)
}

/// Identical banding to the area ladder, applied to the requested price.
/// Also the secondary sort key when relaxation tagged candidates with a
/// location-relevance score.
pub fn price_similarity(criteria: &SearchCriteria, candidate: &PropertyRecord) -> f32 {
	relative_band_bonus(candidate.price, criteria.price)
}

fn feature_overlap(criteria: &SearchCriteria, candidate: &PropertyRecord) -> f32 {
	if criteria.features.is_empty() {
		return 0.0;
	}

	let matched = criteria
		.features
		.iter()
		.filter(|feature| candidate.features.contains(feature.as_str()))
		.count();
	let ratio = matched as f32 / criteria.features.len() as f32;

	if ratio >= 0.8 {
		1.0
	} else if ratio >= 0.6 {
		0.7
	} else if ratio >= 0.4 {
		0.4
	} else if ratio >= 0.2 {
		0.2
	} else {
		0.0
	}
}

fn recency_bonus(candidate: &PropertyRecord, now: OffsetDateTime) -> f32 {
	let days = (now - candidate.listed_at).whole_days();

	if days <= 30 {
		0.3
	} else if days <= 90 {
		0.1
	} else {
		0.0
	}
}

/// The shared relative-difference ladder for area and price.
fn relative_band_bonus(candidate: f64, requested: f64) -> f32 {
	if requested <= 0.0 {
		return 0.0;
	}

	let relative = (candidate - requested).abs() / requested;

	if relative <= 0.05 {
		1.5
	} else if relative <= 0.15 {
		1.0
	} else if relative <= 0.30 {
		0.5
	} else if relative <= 0.50 {
		0.2
	} else {
		0.0
	}
}
