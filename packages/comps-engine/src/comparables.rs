use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{CompsEngine, ResolutionMethod, Result, relax, score, tiers};
use comps_domain::{
	area::{self, AreaType},
	cachegate,
	criteria::SearchCriteria,
	property::{PropertyRecord, feature_label},
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Comparable {
	pub reference: String,
	pub address: String,
	pub price: f64,
	pub area: f64,
	pub area_type: AreaType,
	pub bedrooms: u32,
	pub bathrooms: u32,
	#[serde(with = "crate::time_serde")]
	pub listed_at: OffsetDateTime,
	pub days_on_market: i64,
	pub price_per_area: Option<i64>,
	pub category: String,
	pub condition: String,
	pub features: Vec<String>,
	pub images: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ComparablesResponse {
	pub trace_id: Uuid,
	pub comparables: Vec<Comparable>,
	/// Distinct candidates examined across all tiers and relaxation steps,
	/// not just those returned.
	pub total_found: usize,
}

struct ScoredCandidate {
	record: PropertyRecord,
	score: f32,
	price_similarity: f32,
	location_score: Option<f32>,
}

impl CompsEngine {
	/// Finds comparables for the subject. Comparable search is best-effort
	/// enrichment: a subject without a city or category yields the empty
	/// response rather than an error.
	pub async fn find_comparables(
		&self,
		subject: &PropertyRecord,
		target_count: Option<usize>,
	) -> Result<ComparablesResponse> {
		let trace_id = Uuid::new_v4();
		let has_city =
			subject.city.as_deref().map(|city| !city.trim().is_empty()).unwrap_or(false);

		if !has_city || subject.category.trim().is_empty() {
			debug!(%trace_id, reference = %subject.reference, "Subject is missing city or category.");

			return Ok(ComparablesResponse { trace_id, comparables: Vec::new(), total_found: 0 });
		}

		let resolved = self.resolve_location(subject).await;
		let mut criteria = SearchCriteria::from_subject(subject, &self.cfg);

		if let Some(count) = target_count {
			criteria.target_count = count.max(1);
		}

		// A confident resolution can stand in for a missing development, which
		// unlocks the development and neighbor tiers.
		if criteria.development.is_none()
			&& resolved.method == ResolutionMethod::Completion
			&& resolved.confidence >= cachegate::SHARED_KEY_MIN_CONFIDENCE
		{
			criteria.development = Some(resolved.label.clone());
		}

		let subject_coordinates = subject.coordinates.or(resolved.coordinates);
		let now = OffsetDateTime::now_utc();
		let outcome = tiers::run_tiered_search(
			&self.catalog,
			&criteria,
			subject_coordinates,
			&self.cfg.matching.neighboring_developments,
		);
		let mut seen = outcome.seen;
		let mut examined = outcome.examined;
		let mut scored: Vec<ScoredCandidate> = outcome
			.candidates
			.into_iter()
			.map(|record| {
				let score = score::score_candidate(&criteria, &record, now);
				let price_similarity = score::price_similarity(&criteria, &record);

				ScoredCandidate { record, score, price_similarity, location_score: None }
			})
			.collect();

		if seen.len() < criteria.target_count {
			for relaxed in relax::run_relaxation(
				&self.catalog,
				&criteria,
				subject_coordinates,
				&mut seen,
				&mut examined,
			) {
				let score = score::score_candidate(&criteria, &relaxed.record, now);
				let price_similarity = score::price_similarity(&criteria, &relaxed.record);

				scored.push(ScoredCandidate {
					record: relaxed.record,
					score,
					price_similarity,
					location_score: Some(relaxed.location_score),
				});
			}
		}

		sort_candidates(&mut scored);
		scored.truncate(criteria.target_count);

		debug!(
			%trace_id,
			reference = %subject.reference,
			returned = scored.len(),
			total_found = examined.len(),
			"Comparable search finished."
		);

		Ok(ComparablesResponse {
			trace_id,
			comparables: scored
				.into_iter()
				.map(|candidate| to_comparable(candidate.record, now))
				.collect(),
			total_found: examined.len(),
		})
	}
}

/// Score ordering with ties broken by insertion (tier) order. When every
/// candidate came out of the low-information relaxation path, the
/// location-relevance tag dominates with price similarity second.
fn sort_candidates(scored: &mut [ScoredCandidate]) {
	let all_tagged = !scored.is_empty()
		&& scored.iter().all(|candidate| candidate.location_score.is_some());

	if all_tagged {
		scored.sort_by(|a, b| {
			let a_location = a.location_score.unwrap_or(0.0);
			let b_location = b.location_score.unwrap_or(0.0);

			b_location
				.partial_cmp(&a_location)
				.unwrap_or(Ordering::Equal)
				.then_with(|| {
					b.price_similarity.partial_cmp(&a.price_similarity).unwrap_or(Ordering::Equal)
				})
		});
	} else {
		scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
	}
}

fn to_comparable(record: PropertyRecord, now: OffsetDateTime) -> Comparable {
	let (display_area, area_type) = area::resolve_display_area(
		&record.category,
		record.build_area,
		record.plot_area,
		record.terrace_area,
	);
	let days_on_market = (now - record.listed_at).whole_days().max(0);
	let price_per_area = if display_area > 0.0 {
		Some((record.price / display_area).round() as i64)
	} else {
		None
	};

	Comparable {
		reference: record.reference,
		address: record.address,
		price: record.price,
		area: display_area,
		area_type,
		bedrooms: record.bedrooms,
		bathrooms: record.bathrooms,
		listed_at: record.listed_at,
		days_on_market,
		price_per_area,
		category: record.category,
		condition: record.condition.label().to_string(),
		features: record.features.iter().map(|code| feature_label(code)).collect(),
		images: record.images,
	}
}
