use regex::Regex;

/// Confidence floor for promotion into the permanent store. Applies to the
/// description-hash path only.
pub const PERMANENT_MIN_CONFIDENCE: f32 = 0.95;
/// Confidence floor for writing the shared development+district cache key.
pub const SHARED_KEY_MIN_CONFIDENCE: f32 = 0.7;

const MAX_LABEL_CHARS: usize = 80;
const MAX_MARKETING_ADJECTIVES: usize = 2;

const MARKETING_ADJECTIVES: &[&str] = &[
	"beautiful",
	"breathtaking",
	"charming",
	"dream",
	"exclusive",
	"exquisite",
	"luxurious",
	"luxury",
	"magnificent",
	"prestigious",
	"spectacular",
	"stunning",
	"unique",
	"unrivalled",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RejectCode {
	RejectEmpty,
	RejectTooLong,
	RejectMarketing,
}

/// Validates a label returned by the completion service. Labels are expected
/// to be genuine place names; long or adjective-heavy strings are marketing
/// copy unless a recognized toponym appears in them.
pub fn validate_label(label: &str, known_places: &[String]) -> Result<(), RejectCode> {
	let trimmed = label.trim();

	if trimmed.is_empty() {
		return Err(RejectCode::RejectEmpty);
	}

	let lowered = trimmed.to_lowercase();

	if known_places.iter().any(|place| lowered.contains(place.as_str())) {
		return Ok(());
	}
	if trimmed.chars().count() > MAX_LABEL_CHARS {
		return Err(RejectCode::RejectTooLong);
	}
	if marketing_adjective_count(&lowered) > MAX_MARKETING_ADJECTIVES {
		return Err(RejectCode::RejectMarketing);
	}

	Ok(())
}

pub fn permanent_write_allowed(confidence: f32) -> bool {
	confidence >= PERMANENT_MIN_CONFIDENCE
}

/// Gate for the shared development+district key. Low-value results must not
/// poison a key that other listings resolve through, so the entry needs both
/// the confidence floor and some genuinely useful signal.
pub fn shared_key_write_allowed(confidence: f32, landmark_count: usize, proximity_count: usize) -> bool {
	confidence >= SHARED_KEY_MIN_CONFIDENCE
		&& (landmark_count + proximity_count > 0 || confidence >= SHARED_KEY_MIN_CONFIDENCE)
}

fn marketing_adjective_count(lowered: &str) -> usize {
	MARKETING_ADJECTIVES
		.iter()
		.filter(|adjective| {
			Regex::new(&format!(r"\b{adjective}\b"))
				.map(|re| re.is_match(lowered))
				.unwrap_or(false)
		})
		.count()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn known_places() -> Vec<String> {
		vec!["nueva andalucia".to_string(), "marbella".to_string()]
	}

	#[test]
	fn accepts_plain_place_names() {
		assert_eq!(validate_label("Nueva Andalucia", &known_places()), Ok(()));
		assert_eq!(validate_label("El Paraiso Alto", &known_places()), Ok(()));
	}

	#[test]
	fn rejects_overlong_labels_without_a_known_place() {
		let label = "a".repeat(81);

		assert_eq!(validate_label(&label, &known_places()), Err(RejectCode::RejectTooLong));
	}

	#[test]
	fn rejects_marketing_copy() {
		let label = "Stunning luxury villa in an exclusive gated community";

		assert_eq!(validate_label(label, &known_places()), Err(RejectCode::RejectMarketing));
	}

	#[test]
	fn a_known_place_overrides_the_marketing_heuristic() {
		let label = "Stunning luxury villa in exclusive Nueva Andalucia";

		assert_eq!(validate_label(label, &known_places()), Ok(()));
	}

	#[test]
	fn two_adjectives_are_still_acceptable() {
		assert_eq!(validate_label("Beautiful exclusive hillside", &known_places()), Ok(()));
	}

	#[test]
	fn permanent_gate_uses_the_high_threshold() {
		assert!(permanent_write_allowed(0.95));
		assert!(!permanent_write_allowed(0.94));
	}

	#[test]
	fn shared_key_gate_requires_the_confidence_floor() {
		assert!(shared_key_write_allowed(0.7, 0, 0));
		assert!(shared_key_write_allowed(0.8, 2, 0));
		assert!(!shared_key_write_allowed(0.69, 3, 3));
	}
}
