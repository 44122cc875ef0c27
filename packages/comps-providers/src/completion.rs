use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};
use comps_config::{CompletionProviderConfig, Resolver};

const SYSTEM_INSTRUCTION: &str = "\
You identify the geographic location described by a property listing. \
Return only genuine place names exactly as a local would write them, never \
marketing language. Respond with a single JSON object matching the schema: \
{\"has_specific\": bool, \"location\": string or null, \"landmarks\": [string], \
\"proximity\": [string], \"condition\": {\"rating\": string, \"details\": string, \
\"keywords\": [string], \"confidence\": number}, \"confidence\": integer 1-10, \
\"reason\": string}.";

/// Words that mark a description as geographically dense enough to be worth
/// the richer model tier.
const LOCATION_KEYWORDS: &[&str] = &[
	"avenida",
	"beach",
	"boulevard",
	"calle",
	"club",
	"golf",
	"marina",
	"minutes",
	"near",
	"next to",
	"opposite",
	"plaza",
	"promenade",
	"urbanization",
	"walk",
];

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConditionAssessment {
	pub rating: String,
	#[serde(default)]
	pub details: String,
	#[serde(default)]
	pub keywords: Vec<String>,
	pub confidence: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LocationExtraction {
	pub has_specific: bool,
	pub location: Option<String>,
	#[serde(default)]
	pub landmarks: Vec<String>,
	#[serde(default)]
	pub proximity: Vec<String>,
	#[serde(default)]
	pub condition: Option<ConditionAssessment>,
	/// Model confidence on a 1-10 scale.
	pub confidence: u8,
	#[serde(default)]
	pub reason: String,
}

/// Routes between model tiers. Long or toponym-dense descriptions go to the
/// richer tier; this changes cost and latency only, never the output shape.
pub fn select_model<'a>(
	cfg: &'a CompletionProviderConfig,
	resolver: &Resolver,
	description: &str,
) -> &'a str {
	let lowered = description.to_lowercase();
	let keyword_hits = LOCATION_KEYWORDS
		.iter()
		.filter(|keyword| lowered.contains(*keyword))
		.count();

	if description.chars().count() as u32 >= resolver.rich_model_min_chars
		|| keyword_hits as u32 >= resolver.rich_model_min_keywords
	{
		&cfg.model_rich
	} else {
		&cfg.model
	}
}

/// Calls the completion service and returns the structured extraction.
///
/// Retries with exponential backoff on rate-limit and server-error statuses
/// only; client errors and malformed payloads fail immediately.
pub async fn extract_location(
	cfg: &CompletionProviderConfig,
	resolver: &Resolver,
	description: &str,
) -> Result<LocationExtraction> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let model = select_model(cfg, resolver, description);
	let body = serde_json::json!({
		"model": model,
		"temperature": cfg.temperature,
		"response_format": { "type": "json_object" },
		"messages": [
			{ "role": "system", "content": SYSTEM_INSTRUCTION },
			{ "role": "user", "content": description },
		],
	});
	let mut attempt = 0;

	loop {
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let status = res.status();

		if status.is_success() {
			let json: Value = res.json().await?;

			return parse_completion_json(json);
		}
		if !retryable(status) || attempt + 1 >= resolver.retry_budget.max(1) {
			return Err(Error::Upstream { status: status.as_u16() });
		}

		let delay = resolver.backoff_base_ms.saturating_mul(1 << attempt);

		tokio::time::sleep(Duration::from_millis(delay)).await;

		attempt += 1;
	}
}

fn retryable(status: StatusCode) -> bool {
	status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn parse_completion_json(json: Value) -> Result<LocationExtraction> {
	let extraction: LocationExtraction = if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		serde_json::from_str(content).map_err(|_| Error::InvalidResponse {
			message: "Completion content does not match the extraction schema.".to_string(),
		})?
	} else if json.is_object() {
		serde_json::from_value(json).map_err(|_| Error::InvalidResponse {
			message: "Completion response does not match the extraction schema.".to_string(),
		})?
	} else {
		return Err(Error::InvalidResponse {
			message: "Completion response is missing JSON content.".to_string(),
		});
	};

	if !(1..=10).contains(&extraction.confidence) {
		return Err(Error::InvalidResponse {
			message: "Extraction confidence must be an integer from 1 to 10.".to_string(),
		});
	}

	Ok(extraction)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn completion_config() -> CompletionProviderConfig {
		CompletionProviderConfig {
			provider_id: "p".to_string(),
			api_base: "http://localhost".to_string(),
			api_key: "key".to_string(),
			path: "/".to_string(),
			model: "small".to_string(),
			model_rich: "large".to_string(),
			temperature: 0.1,
			timeout_ms: 1_000,
			default_headers: serde_json::Map::new(),
		}
	}

	fn resolver_config() -> Resolver {
		Resolver {
			known_places: Vec::new(),
			max_concurrent_calls: 5,
			retry_budget: 3,
			backoff_base_ms: 500,
			fallback_confidence: 0.2,
			rich_model_min_chars: 400,
			rich_model_min_keywords: 4,
		}
	}

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"has_specific\": true, \"location\": \"Nueva Andalucia\", \"landmarks\": [\"Puerto Banus\"], \"proximity\": [], \"confidence\": 8, \"reason\": \"Named district.\"}" } }
			]
		});
		let extraction = parse_completion_json(json).expect("parse failed");

		assert!(extraction.has_specific);
		assert_eq!(extraction.location.as_deref(), Some("Nueva Andalucia"));
		assert_eq!(extraction.confidence, 8);
	}

	#[test]
	fn rejects_out_of_range_confidence() {
		let json = serde_json::json!({
			"has_specific": false,
			"location": null,
			"confidence": 0,
		});

		assert!(matches!(
			parse_completion_json(json),
			Err(Error::InvalidResponse { .. })
		));
	}

	#[test]
	fn rejects_non_conforming_payloads() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "not json" } }
			]
		});

		assert!(matches!(
			parse_completion_json(json),
			Err(Error::InvalidResponse { .. })
		));
	}

	#[test]
	fn short_plain_descriptions_use_the_default_tier() {
		let cfg = completion_config();
		let resolver = resolver_config();

		assert_eq!(select_model(&cfg, &resolver, "Bright two bedroom flat."), "small");
	}

	#[test]
	fn keyword_dense_descriptions_use_the_rich_tier() {
		let cfg = completion_config();
		let resolver = resolver_config();
		let description =
			"Villa near the golf club, five minutes walk to the beach and the marina.";

		assert_eq!(select_model(&cfg, &resolver, description), "large");
	}

	#[test]
	fn long_descriptions_use_the_rich_tier() {
		let cfg = completion_config();
		let resolver = resolver_config();
		let description = "a".repeat(400);

		assert_eq!(select_model(&cfg, &resolver, &description), "large");
	}
}
