use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use comps_config::GeocodingProviderConfig;

#[derive(Clone, Copy, Debug)]
pub struct GeocodeResult {
	pub coordinates: Option<(f64, f64)>,
	pub confidence: f32,
}

/// Resolves a free-text address to coordinates. The hint narrows ambiguous
/// street names to the subject's city or district.
pub async fn geocode(
	cfg: &GeocodingProviderConfig,
	address: &str,
	hint: Option<&str>,
) -> Result<GeocodeResult> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "address": address, "hint": hint });
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_geocode_response(json)
}

fn parse_geocode_response(json: Value) -> Result<GeocodeResult> {
	let point = json
		.get("coordinates")
		.or_else(|| json.get("location"))
		.or_else(|| {
			json.get("results")
				.and_then(|v| v.as_array())
				.and_then(|arr| arr.first())
				.and_then(|first| first.get("geometry"))
				.and_then(|geometry| geometry.get("location"))
		})
		.unwrap_or(&json);
	let latitude = point.get("lat").or_else(|| point.get("latitude")).and_then(|v| v.as_f64());
	let longitude = point
		.get("lng")
		.or_else(|| point.get("lon"))
		.or_else(|| point.get("longitude"))
		.and_then(|v| v.as_f64());
	let coordinates = match (latitude, longitude) {
		(Some(latitude), Some(longitude)) => Some((latitude, longitude)),
		_ => None,
	};
	let confidence = json
		.get("confidence")
		.or_else(|| json.get("score"))
		.and_then(|v| v.as_f64())
		.map(|v| v as f32)
		.unwrap_or(if coordinates.is_some() { 0.5 } else { 0.0 });

	if !(0.0..=1.0).contains(&confidence) {
		return Err(Error::InvalidResponse {
			message: "Geocode confidence must be in the range 0.0-1.0.".to_string(),
		});
	}

	Ok(GeocodeResult { coordinates, confidence })
}
