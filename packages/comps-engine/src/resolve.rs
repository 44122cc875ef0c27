use std::{
	collections::HashMap,
	sync::Mutex,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::CompsEngine;
use comps_domain::{cachegate, property::PropertyRecord};
use comps_providers::completion::LocationExtraction;

/// How a resolution was produced. Cache hits return the stored producing
/// method, so repeated resolutions are indistinguishable from the first.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
	Completion,
	Fallback,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResolvedLocation {
	pub label: String,
	pub coordinates: Option<(f64, f64)>,
	pub confidence: f32,
	pub method: ResolutionMethod,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LocationCacheEntry {
	pub label: String,
	pub landmarks: Vec<String>,
	pub proximity: Vec<String>,
	pub confidence: f32,
	pub method: ResolutionMethod,
	pub coordinates: Option<(f64, f64)>,
}
impl LocationCacheEntry {
	fn to_resolved(&self) -> ResolvedLocation {
		ResolvedLocation {
			label: self.label.clone(),
			coordinates: self.coordinates,
			confidence: self.confidence,
			method: self.method,
		}
	}
}

/// The two in-process cache tiers. Concurrent writers to the same key may
/// race; entries are derived deterministically from the same inputs, so the
/// last write winning is acceptable.
#[derive(Default)]
pub(crate) struct LocationCaches {
	by_description: Mutex<HashMap<String, LocationCacheEntry>>,
	by_development: Mutex<HashMap<(String, String), LocationCacheEntry>>,
}

impl CompsEngine {
	/// Best-effort location resolution. Strategies run in order and the first
	/// hit wins; every failure path degrades to the basic district/city
	/// result, so this never errors.
	pub async fn resolve_location(&self, property: &PropertyRecord) -> ResolvedLocation {
		if let Some(resolved) = self.from_permanent_store(property).await {
			return resolved;
		}
		if let Some(resolved) = self.from_description_cache(property) {
			return resolved;
		}
		if let Some(resolved) = self.from_development_cache(property) {
			return resolved;
		}
		if let Some(resolved) = self.from_completion(property).await {
			return resolved;
		}

		self.fallback_resolution(property)
	}

	async fn from_permanent_store(&self, property: &PropertyRecord) -> Option<ResolvedLocation> {
		let store = self.permanent.as_ref()?;
		let payload = match store.fetch(&property.reference).await {
			Ok(payload) => payload?,
			Err(err) => {
				warn!(reference = %property.reference, %err, "Permanent cache read failed.");

				return None;
			},
		};

		// A malformed payload is a cache miss, not an error.
		parse_permanent_payload(&payload)
	}

	fn from_description_cache(&self, property: &PropertyRecord) -> Option<ResolvedLocation> {
		let description = property.description.as_deref()?;
		let key = description_key(description);
		let cache = self.caches.by_description.lock().unwrap_or_else(|err| err.into_inner());

		cache.get(&key).map(LocationCacheEntry::to_resolved)
	}

	fn from_development_cache(&self, property: &PropertyRecord) -> Option<ResolvedLocation> {
		let key = development_key(property)?;
		let cache = self.caches.by_development.lock().unwrap_or_else(|err| err.into_inner());

		cache.get(&key).map(LocationCacheEntry::to_resolved)
	}

	async fn from_completion(&self, property: &PropertyRecord) -> Option<ResolvedLocation> {
		let description = property.description.as_deref()?;
		let _permit = match self.completion_permits.acquire().await {
			Ok(permit) => permit,
			Err(_) => return None,
		};
		let extraction = match self
			.providers
			.completion
			.extract_location(&self.cfg.providers.completion, &self.cfg.resolver, description)
			.await
		{
			Ok(extraction) => extraction,
			Err(err) => {
				warn!(reference = %property.reference, %err, "Completion call failed.");

				return None;
			},
		};
		let label = match extraction.location.as_deref() {
			Some(label) if extraction.has_specific => label.trim().to_string(),
			_ => return None,
		};

		if let Err(code) = cachegate::validate_label(&label, &self.cfg.resolver.known_places) {
			warn!(
				reference = %property.reference,
				?code,
				"Rejected completion label."
			);

			return None;
		}

		let confidence = f32::from(extraction.confidence) / 10.0;
		let coordinates = self.geocode_label(property, &label).await;
		let entry = LocationCacheEntry {
			label,
			landmarks: extraction.landmarks.clone(),
			proximity: extraction.proximity.clone(),
			confidence,
			method: ResolutionMethod::Completion,
			coordinates,
		};

		self.write_through(property, description, &entry, &extraction).await;

		Some(entry.to_resolved())
	}

	async fn geocode_label(&self, property: &PropertyRecord, label: &str) -> Option<(f64, f64)> {
		if property.coordinates.is_some() {
			return property.coordinates;
		}

		let hint = property.city.as_deref().or(property.district.as_deref());

		match self
			.providers
			.geocode
			.geocode(&self.cfg.providers.geocoding, label, hint)
			.await
		{
			Ok(result) => result.coordinates,
			Err(err) => {
				warn!(reference = %property.reference, %err, "Geocode call failed.");

				None
			},
		}
	}

	async fn write_through(
		&self,
		property: &PropertyRecord,
		description: &str,
		entry: &LocationCacheEntry,
		extraction: &LocationExtraction,
	) {
		{
			let mut cache =
				self.caches.by_description.lock().unwrap_or_else(|err| err.into_inner());

			cache.insert(description_key(description), entry.clone());
		}

		if cachegate::shared_key_write_allowed(
			entry.confidence,
			entry.landmarks.len(),
			entry.proximity.len(),
		) && let Some(key) = development_key(property)
		{
			let mut cache =
				self.caches.by_development.lock().unwrap_or_else(|err| err.into_inner());

			cache.insert(key, entry.clone());
		}

		// Promotion only happens on the description-hash path, which is the
		// path this write-through serves.
		if cachegate::permanent_write_allowed(entry.confidence)
			&& let Some(store) = self.permanent.as_ref()
		{
			let payload = permanent_payload(entry, extraction);

			if let Err(err) = store.store(&property.reference, payload, entry.confidence).await {
				warn!(reference = %property.reference, %err, "Permanent cache write failed.");
			}
		}
	}

	fn fallback_resolution(&self, property: &PropertyRecord) -> ResolvedLocation {
		let label = property
			.district
			.clone()
			.or_else(|| property.city.clone())
			.or_else(|| property.province.clone())
			.unwrap_or_default();

		ResolvedLocation {
			label,
			coordinates: property.coordinates,
			confidence: self.cfg.resolver.fallback_confidence,
			method: ResolutionMethod::Fallback,
		}
	}
}

fn description_key(description: &str) -> String {
	blake3::hash(description.trim().to_lowercase().as_bytes()).to_hex().to_string()
}

fn development_key(property: &PropertyRecord) -> Option<(String, String)> {
	let development = property.development.as_deref()?;
	let district = property.district.as_deref()?;

	Some((development.trim().to_lowercase(), district.trim().to_lowercase()))
}

fn permanent_payload(entry: &LocationCacheEntry, extraction: &LocationExtraction) -> Value {
	serde_json::json!({
		"permanent_cache": true,
		"location": entry.label,
		"landmarks": entry.landmarks,
		"proximity": entry.proximity,
		"confidence": entry.confidence,
		"method": entry.method,
		"coordinates": entry.coordinates,
		"condition": extraction.condition,
		"reason": extraction.reason,
	})
}

fn parse_permanent_payload(payload: &Value) -> Option<ResolvedLocation> {
	if payload.get("permanent_cache").and_then(Value::as_bool) != Some(true) {
		return None;
	}

	let label = payload.get("location").and_then(Value::as_str)?.to_string();
	let confidence = payload.get("confidence").and_then(Value::as_f64)? as f32;
	let method = payload
		.get("method")
		.cloned()
		.and_then(|value| serde_json::from_value(value).ok())
		.unwrap_or(ResolutionMethod::Completion);
	let coordinates = payload
		.get("coordinates")
		.cloned()
		.and_then(|value| serde_json::from_value::<Option<(f64, f64)>>(value).ok())
		.flatten();

	Some(ResolvedLocation { label, coordinates, confidence, method })
}
