use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub resolver: Resolver,
	pub matching: Matching,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	pub bind_localhost_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub completion: CompletionProviderConfig,
	pub geocoding: GeocodingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	/// Default model tier for short, plain descriptions.
	pub model: String,
	/// Richer tier selected for long or toponym-dense descriptions.
	pub model_rich: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resolver {
	/// Toponyms accepted as genuine place names when validating resolved labels.
	pub known_places: Vec<String>,
	pub max_concurrent_calls: u32,
	pub retry_budget: u32,
	pub backoff_base_ms: u64,
	/// Confidence assigned to degraded district/city-only resolutions.
	pub fallback_confidence: f32,
	pub rich_model_min_chars: u32,
	pub rich_model_min_keywords: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Matching {
	pub target_count: u32,
	/// Half-width of the price filter band around the subject price.
	pub price_band: f32,
	/// Half-width of the requested area band around the subject display area.
	pub area_band: f32,
	#[serde(default)]
	pub neighboring_developments: HashMap<String, Vec<String>>,
}
