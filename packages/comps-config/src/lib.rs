mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CompletionProviderConfig, Config, GeocodingProviderConfig, Matching, Postgres, Providers,
	Resolver, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.resolver.max_concurrent_calls == 0 {
		return Err(Error::Validation {
			message: "resolver.max_concurrent_calls must be greater than zero.".to_string(),
		});
	}
	if cfg.resolver.backoff_base_ms == 0 {
		return Err(Error::Validation {
			message: "resolver.backoff_base_ms must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.resolver.fallback_confidence) {
		return Err(Error::Validation {
			message: "resolver.fallback_confidence must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.matching.target_count == 0 {
		return Err(Error::Validation {
			message: "matching.target_count must be greater than zero.".to_string(),
		});
	}

	for (label, band) in
		[("matching.price_band", cfg.matching.price_band), ("matching.area_band", cfg.matching.area_band)]
	{
		if !band.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&band) || band == 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero and at most 1.0."),
			});
		}
	}

	if !cfg.providers.completion.temperature.is_finite()
		|| cfg.providers.completion.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.completion.temperature must be zero or greater.".to_string(),
		});
	}

	for (label, timeout) in [
		("providers.completion.timeout_ms", cfg.providers.completion.timeout_ms),
		("providers.geocoding.timeout_ms", cfg.providers.geocoding.timeout_ms),
	] {
		if timeout == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	for (label, key) in [
		("completion", &cfg.providers.completion.api_key),
		("geocoding", &cfg.providers.geocoding.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	for (label, model) in [
		("providers.completion.model", &cfg.providers.completion.model),
		("providers.completion.model_rich", &cfg.providers.completion.model_rich),
	] {
		if model.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.resolver.known_places.retain(|place| !place.trim().is_empty());

	for place in &mut cfg.resolver.known_places {
		*place = place.trim().to_lowercase();
	}

	let neighbors = std::mem::take(&mut cfg.matching.neighboring_developments);

	cfg.matching.neighboring_developments = neighbors
		.into_iter()
		.map(|(development, mut adjacent)| {
			for name in &mut adjacent {
				*name = name.trim().to_lowercase();
			}

			adjacent.retain(|name| !name.is_empty());

			(development.trim().to_lowercase(), adjacent)
		})
		.filter(|(development, adjacent)| !development.is_empty() && !adjacent.is_empty())
		.collect();
}
