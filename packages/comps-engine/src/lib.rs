pub mod comparables;
pub mod relax;
pub mod resolve;
pub mod score;
pub mod tiers;
pub mod time_serde;

mod error;

pub use comparables::{Comparable, ComparablesResponse};
pub use error::{Error, Result};
pub use resolve::{LocationCacheEntry, ResolutionMethod, ResolvedLocation};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use tokio::sync::Semaphore;

use comps_catalog::{db::Db, index::CatalogIndex};
use comps_config::{CompletionProviderConfig, Config, GeocodingProviderConfig, Resolver};
use comps_providers::{
	completion::{self, LocationExtraction},
	geocode::{self, GeocodeResult},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn extract_location<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		resolver: &'a Resolver,
		description: &'a str,
	) -> BoxFuture<'a, comps_providers::Result<LocationExtraction>>;
}

pub trait GeocodeProvider
where
	Self: Send + Sync,
{
	fn geocode<'a>(
		&'a self,
		cfg: &'a GeocodingProviderConfig,
		address: &'a str,
		hint: Option<&'a str>,
	) -> BoxFuture<'a, comps_providers::Result<GeocodeResult>>;
}

/// Keyed get/put against persistent storage for high-confidence resolutions.
/// Both calls are best-effort from the engine's point of view.
pub trait PermanentStore
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		reference: &'a str,
	) -> BoxFuture<'a, comps_catalog::Result<Option<Value>>>;

	fn store<'a>(
		&'a self,
		reference: &'a str,
		payload: Value,
		confidence: f32,
	) -> BoxFuture<'a, comps_catalog::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionProvider>,
	pub geocode: Arc<dyn GeocodeProvider>,
}
impl Providers {
	pub fn default_stack() -> Self {
		Self { completion: Arc::new(DefaultProviders), geocode: Arc::new(DefaultProviders) }
	}
}

pub struct CompsEngine {
	pub cfg: Config,
	pub catalog: CatalogIndex,
	pub providers: Providers,
	pub(crate) permanent: Option<Arc<dyn PermanentStore>>,
	pub(crate) caches: resolve::LocationCaches,
	pub(crate) completion_permits: Arc<Semaphore>,
}
impl CompsEngine {
	pub fn new(cfg: Config, catalog: CatalogIndex, providers: Providers) -> Self {
		let permits = cfg.resolver.max_concurrent_calls.max(1) as usize;

		Self {
			cfg,
			catalog,
			providers,
			permanent: None,
			caches: resolve::LocationCaches::default(),
			completion_permits: Arc::new(Semaphore::new(permits)),
		}
	}

	pub fn with_permanent_store(mut self, store: Arc<dyn PermanentStore>) -> Self {
		self.permanent = Some(store);

		self
	}
}

struct DefaultProviders;

impl CompletionProvider for DefaultProviders {
	fn extract_location<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		resolver: &'a Resolver,
		description: &'a str,
	) -> BoxFuture<'a, comps_providers::Result<LocationExtraction>> {
		Box::pin(completion::extract_location(cfg, resolver, description))
	}
}

impl GeocodeProvider for DefaultProviders {
	fn geocode<'a>(
		&'a self,
		cfg: &'a GeocodingProviderConfig,
		address: &'a str,
		hint: Option<&'a str>,
	) -> BoxFuture<'a, comps_providers::Result<GeocodeResult>> {
		Box::pin(geocode::geocode(cfg, address, hint))
	}
}

impl PermanentStore for Db {
	fn fetch<'a>(
		&'a self,
		reference: &'a str,
	) -> BoxFuture<'a, comps_catalog::Result<Option<Value>>> {
		Box::pin(self.fetch_permanent_location(reference))
	}

	fn store<'a>(
		&'a self,
		reference: &'a str,
		payload: Value,
		confidence: f32,
	) -> BoxFuture<'a, comps_catalog::Result<()>> {
		Box::pin(async move { self.store_permanent_location(reference, &payload, confidence).await })
	}
}
