use std::sync::Arc;

use comps_catalog::{db::Db, index::CatalogIndex};
use comps_engine::{CompsEngine, Providers};

#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<CompsEngine>,
}
impl AppState {
	pub async fn new(config: comps_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let records = db.load_catalog().await?;

		tracing::info!(listings = records.len(), "Catalog loaded.");

		let catalog = CatalogIndex::build(records);
		let engine = CompsEngine::new(config, catalog, Providers::default_stack())
			.with_permanent_store(Arc::new(db));

		Ok(Self { engine: Arc::new(engine) })
	}
}
