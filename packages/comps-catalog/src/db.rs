use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::warn;

use crate::{Result, models::PropertyRow, schema};
use comps_domain::property::PropertyRecord;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &comps_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 9_220_353;
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	/// Loads every stored listing and normalizes it into the canonical record.
	/// Rows that violate the transaction-flag constraint or miss required
	/// fields are skipped with a warning rather than failing the load.
	pub async fn load_catalog(&self) -> Result<Vec<PropertyRecord>> {
		let rows: Vec<PropertyRow> = sqlx::query_as::<_, PropertyRow>(
			"\
SELECT
	reference,
	is_sale,
	is_short_term,
	is_long_term,
	category,
	address,
	street,
	development,
	district,
	city,
	province,
	bedrooms,
	bathrooms,
	build_area,
	plot_area,
	terrace_area,
	sale_price,
	monthly_price,
	weekly_price,
	condition,
	features,
	listed_at,
	latitude,
	longitude,
	images,
	description
FROM properties",
		)
		.fetch_all(&self.pool)
		.await?;
		let mut records = Vec::with_capacity(rows.len());

		for row in rows {
			let reference = row.reference.clone();

			match row.normalize() {
				Some(record) => records.push(record),
				None => {
					warn!(reference, "Skipping listing that does not normalize.");
				},
			}
		}

		Ok(records)
	}

	/// Permanent location-cache lookup by listing reference. The payload is
	/// returned as stored; callers treat malformed payloads as misses.
	pub async fn fetch_permanent_location(&self, reference: &str) -> Result<Option<Value>> {
		let payload: Option<(Value,)> =
			sqlx::query_as("SELECT payload FROM location_cache WHERE reference = $1")
				.bind(reference)
				.fetch_optional(&self.pool)
				.await?;

		Ok(payload.map(|(value,)| value))
	}

	/// Best-effort permanent write. Last write wins; entries are derived
	/// deterministically from the same inputs, so an overwrite is harmless.
	pub async fn store_permanent_location(
		&self,
		reference: &str,
		payload: &Value,
		confidence: f32,
	) -> Result<()> {
		sqlx::query(
			"\
INSERT INTO location_cache (reference, payload, confidence)
VALUES ($1, $2, $3)
ON CONFLICT (reference) DO UPDATE
SET
	payload = EXCLUDED.payload,
	confidence = EXCLUDED.confidence,
	updated_at = now()",
		)
		.bind(reference)
		.bind(payload)
		.bind(confidence)
		.execute(&self.pool)
		.await?;

		Ok(())
	}
}
