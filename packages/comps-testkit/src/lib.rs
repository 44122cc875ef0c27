use std::{collections::BTreeSet, env};

use time::{Duration, OffsetDateTime};

use comps_domain::property::{Condition, PropertyRecord, TransactionType};
use comps_providers::completion::LocationExtraction;

/// DSN for tests that need a live Postgres. Absent in normal runs.
pub fn env_dsn() -> Option<String> {
	env::var("COMPS_PG_DSN").ok().filter(|dsn| !dsn.trim().is_empty())
}

/// Fluent builder for canonical catalog records. Defaults describe a plain
/// sale apartment so tests only spell out what they are about.
pub struct PropertyBuilder {
	record: PropertyRecord,
}
impl PropertyBuilder {
	pub fn new(reference: &str) -> Self {
		Self {
			record: PropertyRecord {
				reference: reference.to_string(),
				transaction: TransactionType::Sale,
				category: "apartment".to_string(),
				address: String::new(),
				street: None,
				development: None,
				district: None,
				city: None,
				province: None,
				bedrooms: 2,
				bathrooms: 2,
				build_area: 100.0,
				plot_area: 0.0,
				terrace_area: 0.0,
				price: 300_000.0,
				condition: Condition::Good,
				features: BTreeSet::new(),
				listed_at: OffsetDateTime::now_utc() - Duration::days(120),
				coordinates: None,
				images: Vec::new(),
				description: None,
			},
		}
	}

	pub fn transaction(mut self, transaction: TransactionType) -> Self {
		self.record.transaction = transaction;

		self
	}

	pub fn category(mut self, category: &str) -> Self {
		self.record.category = category.to_lowercase();

		self
	}

	pub fn address(mut self, address: &str) -> Self {
		self.record.address = address.to_string();

		self
	}

	pub fn street(mut self, street: &str) -> Self {
		self.record.street = Some(street.to_string());

		self
	}

	pub fn development(mut self, development: &str) -> Self {
		self.record.development = Some(development.to_string());

		self
	}

	pub fn district(mut self, district: &str) -> Self {
		self.record.district = Some(district.to_string());

		self
	}

	pub fn city(mut self, city: &str) -> Self {
		self.record.city = Some(city.to_string());

		self
	}

	pub fn bedrooms(mut self, bedrooms: u32) -> Self {
		self.record.bedrooms = bedrooms;

		self
	}

	pub fn bathrooms(mut self, bathrooms: u32) -> Self {
		self.record.bathrooms = bathrooms;

		self
	}

	pub fn build_area(mut self, build_area: f64) -> Self {
		self.record.build_area = build_area;

		self
	}

	pub fn plot_area(mut self, plot_area: f64) -> Self {
		self.record.plot_area = plot_area;

		self
	}

	pub fn terrace_area(mut self, terrace_area: f64) -> Self {
		self.record.terrace_area = terrace_area;

		self
	}

	pub fn price(mut self, price: f64) -> Self {
		self.record.price = price;

		self
	}

	pub fn condition(mut self, condition: Condition) -> Self {
		self.record.condition = condition;

		self
	}

	pub fn features(mut self, features: &[&str]) -> Self {
		self.record.features = features.iter().map(|feature| feature.to_string()).collect();

		self
	}

	pub fn listed_days_ago(mut self, days: i64) -> Self {
		self.record.listed_at = OffsetDateTime::now_utc() - Duration::days(days);

		self
	}

	pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
		self.record.coordinates = Some((latitude, longitude));

		self
	}

	pub fn images(mut self, images: &[&str]) -> Self {
		self.record.images = images.iter().map(|image| image.to_string()).collect();

		self
	}

	pub fn description(mut self, description: &str) -> Self {
		self.record.description = Some(description.to_string());

		self
	}

	pub fn build(self) -> PropertyRecord {
		self.record
	}
}

/// A canned high-confidence extraction for resolver tests.
pub fn extraction(location: &str, confidence: u8) -> LocationExtraction {
	LocationExtraction {
		has_specific: true,
		location: Some(location.to_string()),
		landmarks: vec!["Puerto Banus".to_string()],
		proximity: vec!["5 minutes from the golf club".to_string()],
		condition: None,
		confidence,
		reason: "Named development in the description.".to_string(),
	}
}
