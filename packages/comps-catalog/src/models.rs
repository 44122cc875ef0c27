use std::collections::BTreeSet;

use serde_json::Value;
use time::OffsetDateTime;

use comps_domain::property::{Condition, PropertyRecord, TransactionType};

/// Raw listing row as stored. Feeds carry arbitrary optional fields and mixed
/// naming, so everything beyond the reference is nullable; `normalize` is the
/// single place that turns this into the canonical record.
#[derive(Debug, sqlx::FromRow)]
pub struct PropertyRow {
	pub reference: String,
	pub is_sale: bool,
	pub is_short_term: bool,
	pub is_long_term: bool,
	pub category: Option<String>,
	pub address: Option<String>,
	pub street: Option<String>,
	pub development: Option<String>,
	pub district: Option<String>,
	pub city: Option<String>,
	pub province: Option<String>,
	pub bedrooms: Option<i32>,
	pub bathrooms: Option<i32>,
	pub build_area: Option<f64>,
	pub plot_area: Option<f64>,
	pub terrace_area: Option<f64>,
	pub sale_price: Option<f64>,
	pub monthly_price: Option<f64>,
	pub weekly_price: Option<f64>,
	pub condition: Option<String>,
	pub features: Value,
	pub listed_at: Option<OffsetDateTime>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub images: Value,
	pub description: Option<String>,
}
impl PropertyRow {
	pub fn normalize(self) -> Option<PropertyRecord> {
		let reference = non_empty(self.reference)?;
		let category = non_empty(self.category?)?.to_lowercase();
		let monthly_price = self.monthly_price.unwrap_or(0.0);
		let weekly_price = self.weekly_price.unwrap_or(0.0);
		let has_rental_price = monthly_price > 0.0 || weekly_price > 0.0;
		let transaction = TransactionType::from_flags(
			self.is_sale,
			self.is_short_term,
			self.is_long_term,
			has_rental_price,
		)?;
		let price = match transaction {
			TransactionType::Sale => self.sale_price.unwrap_or(0.0),
			TransactionType::ShortLet => weekly_price,
			TransactionType::LongLet => monthly_price,
		};
		let coordinates = match (self.latitude, self.longitude) {
			(Some(latitude), Some(longitude)) => Some((latitude, longitude)),
			_ => None,
		};
		let condition = self
			.condition
			.as_deref()
			.and_then(Condition::parse)
			.unwrap_or(Condition::Fair);

		Some(PropertyRecord {
			reference,
			transaction,
			category,
			address: self.address.map(|address| address.trim().to_string()).unwrap_or_default(),
			street: self.street.and_then(non_empty),
			development: self.development.and_then(non_empty),
			district: self.district.and_then(non_empty),
			city: self.city.and_then(non_empty),
			province: self.province.and_then(non_empty),
			bedrooms: self.bedrooms.map(|bedrooms| bedrooms.max(0) as u32).unwrap_or(0),
			bathrooms: self.bathrooms.map(|bathrooms| bathrooms.max(0) as u32).unwrap_or(0),
			build_area: self.build_area.unwrap_or(0.0).max(0.0),
			plot_area: self.plot_area.unwrap_or(0.0).max(0.0),
			terrace_area: self.terrace_area.unwrap_or(0.0).max(0.0),
			price,
			condition,
			features: json_strings(&self.features).into_iter().collect::<BTreeSet<_>>(),
			listed_at: self.listed_at.unwrap_or(OffsetDateTime::UNIX_EPOCH),
			coordinates,
			images: json_strings(&self.images),
			description: self.description.and_then(non_empty),
		})
	}
}

fn non_empty(raw: String) -> Option<String> {
	let trimmed = raw.trim();

	if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn json_strings(value: &Value) -> Vec<String> {
	value
		.as_array()
		.map(|items| {
			items
				.iter()
				.filter_map(|item| item.as_str())
				.map(|item| item.trim().to_lowercase())
				.filter(|item| !item.is_empty())
				.collect()
		})
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row() -> PropertyRow {
		PropertyRow {
			reference: "R-1".to_string(),
			is_sale: true,
			is_short_term: false,
			is_long_term: false,
			category: Some("Villa".to_string()),
			address: Some(" Calle Alta 3, Marbella ".to_string()),
			street: Some("Calle Alta".to_string()),
			development: None,
			district: Some("Nueva Andalucia".to_string()),
			city: Some("Marbella".to_string()),
			province: Some("Malaga".to_string()),
			bedrooms: Some(4),
			bathrooms: Some(3),
			build_area: Some(180.0),
			plot_area: Some(600.0),
			terrace_area: None,
			sale_price: Some(1_250_000.0),
			monthly_price: None,
			weekly_price: None,
			condition: Some("good".to_string()),
			features: serde_json::json!(["Pool", "garden", ""]),
			listed_at: None,
			latitude: Some(36.49),
			longitude: Some(-4.96),
			images: serde_json::json!([]),
			description: Some("South-facing villa near the golf valley.".to_string()),
		}
	}

	#[test]
	fn normalizes_into_the_canonical_shape() {
		let record = row().normalize().expect("Row must normalize.");

		assert_eq!(record.transaction, TransactionType::Sale);
		assert_eq!(record.category, "villa");
		assert_eq!(record.address, "Calle Alta 3, Marbella");
		assert_eq!(record.price, 1_250_000.0);
		assert!(record.features.contains("pool"));
		assert!(record.features.contains("garden"));
		assert_eq!(record.features.len(), 2);
		assert_eq!(record.coordinates, Some((36.49, -4.96)));
	}

	#[test]
	fn conflicting_transaction_flags_drop_the_row() {
		let mut conflicted = row();

		conflicted.is_long_term = true;

		assert!(conflicted.normalize().is_none());
	}

	#[test]
	fn rental_price_without_flags_is_long_term() {
		let mut rental = row();

		rental.is_sale = false;
		rental.sale_price = None;
		rental.monthly_price = Some(2_400.0);

		let record = rental.normalize().expect("Row must normalize.");

		assert_eq!(record.transaction, TransactionType::LongLet);
		assert_eq!(record.price, 2_400.0);
	}

	#[test]
	fn missing_category_drops_the_row() {
		let mut missing = row();

		missing.category = None;

		assert!(missing.normalize().is_none());
	}
}
