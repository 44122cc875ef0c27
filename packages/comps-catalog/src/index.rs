use std::collections::{HashMap, HashSet};

use comps_domain::property::{PropertyRecord, TransactionType};

/// In-memory inverted lists over the catalog. Lookup keys are lower-cased;
/// the transaction partitions are keyed again by city so a candidate set is
/// always the intersection of three lists.
///
/// Transaction intersection is strict: a sale query can never reach a rental
/// partition, relaxed search included.
#[derive(Debug, Default)]
pub struct CatalogIndex {
	records: HashMap<String, PropertyRecord>,
	by_city: HashMap<String, HashSet<String>>,
	by_category: HashMap<String, HashSet<String>>,
	by_transaction: HashMap<TransactionType, HashMap<String, HashSet<String>>>,
}
impl CatalogIndex {
	pub fn build(records: Vec<PropertyRecord>) -> Self {
		let mut index = Self::default();

		for record in records {
			index.insert(record);
		}

		index
	}

	pub fn insert(&mut self, record: PropertyRecord) {
		let reference = record.reference.clone();

		// Records without a city stay retrievable by reference but never join
		// any candidate list.
		if let Some(city) = record.city.as_deref() {
			let city_key = city.to_lowercase();

			self.by_city.entry(city_key.clone()).or_default().insert(reference.clone());
			self.by_transaction
				.entry(record.transaction)
				.or_default()
				.entry(city_key)
				.or_default()
				.insert(reference.clone());
		}

		self.by_category
			.entry(record.category.to_lowercase())
			.or_default()
			.insert(reference.clone());
		self.records.insert(reference, record);
	}

	pub fn get(&self, reference: &str) -> Option<&PropertyRecord> {
		self.records.get(reference)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Intersection of the city list, the category list, and the matching
	/// transaction partition. Returned in reference order so downstream
	/// processing is deterministic.
	pub fn find_candidates(
		&self,
		city: &str,
		category: &str,
		transaction: TransactionType,
	) -> Vec<&PropertyRecord> {
		let city_key = city.to_lowercase();
		let Some(city_list) = self.by_city.get(&city_key) else {
			return Vec::new();
		};
		let Some(category_list) = self.by_category.get(&category.to_lowercase()) else {
			return Vec::new();
		};
		let Some(transaction_list) =
			self.by_transaction.get(&transaction).and_then(|partition| partition.get(&city_key))
		else {
			return Vec::new();
		};
		let mut references: Vec<&String> = city_list
			.iter()
			.filter(|reference| {
				category_list.contains(reference.as_str())
					&& transaction_list.contains(reference.as_str())
			})
			.collect();

		references.sort();

		references.into_iter().filter_map(|reference| self.records.get(reference)).collect()
	}

	/// City and transaction partition only, any category. This is the
	/// last-resort retrieval path; transaction strictness still holds.
	pub fn find_by_city_transaction(
		&self,
		city: &str,
		transaction: TransactionType,
	) -> Vec<&PropertyRecord> {
		let Some(transaction_list) = self
			.by_transaction
			.get(&transaction)
			.and_then(|partition| partition.get(&city.to_lowercase()))
		else {
			return Vec::new();
		};
		let mut references: Vec<&String> = transaction_list.iter().collect();

		references.sort();

		references.into_iter().filter_map(|reference| self.records.get(reference)).collect()
	}
}

#[cfg(test)]
mod tests {
	use comps_testkit::PropertyBuilder;

	use super::*;

	fn index() -> CatalogIndex {
		CatalogIndex::build(vec![
			PropertyBuilder::new("S-1").city("Marbella").category("villa").build(),
			PropertyBuilder::new("S-2").city("Marbella").category("villa").build(),
			PropertyBuilder::new("S-3").city("Marbella").category("apartment").build(),
			PropertyBuilder::new("S-4").city("Estepona").category("villa").build(),
			PropertyBuilder::new("L-1")
				.city("Marbella")
				.category("villa")
				.transaction(TransactionType::LongLet)
				.price(3_000.0)
				.build(),
			PropertyBuilder::new("X-1").category("villa").build(),
		])
	}

	#[test]
	fn intersects_city_category_and_transaction() {
		let index = index();
		let candidates = index.find_candidates("marbella", "villa", TransactionType::Sale);
		let references: Vec<&str> =
			candidates.iter().map(|record| record.reference.as_str()).collect();

		assert_eq!(references, vec!["S-1", "S-2"]);
	}

	#[test]
	fn transaction_partitions_never_mix() {
		let index = index();
		let rentals = index.find_candidates("Marbella", "villa", TransactionType::LongLet);

		assert_eq!(rentals.len(), 1);
		assert_eq!(rentals[0].reference, "L-1");

		let short_lets = index.find_candidates("Marbella", "villa", TransactionType::ShortLet);

		assert!(short_lets.is_empty());
	}

	#[test]
	fn lookup_keys_are_case_insensitive() {
		let index = index();

		assert_eq!(index.find_candidates("MARBELLA", "Villa", TransactionType::Sale).len(), 2);
	}

	#[test]
	fn records_without_a_city_stay_out_of_candidate_lists() {
		let index = index();

		assert!(index.get("X-1").is_some());

		for city in ["marbella", "estepona", ""] {
			let references: Vec<&str> = index
				.find_candidates(city, "villa", TransactionType::Sale)
				.iter()
				.map(|record| record.reference.as_str())
				.collect();

			assert!(!references.contains(&"X-1"));
		}
	}
}
