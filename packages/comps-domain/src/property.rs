use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
	Sale,
	ShortLet,
	LongLet,
}
impl TransactionType {
	/// Resolves the raw listing flags into a single transaction type.
	///
	/// A listing must be sale-only or rental-only. Listings carrying both a sale
	/// flag and a rental flag are unclassifiable and return `None`; listings with
	/// no rental flag but a rental price are treated as long-term.
	pub fn from_flags(
		is_sale: bool,
		is_short_term: bool,
		is_long_term: bool,
		has_rental_price: bool,
	) -> Option<Self> {
		if is_sale {
			if is_short_term || is_long_term {
				return None;
			}

			return Some(Self::Sale);
		}
		if is_short_term {
			return Some(Self::ShortLet);
		}
		if is_long_term || has_rental_price {
			return Some(Self::LongLet);
		}

		None
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Sale => "sale",
			Self::ShortLet => "short_let",
			Self::LongLet => "long_let",
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
	Excellent,
	Good,
	Fair,
	NeedsRenovation,
	NewBuild,
}
impl Condition {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
			"excellent" => Some(Self::Excellent),
			"good" => Some(Self::Good),
			"fair" => Some(Self::Fair),
			"needs_renovation" | "renovation" | "to_renovate" => Some(Self::NeedsRenovation),
			"new_build" | "new" | "new_construction" => Some(Self::NewBuild),
			_ => None,
		}
	}

	/// Position on the ordered scale, used only for distance-based scoring.
	fn ordinal(&self) -> u8 {
		match self {
			Self::Excellent => 0,
			Self::Good => 1,
			Self::Fair => 2,
			Self::NeedsRenovation => 3,
			Self::NewBuild => 4,
		}
	}

	pub fn steps_from(&self, other: Condition) -> u8 {
		self.ordinal().abs_diff(other.ordinal())
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::Excellent => "Excellent",
			Self::Good => "Good",
			Self::Fair => "Fair",
			Self::NeedsRenovation => "Needs Renovation",
			Self::NewBuild => "New Build",
		}
	}
}

/// Canonical catalog record. Produced once at the ingestion boundary; the
/// matching engine never sees any other listing shape.
#[derive(Clone, Debug)]
pub struct PropertyRecord {
	pub reference: String,
	pub transaction: TransactionType,
	pub category: String,
	pub address: String,
	pub street: Option<String>,
	pub development: Option<String>,
	pub district: Option<String>,
	pub city: Option<String>,
	pub province: Option<String>,
	pub bedrooms: u32,
	pub bathrooms: u32,
	pub build_area: f64,
	pub plot_area: f64,
	pub terrace_area: f64,
	/// Effective price: sale price, monthly price for long lets, weekly price
	/// for short lets.
	pub price: f64,
	pub condition: Condition,
	pub features: BTreeSet<String>,
	pub listed_at: OffsetDateTime,
	pub coordinates: Option<(f64, f64)>,
	pub images: Vec<String>,
	pub description: Option<String>,
}

const FEATURE_LABELS: &[(&str, &str)] = &[
	("air_conditioning", "Air Conditioning"),
	("garage", "Garage"),
	("garden", "Garden"),
	("gated", "Gated Community"),
	("gym", "Gym"),
	("heating", "Central Heating"),
	("lift", "Lift"),
	("parking", "Parking"),
	("pool", "Swimming Pool"),
	("private_pool", "Private Pool"),
	("sauna", "Sauna"),
	("sea_views", "Sea Views"),
	("storage", "Storage Room"),
	("terrace", "Terrace"),
];

/// Human-readable label for an amenity code. Unknown codes are title-cased.
pub fn feature_label(code: &str) -> String {
	if let Some((_, label)) = FEATURE_LABELS.iter().find(|(known, _)| *known == code) {
		return (*label).to_string();
	}

	code.split('_')
		.filter(|part| !part.is_empty())
		.map(|part| {
			let mut chars = part.chars();

			match chars.next() {
				Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}
