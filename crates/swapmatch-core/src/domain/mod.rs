//! Request, candidate, and result types for the substitution pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User-supplied description of the product being replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub supercategory: String,
    pub category: String,
    pub quantity: f64,
    #[serde(default)]
    pub quantity_unit: String,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub total_price: f64,
}

impl SourceItem {
    /// Returns `true` when both halves of the category pair are present.
    /// Requests failing this are rejected before any retrieval occurs.
    pub fn has_category_pair(&self) -> bool {
        !self.supercategory.trim().is_empty() && !self.category.trim().is_empty()
    }

    /// Retrieval query text: the name, followed by the description on a new
    /// line when one was given.
    pub fn query_text(&self) -> String {
        if self.description.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{}\n{}", self.name, self.description)
        }
    }
}

/// Indexed payload fields carried back with each retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub supercategory: String,
    pub category: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub web_price: f64,
    #[serde(default)]
    pub uom: String,
    #[serde(default)]
    pub uom_qty: i64,
    #[serde(default)]
    pub name: String,
}

/// One retrieval hit. The score is an opaque ordering key from the vector
/// index; this layer never re-sorts on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub sku: String,
    pub score: f32,
    pub metadata: CandidateMetadata,
    pub document: String,
}

/// Whether a product's quantity unit can be scaled to cover a need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// Scalable units: sheets, feet, ml, oz.
    #[serde(rename = "DIVISIBLE")]
    Divisible,
    /// Fixed structural counts: tabs, slots, ports. Must match outright.
    #[serde(rename = "ABSOLUTE")]
    Absolute,
}

/// The ranking collaborator's judgment for one chosen candidate.
///
/// `rank` values are unique and contiguous starting at 1 within one
/// response; `qty_needed` is a positive integer. Both are enforced by
/// [`crate::ranking::Ranker`] before anything downstream sees the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSubstitute {
    pub sku: String,
    pub rank: u32,
    pub reason: String,
    pub unit_type: UnitKind,
    pub qty_needed: u32,
    pub comparison_notes: String,
}

/// Full catalog row for a product, as served to the wire.
///
/// Price columns are selected with explicit casts so DECIMAL storage decodes
/// as `f64`; the mapping from row to payload is field-by-field, never a
/// runtime type probe.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRecord {
    pub sku: String,
    pub name: String,
    pub short_name: Option<String>,
    pub brand_name: Option<String>,
    pub description: Option<String>,
    pub web_price: Option<f64>,
    pub customer_price: Option<f64>,
    pub uom: Option<String>,
    pub uom_qty: Option<i64>,
    pub manufacturer_name: Option<String>,
    pub review_rating: Option<f64>,
    pub review_count: Option<i64>,
    pub supercategory: Option<String>,
    pub category: Option<String>,
    pub class: Option<String>,
}

impl ProductRecord {
    /// Effective unit price: customer price if present and non-zero, else
    /// list (web) price, else zero.
    pub fn unit_price(&self) -> f64 {
        self.customer_price
            .filter(|p| *p > 0.0)
            .or(self.web_price.filter(|p| *p > 0.0))
            .unwrap_or(0.0)
    }

    /// Display form of the unit of measure, e.g. `"500 Sheets"`.
    pub fn uom_display(&self) -> String {
        format!(
            "{} {}",
            self.uom_qty.unwrap_or(1),
            self.uom.as_deref().unwrap_or("Each")
        )
    }
}

/// A distinct (supercategory, category) pair from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryPair {
    pub supercategory: String,
    pub category: String,
}

/// A ranked substitute merged with catalog data and derived pricing.
/// Built once per request and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedSubstitute {
    pub rank: u32,
    pub reason: String,
    pub unit_type: UnitKind,
    pub qty_needed: u32,
    pub comparison_notes: String,

    pub sku: String,
    pub product_name: String,
    pub brand_name: Option<String>,
    pub candidate_uom: String,
    pub our_unit_price: f64,

    pub our_total_spend: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_total_spend: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_percentage: Option<f64>,

    pub product_details: ProductRecord,
    pub bullets: Vec<String>,
    pub specs: BTreeMap<String, String>,
}

/// Terminal payload for one substitution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionResult {
    pub source_item: SourceItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_evaluated: Option<usize>,
    pub substitutes: Vec<EnrichedSubstitute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What the user currently pays, derived once per request.
#[derive(Debug, Clone, Copy)]
pub struct RequestPricing {
    /// User's stated unit price (0 when not given).
    pub unit_price: f64,
    /// Total spend: the stated total if positive, else unit price x quantity.
    pub total_spend: f64,
    /// Whether any pricing input was supplied at all. When `false`, savings
    /// fields are reported absent, not zero.
    pub available: bool,
}

impl RequestPricing {
    /// Derives pricing from whichever price fields the user provided.
    pub fn from_item(item: &SourceItem) -> Self {
        let unit_price = item.unit_price;
        let mut total_spend = item.total_price;

        if total_spend <= 0.0 && unit_price > 0.0 {
            total_spend = unit_price * item.quantity;
        }

        Self {
            unit_price,
            total_spend,
            available: total_spend > 0.0 || unit_price > 0.0,
        }
    }
}

/// Rounds a currency or percentage value to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
