//! Substitute ranking through a schema-constrained reasoning call.
//!
//! [`RankingBackend`] is the collaborator boundary. [`Ranker`] owns what the
//! collaborator cannot be trusted with: prompt construction and strict
//! validation of the response against the output contract.

pub mod error;
pub mod gemini;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::RankingError;
pub use gemini::GeminiBackend;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRankingBackend;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::{Candidate, RankedSubstitute, SourceItem};

/// Schema-constrained ranking call; returns the raw JSON text.
#[async_trait]
pub trait RankingBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RankingError>;
}

#[derive(Deserialize)]
struct RankingResponse {
    substitutes: Vec<RankedSubstitute>,
}

/// Orchestrates the ranking call and validates the response.
pub struct Ranker {
    backend: Arc<dyn RankingBackend>,
    max_substitutes: usize,
}

impl Ranker {
    pub fn new(backend: Arc<dyn RankingBackend>, max_substitutes: usize) -> Self {
        Self {
            backend,
            max_substitutes,
        }
    }

    /// Ranks `candidates` against `item`, returning at most the configured
    /// maximum of substitutes, sorted by rank.
    ///
    /// Any response missing a required field, carrying a non-positive
    /// quantity, or with duplicate or non-contiguous ranks is rejected as
    /// malformed.
    pub async fn rank(
        &self,
        item: &SourceItem,
        candidates: &[Candidate],
    ) -> Result<Vec<RankedSubstitute>, RankingError> {
        let prompt = build_prompt(item, candidates, self.max_substitutes);
        let raw = self.backend.generate(&prompt).await?;

        let response: RankingResponse = serde_json::from_str(&raw)
            .map_err(|e| RankingError::MalformedResponse(format!("invalid JSON: {e}")))?;

        validate_substitutes(response.substitutes, self.max_substitutes)
    }
}

fn validate_substitutes(
    mut substitutes: Vec<RankedSubstitute>,
    max: usize,
) -> Result<Vec<RankedSubstitute>, RankingError> {
    if substitutes.len() > max {
        return Err(RankingError::MalformedResponse(format!(
            "{} substitutes returned, limit is {max}",
            substitutes.len()
        )));
    }

    for substitute in &substitutes {
        if substitute.sku.trim().is_empty() {
            return Err(RankingError::MalformedResponse("empty sku".to_string()));
        }
        if substitute.qty_needed == 0 {
            return Err(RankingError::MalformedResponse(format!(
                "qty_needed for '{}' must be a positive integer",
                substitute.sku
            )));
        }
    }

    substitutes.sort_by_key(|s| s.rank);
    for (position, substitute) in substitutes.iter().enumerate() {
        let expected = (position + 1) as u32;
        if substitute.rank != expected {
            return Err(RankingError::MalformedResponse(format!(
                "ranks must be unique and contiguous starting at 1; \
                 found rank {} at position {expected}",
                substitute.rank
            )));
        }
    }

    Ok(substitutes)
}

fn build_prompt(item: &SourceItem, candidates: &[Candidate], max: usize) -> String {
    let candidates_info = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("--- Candidate {} (SKU: {}) ---\n{}", i + 1, c.sku, c.document))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are a product substitution expert for an office/industrial supply company.

A user wants to find substitutes for a product they are currently buying.

SOURCE ITEM (user-provided):
- Name: {name}
- Description: {description}
- Supercategory: {supercategory}
- Category: {category}
- Quantity Needed: {quantity} {quantity_unit}

CANDIDATE PRODUCTS FROM OUR CATALOG:
{candidates_info}

CRITICAL RULES FOR UNIT COMPARISON:

1. CLASSIFY each product attribute as DIVISIBLE or ABSOLUTE:
   - DIVISIBLE units CAN be scaled/split: sheets, pages, rolls, feet, inches, yards, meters, ml, oz, lbs, sq ft, etc.
   - ABSOLUTE units CANNOT be scaled: tabs (in a folder), compartments, drawers, holes, ports, pockets, dividers, slots, buttons, keys, etc.

2. For ABSOLUTE attributes:
   - A 24-tab folder is NOT comparable to a 12-tab folder by doing 24/12 ratio. They are fundamentally different products.
   - The candidate MUST have the SAME or very similar absolute spec to be a valid substitute.
   - Do NOT include candidates with mismatched absolute specs.

3. For DIVISIBLE units, calculate qty_needed (always round UP to next whole number):
   - Example: User buys 500 sheets. Candidate sells 5000 sheets/case.
     qty_needed = ceil(500 / 5000) = 1 unit needed
   - Example: User buys 2000 sheets. Candidate sells 500 sheets/ream.
     qty_needed = ceil(2000 / 500) = 4 units needed
   - For dimensional products, CONVERT to common base units first:
     * feet -> inches (x12), yards -> inches (x36), meters -> inches (x39.37), cm -> inches (x0.3937)

4. RANKING priority:
   a. Functional match (same purpose, matching absolute specs)
   b. Value (lower total spend = qty_needed * candidate_price)
   c. Brand/quality similarity

Return the top {max} best substitutes. If fewer are suitable, return fewer. Do NOT pad with unsuitable products."#,
        name = item.name,
        description = item.description,
        supercategory = item.supercategory,
        category = item.category,
        quantity = item.quantity,
        quantity_unit = item.quantity_unit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidateMetadata, UnitKind};

    fn item() -> SourceItem {
        SourceItem {
            name: "Copy Paper".to_string(),
            description: "8.5x11".to_string(),
            supercategory: "Office Supplies".to_string(),
            category: "Paper".to_string(),
            quantity: 2000.0,
            quantity_unit: "sheets".to_string(),
            unit_price: 0.0,
            total_price: 0.0,
        }
    }

    fn candidate(sku: &str) -> Candidate {
        Candidate {
            sku: sku.to_string(),
            score: 0.4,
            metadata: CandidateMetadata {
                supercategory: "Office Supplies".to_string(),
                category: "Paper".to_string(),
                class: String::new(),
                brand_name: String::new(),
                web_price: 8.99,
                uom: "Ream".to_string(),
                uom_qty: 500,
                name: "Recycled Paper".to_string(),
            },
            document: "Product: Recycled Paper\nUOM: 500 Ream".to_string(),
        }
    }

    fn response_json(entries: &[(&str, u32, u32)]) -> String {
        let substitutes: Vec<serde_json::Value> = entries
            .iter()
            .map(|(sku, rank, qty)| {
                serde_json::json!({
                    "sku": sku,
                    "rank": rank,
                    "reason": "close functional match",
                    "unit_type": "DIVISIBLE",
                    "qty_needed": qty,
                    "comparison_notes": "2000 / 500 = 4",
                })
            })
            .collect();
        serde_json::json!({ "substitutes": substitutes }).to_string()
    }

    #[tokio::test]
    async fn valid_response_is_sorted_by_rank() {
        let backend = Arc::new(MockRankingBackend::with_response(response_json(&[
            ("B", 2, 1),
            ("A", 1, 4),
        ])));
        let ranker = Ranker::new(backend, 5);

        let ranked = ranker.rank(&item(), &[candidate("A"), candidate("B")]).await.unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].sku, "A");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].qty_needed, 4);
        assert_eq!(ranked[0].unit_type, UnitKind::Divisible);
        assert_eq!(ranked[1].sku, "B");
    }

    #[tokio::test]
    async fn missing_field_is_malformed() {
        let backend = Arc::new(MockRankingBackend::with_response(
            r#"{"substitutes": [{"sku": "A", "rank": 1}]}"#.to_string(),
        ));
        let ranker = Ranker::new(backend, 5);

        let err = ranker.rank(&item(), &[candidate("A")]).await.unwrap_err();
        assert!(matches!(err, RankingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn zero_qty_needed_is_malformed() {
        let backend = Arc::new(MockRankingBackend::with_response(response_json(&[("A", 1, 0)])));
        let ranker = Ranker::new(backend, 5);

        let err = ranker.rank(&item(), &[candidate("A")]).await.unwrap_err();
        assert!(matches!(err, RankingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn duplicate_ranks_are_malformed() {
        let backend = Arc::new(MockRankingBackend::with_response(response_json(&[
            ("A", 1, 1),
            ("B", 1, 1),
        ])));
        let ranker = Ranker::new(backend, 5);

        let err = ranker.rank(&item(), &[candidate("A"), candidate("B")]).await.unwrap_err();
        assert!(matches!(err, RankingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn ranks_not_starting_at_one_are_malformed() {
        let backend = Arc::new(MockRankingBackend::with_response(response_json(&[
            ("A", 2, 1),
            ("B", 3, 1),
        ])));
        let ranker = Ranker::new(backend, 5);

        let err = ranker.rank(&item(), &[candidate("A"), candidate("B")]).await.unwrap_err();
        assert!(matches!(err, RankingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn overlong_response_is_malformed() {
        let backend = Arc::new(MockRankingBackend::with_response(response_json(&[
            ("A", 1, 1),
            ("B", 2, 1),
            ("C", 3, 1),
        ])));
        let ranker = Ranker::new(backend, 2);

        let err = ranker.rank(&item(), &[candidate("A")]).await.unwrap_err();
        assert!(matches!(err, RankingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn fewer_than_max_is_fine() {
        let backend = Arc::new(MockRankingBackend::with_response(response_json(&[("A", 1, 1)])));
        let ranker = Ranker::new(backend, 5);

        let ranked = ranker.rank(&item(), &[candidate("A"), candidate("B")]).await.unwrap();
        assert_eq!(ranked.len(), 1);
    }

    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let backend = Arc::new(MockRankingBackend::with_response("not json".to_string()));
        let ranker = Ranker::new(backend, 5);

        let err = ranker.rank(&item(), &[candidate("A")]).await.unwrap_err();
        assert!(matches!(err, RankingError::MalformedResponse(_)));
    }

    #[test]
    fn prompt_carries_item_candidates_and_width() {
        let prompt = build_prompt(&item(), &[candidate("A"), candidate("B")], 5);

        assert!(prompt.contains("- Name: Copy Paper"));
        assert!(prompt.contains("- Quantity Needed: 2000 sheets"));
        assert!(prompt.contains("--- Candidate 1 (SKU: A) ---"));
        assert!(prompt.contains("--- Candidate 2 (SKU: B) ---"));
        assert!(prompt.contains("Return the top 5 best substitutes."));
    }
}
