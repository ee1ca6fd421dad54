//! The substitution pipeline: cached retrieval, cached ranking, enrichment
//! and pricing, with progress streamed to the caller as ordered events.

pub mod event;


pub use event::{PipelineEvent, Stage};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};

use crate::cache::TtlCache;
use crate::catalog::{CatalogError, CatalogStore};
use crate::domain::{
    Candidate, EnrichedSubstitute, RankedSubstitute, RequestPricing, SourceItem,
    SubstitutionResult, round2,
};
use crate::fingerprint::{ranking_fingerprint, retrieval_fingerprint};
use crate::ranking::{Ranker, RankingBackend, RankingError};
use crate::retrieval::{Retriever, RetrievalError, VectorSearch};

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Candidates fetched from the vector index per request.
    pub candidate_pool: usize,
    /// Maximum substitutes returned per request.
    pub max_substitutes: usize,
    /// TTL for both result caches. `Duration::ZERO` disables caching.
    pub cache_ttl: Duration,
}

#[derive(Debug, Error)]
/// Failures that terminate a request.
pub enum PipelineError {
    /// The category pair was missing. Callers are expected to validate this
    /// before streaming starts; the pipeline re-checks so it can never run
    /// a retrieval for an invalid item.
    #[error("both supercategory and category are required")]
    MissingCategory,

    /// The retrieval collaborator failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// The ranking collaborator failed or returned malformed data.
    #[error("ranking failed: {0}")]
    Ranking(#[from] RankingError),

    /// The enrichment fetch failed.
    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),

    /// The caller went away; remaining work is abandoned.
    #[error("request stream closed by caller")]
    Cancelled,
}

/// Turns a validated request into a ranked, priced, enriched result.
///
/// All collaborators are injected at construction; the only state shared
/// across requests is the pair of TTL caches.
pub struct SubstitutionPipeline {
    catalog: Arc<dyn CatalogStore>,
    retriever: Retriever,
    ranker: Ranker,
    retrieval_cache: TtlCache<Vec<Candidate>>,
    ranking_cache: TtlCache<Vec<RankedSubstitute>>,
    candidate_pool: usize,
}

impl SubstitutionPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        index: Arc<dyn VectorSearch>,
        backend: Arc<dyn RankingBackend>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            catalog,
            retriever: Retriever::new(index),
            ranker: Ranker::new(backend, options.max_substitutes),
            retrieval_cache: TtlCache::new(options.cache_ttl),
            ranking_cache: TtlCache::new(options.cache_ttl),
            candidate_pool: options.candidate_pool,
        }
    }

    /// Runs the pipeline for `item`, pushing events into `events` in order
    /// and ending with exactly one terminal result or error event. The
    /// channel is closed when this returns.
    pub async fn run(&self, item: SourceItem, events: UnboundedSender<PipelineEvent>) {
        match self.execute(item, &events).await {
            Ok(result) => {
                let _ = events.send(PipelineEvent::Result { result });
            }
            Err(PipelineError::Cancelled) => {
                debug!("caller disconnected mid-stream; discarding result");
            }
            Err(e) => {
                error!(error = %e, "substitution pipeline failed");
                let _ = events.send(PipelineEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    async fn execute(
        &self,
        item: SourceItem,
        events: &UnboundedSender<PipelineEvent>,
    ) -> Result<SubstitutionResult, PipelineError> {
        if !item.has_category_pair() {
            return Err(PipelineError::MissingCategory);
        }

        let query_text = item.query_text();

        emit(events, Stage::Searching, "Searching the catalog for similar products...")?;
        let retrieval_key =
            retrieval_fingerprint(&query_text, &item.supercategory, &item.category);
        let candidates = match self.retrieval_cache.get(retrieval_key) {
            Some(cached) => {
                debug!(fingerprint = retrieval_key, "retrieval cache hit");
                cached
            }
            None => {
                let found = self
                    .retriever
                    .search(
                        &query_text,
                        &item.supercategory,
                        &item.category,
                        "",
                        self.candidate_pool,
                    )
                    .await?;
                self.retrieval_cache.insert(retrieval_key, found.clone());
                found
            }
        };

        if candidates.is_empty() {
            // A category pair with nothing indexed is a legitimate terminal
            // outcome, not an error.
            return Ok(SubstitutionResult {
                message: Some(format!(
                    "No candidate products found in '{} > {}'.",
                    item.supercategory, item.category
                )),
                candidates_evaluated: None,
                substitutes: Vec::new(),
                source_item: item,
            });
        }
        emit(
            events,
            Stage::SearchDone,
            format!("Found {} candidate products.", candidates.len()),
        )?;

        emit(events, Stage::Ranking, "Ranking candidates for fit and value...")?;
        let ranking_key = ranking_fingerprint(&item);
        let ranked = match self.ranking_cache.get(ranking_key) {
            Some(cached) => {
                debug!(fingerprint = ranking_key, "ranking cache hit");
                cached
            }
            None => {
                let ranked = self.ranker.rank(&item, &candidates).await?;
                self.ranking_cache.insert(ranking_key, ranked.clone());
                ranked
            }
        };
        emit(
            events,
            Stage::RankingDone,
            format!("Selected {} substitutes.", ranked.len()),
        )?;

        emit(events, Stage::Enriching, "Pricing substitutes against the catalog...")?;
        let substitutes = self.enrich(&item, &ranked).await?;

        Ok(SubstitutionResult {
            candidates_evaluated: Some(candidates.len()),
            substitutes,
            message: None,
            source_item: item,
        })
    }

    /// Merges ranked substitutes with catalog data and derives pricing.
    ///
    /// Each data kind is fetched in one batch call, then the original rank
    /// sequence is walked explicitly so output order always matches the
    /// ranking; this is a documented invariant, not an iteration accident.
    /// A substitute whose
    /// SKU is missing from the catalog (stale index entry) is dropped.
    async fn enrich(
        &self,
        item: &SourceItem,
        ranked: &[RankedSubstitute],
    ) -> Result<Vec<EnrichedSubstitute>, PipelineError> {
        let skus: Vec<String> = ranked.iter().map(|s| s.sku.clone()).collect();

        let products = self.catalog.products_by_skus(&skus).await?;
        let mut bullets = self.catalog.bullets_by_skus(&skus).await?;
        let mut specs = self.catalog.specs_by_skus(&skus).await?;

        let mut by_sku: HashMap<String, _> =
            products.into_iter().map(|p| (p.sku.clone(), p)).collect();

        let pricing = RequestPricing::from_item(item);

        let mut enriched = Vec::with_capacity(ranked.len());
        for substitute in ranked {
            let Some(product) = by_sku.remove(&substitute.sku) else {
                warn!(sku = %substitute.sku, "ranked substitute missing from catalog; dropping");
                continue;
            };

            let our_unit_price = product.unit_price();
            let our_total_spend = round2(substitute.qty_needed as f64 * our_unit_price);

            let (their_unit_price, their_total_spend, savings, savings_percentage) =
                if pricing.available {
                    let savings = round2(pricing.total_spend - our_total_spend);
                    let percentage = if pricing.total_spend != 0.0 {
                        round2(savings / pricing.total_spend * 100.0)
                    } else {
                        0.0
                    };
                    (
                        Some(pricing.unit_price),
                        Some(round2(pricing.total_spend)),
                        Some(savings),
                        Some(percentage),
                    )
                } else {
                    (None, None, None, None)
                };

            enriched.push(EnrichedSubstitute {
                rank: substitute.rank,
                reason: substitute.reason.clone(),
                unit_type: substitute.unit_type,
                qty_needed: substitute.qty_needed,
                comparison_notes: substitute.comparison_notes.clone(),
                sku: substitute.sku.clone(),
                product_name: product.name.clone(),
                brand_name: product.brand_name.clone(),
                candidate_uom: product.uom_display(),
                our_unit_price,
                our_total_spend,
                their_unit_price,
                their_total_spend,
                savings,
                savings_percentage,
                bullets: bullets.remove(&substitute.sku).unwrap_or_default(),
                specs: specs.remove(&substitute.sku).unwrap_or_default(),
                product_details: product,
            });
        }

        Ok(enriched)
    }
}

fn emit(
    events: &UnboundedSender<PipelineEvent>,
    stage: Stage,
    message: impl Into<String>,
) -> Result<(), PipelineError> {
    events
        .send(PipelineEvent::Status {
            stage,
            message: message.into(),
        })
        .map_err(|_| PipelineError::Cancelled)
}
