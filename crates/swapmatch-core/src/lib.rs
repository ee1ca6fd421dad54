//! Swapmatch library crate (used by the server and integration tests).
//!
//! Recommends catalog substitutes for a user-described product and
//! quantifies the cost delta of switching. The exports are organized by
//! module:
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Server configuration
//! - [`SourceItem`], [`Candidate`], [`RankedSubstitute`], [`EnrichedSubstitute`],
//!   [`SubstitutionResult`] - Request and result model
//! - [`SubstitutionPipeline`], [`PipelineEvent`] - The pipeline and its
//!   progress stream
//!
//! ## Shared State
//! - [`TtlCache`] - Fingerprint-keyed result caches
//! - [`QuotaGuard`] - Per-client daily request quota
//!
//! ## Collaborator Boundaries
//! - [`CatalogStore`] / [`MySqlCatalog`] - Relational catalog
//! - [`VectorSearch`] / [`QdrantProductIndex`] - Vector index
//! - [`RankingBackend`] / [`GeminiBackend`] - Ranking model
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod fingerprint;
pub mod pipeline;
pub mod quota;
pub mod ranking;
pub mod retrieval;

pub use cache::TtlCache;
pub use config::{Config, ConfigError};
pub use domain::{
    Candidate, CandidateMetadata, CategoryPair, EnrichedSubstitute, ProductRecord,
    RankedSubstitute, RequestPricing, SourceItem, SubstitutionResult, UnitKind, round2,
};
pub use fingerprint::{ranking_fingerprint, retrieval_fingerprint, sku_point_id};
pub use pipeline::{
    PipelineError, PipelineEvent, PipelineOptions, Stage, SubstitutionPipeline,
};
pub use quota::{QuotaExceeded, QuotaGuard};

pub use catalog::{CatalogError, CatalogStore, IndexableProduct, MySqlCatalog};
#[cfg(any(test, feature = "mock"))]
pub use catalog::MockCatalog;

pub use ranking::{GeminiBackend, RankingBackend, RankingError};
#[cfg(any(test, feature = "mock"))]
pub use ranking::MockRankingBackend;

pub use retrieval::{
    EmbeddingClient, IndexAdmin, QdrantProductIndex, RetrievalError, Retriever, VectorSearch,
    build_document,
};
#[cfg(any(test, feature = "mock"))]
pub use retrieval::MockVectorSearch;
