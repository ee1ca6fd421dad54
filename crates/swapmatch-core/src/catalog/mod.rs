//! Relational catalog access.
//!
//! The pipeline only ever talks to the catalog through [`CatalogStore`], so
//! tests can substitute an in-memory implementation. The batch methods issue
//! at most one query per data kind no matter how many SKUs are requested.

pub mod error;
pub mod mysql;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::CatalogError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockCatalog;
pub use mysql::MySqlCatalog;

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::domain::{CategoryPair, ProductRecord};

/// A product with its descriptive extras, as fed to the vector index.
#[derive(Debug, Clone)]
pub struct IndexableProduct {
    pub record: ProductRecord,
    pub bullets: Vec<String>,
    pub specs: BTreeMap<String, String>,
}

/// Read interface onto the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Full product rows for `skus`, returned in the same order as `skus`.
    /// Unknown SKUs are omitted, not errors.
    async fn products_by_skus(&self, skus: &[String]) -> Result<Vec<ProductRecord>, CatalogError>;

    /// Feature bullets keyed by SKU, each list in display order.
    async fn bullets_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, Vec<String>>, CatalogError>;

    /// Specification name/value pairs keyed by SKU.
    async fn specs_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, BTreeMap<String, String>>, CatalogError>;

    /// Distinct (supercategory, category) pairs, ordered.
    async fn categories(&self) -> Result<Vec<CategoryPair>, CatalogError>;

    /// All active products with bullets and specs attached, for indexing.
    async fn products_for_indexing(&self) -> Result<Vec<IndexableProduct>, CatalogError>;
}
