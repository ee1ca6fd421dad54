//! In-memory [`CatalogStore`] for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{CatalogError, CatalogStore, IndexableProduct};
use crate::domain::{CategoryPair, ProductRecord};

/// In-memory catalog with per-method call counters.
#[derive(Default)]
pub struct MockCatalog {
    products: Mutex<HashMap<String, ProductRecord>>,
    bullets: Mutex<HashMap<String, Vec<String>>>,
    specs: Mutex<HashMap<String, BTreeMap<String, String>>>,
    categories: Mutex<Vec<CategoryPair>>,
    product_calls: AtomicUsize,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a minimal product row; tests override the fields they need.
    pub fn product(sku: &str, name: &str, customer_price: Option<f64>) -> ProductRecord {
        ProductRecord {
            sku: sku.to_string(),
            name: name.to_string(),
            short_name: None,
            brand_name: Some("Acme".to_string()),
            description: None,
            web_price: Some(9.99),
            customer_price,
            uom: Some("Ream".to_string()),
            uom_qty: Some(500),
            manufacturer_name: None,
            review_rating: None,
            review_count: None,
            supercategory: Some("Office Supplies".to_string()),
            category: Some("Paper".to_string()),
            class: None,
        }
    }

    pub fn insert_product(&self, record: ProductRecord) {
        self.products.lock().insert(record.sku.clone(), record);
    }

    pub fn insert_bullets(&self, sku: &str, bullets: Vec<String>) {
        self.bullets.lock().insert(sku.to_string(), bullets);
    }

    pub fn insert_specs(&self, sku: &str, specs: BTreeMap<String, String>) {
        self.specs.lock().insert(sku.to_string(), specs);
    }

    pub fn set_categories(&self, pairs: Vec<CategoryPair>) {
        *self.categories.lock() = pairs;
    }

    /// Number of `products_by_skus` calls observed.
    pub fn product_call_count(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogStore for MockCatalog {
    async fn products_by_skus(&self, skus: &[String]) -> Result<Vec<ProductRecord>, CatalogError> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        let products = self.products.lock();
        // Input order, unknown SKUs omitted, same as the real store.
        Ok(skus.iter().filter_map(|sku| products.get(sku).cloned()).collect())
    }

    async fn bullets_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, Vec<String>>, CatalogError> {
        let bullets = self.bullets.lock();
        Ok(skus
            .iter()
            .filter_map(|sku| bullets.get(sku).map(|b| (sku.clone(), b.clone())))
            .collect())
    }

    async fn specs_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, BTreeMap<String, String>>, CatalogError> {
        let specs = self.specs.lock();
        Ok(skus
            .iter()
            .filter_map(|sku| specs.get(sku).map(|s| (sku.clone(), s.clone())))
            .collect())
    }

    async fn categories(&self) -> Result<Vec<CategoryPair>, CatalogError> {
        Ok(self.categories.lock().clone())
    }

    async fn products_for_indexing(&self) -> Result<Vec<IndexableProduct>, CatalogError> {
        let products = self.products.lock();
        let bullets = self.bullets.lock();
        let specs = self.specs.lock();

        let mut skus: Vec<&String> = products.keys().collect();
        skus.sort();

        Ok(skus
            .into_iter()
            .map(|sku| IndexableProduct {
                record: products[sku].clone(),
                bullets: bullets.get(sku).cloned().unwrap_or_default(),
                specs: specs.get(sku).cloned().unwrap_or_default(),
            })
            .collect())
    }
}
