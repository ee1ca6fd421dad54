//! MySQL-backed [`CatalogStore`].
//!
//! Price and count columns are selected with explicit casts so DECIMAL/INT
//! storage decodes as `f64`/`i64` without a runtime type probe.

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, QueryBuilder, Row};
use std::collections::{BTreeMap, HashMap};

use super::{CatalogError, CatalogStore, IndexableProduct};
use crate::domain::{CategoryPair, ProductRecord};

const PRODUCT_SELECT: &str = "\
SELECT p.sku, p.name, p.short_name, p.brand_name, p.description, \
CAST(p.web_price AS DOUBLE) AS web_price, \
CAST(p.customer_price AS DOUBLE) AS customer_price, \
p.uom, CAST(p.uom_qty AS SIGNED) AS uom_qty, p.manufacturer_name, \
CAST(p.review_rating AS DOUBLE) AS review_rating, \
CAST(p.review_count AS SIGNED) AS review_count, \
c.supercategory, c.category, c.class \
FROM products p \
LEFT JOIN categories c ON p.sku = c.sku";

/// Catalog store backed by a MySQL connection pool.
#[derive(Clone)]
pub struct MySqlCatalog {
    pool: MySqlPool,
}

impl MySqlCatalog {
    /// Connects a pool of at most `max_conns` connections to `url`.
    pub async fn connect(url: &str, max_conns: u32) -> Result<Self, CatalogError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_conns)
            .connect(url)
            .await
            .map_err(CatalogError::ConnectionFailed)?;

        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for MySqlCatalog {
    async fn products_by_skus(&self, skus: &[String]) -> Result<Vec<ProductRecord>, CatalogError> {
        if skus.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(PRODUCT_SELECT);
        builder.push(" WHERE p.sku IN (");
        let mut separated = builder.separated(", ");
        for sku in skus {
            separated.push_bind(sku);
        }
        separated.push_unseparated(")");

        let rows: Vec<ProductRecord> = builder.build_query_as().fetch_all(&self.pool).await?;

        // The IN clause returns rows in storage order; walk the original
        // identifier sequence so callers get input order back. This is a
        // documented invariant, not an accident of iteration.
        let mut by_sku: HashMap<String, ProductRecord> =
            rows.into_iter().map(|r| (r.sku.clone(), r)).collect();

        Ok(skus.iter().filter_map(|sku| by_sku.remove(sku)).collect())
    }

    async fn bullets_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, Vec<String>>, CatalogError> {
        if skus.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<MySql> =
            QueryBuilder::new("SELECT sku, bullet_text FROM product_bullets WHERE sku IN (");
        let mut separated = builder.separated(", ");
        for sku in skus {
            separated.push_bind(sku);
        }
        separated.push_unseparated(")");
        builder.push(" ORDER BY sku, display_order");

        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut bullets: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let sku: String = row.try_get("sku")?;
            let text: String = row.try_get("bullet_text")?;
            bullets.entry(sku).or_default().push(text);
        }

        Ok(bullets)
    }

    async fn specs_by_skus(
        &self,
        skus: &[String],
    ) -> Result<HashMap<String, BTreeMap<String, String>>, CatalogError> {
        if skus.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT ps.sku, sn.name, ps.spec_value \
             FROM product_specifications ps \
             JOIN specification_names sn ON ps.spec_name_id = sn.id \
             WHERE ps.sku IN (",
        );
        let mut separated = builder.separated(", ");
        for sku in skus {
            separated.push_bind(sku);
        }
        separated.push_unseparated(")");

        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut specs: HashMap<String, BTreeMap<String, String>> = HashMap::new();
        for row in rows {
            let sku: String = row.try_get("sku")?;
            let name: String = row.try_get("name")?;
            let value: String = row.try_get("spec_value")?;
            specs.entry(sku).or_default().insert(name, value);
        }

        Ok(specs)
    }

    async fn categories(&self) -> Result<Vec<CategoryPair>, CatalogError> {
        let pairs = sqlx::query_as::<_, CategoryPair>(
            "SELECT DISTINCT supercategory, category FROM categories \
             ORDER BY supercategory, category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs)
    }

    async fn products_for_indexing(&self) -> Result<Vec<IndexableProduct>, CatalogError> {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(PRODUCT_SELECT);
        builder.push(" WHERE p.active = 1");

        let records: Vec<ProductRecord> = builder.build_query_as().fetch_all(&self.pool).await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let skus: Vec<String> = records.iter().map(|r| r.sku.clone()).collect();
        let mut bullets = self.bullets_by_skus(&skus).await?;
        let mut specs = self.specs_by_skus(&skus).await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let bullets = bullets.remove(&record.sku).unwrap_or_default();
                let specs = specs.remove(&record.sku).unwrap_or_default();
                IndexableProduct {
                    record,
                    bullets,
                    specs,
                }
            })
            .collect())
    }
}
