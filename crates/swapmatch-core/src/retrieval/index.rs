//! Qdrant-backed product index: filtered similarity search plus the full
//! catalog re-index.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, ScoredPoint,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::embedding::EmbeddingClient;
use super::{IndexAdmin, RetrievalError, VectorSearch};
use crate::catalog::{CatalogStore, IndexableProduct};
use crate::domain::{Candidate, CandidateMetadata};
use crate::fingerprint::sku_point_id;

/// Products embedded and upserted per indexing round trip.
const INDEX_BATCH_SIZE: usize = 100;

/// Product index backed by a Qdrant collection.
pub struct QdrantProductIndex {
    client: Qdrant,
    collection: String,
    vector_size: u64,
    embedder: EmbeddingClient,
    catalog: Arc<dyn CatalogStore>,
}

impl QdrantProductIndex {
    /// Creates an index client for `url`.
    pub fn new(
        url: &str,
        collection: String,
        embedder: EmbeddingClient,
        catalog: Arc<dyn CatalogStore>,
    ) -> Result<Self, RetrievalError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| RetrievalError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            collection,
            vector_size: embedder.dimensions() as u64,
            embedder,
            catalog,
        })
    }

    /// The collection this index reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn recreate_collection(&self) -> Result<(), RetrievalError> {
        let exists = self.client.collection_exists(&self.collection).await.map_err(|e| {
            RetrievalError::RebuildFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            }
        })?;

        if exists {
            self.client.delete_collection(&self.collection).await.map_err(|e| {
                RetrievalError::RebuildFailed {
                    collection: self.collection.clone(),
                    message: e.to_string(),
                }
            })?;
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(self.vector_size, Distance::Cosine))
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| RetrievalError::RebuildFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}

#[async_trait]
impl VectorSearch for QdrantProductIndex {
    async fn query(
        &self,
        query_text: &str,
        supercategory: &str,
        category: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        let vectors = self.embedder.embed(&[query_text.to_string()]).await?;
        let vector = vectors.into_iter().next().ok_or_else(|| {
            RetrievalError::EmbeddingResponse("provider returned no vectors".to_string())
        })?;

        // Both halves of the category pair must match exactly.
        let filter = Filter::must([
            Condition::matches("supercategory", supercategory.to_string()),
            Condition::matches("category", category.to_string()),
        ]);

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, limit as u64)
                    .filter(filter)
                    .with_payload(true),
            )
            .await
            .map_err(|e| RetrievalError::SearchFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        Ok(response
            .result
            .into_iter()
            .filter_map(candidate_from_scored_point)
            .collect())
    }
}

#[async_trait]
impl IndexAdmin for QdrantProductIndex {
    async fn rebuild(&self) -> Result<usize, RetrievalError> {
        self.recreate_collection().await?;

        let products = self.catalog.products_for_indexing().await?;
        if products.is_empty() {
            info!("no products found to index");
            return Ok(0);
        }

        let total = products.len();
        for batch in products.chunks(INDEX_BATCH_SIZE) {
            let documents: Vec<String> = batch.iter().map(build_document).collect();
            let vectors = self.embedder.embed(&documents).await?;

            let points: Vec<PointStruct> = batch
                .iter()
                .zip(documents)
                .zip(vectors)
                .map(|((product, document), vector)| product_point(product, document, vector))
                .collect();

            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
                .await
                .map_err(|e| RetrievalError::RebuildFailed {
                    collection: self.collection.clone(),
                    message: e.to_string(),
                })?;

            debug!(batch = batch.len(), total, "indexed product batch");
        }

        info!(total, collection = %self.collection, "product index rebuilt");
        Ok(total)
    }
}

/// Text document embedded for one product.
pub fn build_document(product: &IndexableProduct) -> String {
    let record = &product.record;
    let mut parts = vec![
        format!("Product: {}", record.name),
        format!("Brand: {}", record.brand_name.as_deref().unwrap_or("N/A")),
        format!(
            "UOM: {} {}",
            record.uom_qty.unwrap_or(1),
            record.uom.as_deref().unwrap_or("Each")
        ),
        format!("Customer Price: ${}", record.unit_price()),
    ];

    if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("Description: {description}"));
    }
    if !product.bullets.is_empty() {
        parts.push(format!("Features: {}", product.bullets.join("; ")));
    }
    if !product.specs.is_empty() {
        let specs = product
            .specs
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        parts.push(format!("Specifications: {specs}"));
    }

    parts.join("\n")
}

fn product_point(product: &IndexableProduct, document: String, vector: Vec<f32>) -> PointStruct {
    let record = &product.record;

    let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
    payload.insert("sku".to_string(), record.sku.clone().into());
    payload.insert(
        "supercategory".to_string(),
        record.supercategory.clone().unwrap_or_default().into(),
    );
    payload.insert(
        "category".to_string(),
        record.category.clone().unwrap_or_default().into(),
    );
    payload.insert(
        "class".to_string(),
        record.class.clone().unwrap_or_default().into(),
    );
    payload.insert(
        "brand_name".to_string(),
        record.brand_name.clone().unwrap_or_default().into(),
    );
    payload.insert("web_price".to_string(), record.web_price.unwrap_or(0.0).into());
    payload.insert("uom".to_string(), record.uom.clone().unwrap_or_default().into());
    payload.insert("uom_qty".to_string(), record.uom_qty.unwrap_or(1).into());
    payload.insert("name".to_string(), record.name.clone().into());
    payload.insert("document".to_string(), document.into());

    PointStruct::new(sku_point_id(&record.sku), vector, payload)
}

/// Maps a scored point back to a [`Candidate`]; points without a SKU in the
/// payload are skipped.
fn candidate_from_scored_point(point: ScoredPoint) -> Option<Candidate> {
    let payload = point.payload;

    let sku = payload.get("sku").and_then(|v| v.as_str()).map(|s| s.to_string())?;

    let get_str = |key: &str| {
        payload
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };

    let metadata = CandidateMetadata {
        supercategory: get_str("supercategory"),
        category: get_str("category"),
        class: get_str("class"),
        brand_name: get_str("brand_name"),
        web_price: payload.get("web_price").and_then(|v| v.as_double()).unwrap_or(0.0),
        uom: get_str("uom"),
        uom_qty: payload.get("uom_qty").and_then(|v| v.as_integer()).unwrap_or(1),
        name: get_str("name"),
    };

    Some(Candidate {
        sku,
        score: point.score,
        metadata,
        document: get_str("document"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn indexable(description: Option<&str>) -> IndexableProduct {
        let mut record = crate::catalog::MockCatalog::product("P1", "Copy Paper", Some(7.49));
        record.description = description.map(|d| d.to_string());
        IndexableProduct {
            record,
            bullets: vec!["Bright white".to_string(), "Acid free".to_string()],
            specs: BTreeMap::from([
                ("Sheet Count".to_string(), "500".to_string()),
                ("Size".to_string(), "8.5 x 11".to_string()),
            ]),
        }
    }

    #[test]
    fn document_includes_all_sections() {
        let document = build_document(&indexable(Some("Everyday copy paper")));

        assert!(document.starts_with("Product: Copy Paper"));
        assert!(document.contains("Brand: Acme"));
        assert!(document.contains("UOM: 500 Ream"));
        assert!(document.contains("Customer Price: $7.49"));
        assert!(document.contains("Description: Everyday copy paper"));
        assert!(document.contains("Features: Bright white; Acid free"));
        assert!(document.contains("Specifications: Sheet Count: 500; Size: 8.5 x 11"));
    }

    #[test]
    fn document_omits_empty_sections() {
        let mut product = indexable(None);
        product.bullets.clear();
        product.specs.clear();

        let document = build_document(&product);
        assert!(!document.contains("Description:"));
        assert!(!document.contains("Features:"));
        assert!(!document.contains("Specifications:"));
    }
}
