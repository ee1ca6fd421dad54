//! HTTP client for an OpenAI-style embeddings endpoint.
//!
//! Embedding computation is an external collaborator; this client only
//! shapes the request and reads vectors back in input order.

use serde_json::Value;

use super::RetrievalError;

/// Client for the embedding provider configured at construction.
#[derive(Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
}

impl EmbeddingClient {
    /// Creates a client for `endpoint` requesting `dimensions`-wide vectors.
    pub fn new(
        endpoint: String,
        model: String,
        api_key: Option<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            model,
            api_key,
            dimensions,
        }
    }

    /// The configured vector width.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embeds `texts`, returning one vector per input in input order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "dimensions": self.dimensions,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?
            .error_for_status()
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| RetrievalError::EmbeddingResponse(e.to_string()))?;

        parse_embedding_response(json)
    }
}

/// Reads the `data` array, honoring per-item `index` fields so vectors come
/// back in input order even if the provider reorders them.
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>, RetrievalError> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| RetrievalError::EmbeddingResponse("missing data array".to_string()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);

        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                RetrievalError::EmbeddingResponse("item missing embedding array".to_string())
            })?;

        let mut vector = Vec::with_capacity(embedding.len());
        for value in embedding {
            let number = value.as_f64().ok_or_else(|| {
                RetrievalError::EmbeddingResponse("embedding value must be numeric".to_string())
            })?;
            vector.push(number as f32);
        }

        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}
