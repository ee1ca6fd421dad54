//! Gemini-backed [`RankingBackend`] using a JSON-schema-constrained call.

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatResponseFormat, JsonSpec};
use tracing::error;

use super::{RankingBackend, RankingError};

/// Ranking backend speaking to a Gemini model through `genai`.
///
/// The provider credential is resolved by the client itself from the
/// environment (`GEMINI_API_KEY`).
pub struct GeminiBackend {
    client: Client,
    model: String,
}

impl GeminiBackend {
    /// Creates a backend for `model` (e.g. `gemini-2.5-flash`).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl RankingBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, RankingError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
        let options = ChatOptions::default().with_response_format(ChatResponseFormat::JsonSpec(
            JsonSpec::new("substitutes", response_schema()),
        ));

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&options))
            .await
            .map_err(|e| {
                error!("ranking provider error: {e}");
                RankingError::Provider(e.to_string())
            })?;

        let text = response
            .first_text()
            .ok_or_else(|| RankingError::MalformedResponse("empty response".to_string()))?;

        Ok(text.to_string())
    }
}

/// Output schema enforced on the provider: only the fields the model must
/// determine, nothing derivable from the catalog.
fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "substitutes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "sku": {
                            "type": "string",
                            "description": "Product SKU of the chosen substitute"
                        },
                        "rank": {
                            "type": "integer",
                            "description": "Rank starting at 1, 1 being best"
                        },
                        "reason": {
                            "type": "string",
                            "description": "Why this is a good substitute: functional match, spec comparison, value proposition"
                        },
                        "unit_type": {
                            "type": "string",
                            "enum": ["DIVISIBLE", "ABSOLUTE"],
                            "description": "DIVISIBLE if the quantity unit can be scaled (sheets, feet, ml, oz) or ABSOLUTE if it cannot (tabs, compartments, drawers, holes, ports)"
                        },
                        "qty_needed": {
                            "type": "integer",
                            "description": "How many units of the candidate the user must buy to fulfill their quantity. Rounded UP to a whole number. For ABSOLUTE units where specs match, this is 1."
                        },
                        "comparison_notes": {
                            "type": "string",
                            "description": "Step-by-step calculation: how qty_needed was determined, any unit conversions (ft->in, etc.), and why this quantity covers the user's need. For ABSOLUTE units, why the specs are equivalent."
                        }
                    },
                    "required": ["sku", "rank", "reason", "unit_type", "qty_needed", "comparison_notes"]
                }
            }
        },
        "required": ["substitutes"]
    })
}
