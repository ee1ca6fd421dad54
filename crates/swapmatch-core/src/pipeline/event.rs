//! Progress events emitted while a substitution request runs.

use serde::{Deserialize, Serialize};

use crate::domain::SubstitutionResult;

/// Pipeline phase a status event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Searching,
    SearchDone,
    Ranking,
    RankingDone,
    Enriching,
}

/// One element of a request's ordered progress stream.
///
/// Status events bracket each externally-observable phase. Exactly one
/// terminal event (`Result` or `Error`) is emitted per request, and the
/// stream closes immediately after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PipelineEvent {
    Status {
        stage: Stage,
        message: String,
    },
    Result {
        #[serde(flatten)]
        result: SubstitutionResult,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_event_wire_shape() {
        let event = PipelineEvent::Status {
            stage: Stage::Searching,
            message: "Searching the catalog...".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["stage"], "searching");
        assert_eq!(json["message"], "Searching the catalog...");
    }

    #[test]
    fn result_event_flattens_the_payload() {
        let event = PipelineEvent::Result {
            result: SubstitutionResult {
                source_item: crate::domain::SourceItem {
                    name: "Copy Paper".to_string(),
                    description: String::new(),
                    supercategory: "Office Supplies".to_string(),
                    category: "Paper".to_string(),
                    quantity: 2000.0,
                    quantity_unit: "sheets".to_string(),
                    unit_price: 0.0,
                    total_price: 0.0,
                },
                candidates_evaluated: Some(12),
                substitutes: Vec::new(),
                message: None,
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "result");
        assert_eq!(json["candidates_evaluated"], 12);
        assert_eq!(json["source_item"]["name"], "Copy Paper");
        assert!(json.get("message").is_none());
    }
}
