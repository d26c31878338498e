use super::ItemOutcome;
use crate::document::Document;
use crate::expr::ExpressionEngine;
use serde::{Deserialize, Serialize};

/// The reported result of a single variable, match condition, validation or audit annotation.
///
/// At most one of `result` and `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Document>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Document>,
}

impl EvalResult {
    /// Convert an item's engine values into documents.
    #[must_use]
    pub fn from_item<E: ExpressionEngine>(item: &ItemOutcome<E::Value>, engine: &E) -> Self {
        let (result, error) = match &item.outcome {
            Ok(value) => (Some(engine.export(value)), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Self {
            name: item.name.clone(),
            expression: item.expression.clone(),
            result,
            error,
            message: item.message.as_ref().map(|message| engine.export(message)),
        }
    }

    /// Whether the result is exactly the boolean `true`.
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.result == Some(Document::Bool(true))
    }
}
