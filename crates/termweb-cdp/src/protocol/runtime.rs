//! Runtime domain types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for Runtime.evaluate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// Expression to evaluate.
    pub expression: String,
    /// Return the result by value instead of as a remote object handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    /// Await the result if the expression evaluates to a promise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
}

impl EvaluateParams {
    /// Evaluate an expression, returning the value directly.
    pub fn by_value(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            return_by_value: Some(true),
            await_promise: None,
        }
    }
}

/// A mirror object referencing or holding a JavaScript value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type ("number", "string", "object", ...).
    #[serde(rename = "type")]
    pub object_type: String,
    /// The value, present when returned by value.
    pub value: Option<Value>,
    /// Printable description.
    pub description: Option<String>,
}

/// Result of Runtime.evaluate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    /// The evaluation result.
    pub result: RemoteObject,
}
