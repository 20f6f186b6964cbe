//! Result envelope returned by every command invocation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uniform output of a command invocation.
///
/// Serializes as `{"success": bool, "data"?: any, "error"?: string, "metadata"?: {..}}`,
/// with absent fields omitted. The constructors keep `data` and `error`
/// mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Whether the execution was successful.
    pub success: bool,

    /// The result payload of a successful command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error message if execution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Informational metadata about the execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ResultEnvelope {
    /// Create a successful envelope.
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: None,
        }
    }

    /// Create a failed envelope.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Attach metadata to the envelope.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The error message, if this is a failure.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_omits_error() {
        let envelope = ResultEnvelope::success(json!({ "target": "10.0.0.1" }));
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["target"], "10.0.0.1");
        assert!(value.get("error").is_none());
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_failure_wire_shape_is_exact() {
        let envelope = ResultEnvelope::failure("Agent not found: ghost");
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({ "success": false, "error": "Agent not found: ghost" })
        );
    }

    #[test]
    fn test_metadata_is_serialized() {
        let mut metadata = Map::new();
        metadata.insert("agent".to_string(), json!("recon"));

        let envelope = ResultEnvelope::success(json!([])).with_metadata(metadata);
        let text = envelope.to_pretty_json().unwrap();

        assert!(text.contains("\"metadata\""));
        assert!(text.contains("\"recon\""));
        assert!(text.contains('\n'), "output should be pretty-printed");
    }

    #[test]
    fn test_deserializes_minimal_shape() {
        let envelope: ResultEnvelope =
            serde_json::from_value(json!({ "success": false, "error": "boom" })).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error_message(), Some("boom"));
        assert!(envelope.data.is_none());
    }
}
