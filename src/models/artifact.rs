//! Generated artifact references attached to an assistant message.

use serde::{Deserialize, Serialize};

/// A reference to something the backend generated for this message, such
/// as an exported document or a saved draft. Artifacts arrive once near
/// the end of a stream; they are not merged incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Backend-assigned artifact id
    #[serde(default)]
    pub id: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Kind of artifact (e.g. "document", "export", "chart")
    #[serde(default, alias = "type", alias = "kind")]
    pub artifact_type: String,
    /// Optional download or preview URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_artifact() {
        let artifact: Artifact = serde_json::from_str(
            r#"{"id":"a1","title":"Proposal draft","artifact_type":"document","url":"https://example.com/a1"}"#,
        )
        .unwrap();
        assert_eq!(artifact.id, "a1");
        assert_eq!(artifact.artifact_type, "document");
        assert_eq!(artifact.url.as_deref(), Some("https://example.com/a1"));
    }

    #[test]
    fn test_deserialize_type_alias() {
        let artifact: Artifact =
            serde_json::from_str(r#"{"id":"a2","title":"Export","type":"export"}"#).unwrap();
        assert_eq!(artifact.artifact_type, "export");
        assert!(artifact.url.is_none());
    }

    #[test]
    fn test_deserialize_defaults() {
        let artifact: Artifact = serde_json::from_str("{}").unwrap();
        assert_eq!(artifact.id, "");
        assert_eq!(artifact.title, "");
        assert_eq!(artifact.artifact_type, "");
    }
}
