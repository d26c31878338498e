//! Decoding of YAML and JSON text into generic value trees.
//!
//! Admission inputs arrive as text in either format. They are decoded into [`Document`], a
//! closed tagged union (null, boolean, number, string, sequence, and string-keyed mapping)
//! whose mappings keep their keys in document order. YAML is a superset of JSON, so a single
//! YAML decoder handles both.

use crate::Result;
use ohno::app_err;

/// A decoded YAML or JSON value tree.
pub type Document = serde_json::Value;

/// Decode `text` into a document.
///
/// Text that is empty or only whitespace decodes to `null`, as does an explicit `null` document.
///
/// # Errors
///
/// Returns an error naming `label` if the text is not valid YAML or JSON, or if it uses
/// constructs that have no JSON equivalent such as non-string mapping keys.
pub fn decode_document(label: &str, text: &str) -> Result<Document> {
    if text.trim().is_empty() {
        return Ok(Document::Null);
    }

    serde_yaml::from_str(text).map_err(|e| app_err!("failed to parse {label} YAML: {e}"))
}

/// Decode `text` into a document that must be a mapping or `null`.
///
/// Kubernetes resources are always mappings, so anything else is rejected up front rather than
/// surfacing later as confusing expression errors.
///
/// # Errors
///
/// Returns an error if the text cannot be decoded or decodes to a scalar or sequence.
pub fn decode_object(label: &str, text: &str) -> Result<Document> {
    match decode_document(label, text)? {
        doc @ (Document::Null | Document::Object(_)) => Ok(doc),
        other => Err(app_err!(
            "failed to parse {label} YAML: expected a mapping, found {}",
            kind_name(&other)
        )),
    }
}

/// Look up a non-null field of a mapping.
#[must_use]
pub fn field<'a>(doc: &'a Document, key: &str) -> Option<&'a Document> {
    doc.get(key).filter(|value| !value.is_null())
}

/// A short human-readable name for the kind of a document node.
#[must_use]
pub const fn kind_name(doc: &Document) -> &'static str {
    match doc {
        Document::Null => "null",
        Document::Bool(_) => "a boolean",
        Document::Number(_) => "a number",
        Document::String(_) => "a string",
        Document::Array(_) => "a sequence",
        Document::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_text_is_null() {
        assert_eq!(decode_document("object", "").unwrap(), Document::Null);
        assert_eq!(decode_document("object", "  \n\t ").unwrap(), Document::Null);
    }

    #[test]
    fn test_explicit_null_is_null() {
        assert_eq!(decode_document("object", "null").unwrap(), Document::Null);
        assert_eq!(decode_document("object", "~").unwrap(), Document::Null);
    }

    #[test]
    fn test_decode_yaml() {
        let doc = decode_document("object", "kind: Pod\nspec:\n  replicas: 3\n  ports: [80, 443]\n").unwrap();
        assert_eq!(doc, json!({"kind": "Pod", "spec": {"replicas": 3, "ports": [80, 443]}}));
    }

    #[test]
    fn test_decode_json() {
        let doc = decode_document("object", r#"{"kind": "Pod", "enabled": true, "ratio": 0.5}"#).unwrap();
        assert_eq!(doc, json!({"kind": "Pod", "enabled": true, "ratio": 0.5}));
    }

    #[test]
    fn test_mapping_order_is_preserved() {
        let doc = decode_document("object", "zeta: 1\nalpha: 2\nmu: 3\n").unwrap();
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_invalid_text_names_the_input() {
        let err = decode_document("namespace", "a: [1, 2").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse namespace YAML"), "{err}");
    }

    #[test]
    fn test_decode_object_rejects_scalars_and_sequences() {
        let err = decode_object("params", "42").unwrap_err();
        assert!(err.to_string().contains("expected a mapping, found a number"), "{err}");

        let err = decode_object("params", "- a\n- b\n").unwrap_err();
        assert!(err.to_string().contains("found a sequence"), "{err}");
    }

    #[test]
    fn test_decode_object_accepts_null_and_mappings() {
        assert_eq!(decode_object("oldObject", "").unwrap(), Document::Null);
        assert_eq!(decode_object("oldObject", "a: b").unwrap(), json!({"a": "b"}));
    }

    #[test]
    fn test_field_skips_nulls() {
        let doc = json!({"kind": null, "apiVersion": "v1"});
        assert!(field(&doc, "kind").is_none());
        assert!(field(&doc, "missing").is_none());
        assert_eq!(field(&doc, "apiVersion"), Some(&json!("v1")));
        assert!(field(&Document::Null, "kind").is_none());
    }
}
