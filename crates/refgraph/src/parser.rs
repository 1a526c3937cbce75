//! Document parser boundary.

use serde_json::Value;

use crate::error::ResolveError;

/// Parse a YAML or JSON document into a tree.
///
/// JSON is valid YAML, so one parser covers both. Only syntax errors fail;
/// a sequence, scalar or empty document is returned as is and simply holds
/// no `$ref`s.
pub fn parse_document(file_name: &str, input: &str) -> Result<Value, ResolveError> {
    serde_yaml::from_str(input).map_err(|e| ResolveError::Parse {
        file_name: file_name.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_and_json() {
        let yaml = parse_document("a.yaml", "openapi: 3.0.0\ninfo:\n  title: A\n").unwrap();
        assert_eq!(yaml["info"]["title"], "A");

        let json = parse_document("a.json", r#"{"openapi": "3.1.0"}"#).unwrap();
        assert_eq!(json["openapi"], "3.1.0");
    }

    #[test]
    fn rejects_malformed_content() {
        let err = parse_document("bad.yaml", "openapi: [unclosed").unwrap_err();
        assert!(
            matches!(err, ResolveError::Parse { ref file_name, .. } if file_name == "bad.yaml"),
            "expected Parse, got: {:?}",
            err
        );
    }

    #[test]
    fn accepts_non_mapping_roots() {
        assert_eq!(
            parse_document("enum.yaml", "- a\n- b\n").unwrap(),
            serde_json::json!(["a", "b"])
        );
        assert_eq!(parse_document("scalar.yaml", "just a string").unwrap(), "just a string");
        assert!(parse_document("empty.yaml", "").unwrap().is_null());
        assert!(parse_document("comment.yaml", "# nothing here\n").unwrap().is_null());
    }
}
