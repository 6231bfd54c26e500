//! JSON handler.

use super::Handler;
use crate::error::ParseError;
use crate::value::Value;
use std::path::Path;

/// Decodes a JSON document.
///
/// Objects become mappings and arrays literal sequences. The document is
/// expected to be an object of categories; other shapes are returned as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHandler;

impl Handler for JsonHandler {
    fn parse(&self, path: &Path) -> Result<Value, ParseError> {
        let content = ParseError::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parses_categories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.json");
        std::fs::write(&path, r#"{"db": {"user": "app", "port": 5432}}"#).unwrap();

        let value = JsonHandler.parse(&path).unwrap();
        assert_eq!(
            value.get_path(["db", "user"]).and_then(Value::as_str),
            Some("app")
        );
        assert_eq!(
            value.get_path(["db", "port"]).and_then(Value::as_i64),
            Some(5432)
        );
    }

    #[test]
    fn test_malformed_document_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(JsonHandler.parse(&path), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = JsonHandler.parse(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
