//! YAML data-file handler.

use super::Handler;
use crate::error::ParseError;
use crate::value::Value;
use std::path::Path;
use tracing::debug;

/// Reads a YAML data file.
///
/// The document must be a mapping. Any other shape, including an empty file,
/// contributes nothing and yields an empty mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlHandler;

impl Handler for YamlHandler {
    fn parse(&self, path: &Path) -> Result<Value, ParseError> {
        let content = ParseError::read_to_string(path)?;
        let value: Value = serde_yaml::from_str(&content)?;
        if value.is_mapping() {
            Ok(value)
        } else {
            debug!(path = %path.display(), kind = value.kind(), "YAML document is not a mapping, ignoring");
            Ok(Value::empty_mapping())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Value, ParseError> {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.yaml");
        std::fs::write(&path, content).unwrap();
        YamlHandler.parse(&path)
    }

    #[test]
    fn test_mapping_document() {
        let value = parse("server:\n  host: localhost\n  ports: [80, 443]\n").unwrap();
        assert_eq!(
            value.get_path(["server", "host"]).and_then(Value::as_str),
            Some("localhost")
        );
        let ports = value.get_path(["server", "ports"]).unwrap().as_sequence().unwrap();
        assert_eq!(ports.len(), 2);
        assert!(!ports.is_coalesced());
    }

    #[test]
    fn test_non_mapping_contributes_nothing() {
        assert_eq!(parse("- a\n- b\n").unwrap(), Value::empty_mapping());
        assert_eq!(parse("just a string").unwrap(), Value::empty_mapping());
        assert_eq!(parse("").unwrap(), Value::empty_mapping());
    }

    #[test]
    fn test_malformed_document_fails() {
        assert!(matches!(parse("a: [1, 2"), Err(ParseError::Yaml(_))));
    }
}
