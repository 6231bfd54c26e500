//! INI handler.

use super::Handler;
use crate::error::ParseError;
use crate::merge::coalesce;
use crate::value::{Mapping, Value};
use ::ini::ParseOption;
use std::path::Path;

/// Reads an INI file with sections.
///
/// Each `[section]` becomes a top-level key holding a mapping of string values.
/// Keys that appear before the first section are placed at the top level.
/// A key written as `name[]` appends to a sequence under `name`; any other
/// repeated key is collected into a coalesced sequence.
///
/// Backslashes are kept as written. A `;` or `#` preceded by whitespace
/// starts an inline comment, which is dropped from the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniHandler;

impl Handler for IniHandler {
    fn parse(&self, path: &Path) -> Result<Value, ParseError> {
        let content = ParseError::read_to_string(path)?;
        let options = ParseOption {
            enabled_escape: false,
            ..ParseOption::default()
        };
        let document = ::ini::Ini::load_from_str_opt(&content, options)?;

        let mut root = Mapping::new();
        for (section, properties) in document.iter() {
            match section {
                None => {
                    for (key, value) in properties.iter() {
                        insert_property(&mut root, key, value);
                    }
                }
                Some(name) => {
                    let entry = root
                        .entry(name.to_string())
                        .or_insert_with(Value::empty_mapping);
                    if !entry.is_mapping() {
                        // A bare key and a section share the name; keep both.
                        coalesce(entry, Value::empty_mapping());
                    }
                    if let Some(target) = section_mapping(entry) {
                        for (key, value) in properties.iter() {
                            insert_property(target, key, value);
                        }
                    }
                }
            }
        }
        Ok(Value::Mapping(root))
    }
}

/// Mapping that receives a section's properties.
///
/// After a name clash the section is the last element of the coalesced sequence.
fn section_mapping(entry: &mut Value) -> Option<&mut Mapping> {
    match entry {
        Value::Mapping(map) => Some(map),
        Value::Sequence(seq) => match seq.last_mut() {
            Some(Value::Mapping(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Drop a trailing `; comment` or `# comment` from a raw value.
fn strip_inline_comment(value: &str) -> &str {
    let mut previous_blank = false;
    for (idx, ch) in value.char_indices() {
        if previous_blank && (ch == ';' || ch == '#') {
            return value[..idx].trim_end();
        }
        previous_blank = ch.is_whitespace();
    }
    value
}

fn insert_property(target: &mut Mapping, key: &str, value: &str) {
    let value = strip_inline_comment(value);
    if let Some(name) = key.strip_suffix("[]") {
        let slot = target
            .entry(name.to_string())
            .or_insert_with(|| Value::sequence(Vec::new()));
        match slot {
            Value::Sequence(seq) if !seq.is_coalesced() => seq.push(Value::from(value)),
            other => coalesce(other, Value::from(value)),
        }
        return;
    }

    match target.get_mut(key) {
        Some(existing) => coalesce(existing, Value::from(value)),
        None => {
            target.insert(key.to_string(), Value::from(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Value, ParseError> {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.ini");
        std::fs::write(&path, content).unwrap();
        IniHandler.parse(&path)
    }

    #[test]
    fn test_sections_become_top_level_keys() {
        let value = parse("[db]\nuser = app\nport = 5432\n\n[cache]\nttl = 60\n").unwrap();
        assert_eq!(
            value.get_path(["db", "user"]).and_then(Value::as_str),
            Some("app")
        );
        // No type coercion: every INI value is a string.
        assert_eq!(
            value.get_path(["db", "port"]).and_then(Value::as_str),
            Some("5432")
        );
        assert_eq!(
            value.get_path(["cache", "ttl"]).and_then(Value::as_str),
            Some("60")
        );
    }

    #[test]
    fn test_keys_before_first_section() {
        let value = parse("name = demo\n[db]\nuser = app\n").unwrap();
        assert_eq!(value.get("name").and_then(Value::as_str), Some("demo"));
        assert!(value.get("db").unwrap().is_mapping());
    }

    #[test]
    fn test_bracket_keys_build_sequence() {
        let value = parse("[hosts]\nlist[] = a\nlist[] = b\n").unwrap();
        let list = value.get_path(["hosts", "list"]).unwrap().as_sequence().unwrap();
        assert!(!list.is_coalesced());
        assert_eq!(list.items(), &[Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn test_backslashes_kept_verbatim() {
        let value = parse("[paths]\nroot = C:\\data\\new\n").unwrap();
        assert_eq!(
            value.get_path(["paths", "root"]).and_then(Value::as_str),
            Some(r"C:\data\new")
        );
    }

    #[test]
    fn test_inline_comments_dropped() {
        let value = parse("[s]\na = plain ; comment\nb = x # note\nc = a;b#c\n").unwrap();
        assert_eq!(value.get_path(["s", "a"]).and_then(Value::as_str), Some("plain"));
        assert_eq!(value.get_path(["s", "b"]).and_then(Value::as_str), Some("x"));
        assert_eq!(value.get_path(["s", "c"]).and_then(Value::as_str), Some("a;b#c"));
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(parse("").unwrap(), Value::empty_mapping());
    }
}
