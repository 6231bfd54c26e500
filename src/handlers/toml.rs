//! TOML handler.

use super::Handler;
use crate::error::ParseError;
use crate::value::{Mapping, Value};
use std::path::Path;

/// Reads a TOML document; tables become mappings, datetimes their string form.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlHandler;

impl Handler for TomlHandler {
    fn parse(&self, path: &Path) -> Result<Value, ParseError> {
        let content = ParseError::read_to_string(path)?;
        let table: ::toml::Table = ::toml::from_str(&content)?;
        Ok(Value::Mapping(convert_table(table)))
    }
}

fn convert_table(table: ::toml::Table) -> Mapping {
    table
        .into_iter()
        .map(|(key, value)| (key, convert(value)))
        .collect()
}

fn convert(value: ::toml::Value) -> Value {
    match value {
        ::toml::Value::String(s) => Value::from(s),
        ::toml::Value::Integer(i) => Value::from(i),
        ::toml::Value::Float(x) => Value::from(x),
        ::toml::Value::Boolean(b) => Value::from(b),
        ::toml::Value::Datetime(dt) => Value::from(dt.to_string()),
        ::toml::Value::Array(items) => Value::sequence(items.into_iter().map(convert)),
        ::toml::Value::Table(table) => Value::Mapping(convert_table(table)),
    }
}
