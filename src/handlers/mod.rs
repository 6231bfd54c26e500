//! Extension-dispatched parsers.
//!
//! A [`Handler`] turns a file into a [`Value`]. The [`HandlerRegistry`] binds
//! handlers to file extensions; refresh walks the registry in insertion order,
//! which is also the merge precedence between extensions of one directory.
//!
//! ## Built-in handlers
//! Registered in this order by [`HandlerRegistry::with_builtins`]:
//! - `xml` - element tree, repeated siblings collected into sequences
//! - `ini` - sections become top-level keys
//! - `json` - any JSON document
//! - `yaml`, `yml` - data files that must evaluate to a mapping
//! - `toml` - tables become mappings

mod ini;
mod json;
mod toml;
mod xml;
mod yaml;

pub use self::ini::IniHandler;
pub use self::json::JsonHandler;
pub use self::toml::TomlHandler;
pub use self::xml::XmlHandler;
pub use self::yaml::YamlHandler;

use crate::error::ParseError;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Parser capability bound to one or more file extensions.
///
/// Closures of the shape `Fn(&Path) -> Result<Value, ParseError>` implement this
/// trait, so callers can register either a closure or a type.
///
/// A handler should return a mapping. Anything else has no keys to merge and is
/// ignored by refresh.
pub trait Handler: Send + Sync {
    fn parse(&self, path: &Path) -> Result<Value, ParseError>;
}

impl<F> Handler for F
where
    F: Fn(&Path) -> Result<Value, ParseError> + Send + Sync,
{
    fn parse(&self, path: &Path) -> Result<Value, ParseError> {
        self(path)
    }
}

/// Registry mapping extension strings to handlers.
///
/// Extensions are case-sensitive; a leading `.` is ignored.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: IndexMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("xml", XmlHandler);
        registry.register("ini", IniHandler);
        registry.register("json", JsonHandler);
        registry.register_many(["yaml", "yml"], YamlHandler);
        registry.register("toml", TomlHandler);
        registry
    }

    /// Bind `handler` to `extension`, replacing any previous binding.
    ///
    /// A replaced extension keeps its position in registry order.
    pub fn register<H>(&mut self, extension: impl AsRef<str>, handler: H)
    where
        H: Handler + 'static,
    {
        self.register_shared(extension, Arc::new(handler));
    }

    /// Bind an already shared handler to `extension`.
    pub fn register_shared(&mut self, extension: impl AsRef<str>, handler: Arc<dyn Handler>) {
        self.handlers
            .insert(normalize_extension(extension.as_ref()), handler);
    }

    /// Bind one handler to every extension given.
    pub fn register_many<I, S, H>(&mut self, extensions: I, handler: H)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        H: Handler + 'static,
    {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        for extension in extensions {
            self.register_shared(extension, Arc::clone(&handler));
        }
    }

    /// Unbind `extension`. Returns whether a binding existed.
    pub fn remove(&mut self, extension: &str) -> bool {
        self.handlers
            .shift_remove(normalize_extension(extension).as_str())
            .is_some()
    }

    pub fn get(&self, extension: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(normalize_extension(extension).as_str())
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.get(extension).is_some()
    }

    /// Registered extensions in registry order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// (extension, handler) pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Handler>)> {
        self.handlers.iter().map(|(ext, h)| (ext.as_str(), h))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("extensions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.strip_prefix('.').unwrap_or(extension).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: i64) -> impl Fn(&Path) -> Result<Value, ParseError> + Send + Sync {
        move |_: &Path| Ok(Value::from_iter([("v", value)]))
    }

    #[test]
    fn test_builtin_order() {
        let registry = HandlerRegistry::with_builtins();
        let extensions: Vec<&str> = registry.extensions().collect();
        assert_eq!(extensions, vec!["xml", "ini", "json", "yaml", "yml", "toml"]);
    }

    #[test]
    fn test_register_overwrites_in_place() {
        let mut registry = HandlerRegistry::new();
        registry.register("a", constant(1));
        registry.register("b", constant(2));
        registry.register("a", constant(3));

        let extensions: Vec<&str> = registry.extensions().collect();
        assert_eq!(extensions, vec!["a", "b"]);

        let value = registry.get("a").unwrap().parse(Path::new("x.a")).unwrap();
        assert_eq!(value.get("v").and_then(Value::as_i64), Some(3));
    }

    #[test]
    fn test_extensions_are_case_sensitive() {
        let mut registry = HandlerRegistry::new();
        registry.register("yml", constant(1));
        assert!(registry.contains("yml"));
        assert!(!registry.contains("YML"));
    }

    #[test]
    fn test_leading_dot_ignored() {
        let mut registry = HandlerRegistry::new();
        registry.register(".conf", constant(1));
        assert!(registry.contains("conf"));
        assert!(registry.contains(".conf"));
    }

    #[test]
    fn test_register_many_shares_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register_many(["cfg", "conf"], constant(7));
        let a = registry.get("cfg").unwrap();
        let b = registry.get("conf").unwrap();
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_remove_unbound_is_noop() {
        let mut registry = HandlerRegistry::with_builtins();
        assert!(registry.remove("ini"));
        assert!(!registry.remove("ini"));
        assert!(!registry.remove("never-registered"));
        assert!(!registry.contains("ini"));
        assert_eq!(registry.len(), 5);
    }
}
