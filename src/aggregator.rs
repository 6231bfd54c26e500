//! Refresh pipeline tying targets, handlers and the store together.
//!
//! A refresh walks the targets in a fixed order, parses every matched file and
//! folds the results into a fresh mapping:
//! 1. each directory, in the order added
//!    - each registered extension, in registry order
//!      - each matching file, sorted by name
//! 2. each explicit file, in the order added
//!
//! The store is replaced only when the refresh completes, so a failed refresh
//! under [`FailurePolicy::Abort`] leaves the previous store untouched. Values
//! added through [`Aggregator::set`] or [`Aggregator::merge`] are not sources:
//! the next refresh discards them.
//!
//! ## Concurrency
//! Everything runs synchronously on the calling thread. Mutating methods take
//! `&mut self`; callers sharing an aggregator across threads wrap it in a
//! mutex. A handler that never returns blocks `refresh` indefinitely.

use crate::error::{Error, Result};
use crate::handlers::{Handler, HandlerRegistry};
use crate::merge::{MergeMode, merge_mappings};
use crate::settings::Settings;
use crate::store::ConfigStore;
use crate::targets::{TargetKind, TargetSet, file_extension, scan_directory};
use crate::value::{Mapping, Value};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What refresh does when a file cannot be parsed or a directory listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure and keep the previous store.
    #[default]
    Abort,
    /// Skip the failing source, record the error and keep going.
    Skip,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(format!("unknown failure policy '{}' (expected abort or skip)", other)),
        }
    }
}

/// A file that refresh would hand to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub path: PathBuf,
    pub extension: String,
    /// Kind of target the file was found through.
    pub origin: TargetKind,
}

/// Outcome of a refresh.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Files whose values were merged, in merge order.
    pub merged: Vec<PathBuf>,
    /// Failures skipped under [`FailurePolicy::Skip`].
    pub skipped: Vec<Error>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// File-based configuration aggregator.
///
/// # Example
/// ```no_run
/// use confagg::Aggregator;
///
/// let config = Aggregator::builder()
///     .target("/etc/myapp")
///     .target("/etc/myapp/override.json")
///     .build()?;
/// let user = config.lookup("db.user");
/// # Ok::<(), confagg::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    targets: TargetSet,
    handlers: HandlerRegistry,
    store: ConfigStore,
    failure_policy: FailurePolicy,
}

impl Aggregator {
    /// Aggregator with the built-in handlers, no targets and an empty store.
    pub fn new() -> Self {
        Self {
            handlers: HandlerRegistry::with_builtins(),
            ..Self::default()
        }
    }

    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::default()
    }

    /// Build an aggregator from settings and run the first refresh.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut aggregator = Self::configure(settings);
        aggregator.refresh()?;
        Ok(aggregator)
    }

    /// Build an aggregator from settings without refreshing.
    pub fn configure(settings: &Settings) -> Self {
        let mut aggregator = Self::new().with_failure_policy(settings.failure_policy);

        for (alias, existing) in &settings.aliases {
            match aggregator.handlers.get(existing).cloned() {
                Some(handler) => aggregator.handlers.register_shared(alias, handler),
                None => warn!(alias = %alias, extension = %existing, "Alias refers to an unknown extension"),
            }
        }
        for extension in &settings.disabled_extensions {
            aggregator.remove_handler(extension);
        }
        aggregator.add_targets(&settings.targets);
        aggregator
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn set_failure_policy(&mut self, policy: FailurePolicy) {
        self.failure_policy = policy;
    }

    // Targets

    /// Register a directory or file. Paths that do not exist are ignored.
    pub fn add_target(&mut self, path: impl AsRef<Path>) -> Option<TargetKind> {
        self.targets.add(path)
    }

    /// Register several paths, returning how many were accepted.
    pub fn add_targets<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.targets.add_all(paths)
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    // Handlers

    pub fn register_handler<H>(&mut self, extension: impl AsRef<str>, handler: H)
    where
        H: Handler + 'static,
    {
        self.handlers.register(extension, handler);
    }

    /// Bind one handler to several extensions.
    pub fn register_handlers<I, S, H>(&mut self, extensions: I, handler: H)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        H: Handler + 'static,
    {
        self.handlers.register_many(extensions, handler);
    }

    /// Unbind an extension. Unbound extensions are a no-op.
    pub fn remove_handler(&mut self, extension: &str) -> bool {
        let removed = self.handlers.remove(extension);
        if removed {
            debug!(extension = %extension, "Removed handler");
        }
        removed
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    // Pipeline

    /// Files a refresh would parse, in merge order, without parsing them.
    pub fn sources(&self) -> Result<Vec<Source>> {
        let mut report = RefreshReport::default();
        let sources = self.discover(FailurePolicy::Abort, &mut report)?;
        Ok(sources.into_iter().map(|(source, _)| source).collect())
    }

    /// Rebuild the store from every target.
    ///
    /// The store is rebuilt from empty: values added through `set` or `merge`
    /// since the last refresh are dropped.
    pub fn refresh(&mut self) -> Result<RefreshReport> {
        let policy = self.failure_policy;
        let mut report = RefreshReport::default();
        let mut fresh = Mapping::new();

        for (source, handler) in self.discover(policy, &mut report)? {
            match handler.parse(&source.path) {
                Ok(value) => {
                    absorb(&mut fresh, value, &source.path);
                    report.merged.push(source.path);
                }
                Err(err) => {
                    let err = Error::Parse {
                        path: source.path,
                        source: err,
                    };
                    match policy {
                        FailurePolicy::Abort => return Err(err),
                        FailurePolicy::Skip => {
                            warn!(error = %err, "Skipping source that failed to parse");
                            report.skipped.push(err);
                        }
                    }
                }
            }
        }

        info!(
            merged = report.merged.len(),
            skipped = report.skipped.len(),
            keys = fresh.len(),
            "Configuration refreshed"
        );
        self.store.replace(fresh);
        Ok(report)
    }

    fn discover(
        &self,
        policy: FailurePolicy,
        report: &mut RefreshReport,
    ) -> Result<Vec<(Source, Arc<dyn Handler>)>> {
        let mut sources = Vec::new();

        for dir in self.targets.directories() {
            for (extension, handler) in self.handlers.iter() {
                let files = match scan_directory(dir, extension) {
                    Ok(files) => files,
                    Err(source) => {
                        let err = Error::Scan {
                            path: dir.clone(),
                            source,
                        };
                        match policy {
                            FailurePolicy::Abort => return Err(err),
                            FailurePolicy::Skip => {
                                warn!(error = %err, "Skipping directory that could not be scanned");
                                report.skipped.push(err);
                                break;
                            }
                        }
                    }
                };
                for path in files {
                    sources.push((
                        Source {
                            path,
                            extension: extension.to_string(),
                            origin: TargetKind::Directory,
                        },
                        Arc::clone(handler),
                    ));
                }
            }
        }

        for path in self.targets.files() {
            let Some(extension) = file_extension(path) else {
                debug!(path = %path.display(), "Skipping file without extension");
                continue;
            };
            let Some(handler) = self.handlers.get(extension) else {
                debug!(path = %path.display(), extension = %extension, "No handler for file");
                continue;
            };
            sources.push((
                Source {
                    path: path.clone(),
                    extension: extension.to_string(),
                    origin: TargetKind::File,
                },
                Arc::clone(handler),
            ));
        }

        Ok(sources)
    }

    // Store access

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConfigStore {
        &mut self.store
    }

    pub fn into_store(self) -> ConfigStore {
        self.store
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    pub fn get_path<I, S>(&self, path: I) -> Option<&Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store.get_path(path)
    }

    pub fn lookup(&self, dotted: &str) -> Option<&Value> {
        self.store.lookup(dotted)
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.has(key)
    }

    /// Direct assignment; lost on the next refresh.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.store.set(key, value);
    }

    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.store.delete(key)
    }

    /// Fold a mapping into the store with append semantics; lost on the next refresh.
    pub fn merge(&mut self, mapping: Mapping) {
        self.store.merge(mapping);
    }

    pub fn merge_with(&mut self, mapping: Mapping, mode: MergeMode) {
        self.store.merge_with(mapping, mode);
    }
}

/// Merge one parsed document into the accumulator.
fn absorb(acc: &mut Mapping, value: Value, path: &Path) {
    match value {
        Value::Mapping(mapping) => {
            debug!(path = %path.display(), keys = mapping.len(), "Merging source");
            merge_mappings(acc, mapping, MergeMode::Append);
        }
        other => {
            warn!(
                path = %path.display(),
                kind = other.kind(),
                "Source did not produce a mapping, nothing to merge"
            );
        }
    }
}

/// Builder for an [`Aggregator`] that runs the first refresh on `build`.
#[derive(Default)]
pub struct AggregatorBuilder {
    targets: Vec<PathBuf>,
    handlers: Vec<(Vec<String>, Arc<dyn Handler>)>,
    without_builtins: bool,
    failure_policy: FailurePolicy,
}

impl AggregatorBuilder {
    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        self.targets.push(path.into());
        self
    }

    pub fn targets<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.targets.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Register a handler; later registrations for the same extension win.
    pub fn handler<H>(mut self, extension: impl Into<String>, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        self.handlers
            .push((vec![extension.into()], Arc::new(handler)));
        self
    }

    pub fn handlers<I, S, H>(mut self, extensions: I, handler: H) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        H: Handler + 'static,
    {
        self.handlers.push((
            extensions.into_iter().map(Into::into).collect(),
            Arc::new(handler),
        ));
        self
    }

    /// Start from an empty registry instead of the built-in handlers.
    pub fn without_builtins(mut self) -> Self {
        self.without_builtins = true;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Assemble the aggregator without refreshing.
    pub fn build_empty(self) -> Aggregator {
        let mut handlers = if self.without_builtins {
            HandlerRegistry::new()
        } else {
            HandlerRegistry::with_builtins()
        };
        for (extensions, handler) in self.handlers {
            for extension in extensions {
                handlers.register_shared(extension, Arc::clone(&handler));
            }
        }

        let mut targets = TargetSet::new();
        targets.add_all(&self.targets);

        Aggregator {
            targets,
            handlers,
            store: ConfigStore::new(),
            failure_policy: self.failure_policy,
        }
    }

    /// Assemble the aggregator and run the first refresh.
    pub fn build(self) -> Result<Aggregator> {
        let mut aggregator = self.build_empty();
        aggregator.refresh()?;
        Ok(aggregator)
    }
}

impl std::fmt::Debug for AggregatorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorBuilder")
            .field("targets", &self.targets)
            .field(
                "handlers",
                &self.handlers.iter().map(|(exts, _)| exts).collect::<Vec<_>>(),
            )
            .field("without_builtins", &self.without_builtins)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use tempfile::TempDir;

    #[test]
    fn test_failure_policy_from_str() {
        assert_eq!("abort".parse::<FailurePolicy>(), Ok(FailurePolicy::Abort));
        assert_eq!("Skip".parse::<FailurePolicy>(), Ok(FailurePolicy::Skip));
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_aggregator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Aggregator>();
    }

    #[test]
    fn test_new_has_builtins_and_empty_store() {
        let aggregator = Aggregator::new();
        assert!(aggregator.handlers().contains("json"));
        assert!(aggregator.store().is_empty());
        assert!(aggregator.targets().is_empty());
    }

    #[test]
    fn test_builder_without_builtins() {
        let aggregator = Aggregator::builder().without_builtins().build().unwrap();
        assert!(aggregator.handlers().is_empty());
    }

    #[test]
    fn test_non_mapping_source_is_ignored() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("list.json"), "[1, 2, 3]").unwrap();
        std::fs::write(temp.path().join("map.json"), r#"{"a": 1}"#).unwrap();

        let aggregator = Aggregator::builder().target(temp.path()).build().unwrap();
        assert_eq!(aggregator.store().len(), 1);
        assert_eq!(aggregator.get("a").and_then(Value::as_i64), Some(1));
    }

    #[test]
    fn test_sources_lists_without_parsing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("broken.json"), "{").unwrap();

        let aggregator = Aggregator::builder().target(temp.path()).build_empty();
        let sources = aggregator.sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].extension, "json");
        assert_eq!(sources[0].origin, TargetKind::Directory);
    }

    #[test]
    fn test_builder_handler_overrides_builtin() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.json"), "ignored").unwrap();

        let aggregator = Aggregator::builder()
            .target(temp.path())
            .handler("json", |_: &Path| -> std::result::Result<Value, ParseError> {
                Ok(Value::from_iter([("custom", true)]))
            })
            .build()
            .unwrap();
        assert_eq!(aggregator.get("custom").and_then(Value::as_bool), Some(true));
    }
}
