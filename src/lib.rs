//! File-based configuration aggregator.
//!
//! Discovers configuration files across registered directories and explicit
//! paths, parses each with a handler chosen by file extension, and folds the
//! results into one [`ConfigStore`].
//!
//! Merging appends rather than overwrites: when two sources define the same
//! leaf, the store holds both values in arrival order. See [`merge`].

pub mod aggregator;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod merge;
pub mod settings;
pub mod store;
pub mod targets;
pub mod value;

pub use aggregator::{Aggregator, AggregatorBuilder, FailurePolicy, RefreshReport, Source};
pub use error::{Error, ParseError, Result};
pub use handlers::{Handler, HandlerRegistry};
pub use merge::MergeMode;
pub use settings::Settings;
pub use store::ConfigStore;
pub use targets::{TargetKind, TargetSet};
pub use value::{Mapping, Scalar, Sequence, Value};
