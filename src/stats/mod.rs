//! Stat sources and the metrics extracted from them.
//!
//! Every monitored entity exposes a fixed set of accounting files. A [`SourceGroup`]
//! names one family of those files (e.g. the `memory` controller) and lists each
//! file together with the [`StatShape`] of its content.
//!
//! # Shapes
//!
//! - [`StatShape::Table`]: `key value` per line, e.g. `memory.stat`, `cpuacct.stat`.
//! - [`StatShape::Array`]: one line of space separated values, e.g. `cpuacct.usage_percpu`.
//! - [`StatShape::Scalar`]: a single value, e.g. `cpuacct.usage`.
//!
//! # Example
//!
//! ```rust
//! use creo_carbon::stats::StatShape;
//!
//! let mut out = Vec::new();
//! StatShape::Scalar.extract("cpuacct.usage", "42\n", "demo.cpuacct", 1_700_000_000, &mut out);
//! assert_eq!(out[0].name(), "demo.cpuacct.cpuacct_usage");
//! assert_eq!(out[0].value(), "42");
//! ```

mod error;
mod parser;

pub use error::StatReadError;

use std::fmt;

/// A named, timestamped value ready to be pushed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    name: String,
    value: String,
    /// Timestamp (in UNIX epoch seconds)
    timestamp: u64,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: impl Into<String>, timestamp: u64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}@{}", self.name, self.value, self.timestamp)
    }
}

/// Text layout of a stat source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatShape {
    /// Newline separated `key value` lines, one metric per line: `prefix.key`.
    Table,
    /// One line of space separated values, one metric per index: `prefix.file_name.index`.
    Array,
    /// The whole file is a single value: `prefix.file_name`.
    Scalar,
}

impl StatShape {
    /// Extracts the metrics contained in `content` and appends them to `out`.
    ///
    /// Dots in `file_name` are replaced with underscores before it becomes part of a
    /// metric name, so `cpuacct.usage` turns into `cpuacct_usage`.
    pub fn extract(
        self,
        file_name: &str,
        content: &str,
        prefix: &str,
        timestamp: u64,
        out: &mut Vec<Metric>,
    ) {
        match self {
            StatShape::Table => parser::extract_table(content, prefix, timestamp, out),
            StatShape::Array => parser::extract_array(file_name, content, prefix, timestamp, out),
            StatShape::Scalar => parser::extract_scalar(file_name, content, prefix, timestamp, out),
        }
    }
}

/// One accounting file inside an entity directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatSource {
    pub file_name: &'static str,
    pub shape: StatShape,
}

impl StatSource {
    pub const fn new(file_name: &'static str, shape: StatShape) -> Self {
        Self { file_name, shape }
    }
}

/// A family of stat sources read together, labelled in metric names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    /// Label placed between entity name and metric: `<entity>.<label>.<metric>`.
    pub label: &'static str,
    /// Directory of the controller hierarchy below the cgroup root.
    pub controller: &'static str,
    /// Sources in the order their metrics appear in a batch.
    pub sources: Vec<StatSource>,
}

impl SourceGroup {
    /// `memory.stat` of the memory controller.
    pub fn memory() -> Self {
        Self {
            label: "memory",
            controller: "memory",
            sources: vec![StatSource::new("memory.stat", StatShape::Table)],
        }
    }

    /// `cpuacct.stat`, `cpuacct.usage` and `cpuacct.usage_percpu` of the cpuacct controller.
    pub fn cpuacct() -> Self {
        Self {
            label: "cpuacct",
            controller: "cpuacct",
            sources: vec![
                StatSource::new("cpuacct.stat", StatShape::Table),
                StatSource::new("cpuacct.usage", StatShape::Scalar),
                StatSource::new("cpuacct.usage_percpu", StatShape::Array),
            ],
        }
    }

    /// All groups forwarded by default.
    pub fn defaults() -> Vec<Self> {
        vec![Self::memory(), Self::cpuacct()]
    }

    /// Metric prefix for an entity: `<entity>.<label>`.
    pub fn prefix_for(&self, entity_name: &str) -> String {
        format!("{}.{}", entity_name, self.label)
    }
}
