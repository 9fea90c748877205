//! Aggregation pipelines.

use serde::{Deserialize, Serialize};

use stockdesk_core::types::{Filter, SortField};

/// Options for plain find queries.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort order. Defaults to ascending `id`.
    pub sort: Vec<SortField>,
    /// Maximum number of documents.
    pub limit: Option<u64>,
    /// Documents to skip.
    pub offset: u64,
}

impl FindOptions {
    /// Sort by the given fields.
    pub fn sorted(sort: Vec<SortField>) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }
}

/// One output field of a group stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Accumulator {
    /// Sum of a numeric field.
    Sum {
        /// Source field.
        field: String,
        /// Output field.
        output: String,
    },
    /// Number of documents in the group.
    Count {
        /// Output field.
        output: String,
    },
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Keep documents matching the filter.
    Match(Filter),
    /// Group by the listed fields and compute accumulators per group.
    Group {
        /// Grouping fields, copied into each output document.
        by: Vec<String>,
        /// Computed fields.
        accumulators: Vec<Accumulator>,
    },
    /// Order documents.
    Sort(Vec<SortField>),
    /// Keep the first `n` documents.
    Limit(u64),
}

/// An ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    /// Stages in execution order.
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// An empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append a match stage.
    pub fn matching(self, filter: Filter) -> Self {
        self.stage(Stage::Match(filter))
    }

    /// Append a group stage.
    pub fn group(self, by: &[&str], accumulators: Vec<Accumulator>) -> Self {
        self.stage(Stage::Group {
            by: by.iter().map(|f| f.to_string()).collect(),
            accumulators,
        })
    }

    /// Append a sort stage.
    pub fn sort(self, fields: Vec<SortField>) -> Self {
        self.stage(Stage::Sort(fields))
    }

    /// Append a limit stage.
    pub fn limit(self, n: u64) -> Self {
        self.stage(Stage::Limit(n))
    }
}

impl Accumulator {
    /// Sum `field` into `output`.
    pub fn sum(field: &str, output: &str) -> Self {
        Self::Sum {
            field: field.to_string(),
            output: output.to_string(),
        }
    }

    /// Count documents into `output`.
    pub fn count(output: &str) -> Self {
        Self::Count {
            output: output.to_string(),
        }
    }
}
