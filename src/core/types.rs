use crate::core::error::{PulseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Read-time projection of a metric series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// Number of events closed into each window
    Count,
    /// Summed value divided by count, per window
    Average,
    /// Summed value per window
    Sum,
}

impl Op {
    /// Every operation, in declaration order
    pub const ALL: [Op; 3] = [Op::Count, Op::Average, Op::Sum];

    /// Canonical lowercase name, also used as the sort key for listings
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Count => "count",
            Op::Average => "average",
            Op::Sum => "sum",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Op {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(Op::Count),
            "average" => Ok(Op::Average),
            "sum" => Ok(Op::Sum),
            other => Err(PulseError::UnknownOp(other.to_string())),
        }
    }
}

/// Which operations a display name applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpScope {
    /// Every operation of the metric
    All,
    /// A single operation
    Only(Op),
}

impl From<Op> for OpScope {
    fn from(op: Op) -> Self {
        OpScope::Only(op)
    }
}

/// Listing entry naming one (metric, operation) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    /// Metric name
    pub name: String,
    /// Operation the display name applies to
    pub op: Op,
    /// Label shown on the dashboard
    pub display_name: String,
}

impl MetricDefinition {
    /// Definition used when a metric has no explicit display names
    pub fn synthesized(name: &str, op: Op) -> Self {
        Self {
            name: name.to_string(),
            op,
            display_name: format!("{} - {}", name, op),
        }
    }
}

/// A free-text note shown in the dashboard table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique note key
    #[serde(rename = "key")]
    pub name: String,
    /// Latest text recorded under the key
    pub value: String,
}
