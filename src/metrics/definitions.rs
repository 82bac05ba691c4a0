//! Display name overrides per (metric, operation) pair.

use crate::core::{MetricDefinition, Op, OpScope};

/// At most one display name per operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
    count: Option<String>,
    average: Option<String>,
    sum: Option<String>,
}

impl Definitions {
    /// Set the display name for `scope`, replacing any previous one
    pub fn define(&mut self, scope: OpScope, display_name: &str) {
        match scope {
            OpScope::All => {
                for op in Op::ALL {
                    *self.slot_mut(op) = Some(display_name.to_string());
                }
            },
            OpScope::Only(op) => *self.slot_mut(op) = Some(display_name.to_string()),
        }
    }

    /// Display name explicitly set for `op`
    pub fn get(&self, op: Op) -> Option<&str> {
        match op {
            Op::Count => self.count.as_deref(),
            Op::Average => self.average.as_deref(),
            Op::Sum => self.sum.as_deref(),
        }
    }

    /// True when no display name was ever set
    pub fn is_empty(&self) -> bool {
        Op::ALL.iter().all(|&op| self.get(op).is_none())
    }

    /// Append the listing entries for metric `name` to `out`.
    ///
    /// Explicit entries only; all three synthesized ones when there are none.
    pub fn list_into(&self, name: &str, out: &mut Vec<MetricDefinition>) {
        if self.is_empty() {
            out.extend(Op::ALL.iter().map(|&op| MetricDefinition::synthesized(name, op)));
            return;
        }

        for op in Op::ALL {
            if let Some(display_name) = self.get(op) {
                out.push(MetricDefinition {
                    name: name.to_string(),
                    op,
                    display_name: display_name.to_string(),
                });
            }
        }
    }

    fn slot_mut(&mut self, op: Op) -> &mut Option<String> {
        match op {
            Op::Count => &mut self.count,
            Op::Average => &mut self.average,
            Op::Sum => &mut self.sum,
        }
    }
}

/// Listing order: metric name, then the canonical operation name
pub fn sort_definitions(defs: &mut [MetricDefinition]) {
    defs.sort_unstable_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.op.as_str().cmp(b.op.as_str()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(defs: &Definitions, name: &str) -> Vec<(Op, String)> {
        let mut out = Vec::new();
        defs.list_into(name, &mut out);
        out.into_iter().map(|d| (d.op, d.display_name)).collect()
    }

    #[test]
    fn test_empty_synthesizes_three() {
        let defs = Definitions::default();
        assert!(defs.is_empty());
        assert_eq!(
            listing(&defs, "reqs"),
            vec![
                (Op::Count, "reqs - count".to_string()),
                (Op::Average, "reqs - average".to_string()),
                (Op::Sum, "reqs - sum".to_string()),
            ]
        );
    }

    #[test]
    fn test_single_op_hides_the_others() {
        let mut defs = Definitions::default();
        defs.define(Op::Sum.into(), "Bytes out");
        assert_eq!(listing(&defs, "bytes"), vec![(Op::Sum, "Bytes out".to_string())]);
    }

    #[test]
    fn test_wildcard_overwrites_every_op() {
        let mut defs = Definitions::default();
        defs.define(OpScope::Only(Op::Count), "Old");
        defs.define(OpScope::All, "Latency");
        for op in Op::ALL {
            assert_eq!(defs.get(op), Some("Latency"));
        }

        defs.define(OpScope::Only(Op::Average), "Mean latency");
        assert_eq!(defs.get(Op::Average), Some("Mean latency"));
        assert_eq!(defs.get(Op::Count), Some("Latency"));
    }

    #[test]
    fn test_sort_by_name_then_op_string() {
        let mut defs = vec![
            MetricDefinition::synthesized("b", Op::Count),
            MetricDefinition::synthesized("a", Op::Sum),
            MetricDefinition::synthesized("a", Op::Count),
            MetricDefinition::synthesized("a", Op::Average),
        ];
        sort_definitions(&mut defs);

        let order: Vec<(&str, Op)> = defs.iter().map(|d| (d.name.as_str(), d.op)).collect();
        assert_eq!(
            order,
            vec![("a", Op::Average), ("a", Op::Count), ("a", Op::Sum), ("b", Op::Count)]
        );
    }
}
