//! Evaluation trace types for debugging condition sets.
//!
//! [`ConditionSet::matches`](crate::ConditionSet::matches) answers yes or no.
//! When a rule unexpectedly skips (or catches) a volume, use
//! [`ConditionSet::matches_with_trace`](crate::ConditionSet::matches_with_trace)
//! to see which condition decided it.
//!
//! # Example
//!
//! ```
//! use volmatch::prelude::*;
//!
//! let set = VolumeConditions::from_yaml(r#"
//! capacity: "1Gi,10Gi"
//! storageClass: [gp2]
//! "#).unwrap().build();
//!
//! let volume = StructuredVolume::new("20Gi".parse().unwrap(), "gp2", None, None, None);
//! let trace = set.matches_with_trace(&volume);
//!
//! assert!(!trace.matched);
//! let failed: Vec<_> = trace.failed().map(|step| step.condition).collect();
//! assert_eq!(failed, vec!["capacity"]);
//! assert!(trace.to_string().contains("[ok] storageClass"));
//! ```

use std::fmt;

/// Result of evaluating one condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionStep {
    /// Condition name (e.g. `"storageClass"`).
    pub condition: &'static str,
    /// Debug rendering of the condition's configuration.
    pub detail: String,
    /// Whether the condition matched.
    pub matched: bool,
}

/// Trace of a full [`ConditionSet`](crate::ConditionSet) evaluation.
///
/// Every condition is evaluated (no short-circuit), so `steps` always has one
/// entry per condition in the set.
///
/// # INV: `matched` == `matches()` result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionTrace {
    /// Whether every condition matched.
    pub matched: bool,
    /// Per-condition results, in evaluation order.
    pub steps: Vec<ConditionStep>,
}

impl ConditionTrace {
    /// Steps whose condition did not match.
    pub fn failed(&self) -> impl Iterator<Item = &ConditionStep> {
        self.steps.iter().filter(|step| !step.matched)
    }
}

impl fmt::Display for ConditionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.matched { "matched" } else { "no match" };
        if self.steps.is_empty() {
            return write!(f, "{verdict} (no conditions)");
        }
        write!(f, "{verdict}")?;
        for step in &self.steps {
            let mark = if step.matched { "ok" } else { "FAIL" };
            write!(f, "\n  [{mark}] {}: {}", step.condition, step.detail)?;
        }
        Ok(())
    }
}
