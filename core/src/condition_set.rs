//! `ConditionSet`: Conjunction of volume conditions
//!
//! One `ConditionSet` is compiled per configured rule. It holds only the
//! conditions the rule actually constrains; an empty set matches every
//! volume.

use crate::{
    CapacityCondition, ConditionStep, ConditionTrace, CsiCondition, NfsCondition,
    PvcLabelsCondition, StorageClassCondition, StructuredVolume, VolumeCondition,
    VolumeConditions,
};
use std::fmt::Debug;

/// All conditions of one rule, ANDed together.
///
/// # Example
///
/// ```
/// use volmatch::prelude::*;
///
/// let conditions = VolumeConditions::from_yaml(r#"
/// capacity: "0,100Gi"
/// storageClass: [gp2]
/// "#).unwrap();
/// let set = conditions.build();
///
/// let volume = StructuredVolume::new("10Gi".parse().unwrap(), "gp2", None, None, None);
/// assert!(set.matches(&volume));
/// ```
#[derive(Default)]
pub struct ConditionSet {
    conditions: Vec<Box<dyn VolumeCondition>>,
}

impl ConditionSet {
    /// Create a set from explicit conditions.
    #[must_use]
    pub fn new(conditions: Vec<Box<dyn VolumeCondition>>) -> Self {
        Self { conditions }
    }

    /// A set with no conditions; matches every volume.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if the volume satisfies every condition.
    ///
    /// Stops at the first condition that does not match.
    pub fn matches(&self, volume: &StructuredVolume) -> bool {
        self.conditions.iter().all(|condition| {
            let matched = condition.matches(volume);
            if !matched {
                tracing::trace!(condition = condition.name(), "volume rejected");
            }
            matched
        })
    }

    /// Evaluate every condition and record each result.
    ///
    /// Unlike [`matches()`](Self::matches), this does NOT short-circuit.
    #[must_use]
    pub fn matches_with_trace(&self, volume: &StructuredVolume) -> ConditionTrace {
        let steps: Vec<ConditionStep> = self
            .conditions
            .iter()
            .map(|condition| ConditionStep {
                condition: condition.name(),
                detail: format!("{condition:?}"),
                matched: condition.matches(volume),
            })
            .collect();
        ConditionTrace {
            matched: steps.iter().all(|step| step.matched),
            steps,
        }
    }

    /// The conditions in evaluation order.
    #[must_use]
    pub fn conditions(&self) -> &[Box<dyn VolumeCondition>] {
        &self.conditions
    }

    /// Number of active conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns `true` if the set holds no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl From<&VolumeConditions> for ConditionSet {
    /// Compile decoded conditions, skipping every unconstrained member.
    fn from(config: &VolumeConditions) -> Self {
        let mut conditions: Vec<Box<dyn VolumeCondition>> = Vec::new();

        if let Some(capacity) = config.capacity.as_ref().filter(|c| !c.is_unconstrained()) {
            conditions.push(Box::new(CapacityCondition::new(capacity.clone())));
        }
        if !config.storage_class.is_empty() {
            conditions.push(Box::new(StorageClassCondition::new(
                config.storage_class.clone(),
            )));
        }
        if config.nfs.is_some() {
            conditions.push(Box::new(NfsCondition::new(config.nfs.clone())));
        }
        if config.csi.is_some() {
            conditions.push(Box::new(CsiCondition::new(config.csi.clone())));
        }
        if !config.pvc_labels.is_empty() {
            conditions.push(Box::new(PvcLabelsCondition::new(
                config.pvc_labels.clone(),
            )));
        }

        Self { conditions }
    }
}

impl Debug for ConditionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.conditions).finish()
    }
}
