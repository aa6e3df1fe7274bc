//! `VolumeCondition`: Predicates over a [`StructuredVolume`]
//!
//! Each condition answers one question about a volume. Conditions are
//! independent of each other and of how the volume was obtained; a
//! [`ConditionSet`](crate::ConditionSet) ANDs them together.
//!
//! # Available Conditions
//!
//! - [`StorageClassCondition`]: storage class allow-list
//! - [`CapacityCondition`]: capacity range
//! - [`NfsCondition`]: NFS server/path identity
//! - [`CsiCondition`]: CSI driver and attribute subset
//! - [`PvcLabelsCondition`]: claim label subset
//!
//! # Wildcards
//!
//! An absent template (`None`), an empty list and an empty map all match
//! every volume. Inside a template, an unset field matches any value of that
//! field only.

use crate::{Capacity, StructuredVolume};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// A predicate over a normalized volume.
///
/// Evaluation is pure: implementations never mutate themselves, so a
/// condition can be shared across threads and evaluated concurrently.
///
/// # Example
///
/// ```
/// use volmatch::{StructuredVolume, VolumeCondition, StorageClassCondition, Quantity};
///
/// let condition = StorageClassCondition::new(vec!["gp2".into(), "ebs-sc".into()]);
/// let volume = StructuredVolume::new(Quantity::zero(), "gp2", None, None, None);
/// assert!(condition.matches(&volume));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `VolumeCondition`",
    label = "this type cannot be evaluated against a StructuredVolume",
    note = "implement `matches(&self, &StructuredVolume) -> bool` and `name(&self) -> &'static str`"
)]
pub trait VolumeCondition: Send + Sync + Debug {
    /// Returns `true` if the volume satisfies this condition.
    fn matches(&self, volume: &StructuredVolume) -> bool;

    /// Short stable name used in traces and logs (e.g. `"storageClass"`).
    fn name(&self) -> &'static str;
}

// Blanket implementation for boxed conditions
#[diagnostic::do_not_recommend]
impl VolumeCondition for Box<dyn VolumeCondition> {
    fn matches(&self, volume: &StructuredVolume) -> bool {
        (**self).matches(volume)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Returns `true` if every pair in `required` appears with an equal value
/// in `candidate`.
///
/// Extra candidate keys are ignored. An empty `required` map is satisfied
/// by anything, including a missing candidate.
#[must_use]
pub fn is_subset(
    required: &BTreeMap<String, String>,
    candidate: Option<&BTreeMap<String, String>>,
) -> bool {
    if required.is_empty() {
        return true;
    }
    let Some(candidate) = candidate else {
        return false;
    };
    required.iter().all(|(k, v)| candidate.get(k) == Some(v))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Storage class
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches volumes whose storage class is in an allow-list.
///
/// An empty list matches every volume. A volume with an empty storage class
/// never matches a non-empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageClassCondition {
    storage_classes: Vec<String>,
}

impl StorageClassCondition {
    /// Create a condition from an allow-list.
    #[must_use]
    pub fn new(storage_classes: Vec<String>) -> Self {
        Self { storage_classes }
    }

    /// The allowed storage classes.
    #[must_use]
    pub fn storage_classes(&self) -> &[String] {
        &self.storage_classes
    }
}

impl VolumeCondition for StorageClassCondition {
    fn matches(&self, volume: &StructuredVolume) -> bool {
        if self.storage_classes.is_empty() {
            return true;
        }
        let class = volume.storage_class();
        !class.is_empty() && self.storage_classes.iter().any(|sc| sc == class)
    }

    fn name(&self) -> &'static str {
        "storageClass"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Capacity
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches volumes whose capacity falls inside a [`Capacity`] range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityCondition {
    capacity: Capacity,
}

impl CapacityCondition {
    /// Create a condition from a range.
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        Self { capacity }
    }

    /// The configured range.
    #[must_use]
    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }
}

impl VolumeCondition for CapacityCondition {
    fn matches(&self, volume: &StructuredVolume) -> bool {
        self.capacity.is_in_range(volume.capacity())
    }

    fn name(&self) -> &'static str {
        "capacity"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NFS
// ═══════════════════════════════════════════════════════════════════════════════

/// NFS identity template. Unset fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NfsMatch {
    /// Required server, if any.
    pub server: Option<String>,
    /// Required export path, if any.
    pub path: Option<String>,
}

impl NfsMatch {
    /// A template matching any NFS volume.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require this server.
    #[must_use]
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Require this export path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Matches NFS-backed volumes against an [`NfsMatch`] template.
///
/// With no template, every volume matches. With a template, the volume must
/// be NFS backed and agree on every field the template sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NfsCondition {
    nfs: Option<NfsMatch>,
}

impl NfsCondition {
    /// Create a condition from an optional template.
    #[must_use]
    pub fn new(nfs: Option<NfsMatch>) -> Self {
        Self { nfs }
    }
}

impl VolumeCondition for NfsCondition {
    fn matches(&self, volume: &StructuredVolume) -> bool {
        let Some(template) = &self.nfs else {
            return true;
        };
        let Some(nfs) = volume.nfs() else {
            return false;
        };
        template.server.as_ref().map_or(true, |s| *s == nfs.server)
            && template.path.as_ref().map_or(true, |p| *p == nfs.path)
    }

    fn name(&self) -> &'static str {
        "nfs"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CSI
// ═══════════════════════════════════════════════════════════════════════════════

/// CSI identity template. Unset fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsiMatch {
    /// Required driver, if any.
    pub driver: Option<String>,
    /// Attributes that must be present on the volume with equal values.
    pub volume_attributes: Option<BTreeMap<String, String>>,
}

impl CsiMatch {
    /// A template matching any CSI volume.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require this driver.
    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    /// Require one volume attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.volume_attributes
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Matches CSI-backed volumes against a [`CsiMatch`] template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsiCondition {
    csi: Option<CsiMatch>,
}

impl CsiCondition {
    /// Create a condition from an optional template.
    #[must_use]
    pub fn new(csi: Option<CsiMatch>) -> Self {
        Self { csi }
    }
}

impl VolumeCondition for CsiCondition {
    fn matches(&self, volume: &StructuredVolume) -> bool {
        let Some(template) = &self.csi else {
            return true;
        };
        let Some(csi) = volume.csi() else {
            return false;
        };
        if template.driver.as_ref().is_some_and(|d| *d != csi.driver) {
            return false;
        }
        template
            .volume_attributes
            .as_ref()
            .map_or(true, |required| {
                is_subset(required, csi.volume_attributes.as_ref())
            })
    }

    fn name(&self) -> &'static str {
        "csi"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PVC labels
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches volumes whose claim labels include every configured pair.
///
/// A volume without labels fails any non-empty condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PvcLabelsCondition {
    labels: BTreeMap<String, String>,
}

impl PvcLabelsCondition {
    /// Create a condition from the required labels.
    #[must_use]
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    /// The required labels.
    #[must_use]
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }
}

impl VolumeCondition for PvcLabelsCondition {
    fn matches(&self, volume: &StructuredVolume) -> bool {
        is_subset(&self.labels, volume.pvc_labels())
    }

    fn name(&self) -> &'static str {
        "pvcLabels"
    }
}
