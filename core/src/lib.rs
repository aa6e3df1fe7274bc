//! volmatch - Volume resource policy conditions
//!
//! Decides whether a Kubernetes volume satisfies the conditions of a backup
//! resource policy rule.
//!
//! # Architecture
//!
//! Matching runs in three stages:
//!
//! - [`VolumeConditions`]: Decodes a rule's untyped condition mapping through
//!   an explicit field table, with precise diagnostics
//! - [`ConditionSet`]: The compiled rule, holding the active
//!   [`VolumeCondition`]s ANDed together
//! - [`StructuredVolume`]: A pod volume or persistent volume normalized into
//!   the fields conditions read
//!
//! # Key Design Insights
//!
//! 1. **Absent means any**: An unset condition, empty list or empty map never
//!    rejects a volume. Only configured conditions are compiled into the set.
//!
//! 2. **Identity templates are strict**: A configured `nfs` or `csi` template
//!    rejects a volume lacking that backend, even if every field is a wildcard.
//!
//! 3. **Quantities compare by value**: `1Gi` and `1024Mi` are equal, and
//!    fractional values round up instead of truncating.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use volmatch::prelude::*;
//!
//! let conditions = VolumeConditions::from_yaml(r#"
//! capacity: "0,100Gi"
//! csi:
//!   driver: ebs.csi.aws.com
//! pvcLabels:
//!   environment: production
//! "#).unwrap();
//! let set = conditions.build();
//!
//! let volume = StructuredVolume::new(
//!     "20Gi".parse().unwrap(),
//!     "gp3",
//!     None,
//!     Some(CsiVolumeSource { driver: "ebs.csi.aws.com".into(), volume_attributes: None }),
//!     None,
//! )
//! .with_pvc_labels(BTreeMap::from([("environment".into(), "production".into())]));
//!
//! assert!(set.matches(&volume));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod capacity;
mod condition;
mod condition_set;
mod config;
mod quantity;
mod trace;
mod volume;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use capacity::Capacity;
pub use condition_set::ConditionSet;
pub use config::{Shape, VolumeConditions};
pub use quantity::Quantity;
pub use volume::{CsiVolumeSource, NfsVolumeSource, StructuredVolume};

// Conditions
pub use condition::{
    is_subset, CapacityCondition, CsiCondition, CsiMatch, NfsCondition, NfsMatch,
    PvcLabelsCondition, StorageClassCondition, VolumeCondition,
};

// Trace types
pub use trace::{ConditionStep, ConditionTrace};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use volmatch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Core types
        Capacity,
        ConditionSet,
        // Trace types
        ConditionStep,
        ConditionTrace,
        // Identity templates
        CsiMatch,
        CsiVolumeSource,
        NfsMatch,
        NfsVolumeSource,
        // Errors
        PolicyError,
        Quantity,
        StructuredVolume,
        // Traits
        VolumeCondition,
        VolumeConditions,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from decoding conditions and normalizing volumes.
///
/// Matching itself never fails; every error surfaces at load time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// A capacity string is not of the form `"<lower>,<upper>"`.
    #[error("capacity {input:?} must be \"<lower>,<upper>\" with exactly one comma")]
    CapacityFormat {
        /// The rejected capacity text.
        input: String,
    },

    /// A quantity could not be parsed.
    #[error("invalid quantity {input:?}: {reason}")]
    InvalidQuantity {
        /// The rejected quantity text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A configuration key is not in the field table.
    #[error("field {field} not found in type {target}")]
    UnknownField {
        /// Path of the unrecognized key (e.g. `nfs.export`).
        field: String,
        /// Type whose table was searched.
        target: &'static str,
    },

    /// A configuration value has the wrong shape.
    #[error("field {field}: cannot decode {literal} into {target}")]
    TypeMismatch {
        /// Path of the offending value (e.g. `pvcLabels.app`).
        field: String,
        /// The literal, with its kind (e.g. ``string `ebs-sc` ``).
        literal: String,
        /// The shape that was expected.
        target: String,
    },

    /// The configuration document is not valid YAML.
    #[error("invalid YAML: {reason}")]
    Yaml {
        /// The parser's message.
        reason: String,
    },
}

/// Result alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, PolicyError>;
