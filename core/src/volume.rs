//! `StructuredVolume`: Backend-agnostic view of a volume
//!
//! Conditions never look at Kubernetes objects directly. A pod volume or a
//! persistent volume is first normalized into a [`StructuredVolume`], which
//! carries only the fields conditions read: capacity, storage class, the NFS
//! or CSI identity, and the claim labels supplied by the caller.

use crate::{Quantity, Result};
use k8s_openapi::api::core::v1::{PersistentVolume, Volume};
use std::collections::BTreeMap;

/// Resource name of declared storage capacity in a PV spec.
const RESOURCE_STORAGE: &str = "storage";

/// Identity of an NFS-backed volume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NfsVolumeSource {
    /// NFS server host name or address.
    pub server: String,
    /// Exported path on the server.
    pub path: String,
}

/// Identity of a CSI-backed volume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsiVolumeSource {
    /// CSI driver name.
    pub driver: String,
    /// Driver-specific volume attributes.
    pub volume_attributes: Option<BTreeMap<String, String>>,
}

/// A volume normalized for condition matching.
///
/// Built fresh for every evaluated volume and never mutated afterwards.
/// At most one of `nfs`/`csi` is populated by the normalizer, but both are
/// independently optional and nothing enforces exclusivity.
///
/// # Example
///
/// ```
/// use k8s_openapi::api::core::v1::{NFSVolumeSource, Volume};
/// use volmatch::StructuredVolume;
///
/// let pod_volume = Volume {
///     name: "data".into(),
///     nfs: Some(NFSVolumeSource {
///         server: "nfs.example.com".into(),
///         path: "/exports/data".into(),
///         ..Default::default()
///     }),
///     ..Default::default()
/// };
///
/// let volume = StructuredVolume::from_pod_volume(&pod_volume);
/// assert_eq!(volume.nfs().unwrap().server, "nfs.example.com");
/// assert!(volume.pvc_labels().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredVolume {
    capacity: Quantity,
    storage_class: String,
    nfs: Option<NfsVolumeSource>,
    csi: Option<CsiVolumeSource>,
    pvc_labels: Option<BTreeMap<String, String>>,
}

impl StructuredVolume {
    /// Create a volume from already-normalized fields.
    #[must_use]
    pub fn new(
        capacity: Quantity,
        storage_class: impl Into<String>,
        nfs: Option<NfsVolumeSource>,
        csi: Option<CsiVolumeSource>,
        pvc_labels: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            capacity,
            storage_class: storage_class.into(),
            nfs,
            csi,
            pvc_labels,
        }
    }

    /// Normalize a pod-scoped volume.
    ///
    /// Pod volumes declare neither capacity nor storage class, and never
    /// carry claim labels; attach those with [`with_pvc_labels`](Self::with_pvc_labels).
    #[must_use]
    pub fn from_pod_volume(volume: &Volume) -> Self {
        Self {
            nfs: volume.nfs.as_ref().map(|nfs| NfsVolumeSource {
                server: nfs.server.clone(),
                path: nfs.path.clone(),
            }),
            csi: volume.csi.as_ref().map(|csi| CsiVolumeSource {
                driver: csi.driver.clone(),
                volume_attributes: csi.volume_attributes.clone(),
            }),
            ..Self::default()
        }
    }

    /// Normalize a persistent volume.
    ///
    /// Capacity comes from the declared `storage` resource (zero if absent)
    /// and storage class from `storageClassName` (empty if absent).
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidQuantity`](crate::PolicyError::InvalidQuantity)
    /// if the declared storage capacity is not a valid quantity.
    pub fn from_persistent_volume(pv: &PersistentVolume) -> Result<Self> {
        let Some(spec) = &pv.spec else {
            return Ok(Self::default());
        };

        let capacity = match spec
            .capacity
            .as_ref()
            .and_then(|resources| resources.get(RESOURCE_STORAGE))
        {
            Some(declared) => Quantity::try_from(declared).inspect_err(|e| {
                tracing::debug!(
                    pv = pv.metadata.name.as_deref().unwrap_or_default(),
                    error = %e,
                    "persistent volume declares an unparseable capacity"
                );
            })?,
            None => Quantity::zero(),
        };

        Ok(Self {
            capacity,
            storage_class: spec.storage_class_name.clone().unwrap_or_default(),
            nfs: spec.nfs.as_ref().map(|nfs| NfsVolumeSource {
                server: nfs.server.clone(),
                path: nfs.path.clone(),
            }),
            csi: spec.csi.as_ref().map(|csi| CsiVolumeSource {
                driver: csi.driver.clone(),
                volume_attributes: csi.volume_attributes.clone(),
            }),
            pvc_labels: None,
        })
    }

    /// Attach the labels of the claim bound to this volume.
    #[must_use]
    pub fn with_pvc_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.pvc_labels = Some(labels);
        self
    }

    /// Declared capacity (zero if unknown).
    #[must_use]
    pub fn capacity(&self) -> &Quantity {
        &self.capacity
    }

    /// Storage class name (empty if not applicable).
    #[must_use]
    pub fn storage_class(&self) -> &str {
        &self.storage_class
    }

    /// NFS identity, if NFS backed.
    #[must_use]
    pub fn nfs(&self) -> Option<&NfsVolumeSource> {
        self.nfs.as_ref()
    }

    /// CSI identity, if CSI backed.
    #[must_use]
    pub fn csi(&self) -> Option<&CsiVolumeSource> {
        self.csi.as_ref()
    }

    /// Claim labels, if the caller attached any.
    #[must_use]
    pub fn pvc_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.pvc_labels.as_ref()
    }
}
