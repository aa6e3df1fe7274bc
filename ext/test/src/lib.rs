//! volmatch-test: Test domain for conformance testing
//!
//! Provides builders for the Kubernetes volume shapes conditions are
//! evaluated against, and the YAML fixture runner in [`fixture`].
//!
//! # Example
//!
//! ```
//! use volmatch_test::prelude::*;
//!
//! let sample = VolumeSample::persistent(nfs_pv("10Gi", "nfs-client", "nas", "/exports"))
//!     .with_label("app", "database");
//!
//! let volume = sample.structure().unwrap();
//! assert_eq!(volume.storage_class(), "nfs-client");
//! assert_eq!(volume.pvc_labels().unwrap()["app"], "database");
//! ```

use k8s_openapi::api::core::v1::{
    CSIPersistentVolumeSource, NFSVolumeSource, PersistentVolume, PersistentVolumeSpec, Volume,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;
use std::collections::BTreeMap;
use volmatch::StructuredVolume;

pub mod fixture;

/// Where a sample volume comes from.
#[derive(Debug, Clone)]
pub enum VolumeSource {
    /// A cluster-scoped persistent volume.
    Persistent(PersistentVolume),
    /// A volume declared inline in a pod spec.
    Pod(Volume),
}

/// A volume plus the labels of its claim, as a caller would supply them.
#[derive(Debug, Clone)]
pub struct VolumeSample {
    source: VolumeSource,
    pvc_labels: Option<BTreeMap<String, String>>,
}

impl VolumeSample {
    /// Sample a persistent volume.
    #[must_use]
    pub fn persistent(pv: PersistentVolume) -> Self {
        Self {
            source: VolumeSource::Persistent(pv),
            pvc_labels: None,
        }
    }

    /// Sample a pod volume.
    #[must_use]
    pub fn pod(volume: Volume) -> Self {
        Self {
            source: VolumeSource::Pod(volume),
            pvc_labels: None,
        }
    }

    /// Attach one claim label (builder pattern).
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pvc_labels
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Attach the full claim label set.
    #[must_use]
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.pvc_labels = Some(labels);
        self
    }

    /// Normalize into the matcher's view of the volume.
    ///
    /// # Errors
    ///
    /// Fails if a persistent volume declares an invalid capacity.
    pub fn structure(&self) -> volmatch::Result<StructuredVolume> {
        let volume = match &self.source {
            VolumeSource::Persistent(pv) => StructuredVolume::from_persistent_volume(pv)?,
            VolumeSource::Pod(volume) => StructuredVolume::from_pod_volume(volume),
        };
        Ok(match &self.pvc_labels {
            Some(labels) => volume.with_pvc_labels(labels.clone()),
            None => volume,
        })
    }
}

fn pv(capacity: &str, storage_class: &str, spec: PersistentVolumeSpec) -> PersistentVolume {
    PersistentVolume {
        spec: Some(PersistentVolumeSpec {
            capacity: Some(BTreeMap::from([(
                "storage".to_string(),
                K8sQuantity(capacity.to_string()),
            )])),
            storage_class_name: (!storage_class.is_empty()).then(|| storage_class.to_string()),
            ..spec
        }),
        ..Default::default()
    }
}

/// An NFS-backed persistent volume.
#[must_use]
pub fn nfs_pv(capacity: &str, storage_class: &str, server: &str, path: &str) -> PersistentVolume {
    pv(
        capacity,
        storage_class,
        PersistentVolumeSpec {
            nfs: Some(NFSVolumeSource {
                server: server.to_string(),
                path: path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
}

/// A CSI-backed persistent volume.
#[must_use]
pub fn csi_pv(
    capacity: &str,
    storage_class: &str,
    driver: &str,
    attributes: &[(&str, &str)],
) -> PersistentVolume {
    let attributes: BTreeMap<String, String> = attributes
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    pv(
        capacity,
        storage_class,
        PersistentVolumeSpec {
            csi: Some(CSIPersistentVolumeSource {
                driver: driver.to_string(),
                volume_handle: format!("{driver}-handle"),
                volume_attributes: (!attributes.is_empty()).then_some(attributes),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{csi_pv, nfs_pv, VolumeSample, VolumeSource};
    pub use volmatch::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::CSIVolumeSource;

    #[test]
    fn persistent_sample_keeps_labels() {
        let volume = VolumeSample::persistent(csi_pv("5Gi", "gp3", "ebs.csi.aws.com", &[]))
            .with_label("environment", "production")
            .structure()
            .unwrap();
        assert_eq!(volume.csi().unwrap().driver, "ebs.csi.aws.com");
        assert!(volume.csi().unwrap().volume_attributes.is_none());
        assert_eq!(volume.pvc_labels().unwrap().len(), 1);
    }

    #[test]
    fn pod_sample_without_labels() {
        let volume = VolumeSample::pod(Volume {
            name: "data".into(),
            csi: Some(CSIVolumeSource {
                driver: "secrets-store.csi.k8s.io".into(),
                ..Default::default()
            }),
            ..Default::default()
        })
        .structure()
        .unwrap();
        assert!(volume.pvc_labels().is_none());
        assert!(volume.capacity().is_zero());
    }

    #[test]
    fn empty_storage_class_is_omitted() {
        let pv = nfs_pv("1Gi", "", "nas", "/x");
        assert!(pv.spec.unwrap().storage_class_name.is_none());
    }
}
