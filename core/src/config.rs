//! `VolumeConditions`: Decoding untyped rule configuration
//!
//! Rule files are parsed upstream into a generic mapping. This module turns
//! that mapping into typed conditions through explicit field tables: every
//! accepted key, its expected shape and its setter are declared up front, and
//! every diagnostic is generated from the table.
//!
//! # Accepted keys
//!
//! | Key | Shape | Decoded into |
//! |-----|-------|--------------|
//! | `capacity` | string `"<lower>,<upper>"` | [`Capacity`] |
//! | `storageClass` | list of strings | allow-list |
//! | `nfs` | `{server, path}` | [`NfsMatch`] |
//! | `csi` | `{driver, volumeAttributes}` | [`CsiMatch`] |
//! | `pvcLabels` | map of strings | required labels |
//!
//! Scalars (strings, numbers, booleans) are accepted wherever a string is
//! expected and keep their textual form. A `null` value is treated as if the
//! key were absent. An empty `server`, `path` or `driver` means "any".
//!
//! # Example
//!
//! ```
//! use volmatch::VolumeConditions;
//!
//! let conditions = VolumeConditions::from_yaml(r#"
//! capacity: "1Gi,10Gi"
//! storageClass: [gp2, ebs-sc]
//! csi:
//!   driver: aws.efs.csi.driver
//! pvcLabels:
//!   environment: production
//! "#).unwrap();
//!
//! assert_eq!(conditions.storage_class, vec!["gp2", "ebs-sc"]);
//! assert_eq!(conditions.build().len(), 4);
//!
//! let err = VolumeConditions::from_yaml("storageClass: ebs-sc").unwrap_err();
//! assert!(err.to_string().contains("string `ebs-sc`"));
//! ```

use crate::{Capacity, ConditionSet, CsiMatch, NfsMatch, PolicyError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Decoded conditions of one rule.
///
/// Produced by [`from_mapping`](Self::from_mapping) and friends, then compiled
/// into a [`ConditionSet`] with [`build`](Self::build). Unset members leave the
/// corresponding aspect of the volume unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeConditions {
    /// Capacity range, if configured.
    pub capacity: Option<Capacity>,
    /// Storage class allow-list (empty = any).
    pub storage_class: Vec<String>,
    /// NFS identity template.
    pub nfs: Option<NfsMatch>,
    /// CSI identity template.
    pub csi: Option<CsiMatch>,
    /// Required claim labels (empty = any).
    pub pvc_labels: BTreeMap<String, String>,
}

impl VolumeConditions {
    /// Decode conditions from a generic mapping.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::UnknownField`] for a key outside the field table
    /// - [`PolicyError::TypeMismatch`] for a value of the wrong shape
    /// - [`PolicyError::CapacityFormat`] / [`PolicyError::InvalidQuantity`]
    ///   for a malformed capacity
    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self> {
        decode_fields(mapping, VOLUME_CONDITION_FIELDS, VOLUME_CONDITIONS, None).inspect_err(
            |e| tracing::debug!(error = %e, "rejected volume conditions"),
        )
    }

    /// Decode conditions from a JSON value.
    ///
    /// `null` decodes to the empty condition set.
    ///
    /// # Errors
    ///
    /// As [`from_mapping`](Self::from_mapping); a value that is not a mapping
    /// is a [`PolicyError::TypeMismatch`].
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(mapping) => Self::from_mapping(mapping),
            other => Err(Site {
                path: "conditions".to_owned(),
                shape: Shape::Object(VOLUME_CONDITIONS),
            }
            .mismatch(other)),
        }
    }

    /// Decode conditions from a YAML document.
    ///
    /// # Errors
    ///
    /// [`PolicyError::Yaml`] if the text is not YAML, otherwise as
    /// [`from_value`](Self::from_value).
    pub fn from_yaml(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| PolicyError::Yaml {
            reason: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// The accepted top-level keys and their shapes.
    pub fn known_fields() -> impl Iterator<Item = (&'static str, Shape)> {
        VOLUME_CONDITION_FIELDS.iter().map(|f| (f.name, f.shape))
    }

    /// Compile into a [`ConditionSet`].
    #[must_use]
    pub fn build(&self) -> ConditionSet {
        ConditionSet::from(self)
    }
}

impl<'de> Deserialize<'de> for VolumeConditions {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Field tables
// ═══════════════════════════════════════════════════════════════════════════════

const VOLUME_CONDITIONS: &str = "VolumeConditions";
const NFS_VOLUME_SOURCE: &str = "NfsVolumeSource";
const CSI_VOLUME_SOURCE: &str = "CsiVolumeSource";

/// Value shape a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A scalar, kept as text.
    String,
    /// A sequence of scalars.
    StringList,
    /// A mapping from string keys to scalars.
    StringMap,
    /// A nested object with its own field table.
    Object(&'static str),
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::StringList => f.write_str("list of strings"),
            Self::StringMap => f.write_str("map of strings"),
            Self::Object(name) => write!(f, "object {name}"),
        }
    }
}

/// One row of a field table.
struct Field<T> {
    name: &'static str,
    shape: Shape,
    decode: fn(&mut T, &Value, &Site) -> Result<()>,
}

const VOLUME_CONDITION_FIELDS: &[Field<VolumeConditions>] = &[
    Field {
        name: "capacity",
        shape: Shape::String,
        decode: decode_capacity,
    },
    Field {
        name: "storageClass",
        shape: Shape::StringList,
        decode: decode_storage_class,
    },
    Field {
        name: "nfs",
        shape: Shape::Object(NFS_VOLUME_SOURCE),
        decode: decode_nfs,
    },
    Field {
        name: "csi",
        shape: Shape::Object(CSI_VOLUME_SOURCE),
        decode: decode_csi,
    },
    Field {
        name: "pvcLabels",
        shape: Shape::StringMap,
        decode: decode_pvc_labels,
    },
];

const NFS_FIELDS: &[Field<NfsMatch>] = &[
    Field {
        name: "server",
        shape: Shape::String,
        decode: decode_nfs_server,
    },
    Field {
        name: "path",
        shape: Shape::String,
        decode: decode_nfs_path,
    },
];

const CSI_FIELDS: &[Field<CsiMatch>] = &[
    Field {
        name: "driver",
        shape: Shape::String,
        decode: decode_csi_driver,
    },
    Field {
        name: "volumeAttributes",
        shape: Shape::StringMap,
        decode: decode_csi_attributes,
    },
];

fn decode_capacity(conditions: &mut VolumeConditions, value: &Value, site: &Site) -> Result<()> {
    conditions.capacity = Some(Capacity::parse(&site.string(value)?)?);
    Ok(())
}

fn decode_storage_class(
    conditions: &mut VolumeConditions,
    value: &Value,
    site: &Site,
) -> Result<()> {
    conditions.storage_class = site.string_list(value)?;
    Ok(())
}

fn decode_nfs(conditions: &mut VolumeConditions, value: &Value, site: &Site) -> Result<()> {
    conditions.nfs = Some(site.object(value, NFS_FIELDS)?);
    Ok(())
}

fn decode_csi(conditions: &mut VolumeConditions, value: &Value, site: &Site) -> Result<()> {
    conditions.csi = Some(site.object(value, CSI_FIELDS)?);
    Ok(())
}

fn decode_pvc_labels(conditions: &mut VolumeConditions, value: &Value, site: &Site) -> Result<()> {
    conditions.pvc_labels = site.string_map(value)?;
    Ok(())
}

fn decode_nfs_server(nfs: &mut NfsMatch, value: &Value, site: &Site) -> Result<()> {
    nfs.server = non_empty(site.string(value)?);
    Ok(())
}

fn decode_nfs_path(nfs: &mut NfsMatch, value: &Value, site: &Site) -> Result<()> {
    nfs.path = non_empty(site.string(value)?);
    Ok(())
}

fn decode_csi_driver(csi: &mut CsiMatch, value: &Value, site: &Site) -> Result<()> {
    csi.driver = non_empty(site.string(value)?);
    Ok(())
}

fn decode_csi_attributes(csi: &mut CsiMatch, value: &Value, site: &Site) -> Result<()> {
    csi.volume_attributes = Some(site.string_map(value)?);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Decoding machinery
// ═══════════════════════════════════════════════════════════════════════════════

/// Applies `fields` to every key of `mapping`.
fn decode_fields<T: Default>(
    mapping: &Map<String, Value>,
    fields: &[Field<T>],
    type_name: &'static str,
    prefix: Option<&str>,
) -> Result<T> {
    let mut decoded = T::default();
    for (key, value) in mapping {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        let Some(field) = fields.iter().find(|f| f.name == key) else {
            return Err(PolicyError::UnknownField {
                field: path,
                target: type_name,
            });
        };
        if value.is_null() {
            continue;
        }
        let site = Site {
            path,
            shape: field.shape,
        };
        (field.decode)(&mut decoded, value, &site)?;
    }
    Ok(decoded)
}

/// Location of a value in the document and the shape expected there.
struct Site {
    path: String,
    shape: Shape,
}

impl Site {
    fn mismatch(&self, literal: &Value) -> PolicyError {
        PolicyError::TypeMismatch {
            field: self.path.clone(),
            literal: describe(literal),
            target: self.shape.to_string(),
        }
    }

    fn child(&self, segment: impl fmt::Display, shape: Shape) -> Site {
        Site {
            path: format!("{}{segment}", self.path),
            shape,
        }
    }

    fn string(&self, value: &Value) -> Result<String> {
        scalar_text(value).ok_or_else(|| self.mismatch(value))
    }

    fn string_list(&self, value: &Value) -> Result<Vec<String>> {
        let Value::Array(items) = value else {
            return Err(self.mismatch(value));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.child(format_args!("[{i}]"), Shape::String).string(item))
            .collect()
    }

    fn string_map(&self, value: &Value) -> Result<BTreeMap<String, String>> {
        let Value::Object(entries) = value else {
            return Err(self.mismatch(value));
        };
        entries
            .iter()
            .map(|(k, v)| {
                let text = self.child(format_args!(".{k}"), Shape::String).string(v)?;
                Ok((k.clone(), text))
            })
            .collect()
    }

    fn object<T: Default>(&self, value: &Value, fields: &[Field<T>]) -> Result<T> {
        let (Value::Object(entries), Shape::Object(type_name)) = (value, self.shape) else {
            return Err(self.mismatch(value));
        };
        decode_fields(entries, fields, type_name, Some(self.path.as_str()))
    }
}

/// Text of a scalar value; `None` for null, sequences and mappings.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Describes a literal for diagnostics, e.g. ``string `ebs-sc` ``.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => format!("bool `{b}`"),
        Value::Number(n) => format!("number `{n}`"),
        Value::String(s) => format!("string `{s}`"),
        Value::Array(_) => format!("sequence `{value}`"),
        Value::Object(_) => format!("mapping `{value}`"),
    }
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
