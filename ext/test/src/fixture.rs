//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against volmatch. A fixture holds one
//! rule's raw `conditions` mapping and either an `expect_error` substring or
//! a list of volume cases with the expected verdict.

use k8s_openapi::api::core::v1::{PersistentVolume, Volume};
use serde::Deserialize;
use std::collections::BTreeMap;
use volmatch::{ConditionSet, VolumeConditions};

use crate::VolumeSample;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub description: String,
    /// Raw conditions, decoded by the library under test.
    #[serde(default)]
    pub conditions: serde_json::Value,
    /// Substring the decode error must contain. Cases are ignored when set.
    #[serde(default)]
    pub expect_error: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Test case: exactly one of `persistentVolume` or `podVolume`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub persistent_volume: Option<PersistentVolume>,
    #[serde(default)]
    pub pod_volume: Option<Volume>,
    #[serde(default)]
    pub pvc_labels: Option<BTreeMap<String, String>>,
    pub expect: bool,
}

impl TestCase {
    /// Build the volume sample this case describes
    pub fn build_sample(&self) -> Result<VolumeSample, String> {
        let sample = match (&self.persistent_volume, &self.pod_volume) {
            (Some(pv), None) => VolumeSample::persistent(pv.clone()),
            (None, Some(volume)) => VolumeSample::pod(volume.clone()),
            _ => return Err("case needs exactly one of persistentVolume or podVolume".into()),
        };
        Ok(match &self.pvc_labels {
            Some(labels) => sample.with_labels(labels.clone()),
            None => sample,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Vec<CaseResult> {
        let decoded = VolumeConditions::from_value(&self.conditions);

        if let Some(expected) = &self.expect_error {
            let (passed, actual) = match &decoded {
                Ok(conditions) => (false, format!("decoded {conditions:?}")),
                Err(e) => (e.to_string().contains(expected.as_str()), e.to_string()),
            };
            return vec![CaseResult {
                case_name: "decode".into(),
                passed,
                expected: format!("error containing {expected:?}"),
                actual,
            }];
        }

        let set = match decoded {
            Ok(conditions) => conditions.build(),
            Err(e) => {
                return vec![CaseResult {
                    case_name: "decode".into(),
                    passed: false,
                    expected: "conditions to decode".into(),
                    actual: e.to_string(),
                }]
            }
        };

        self.cases
            .iter()
            .map(|case| run_case(&set, case))
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self.run();
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {}, got {}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

fn run_case(set: &ConditionSet, case: &TestCase) -> CaseResult {
    let volume = case
        .build_sample()
        .and_then(|sample| sample.structure().map_err(|e| e.to_string()));

    let (passed, actual) = match volume {
        Ok(volume) => {
            let matched = set.matches(&volume);
            let trace = set.matches_with_trace(&volume);
            (
                matched == case.expect && trace.matched == matched,
                trace.to_string(),
            )
        }
        Err(e) => (false, e),
    };

    CaseResult {
        case_name: case.name.clone(),
        passed,
        expected: if case.expect { "match" } else { "no match" }.into(),
        actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
name: storage class allow-list
description: only listed classes match
conditions:
  storageClass: [gp2]
cases:
  - name: listed
    persistentVolume:
      apiVersion: v1
      kind: PersistentVolume
      spec:
        storageClassName: gp2
    expect: true
  - name: unlisted
    persistentVolume:
      apiVersion: v1
      kind: PersistentVolume
      spec:
        storageClassName: gp3
    expect: false
"#;

    #[test]
    fn parses_and_runs_single_fixture() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        assert_eq!(fixture.cases.len(), 2);
        let results = fixture.run();
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn wrong_expectation_is_reported() {
        let mut fixture = Fixture::from_yaml(FIXTURE).unwrap();
        fixture.cases[1].expect = true;
        let results = fixture.run();
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert!(results[1].actual.contains("[FAIL] storageClass"));
    }

    #[test]
    fn expected_error_fixture() {
        let fixture = Fixture::from_yaml(
            r#"
name: unknown key
description: rejected at decode time
conditions:
  Capacity: "1Gi,10Gi"
expect_error: "field Capacity not found"
"#,
        )
        .unwrap();
        let results = fixture.run();
        assert_eq!(results.len(), 1);
        assert!(results[0].passed, "{results:?}");
    }

    #[test]
    fn case_without_volume_fails() {
        let case = TestCase {
            name: "empty".into(),
            persistent_volume: None,
            pod_volume: None,
            pvc_labels: None,
            expect: true,
        };
        assert!(case.build_sample().is_err());
    }
}
