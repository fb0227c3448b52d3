//! Task files: the workloads a benchmark run would execute, validated before
//! anything runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::Catalog;
use crate::errors::{PreflightError, Result};
use crate::models::Credentials;
use crate::result::ValidationResult;
use crate::validation::ValidateOptions;

/// One workload: a scenario plugin and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub scenario: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default)]
    pub args: Map<String, Value>,

    /// Runner, contexts, SLA, and anything else the workload carries.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workload {
    /// The whole workload as a JSON object, as seen by validators.
    #[must_use]
    pub fn config(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("scenario".into(), Value::String(self.scenario.clone()));
        if let Some(ns) = &self.namespace {
            map.insert("namespace".into(), Value::String(ns.clone()));
        }
        map.insert("args".into(), Value::Object(self.args.clone()));
        Value::Object(map)
    }
}

/// A parsed task file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskFile {
    pub workloads: Vec<Workload>,
}

/// Validation outcome for one workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadReport {
    /// Position of the workload in the task file.
    pub index: usize,
    pub scenario: String,
    /// Failing results; empty when the workload is valid.
    pub results: Vec<ValidationResult>,
}

impl WorkloadReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.results.is_empty()
    }
}

/// Parse a task document.
pub fn parse_task(content: &str) -> Result<TaskFile> {
    let task: TaskFile = serde_yaml_ng::from_str(content)?;
    if task.workloads.is_empty() {
        return Err(PreflightError::Parse {
            message: "task has no workloads".into(),
        });
    }
    Ok(task)
}

/// Read and parse a task file.
pub fn load_task(path: &Path) -> Result<TaskFile> {
    parse_task(&std::fs::read_to_string(path)?)
}

/// Read a credentials file (YAML or JSON): platform name to `{admin, users}`.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml_ng::from_str(&content)?)
}

/// Validate every workload of a task.
///
/// A workload's own `namespace` takes precedence over the one in `options`.
pub fn validate_task(
    catalog: &Catalog,
    task: &TaskFile,
    credentials: Option<&Credentials>,
    options: &ValidateOptions,
) -> Result<Vec<WorkloadReport>> {
    task.workloads
        .iter()
        .enumerate()
        .map(|(index, workload)| {
            let mut opts = options.clone();
            if let Some(ns) = &workload.namespace {
                opts.namespace = Some(ns.clone());
            }
            let plugin_cfg = Value::Object(workload.args.clone());
            let results = catalog.validate(
                &workload.scenario,
                credentials,
                &workload.config(),
                &plugin_cfg,
                &opts,
            )?;
            Ok(WorkloadReport {
                index,
                scenario: workload.scenario.clone(),
                results,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const CATALOG: &str = r#"
bases:
  - name: scenario
plugins:
  - name: Dummy.dummy
    base: scenario
    validators:
      - name: number
        kwargs: {param_name: sleep, minval: 0}
"#;

    #[test]
    fn parse_task_keeps_extra_keys() {
        let task = parse_task(
            "workloads:\n  - scenario: Dummy.dummy\n    args: {sleep: 1}\n    runner: {type: constant}\n",
        )
        .unwrap();
        let w = &task.workloads[0];
        assert_eq!(w.args["sleep"], json!(1));
        assert_eq!(w.extra["runner"], json!({"type": "constant"}));
        let config = w.config();
        assert_eq!(config["scenario"], "Dummy.dummy");
        assert_eq!(config["runner"]["type"], "constant");
        assert_eq!(config["args"]["sleep"], 1);
    }

    #[test]
    fn parse_task_args_default_to_empty() {
        let task = parse_task("workloads:\n  - scenario: Dummy.dummy\n").unwrap();
        assert!(task.workloads[0].args.is_empty());
    }

    #[test]
    fn parse_task_rejects_non_mapping_args() {
        assert!(parse_task("workloads:\n  - scenario: x\n    args: [1, 2]\n").is_err());
    }

    #[test]
    fn parse_task_without_workloads() {
        assert!(matches!(
            parse_task("workloads: []\n"),
            Err(PreflightError::Parse { .. })
        ));
    }

    #[test]
    fn validate_task_reports_each_workload() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let task = parse_task(
            r#"
workloads:
  - scenario: Dummy.dummy
    args: {sleep: 2}
  - scenario: Dummy.dummy
    args: {sleep: -1}
  - scenario: Missing.scenario
"#,
        )
        .unwrap();
        let reports = validate_task(&catalog, &task, None, &ValidateOptions::new()).unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].is_valid());
        assert_eq!(
            reports[1].results[0].msg(),
            "sleep is -1 which is less than the minimum (0)"
        );
        assert_eq!(reports[2].index, 2);
        assert!(reports[2].results[0].msg().contains("Missing.scenario"));
    }

    #[test]
    fn load_credentials_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creds.yaml");
        fs::write(&path, "openstack:\n  admin: {username: admin}\n  users: []\n").unwrap();
        let creds = load_credentials(&path).unwrap();
        assert!(creds["openstack"].admin.is_some());
    }

    #[test]
    fn load_credentials_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creds.json");
        fs::write(&path, r#"{"openstack": {"admin": null, "users": [{"username": "u"}]}}"#)
            .unwrap();
        let creds = load_credentials(&path).unwrap();
        assert!(creds["openstack"].admin.is_none());
        assert_eq!(creds["openstack"].users.len(), 1);
    }

    #[test]
    fn load_task_missing_file() {
        assert!(matches!(
            load_task(Path::new("/nonexistent/task.yaml")),
            Err(PreflightError::Io(_))
        ));
    }
}
