use std::{fmt::Display, fs::File, io::BufReader, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{workflow::AnalysisTask, AodResult};

/// A named task setting with its current value, default, and description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configurable {
    pub name: String,
    pub value: Value,
    pub default: Value,
    pub description: String,
}

impl Configurable {
    pub fn new(
        name: &str,
        value: impl Into<Value>,
        default: impl Into<Value>,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            default: default.into(),
            description: description.to_string(),
        }
    }

    /// Whether the current value differs from the default.
    pub fn is_modified(&self) -> bool {
        self.value != self.default
    }
}

impl Display for Configurable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.name, self.value)?;
        if self.is_modified() {
            write!(f, " (default {})", self.default)?;
        }
        write!(f, ": {}", self.description)
    }
}

/// A named processing mode of a task which can be turned on or off from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSwitch {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

impl ProcessSwitch {
    pub fn new(name: &str, description: &str, enabled: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            enabled,
        }
    }
}

impl Display for ProcessSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            if self.enabled { "x" } else { " " },
            self.name,
            self.description
        )
    }
}

/// The contents of a workflow file: an ordered list of tasks with their settings.
///
/// ```json
/// { "tasks": [ { "type": "V0McExample", "v0_cos_pa": 0.99, "processRun2": true } ] }
/// ```
///
/// Each entry's `type` selects the task; any setting left out takes its default value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub tasks: Vec<Box<dyn AnalysisTask>>,
}

impl WorkflowConfig {
    /// Parse a workflow from a JSON string.
    pub fn from_json_str(json: &str) -> AodResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a workflow from a JSON file. The path may contain `~` and environment variables.
    pub fn from_json_file(file_path: &str) -> AodResult<Self> {
        let path = PathBuf::from(&*shellexpand::full(file_path)?);
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serialize the workflow, including every task's settings, as pretty-printed JSON.
    pub fn to_json_string(&self) -> AodResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks.iter().map(|task| task.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_configurable_display() {
        let c = Configurable::new("nBinsPt", 50, 100, "N bins in pT histo");
        assert!(c.is_modified());
        assert_eq!(c.to_string(), "nBinsPt = 50 (default 100): N bins in pT histo");
        let c = Configurable::new("cut", 0.2, 0.2, "DCA cut");
        assert!(!c.is_modified());
        assert_eq!(c.to_string(), "cut = 0.2: DCA cut");
    }

    #[test]
    fn test_process_switch_display() {
        let switch = ProcessSwitch::new("processRun3", "Process Run 3 data", true);
        assert_eq!(switch.to_string(), "[x] processRun3: Process Run 3 data");
    }

    #[test]
    fn test_empty_workflow() {
        let config = WorkflowConfig::from_json_str("{}").unwrap();
        assert!(config.tasks.is_empty());
        let config = WorkflowConfig::from_json_str(r#"{"tasks": []}"#).unwrap();
        assert!(config.tasks.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            WorkflowConfig::from_json_str("{\"tasks\": 3}"),
            Err(crate::AodError::JsonError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            WorkflowConfig::from_json_file("/definitely/not/a/workflow.json"),
            Err(crate::AodError::IOError(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tasks": []}}"#).unwrap();
        let config = WorkflowConfig::from_json_file(file.path().to_str().unwrap()).unwrap();
        assert!(config.task_names().is_empty());
        let json = config.to_json_string().unwrap();
        assert!(json.contains("\"tasks\""));
    }
}
