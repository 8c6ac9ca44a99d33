use std::{
    fmt::{Debug, Display},
    fs::File,
    io::BufWriter,
    path::PathBuf,
    time::Instant,
};

use dyn_clone::DynClone;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::{
    config::{Configurable, ProcessSwitch, WorkflowConfig},
    data::{io::WriteOptions, AodSource, DerivedTables},
    histogram::{Histogram, HistogramRegistry},
    AodError, AodResult,
};

/// Everything a task may touch while processing: the read-only input tables, the derived tables
/// shared with other tasks, and the task's own histograms.
pub struct ProcessingContext<'a> {
    pub source: &'a dyn AodSource,
    pub derived: &'a mut DerivedTables,
    pub registry: &'a mut HistogramRegistry,
}

/// An analysis task which can be configured, initialised, and run over an [`AodSource`].
///
/// Tasks are (de)serialised as trait objects: a JSON object with a `"type"` field naming the task
/// and the task's settings as the remaining fields.
#[typetag::serde(tag = "type")]
pub trait AnalysisTask: DynClone + Debug + Send + Sync {
    /// The unique name of this task within a workflow.
    fn name(&self) -> String;

    /// Every setting of this task with its current value, default, and description.
    fn configurables(&self) -> Vec<Configurable>;

    /// The task's processing modes. Tasks with a single mode can rely on the default.
    fn process_switches(&self) -> Vec<ProcessSwitch> {
        vec![ProcessSwitch::new("process", "Default process function", true)]
    }

    /// Table names (such as `D0CANDIDATES`) of the derived tables this task fills. Rows of these
    /// tables handed to [`Workflow::run_with`] are discarded before any task runs.
    fn produces(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Register histograms. Called once per run, before any task processes data.
    fn init(&mut self, registry: &mut HistogramRegistry) -> AodResult<()>;

    /// Run every enabled processing mode over the input.
    fn process(&mut self, ctx: &mut ProcessingContext<'_>) -> AodResult<()>;
}

dyn_clone::clone_trait_object!(AnalysisTask);

/// An ordered list of tasks run one after another over the same input.
#[derive(Clone, Debug, Default)]
pub struct Workflow {
    tasks: Vec<Box<dyn AnalysisTask>>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a workflow from a parsed workflow file.
    pub fn from_config(config: WorkflowConfig) -> AodResult<Self> {
        let mut workflow = Self::new();
        for task in config.tasks {
            workflow.add(task)?;
        }
        Ok(workflow)
    }

    /// Append a task.
    ///
    /// # Errors
    ///
    /// Returns [`AodError::DuplicateTask`] if a task with the same name is already present.
    pub fn add(&mut self, task: Box<dyn AnalysisTask>) -> AodResult<()> {
        let name = task.name();
        if self.tasks.iter().any(|t| t.name() == name) {
            return Err(AodError::DuplicateTask { name });
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Builder-style version of [`Workflow::add`].
    pub fn with_task(mut self, task: Box<dyn AnalysisTask>) -> AodResult<Self> {
        self.add(task)?;
        Ok(self)
    }

    pub fn tasks(&self) -> &[Box<dyn AnalysisTask>] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The workflow as a [`WorkflowConfig`], e.g. to write out the effective settings.
    pub fn to_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            tasks: self.tasks.clone(),
        }
    }

    /// Check that every task has at least one enabled processing mode.
    pub fn validate(&self) -> AodResult<()> {
        for task in &self.tasks {
            if !task.process_switches().iter().any(|switch| switch.enabled) {
                return Err(AodError::NoProcessEnabled { task: task.name() });
            }
        }
        Ok(())
    }

    /// Run every task over `source`, starting with no derived tables.
    pub fn run(&mut self, source: &dyn AodSource) -> AodResult<WorkflowOutput> {
        self.run_with(source, DerivedTables::default())
    }

    /// Run every task over `source`, starting from existing derived tables (for example, ones
    /// produced by an earlier workflow and loaded from disk).
    pub fn run_with(
        &mut self,
        source: &dyn AodSource,
        mut derived: DerivedTables,
    ) -> AodResult<WorkflowOutput> {
        self.validate()?;
        for task in &self.tasks {
            for table in task.produces() {
                let discarded = derived.clear(table)?;
                if discarded > 0 {
                    info!(
                        task = %task.name(),
                        table,
                        rows = discarded,
                        "discarding pre-loaded rows of a table produced by this workflow"
                    );
                }
            }
        }
        let mut registries: IndexMap<String, HistogramRegistry> = IndexMap::new();
        for task in self.tasks.iter_mut() {
            let mut registry = HistogramRegistry::new();
            task.init(&mut registry)?;
            debug!(task = %task.name(), histograms = registry.len(), "initialised task");
            registries.insert(task.name(), registry);
        }
        info!(tasks = self.tasks.len(), "starting workflow");
        for task in self.tasks.iter_mut() {
            let start = Instant::now();
            let name = task.name();
            let registry = registries
                .get_mut(&name)
                .ok_or_else(|| AodError::Custom(format!("Task \"{name}\" was not initialised")))?;
            let mut ctx = ProcessingContext {
                source,
                derived: &mut derived,
                registry,
            };
            task.process(&mut ctx)?;
            info!(
                task = %name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "finished task"
            );
        }
        Ok(WorkflowOutput {
            histograms: registries,
            derived,
        })
    }
}

/// The results of a workflow run: one histogram registry per task, plus the derived tables.
#[derive(Clone, Debug, Default)]
pub struct WorkflowOutput {
    pub histograms: IndexMap<String, HistogramRegistry>,
    pub derived: DerivedTables,
}

impl WorkflowOutput {
    /// The histograms of one task.
    pub fn registry(&self, task: &str) -> Option<&HistogramRegistry> {
        self.histograms.get(task)
    }

    /// Write all histograms, grouped by task, as one JSON document.
    pub fn write_histograms_json(&self, file_path: &str) -> AodResult<()> {
        let path = PathBuf::from(&*shellexpand::full(file_path)?);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &self.histograms)?;
        debug!(path = %path.display(), "wrote histograms");
        Ok(())
    }

    /// Write `histograms.json` and, if any task produced rows, the derived tables to `dir`.
    pub fn write(&self, dir: &str, options: &WriteOptions) -> AodResult<()> {
        let dir_path = PathBuf::from(&*shellexpand::full(dir)?);
        std::fs::create_dir_all(&dir_path)?;
        self.write_histograms_json(&dir_path.join("histograms.json").to_string_lossy())?;
        if !self.derived.is_empty() {
            self.derived.write(&dir_path.to_string_lossy(), options)?;
        }
        info!(path = %dir_path.display(), "wrote workflow output");
        Ok(())
    }
}

impl Display for WorkflowOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (task, registry) in &self.histograms {
            writeln!(f, "{task}:")?;
            for (name, histogram) in registry.iter() {
                write!(
                    f,
                    "  {:<24} {:>3} {:>10} entries  integral {:.1}",
                    name,
                    histogram.kind(),
                    histogram.entries(),
                    histogram.integral()
                )?;
                match histogram {
                    Histogram::H1(h) if h.integral() > 0.0 => {
                        writeln!(f, "  mean {:.4}", h.mean())?
                    }
                    _ => writeln!(f)?,
                }
            }
        }
        if !self.derived.d0_candidates.is_empty() {
            writeln!(f, "D0CANDIDATES: {} rows", self.derived.d0_candidates.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{test_frame, AodFrame, AodRow, D0Candidate},
        Table,
        histogram::{Axis, HistID, HistSpec},
    };
    use serde::{Deserialize, Serialize};

    /// Counts collisions and copies each collision's z vertex into the derived table.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct CountCollisions {
        enabled: bool,
        #[serde(skip)]
        id: Option<HistID>,
    }

    #[typetag::serde]
    impl AnalysisTask for CountCollisions {
        fn name(&self) -> String {
            "count-collisions".to_string()
        }
        fn configurables(&self) -> Vec<Configurable> {
            Vec::new()
        }
        fn process_switches(&self) -> Vec<ProcessSwitch> {
            vec![ProcessSwitch::new("process", "count", self.enabled)]
        }
        fn produces(&self) -> Vec<&'static str> {
            vec![D0Candidate::TABLE_NAME]
        }
        fn init(&mut self, registry: &mut HistogramRegistry) -> AodResult<()> {
            self.id = Some(registry.add(
                "hVertexZ",
                HistSpec::h1("z", Axis::new(120, -15.0, 15.0)?),
            )?);
            Ok(())
        }
        fn process(&mut self, ctx: &mut ProcessingContext<'_>) -> AodResult<()> {
            let id = self.id.clone().unwrap_or_default();
            for collision in ctx.source.collisions().iter() {
                ctx.registry.fill(&id, collision.pos_z as f64)?;
                ctx.derived.d0_candidates.push(D0Candidate {
                    pt: collision.pos_z,
                    ..Default::default()
                });
            }
            Ok(())
        }
    }

    /// Reads what the previous task produced.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct CountDerived {
        #[serde(skip)]
        id: Option<HistID>,
    }

    #[typetag::serde]
    impl AnalysisTask for CountDerived {
        fn name(&self) -> String {
            "count-derived".to_string()
        }
        fn configurables(&self) -> Vec<Configurable> {
            Vec::new()
        }
        fn init(&mut self, registry: &mut HistogramRegistry) -> AodResult<()> {
            self.id = Some(registry.add("n", HistSpec::h1("n", Axis::new(10, 0.0, 10.0)?))?);
            Ok(())
        }
        fn process(&mut self, ctx: &mut ProcessingContext<'_>) -> AodResult<()> {
            let id = self.id.clone().unwrap_or_default();
            ctx.registry
                .fill(&id, ctx.derived.d0_candidates.len() as f64)
        }
    }

    #[test]
    fn test_workflow_runs_tasks_in_order() {
        let frame = test_frame();
        let mut workflow = Workflow::new()
            .with_task(Box::new(CountCollisions {
                enabled: true,
                id: None,
            }))
            .unwrap()
            .with_task(Box::new(CountDerived::default()))
            .unwrap();
        let output = workflow.run(&frame).unwrap();
        let counts = output.registry("count-collisions").unwrap();
        assert_eq!(counts.get_1d("hVertexZ").unwrap().entries, 3);
        assert_eq!(output.derived.d0_candidates.len(), 3);
        let derived = output.registry("count-derived").unwrap();
        assert_eq!(derived.get_1d("n").unwrap().bin_content(3), 1.0);
        let summary = output.to_string();
        assert!(summary.contains("count-collisions:"));
        assert!(summary.contains("  mean "));
        assert!(summary.contains("D0CANDIDATES: 3 rows"));
    }

    fn seeded_derived(n: usize) -> DerivedTables {
        DerivedTables {
            d0_candidates: Table::new(vec![D0Candidate::default(); n]),
        }
    }

    #[test]
    fn test_produced_tables_start_empty() {
        let mut workflow = Workflow::new()
            .with_task(Box::new(CountCollisions {
                enabled: true,
                id: None,
            }))
            .unwrap()
            .with_task(Box::new(CountDerived::default()))
            .unwrap();
        let first = workflow.run_with(&test_frame(), seeded_derived(5)).unwrap();
        assert_eq!(first.derived.d0_candidates.len(), 3);
        // feeding the output back in does not accumulate rows
        let second = workflow.run_with(&test_frame(), first.derived).unwrap();
        assert_eq!(second.derived.d0_candidates.len(), 3);
        let n = second.registry("count-derived").unwrap().get_1d("n").unwrap();
        assert_eq!(n.bin_content(3), 1.0);
    }

    #[test]
    fn test_consumers_keep_seeded_tables() {
        let mut workflow = Workflow::new()
            .with_task(Box::new(CountDerived::default()))
            .unwrap();
        let output = workflow
            .run_with(&AodFrame::default(), seeded_derived(5))
            .unwrap();
        assert_eq!(output.derived.d0_candidates.len(), 5);
        let n = output.registry("count-derived").unwrap().get_1d("n").unwrap();
        assert_eq!(n.bin_content(5), 1.0);
    }

    #[test]
    fn test_duplicate_tasks_are_rejected() {
        let mut workflow = Workflow::new();
        workflow.add(Box::new(CountDerived::default())).unwrap();
        assert!(matches!(
            workflow.add(Box::new(CountDerived::default())),
            Err(AodError::DuplicateTask { .. })
        ));
    }

    #[test]
    fn test_all_switches_off_is_an_error() {
        let mut workflow = Workflow::new()
            .with_task(Box::new(CountCollisions::default()))
            .unwrap();
        assert!(matches!(
            workflow.run(&test_frame()),
            Err(AodError::NoProcessEnabled { .. })
        ));
    }

    #[test]
    fn test_workflow_from_json() {
        let config = WorkflowConfig::from_json_str(
            r#"{"tasks": [{"type": "CountCollisions", "enabled": true, "unknown": 1},
                          {"type": "CountDerived"}]}"#,
        )
        .unwrap();
        assert_eq!(config.task_names(), vec!["count-collisions", "count-derived"]);
        let workflow = Workflow::from_config(config).unwrap();
        assert!(workflow.validate().is_ok());
        let json = workflow.to_config().to_json_string().unwrap();
        assert!(json.contains("\"type\": \"CountCollisions\""));
    }

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut workflow = Workflow::new()
            .with_task(Box::new(CountCollisions {
                enabled: true,
                id: None,
            }))
            .unwrap();
        let output = workflow.run(&test_frame()).unwrap();
        let dir_path = dir.path().to_str().unwrap();
        output.write(dir_path, &WriteOptions::default()).unwrap();
        let json = std::fs::read_to_string(dir.path().join("histograms.json")).unwrap();
        let parsed: IndexMap<String, HistogramRegistry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output.histograms);
        let derived = DerivedTables::open(dir_path).unwrap();
        assert_eq!(derived.d0_candidates, output.derived.d0_candidates);
    }
}
