//! `aodkit` runs analysis workflows over columnar collision data. A directory of Parquet tables
//! (collisions, tracks, V0s, Monte-Carlo particles, and two-prong heavy-flavour candidates) is
//! loaded into an [`AodFrame`], a list of [`AnalysisTask`](crate::traits::AnalysisTask)s declares
//! histograms and derived tables, and a [`Workflow`] runs every task over the data in order.
//!
//! # Quick Start
//! ```rust,no_run
//! use aodkit::{AodFrame, MomentumResolution, V0McExample, Workflow};
//! use aodkit::data::io::WriteOptions;
//!
//! let frame = AodFrame::open("~/data/aod").unwrap();
//! let mut workflow = Workflow::new()
//!     .with_task(MomentumResolution::new(100, 100))
//!     .unwrap()
//!     .with_task(V0McExample::new(false, true))
//!     .unwrap();
//! let output = workflow.run(&frame).unwrap();
//! println!("{output}");
//! output.write("~/data/results", &WriteOptions::default()).unwrap();
//! ```
//!
//! # Data Format
//! Each table is one Parquet file named after the table (`collisions.parquet`, `tracks.parquet`,
//! `tracks_iu.parquet`, `v0s.parquet`, `mc_particles.parquet`, `hf_cand_2prongs.parquet`). Columns
//! follow the `fName` convention (`fPt`, `fIndexCollisions`, ...). Index columns are 64-bit integers
//! where `-1` marks a missing link. Floating-point columns may be stored as 32- or 64-bit floats.
//!
//! # Workflow Files
//! Tasks and their settings can be given as JSON, keyed by the task's type name:
//! ```json
//! {
//!     "tasks": [
//!         {"type": "MomentumResolution", "n_bins_pt": 50},
//!         {"type": "V0McExample", "processRun2": true, "processRun3": false}
//!     ]
//! }
//! ```
use aodkit_core::data::io::WriteOptions;
pub use aodkit_core::*;
use tracing::info;
pub use aodkit_tasks::{
    derived_table, momentum_resolution, task_from_type, two_particle_correlation, v0_mc,
    MomentumResolution, ProduceD0Candidates, ReadD0Candidates, TwoParticleCorrelation,
    V0McExample, TASK_TYPES,
};

/// Assemble a [`Workflow`] from an optional workflow file followed by extra tasks given by type
/// name (with default settings).
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, a type name is unknown, or two tasks share a name.
pub fn build_workflow(config: Option<&str>, task_types: &[String]) -> AodResult<Workflow> {
    let mut workflow = match config {
        Some(path) => Workflow::from_config(WorkflowConfig::from_json_file(path)?)?,
        None => Workflow::new(),
    };
    for type_name in task_types {
        workflow.add(task_from_type(type_name)?)?;
    }
    Ok(workflow)
}

/// Run `workflow` over the tables stored in the `input` directory and, if `output` is given,
/// write the histograms and derived tables there.
///
/// Derived tables already present in `input` are handed to the workflow, so consumers can read
/// what an earlier run produced. Tables that a task of this workflow produces start empty.
pub fn run_directory(
    workflow: &mut Workflow,
    input: &str,
    output: Option<&str>,
    options: &WriteOptions,
) -> AodResult<WorkflowOutput> {
    let frame = AodFrame::open(input)?;
    let derived = DerivedTables::open(input)?;
    info!(
        collisions = frame.collisions.len(),
        tracks = frame.tracks.len(),
        derived_rows = derived.d0_candidates.len(),
        tasks = workflow.tasks().len(),
        "loaded input"
    );
    let result = workflow.run_with(&frame, derived)?;
    if let Some(output) = output {
        result.write(output, options)?;
    }
    Ok(result)
}
