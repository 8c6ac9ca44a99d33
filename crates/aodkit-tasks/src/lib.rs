//! # aodkit-tasks
//!
//! The tutorial analysis tasks shipped with `aodkit`. Every task implements
//! [`AnalysisTask`](aodkit_core::traits::AnalysisTask) and can be built from a workflow file by its
//! type name.
use aodkit_core::{traits::AnalysisTask, AodResult};

/// Production and consumption of the derived `D0CANDIDATES` table.
pub mod derived_table;
/// Transverse-momentum resolution of reconstructed tracks against their MC truth.
pub mod momentum_resolution;
/// Trigger-associate azimuthal correlations.
pub mod two_particle_correlation;
/// Invariant-mass spectra of $`K^0_S`$, $`\Lambda`$, and $`\bar{\Lambda}`$ candidates.
pub mod v0_mc;

pub use derived_table::{ProduceD0Candidates, ReadD0Candidates};
pub use momentum_resolution::MomentumResolution;
pub use two_particle_correlation::TwoParticleCorrelation;
pub use v0_mc::V0McExample;

/// The type names of all tasks in this crate, as used in workflow files.
pub const TASK_TYPES: [&str; 5] = [
    "MomentumResolution",
    "TwoParticleCorrelation",
    "V0McExample",
    "ProduceD0Candidates",
    "ReadD0Candidates",
];

/// Build a task with default settings from its type name.
///
/// ```
/// let task = aodkit_tasks::task_from_type("V0McExample").unwrap();
/// assert_eq!(task.name(), "v0-mc-example");
/// ```
pub fn task_from_type(type_name: &str) -> AodResult<Box<dyn AnalysisTask>> {
    Ok(serde_json::from_value(serde_json::json!({ "type": type_name }))?)
}
