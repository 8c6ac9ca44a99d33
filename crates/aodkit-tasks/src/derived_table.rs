use aodkit_core::{
    histogram::{Axis, HistID, HistSpec, HistogramRegistry},
    traits::{AnalysisTask, AodRow},
    AodResult, Configurable, D0Candidate, DecayType, ProcessingContext,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Builds the derived `D0CANDIDATES` table from two-prong heavy-flavour candidates.
///
/// A candidate is kept when it is flagged as $`D^0 \to \pi^+ K^-`$ and its $`p_T`$ is at least
/// `min_pt`. The collision of the candidate is taken from its first prong. The table is rebuilt
/// from scratch on every run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProduceD0Candidates {
    pub min_pt: f64,
}

impl Default for ProduceD0Candidates {
    fn default() -> Self {
        Self { min_pt: 4.0 }
    }
}

impl ProduceD0Candidates {
    pub fn new(min_pt: f64) -> Box<Self> {
        Self { min_pt }.into()
    }
}

#[typetag::serde]
impl AnalysisTask for ProduceD0Candidates {
    fn name(&self) -> String {
        "produce-d0-candidates".to_string()
    }

    fn configurables(&self) -> Vec<Configurable> {
        vec![Configurable::new(
            "min_pt",
            self.min_pt,
            Self::default().min_pt,
            "Minimum pT of D0 candidates",
        )]
    }

    fn produces(&self) -> Vec<&'static str> {
        vec![D0Candidate::TABLE_NAME]
    }

    fn init(&mut self, _registry: &mut HistogramRegistry) -> AodResult<()> {
        Ok(())
    }

    fn process(&mut self, ctx: &mut ProcessingContext<'_>) -> AodResult<()> {
        let tracks = ctx.source.tracks();
        let collisions = ctx.source.collisions();
        for candidate in ctx.source.hf_cand_2prongs().iter() {
            if !candidate.is_selected(DecayType::D0ToPiK) {
                continue;
            }
            let pt = candidate.pt();
            if pt < self.min_pt {
                continue;
            }
            let prong0 = tracks.resolve(candidate.prong0_id)?;
            if let Some(collision_id) = prong0.collision_id {
                collisions.resolve(collision_id)?;
            }
            let row = D0Candidate {
                inv_mass_d0: candidate.inv_mass_d0_to_pi_k() as f32,
                inv_mass_d0bar: candidate.inv_mass_d0bar_to_k_pi() as f32,
                pt: pt as f32,
                cosine_pointing: candidate.cpa() as f32,
                collision_id: prong0.collision_id,
            };
            debug!(
                candidate = candidate.index(),
                m_d0 = row.inv_mass_d0,
                m_d0bar = row.inv_mass_d0bar,
                pt = row.pt,
                "D0 candidate"
            );
            ctx.derived.d0_candidates.push(row);
        }
        Ok(())
    }
}

/// Histograms the contents of the derived `D0CANDIDATES` table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReadD0Candidates {
    #[serde(skip)]
    hid_mass_d0: HistID,
    #[serde(skip)]
    hid_mass_d0bar: HistID,
    #[serde(skip)]
    hid_pt: HistID,
    #[serde(skip)]
    hid_cosp: HistID,
}

impl ReadD0Candidates {
    pub fn new() -> Box<Self> {
        Self::default().into()
    }
}

#[typetag::serde]
impl AnalysisTask for ReadD0Candidates {
    fn name(&self) -> String {
        "read-d0-candidates".to_string()
    }

    fn configurables(&self) -> Vec<Configurable> {
        Vec::new()
    }

    fn init(&mut self, registry: &mut HistogramRegistry) -> AodResult<()> {
        let mass_axis = Axis::new(300, 1.75, 2.05)?;
        self.hid_mass_d0 = registry.add("hMassD0", HistSpec::h1("hMassD0", mass_axis))?;
        self.hid_mass_d0bar =
            registry.add("hMassD0bar", HistSpec::h1("hMassD0bar", mass_axis))?;
        self.hid_pt = registry.add("hPt", HistSpec::h1("hPt", Axis::new(50, 0.0, 50.0)?))?;
        self.hid_cosp = registry.add("hCosp", HistSpec::h1("hCosp", Axis::new(100, 0.8, 1.0)?))?;
        Ok(())
    }

    fn process(&mut self, ctx: &mut ProcessingContext<'_>) -> AodResult<()> {
        for candidate in ctx.derived.d0_candidates.iter() {
            ctx.registry
                .fill(&self.hid_mass_d0, candidate.inv_mass_d0 as f64)?;
            ctx.registry
                .fill(&self.hid_mass_d0bar, candidate.inv_mass_d0bar as f64)?;
            ctx.registry.fill(&self.hid_pt, candidate.pt as f64)?;
            ctx.registry
                .fill(&self.hid_cosp, candidate.cosine_pointing as f64)?;
        }
        Ok(())
    }
}
