use aodkit_core::{
    data::{Filtered, V0},
    histogram::{Axis, HistID, HistSpec, HistogramRegistry},
    traits::{AnalysisTask, AodSource, VariableExt},
    utils::pdg,
    AodResult, Collision, Configurable, McParticle, ProcessSwitch, ProcessingContext, RunPeriod,
    Selection, Table, Track, V0Var,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Invariant-mass spectra of $`K^0_S`$, $`\Lambda`$, and $`\bar{\Lambda}`$ candidates, together
/// with the spectra of candidates matched to a generated particle of the same species.
///
/// V0s are pre-filtered on the daughter DCAs, then selected on decay radius and cosine of pointing
/// angle. Each mass hypothesis additionally requires both daughters to be compatible with the
/// corresponding species in the TPC. Run 2 and Run 3 processing differ in the event selection
/// and in the track table holding the daughters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct V0McExample {
    pub n_bins: usize,
    pub v0_cos_pa: f64,
    pub dca_v0_daughters: f64,
    pub dca_neg_to_pv: f64,
    pub dca_pos_to_pv: f64,
    pub v0_radius: f64,
    pub max_n_sigma_tpc: f64,
    #[serde(rename = "processRun2")]
    pub process_run2: bool,
    #[serde(rename = "processRun3")]
    pub process_run3: bool,
    #[serde(skip)]
    hids: MassHistograms,
}

#[derive(Clone, Debug, Default)]
struct MassHistograms {
    vertex_z: HistID,
    k0_short: HistID,
    lambda: HistID,
    anti_lambda: HistID,
    true_k0_short: HistID,
    true_lambda: HistID,
    true_anti_lambda: HistID,
}

impl Default for V0McExample {
    fn default() -> Self {
        Self {
            n_bins: 100,
            v0_cos_pa: 0.97,
            dca_v0_daughters: 1.0,
            dca_neg_to_pv: 0.1,
            dca_pos_to_pv: 0.1,
            v0_radius: 0.5,
            max_n_sigma_tpc: 4.0,
            process_run2: false,
            process_run3: true,
            hids: MassHistograms::default(),
        }
    }
}

impl V0McExample {
    /// Construct a [`V0McExample`] with default cuts and the given processing modes.
    pub fn new(process_run2: bool, process_run3: bool) -> Box<Self> {
        Self {
            process_run2,
            process_run3,
            ..Default::default()
        }
        .into()
    }

    /// The pre-filter on daughter DCAs.
    pub fn pre_filter(&self) -> Selection<V0Var> {
        V0Var::DcaPosToPV.abs().gt(self.dca_pos_to_pv)
            & V0Var::DcaNegToPV.abs().gt(self.dca_neg_to_pv)
            & V0Var::DcaV0Daughters.lt(self.dca_v0_daughters)
    }

    fn process_period(
        &self,
        period: RunPeriod,
        source: &dyn AodSource,
        v0s_per_collision: &[Filtered<'_, V0>],
        registry: &mut HistogramRegistry,
    ) -> AodResult<()> {
        let tracks = period.tracks(source);
        let mc_particles = source.mc_particles();
        for (collision, v0s) in source.collisions().iter().zip(v0s_per_collision) {
            if !period.is_selected(&collision) {
                continue;
            }
            registry.fill(&self.hids.vertex_z, collision.pos_z as f64)?;
            for v0 in v0s.iter() {
                self.process_candidate(&v0, &collision, tracks, mc_particles, registry)?;
            }
        }
        Ok(())
    }

    fn process_candidate(
        &self,
        v0: &V0,
        collision: &Collision,
        tracks: &Table<Track>,
        mc_particles: &Table<McParticle>,
        registry: &mut HistogramRegistry,
    ) -> AodResult<()> {
        let pos = tracks.resolve(v0.pos_track_id)?;
        let neg = tracks.resolve(v0.neg_track_id)?;
        let pv = collision.pos();
        if !(v0.v0_radius() > self.v0_radius && v0.v0_cos_pa(pv.x, pv.y, pv.z) > self.v0_cos_pa) {
            return Ok(());
        }
        let n_sigma_pos_pion = (pos.tpc_n_sigma_pi as f64).abs();
        let n_sigma_neg_pion = (neg.tpc_n_sigma_pi as f64).abs();
        let n_sigma_pos_proton = (pos.tpc_n_sigma_pr as f64).abs();
        let n_sigma_neg_proton = (neg.tpc_n_sigma_pr as f64).abs();
        let max = self.max_n_sigma_tpc;

        if n_sigma_pos_pion < max && n_sigma_neg_pion < max {
            registry.fill(&self.hids.k0_short, v0.m_k0_short())?;
        }
        if n_sigma_pos_proton < max && n_sigma_neg_pion < max {
            registry.fill(&self.hids.lambda, v0.m_lambda())?;
        }
        if n_sigma_pos_pion < max && n_sigma_neg_proton < max {
            registry.fill(&self.hids.anti_lambda, v0.m_anti_lambda())?;
        }

        if let Some(label) = v0.mc_particle_id {
            match mc_particles.resolve(label)?.pdg_code {
                pdg::K0_SHORT => registry.fill(&self.hids.true_k0_short, v0.m_k0_short())?,
                pdg::LAMBDA => registry.fill(&self.hids.true_lambda, v0.m_lambda())?,
                pdg::ANTI_LAMBDA => {
                    registry.fill(&self.hids.true_anti_lambda, v0.m_anti_lambda())?
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[typetag::serde]
impl AnalysisTask for V0McExample {
    fn name(&self) -> String {
        "v0-mc-example".to_string()
    }

    fn configurables(&self) -> Vec<Configurable> {
        let d = Self::default();
        vec![
            Configurable::new("n_bins", self.n_bins, d.n_bins, "N bins in all histos"),
            Configurable::new("v0_cos_pa", self.v0_cos_pa, d.v0_cos_pa, "V0 CosPA"),
            Configurable::new(
                "dca_v0_daughters",
                self.dca_v0_daughters,
                d.dca_v0_daughters,
                "DCA V0 Daughters",
            ),
            Configurable::new(
                "dca_neg_to_pv",
                self.dca_neg_to_pv,
                d.dca_neg_to_pv,
                "DCA Neg To PV",
            ),
            Configurable::new(
                "dca_pos_to_pv",
                self.dca_pos_to_pv,
                d.dca_pos_to_pv,
                "DCA Pos To PV",
            ),
            Configurable::new("v0_radius", self.v0_radius, d.v0_radius, "V0 radius"),
            Configurable::new(
                "max_n_sigma_tpc",
                self.max_n_sigma_tpc,
                d.max_n_sigma_tpc,
                "Maximum |n sigma| of the TPC PID for each daughter",
            ),
        ]
    }

    fn process_switches(&self) -> Vec<ProcessSwitch> {
        vec![
            ProcessSwitch::new("processRun2", "Process Run 2 data", self.process_run2),
            ProcessSwitch::new("processRun3", "Process Run 3 data", self.process_run3),
        ]
    }

    fn init(&mut self, registry: &mut HistogramRegistry) -> AodResult<()> {
        let k0_axis = Axis::new(200, 0.45, 0.55)?;
        let lambda_axis = Axis::new(200, 1.015, 1.215)?;
        let mut add = |name: &str, axis: Axis| registry.add(name, HistSpec::h1(name, axis));
        self.hids = MassHistograms {
            vertex_z: add("hVertexZ", Axis::new(self.n_bins, -15.0, 15.0)?)?,
            k0_short: add("hMassK0Short", k0_axis)?,
            lambda: add("hMassLambda", lambda_axis)?,
            anti_lambda: add("hMassAntiLambda", lambda_axis)?,
            true_k0_short: add("hMassTrueK0Short", k0_axis)?,
            true_lambda: add("hMassTrueLambda", lambda_axis)?,
            true_anti_lambda: add("hMassTrueAntiLambda", lambda_axis)?,
        };
        Ok(())
    }

    fn process(&mut self, ctx: &mut ProcessingContext<'_>) -> AodResult<()> {
        let source = ctx.source;
        let v0s_per_collision = source
            .v0s()
            .filter(&self.pre_filter())
            .grouped_by_collision(source.collisions().len())?;
        for (period, enabled) in [
            (RunPeriod::Run2, self.process_run2),
            (RunPeriod::Run3, self.process_run3),
        ] {
            if enabled {
                debug!(period = %period, "processing V0s");
                self.process_period(period, source, &v0s_per_collision, ctx.registry)?;
            }
        }
        Ok(())
    }
}
