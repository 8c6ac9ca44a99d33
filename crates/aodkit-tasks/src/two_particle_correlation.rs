use std::f64::consts::PI;

use aodkit_core::{
    delta_phi, full_index_combinations,
    histogram::{Axis, HistID, HistSpec, HistogramRegistry},
    traits::{AnalysisTask, VariableExt},
    AodResult, Configurable, ProcessingContext, Selection, TrackVar,
};
use serde::{Deserialize, Serialize};

/// Azimuthal correlation between high-$`p_T`$ trigger tracks and lower-$`p_T`$ associated
/// tracks from the same collision.
///
/// Tracks are first filtered on kinematics and transverse DCA, then split at `trigger_min_pt`
/// into triggers and associates. Every trigger-associate pair in which both tracks have enough
/// crossed TPC rows contributes $`\Delta\varphi`$ = `delta_phi(trigger.phi, assoc.phi)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoParticleCorrelation {
    pub n_bins: usize,
    pub max_abs_eta: f64,
    pub min_pt: f64,
    pub max_dca_xy: f64,
    pub trigger_min_pt: f64,
    pub min_tpc_crossed_rows: i32,
    pub n_bins_delta_phi: usize,
    #[serde(skip)]
    hid_vertex_z: HistID,
    #[serde(skip)]
    hid_eta_trigger: HistID,
    #[serde(skip)]
    hid_eta_assoc: HistID,
    #[serde(skip)]
    hid_pt_trigger: HistID,
    #[serde(skip)]
    hid_pt_assoc: HistID,
    #[serde(skip)]
    hid_correlation: HistID,
}

impl Default for TwoParticleCorrelation {
    fn default() -> Self {
        Self {
            n_bins: 100,
            max_abs_eta: 0.8,
            min_pt: 2.0,
            max_dca_xy: 0.2,
            trigger_min_pt: 4.0,
            min_tpc_crossed_rows: 70,
            n_bins_delta_phi: 40,
            hid_vertex_z: HistID::default(),
            hid_eta_trigger: HistID::default(),
            hid_eta_assoc: HistID::default(),
            hid_pt_trigger: HistID::default(),
            hid_pt_assoc: HistID::default(),
            hid_correlation: HistID::default(),
        }
    }
}

impl TwoParticleCorrelation {
    /// The track filter applied before splitting into triggers and associates.
    pub fn track_filter(&self) -> Selection<TrackVar> {
        TrackVar::Eta.abs().lt(self.max_abs_eta)
            & TrackVar::Pt.gt(self.min_pt)
            & TrackVar::DcaXY.abs().lt(self.max_dca_xy)
    }

    pub fn trigger_selection(&self) -> Selection<TrackVar> {
        TrackVar::Pt.gt(self.trigger_min_pt)
    }

    pub fn associate_selection(&self) -> Selection<TrackVar> {
        TrackVar::Pt.lt(self.trigger_min_pt)
    }
}

#[typetag::serde]
impl AnalysisTask for TwoParticleCorrelation {
    fn name(&self) -> String {
        "two-particle-correlation".to_string()
    }

    fn configurables(&self) -> Vec<Configurable> {
        let d = Self::default();
        vec![
            Configurable::new("n_bins", self.n_bins, d.n_bins, "N bins in all histos"),
            Configurable::new(
                "max_abs_eta",
                self.max_abs_eta,
                d.max_abs_eta,
                "Maximum |eta| of selected tracks",
            ),
            Configurable::new("min_pt", self.min_pt, d.min_pt, "Minimum pT of selected tracks"),
            Configurable::new(
                "max_dca_xy",
                self.max_dca_xy,
                d.max_dca_xy,
                "Maximum |DCA_xy| to the primary vertex (cm)",
            ),
            Configurable::new(
                "trigger_min_pt",
                self.trigger_min_pt,
                d.trigger_min_pt,
                "pT boundary between associated and trigger tracks",
            ),
            Configurable::new(
                "min_tpc_crossed_rows",
                self.min_tpc_crossed_rows,
                d.min_tpc_crossed_rows,
                "Minimum number of crossed TPC rows for both tracks of a pair",
            ),
            Configurable::new(
                "n_bins_delta_phi",
                self.n_bins_delta_phi,
                d.n_bins_delta_phi,
                "N bins in the correlation function",
            ),
        ]
    }

    fn init(&mut self, registry: &mut HistogramRegistry) -> AodResult<()> {
        let eta_axis = Axis::new(self.n_bins, -1.0, 1.0)?;
        let pt_axis = Axis::new(self.n_bins, 0.0, 10.0)?;
        self.hid_vertex_z = registry.add(
            "hVertexZ",
            HistSpec::h1("hVertexZ", Axis::new(self.n_bins, -15.0, 15.0)?),
        )?;
        self.hid_eta_trigger = registry.add(
            "etaHistogramTrigger",
            HistSpec::h1("etaHistogramTrigger", eta_axis),
        )?;
        self.hid_eta_assoc =
            registry.add("etaHistogramAssoc", HistSpec::h1("etaHistogramAssoc", eta_axis))?;
        self.hid_pt_trigger =
            registry.add("ptHistogramTrigger", HistSpec::h1("ptHistogramTrigger", pt_axis))?;
        self.hid_pt_assoc =
            registry.add("ptHistogramAssoc", HistSpec::h1("ptHistogramAssoc", pt_axis))?;
        self.hid_correlation = registry.add(
            "correlationFunction",
            HistSpec::h1(
                "correlationFunction",
                Axis::new(self.n_bins_delta_phi, -PI / 2.0, 1.5 * PI)?,
            ),
        )?;
        Ok(())
    }

    fn process(&mut self, ctx: &mut ProcessingContext<'_>) -> AodResult<()> {
        let collisions = ctx.source.collisions();
        let trigger_selection = self.trigger_selection();
        let associate_selection = self.associate_selection();
        let grouped = ctx
            .source
            .tracks()
            .filter(&self.track_filter())
            .grouped_by_collision(collisions.len())?;
        for (collision, tracks) in collisions.iter().zip(grouped) {
            ctx.registry
                .fill(&self.hid_vertex_z, collision.pos_z as f64)?;
            let triggers = tracks.partition(&trigger_selection);
            let associates = tracks.partition(&associate_selection);
            for track in triggers.iter() {
                ctx.registry
                    .fill(&self.hid_eta_trigger, track.eta as f64)?;
                ctx.registry.fill(&self.hid_pt_trigger, track.pt as f64)?;
            }
            for track in associates.iter() {
                ctx.registry.fill(&self.hid_eta_assoc, track.eta as f64)?;
                ctx.registry.fill(&self.hid_pt_assoc, track.pt as f64)?;
            }
            for (trigger, associate) in full_index_combinations(triggers.rows(), associates.rows())
            {
                // crossed rows is not part of the filter, it is checked per pair
                if trigger.tpc_n_cls_crossed_rows < self.min_tpc_crossed_rows
                    || associate.tpc_n_cls_crossed_rows < self.min_tpc_crossed_rows
                {
                    continue;
                }
                ctx.registry.fill(
                    &self.hid_correlation,
                    delta_phi(trigger.phi as f64, associate.phi as f64),
                )?;
            }
        }
        Ok(())
    }
}
