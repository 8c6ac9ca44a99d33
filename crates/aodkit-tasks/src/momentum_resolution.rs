use aodkit_core::{
    histogram::{Axis, HistID, HistSpec, HistogramRegistry},
    traits::AnalysisTask,
    AodResult, Configurable, ProcessingContext, TrackSelection,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Fills the pseudorapidity and transverse-momentum spectra of good-quality tracks and the
/// difference between reconstructed and generated $`p_T`$ as a function of $`p_T`$.
///
/// A track enters the spectra when it has enough crossed TPC rows and a small transverse DCA.
/// Tracks without a Monte-Carlo label are kept in the spectra but skip the resolution fill.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumResolution {
    /// Number of bins in the $`\eta`$ histogram.
    pub n_bins_eta: usize,
    /// Number of bins in the $`p_T`$ histograms.
    pub n_bins_pt: usize,
    pub min_tpc_crossed_rows: i32,
    pub max_dca_xy: f64,
    #[serde(skip)]
    hid_vertex_z: HistID,
    #[serde(skip)]
    hid_eta: HistID,
    #[serde(skip)]
    hid_pt: HistID,
    #[serde(skip)]
    hid_reso: HistID,
}

impl Default for MomentumResolution {
    fn default() -> Self {
        let cut = TrackSelection::default();
        Self {
            n_bins_eta: 100,
            n_bins_pt: 100,
            min_tpc_crossed_rows: cut.min_tpc_crossed_rows,
            max_dca_xy: cut.max_dca_xy,
            hid_vertex_z: HistID::default(),
            hid_eta: HistID::default(),
            hid_pt: HistID::default(),
            hid_reso: HistID::default(),
        }
    }
}

impl MomentumResolution {
    /// Construct a [`MomentumResolution`] task with the given binning and default cuts.
    pub fn new(n_bins_eta: usize, n_bins_pt: usize) -> Box<Self> {
        Self {
            n_bins_eta,
            n_bins_pt,
            ..Default::default()
        }
        .into()
    }

    /// The track-quality cut built from this task's settings.
    pub fn track_selection(&self) -> TrackSelection {
        TrackSelection {
            min_tpc_crossed_rows: self.min_tpc_crossed_rows,
            max_dca_xy: self.max_dca_xy,
        }
    }
}

#[typetag::serde]
impl AnalysisTask for MomentumResolution {
    fn name(&self) -> String {
        "momentum-resolution".to_string()
    }

    fn configurables(&self) -> Vec<Configurable> {
        let default = Self::default();
        vec![
            Configurable::new(
                "n_bins_eta",
                self.n_bins_eta,
                default.n_bins_eta,
                "N bins in eta histo",
            ),
            Configurable::new(
                "n_bins_pt",
                self.n_bins_pt,
                default.n_bins_pt,
                "N bins in pT histo",
            ),
            Configurable::new(
                "min_tpc_crossed_rows",
                self.min_tpc_crossed_rows,
                default.min_tpc_crossed_rows,
                "Minimum number of crossed TPC rows",
            ),
            Configurable::new(
                "max_dca_xy",
                self.max_dca_xy,
                default.max_dca_xy,
                "Maximum |DCA_xy| to the primary vertex (cm)",
            ),
        ]
    }

    fn init(&mut self, registry: &mut HistogramRegistry) -> AodResult<()> {
        let pt_axis = Axis::new(self.n_bins_pt, 0.0, 10.0)?;
        self.hid_vertex_z = registry.add(
            "hVertexZ",
            HistSpec::h1("hVertexZ", Axis::new(120, -15.0, 15.0)?),
        )?;
        self.hid_eta = registry.add(
            "etaHistogram",
            HistSpec::h1("etaHistogram", Axis::new(self.n_bins_eta, -1.0, 1.0)?),
        )?;
        self.hid_pt = registry.add("ptHistogram", HistSpec::h1("ptHistogram", pt_axis))?;
        self.hid_reso = registry.add(
            "resoHistogram",
            HistSpec::h2("resoHistogram", pt_axis, Axis::new(100, -0.5, 0.5)?),
        )?;
        Ok(())
    }

    fn process(&mut self, ctx: &mut ProcessingContext<'_>) -> AodResult<()> {
        let collisions = ctx.source.collisions();
        let mc_particles = ctx.source.mc_particles();
        let cut = self.track_selection().to_selection();
        let grouped = ctx.source.tracks().grouped_by_collision(collisions.len())?;
        for (collision, tracks) in collisions.iter().zip(grouped) {
            ctx.registry
                .fill(&self.hid_vertex_z, collision.pos_z as f64)?;
            for track in tracks.iter().filter(|track| cut.passes(track)) {
                let pt = track.pt as f64;
                ctx.registry.fill(&self.hid_eta, track.eta as f64)?;
                ctx.registry.fill(&self.hid_pt, pt)?;
                match track.mc_particle_id {
                    Some(label) => {
                        let particle = mc_particles.resolve(label)?;
                        ctx.registry
                            .fill_2d(&self.hid_reso, pt, pt - particle.pt())?;
                    }
                    None => trace!(track = track.index(), "no MC label, skipping resolution"),
                }
            }
        }
        Ok(())
    }
}
