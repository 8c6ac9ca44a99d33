use std::{fmt::Display, ops::Deref};

use arrow::{array::ArrayRef, datatypes::Field, record_batch::RecordBatch};
use serde::{Deserialize, Serialize};

use crate::{
    selection::{Selection, Variable},
    utils::{
        enums::{DecayType, Species},
        vectors::{Vec3, Vec4},
    },
    AodError, AodResult,
};

/// Table I/O implementations and shared column helpers.
pub mod io;

/// Declares an AOD table row: the struct itself plus its [`AodRow`] implementation, which maps
/// each field to a named Arrow column.
macro_rules! aod_table {
    (
        $(#[$meta:meta])*
        pub struct $name:ident in $table:literal as $stem:literal {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident: $ty:ty => $column:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::data::AodRow for $name {
            const TABLE_NAME: &'static str = $table;
            const FILE_STEM: &'static str = $stem;

            fn fields() -> Vec<arrow::datatypes::Field> {
                vec![$(<$ty as $crate::data::io::ColumnValue>::field($column)),*]
            }

            fn columns(rows: &[Self]) -> Vec<arrow::array::ArrayRef> {
                vec![$(
                    <$ty as $crate::data::io::ColumnValue>::to_array(
                        rows.iter().map(|row| row.$field).collect(),
                    )
                ),*]
            }

            fn from_record_batch(
                batch: &arrow::record_batch::RecordBatch,
            ) -> $crate::AodResult<Vec<Self>> {
                $(
                    let $field =
                        <$ty as $crate::data::io::ColumnValue>::read_column(batch, $table, $column)?;
                )*
                Ok((0..batch.num_rows())
                    .map(|row| Self { $($field: $field[row],)* })
                    .collect())
            }
        }
    };
}

/// A row type which can be stored in a [`Table`] and persisted as a Parquet file.
pub trait AodRow: Copy + Sized {
    /// The table name recorded in the file's schema metadata.
    const TABLE_NAME: &'static str;
    /// The file name (without extension) used inside an AOD directory.
    const FILE_STEM: &'static str;
    /// The Arrow fields, one per column, in declaration order.
    fn fields() -> Vec<Field>;
    /// Convert rows to Arrow arrays matching [`AodRow::fields`].
    fn columns(rows: &[Self]) -> Vec<ArrayRef>;
    /// Read all rows of a record batch.
    fn from_record_batch(batch: &RecordBatch) -> AodResult<Vec<Self>>;
}

/// Rows which belong to a [`Collision`] through an index column.
pub trait CollisionLinked {
    /// The global index of the parent collision, if any.
    fn collision_id(&self) -> Option<usize>;
}

aod_table! {
    /// A reconstructed collision (event) with its primary vertex and event-selection decisions.
    pub struct Collision in "COLLISION" as "collisions" {
        /// Primary vertex $`x`$ (cm).
        pub pos_x: f32 => "fPosX",
        /// Primary vertex $`y`$ (cm).
        pub pos_y: f32 => "fPosY",
        /// Primary vertex $`z`$ (cm).
        pub pos_z: f32 => "fPosZ",
        /// Run 2 minimum-bias selection.
        pub sel7: bool => "fSel7",
        /// Run 3 minimum-bias selection.
        pub sel8: bool => "fSel8",
    }
}

impl Collision {
    /// The primary vertex position.
    pub fn pos(&self) -> Vec3 {
        Vec3::new(self.pos_x as f64, self.pos_y as f64, self.pos_z as f64)
    }
}

aod_table! {
    /// A reconstructed charged-particle track with its quality and PID observables.
    pub struct Track in "TRACK" as "tracks" {
        pub collision_id: Option<usize> => "fIndexCollisions",
        /// Transverse momentum (GeV/$`c`$).
        pub pt: f32 => "fPt",
        /// Pseudorapidity.
        pub eta: f32 => "fEta",
        /// Azimuth in $`[0, 2\pi)`$.
        pub phi: f32 => "fPhi",
        /// Charge sign.
        pub sign: i32 => "fSign",
        /// Transverse distance of closest approach to the primary vertex (cm).
        pub dca_xy: f32 => "fDcaXY",
        /// Longitudinal distance of closest approach to the primary vertex (cm).
        pub dca_z: f32 => "fDcaZ",
        pub tpc_n_cls_crossed_rows: i32 => "fTPCNClsCrossedRows",
        /// TPC $`n\sigma`$ under the pion hypothesis.
        pub tpc_n_sigma_pi: f32 => "fTPCNSigmaPi",
        /// TPC $`n\sigma`$ under the proton hypothesis.
        pub tpc_n_sigma_pr: f32 => "fTPCNSigmaPr",
        /// Monte-Carlo truth label.
        pub mc_particle_id: Option<usize> => "fIndexMcParticles",
    }
}

impl Track {
    /// Momentum vector rebuilt from $`(p_T, \eta, \varphi)`$.
    pub fn vec3(&self) -> Vec3 {
        Vec3::from_pt_eta_phi(self.pt as f64, self.eta as f64, self.phi as f64)
    }
    /// Momentum along x (GeV/c).
    pub fn px(&self) -> f64 {
        self.vec3().px()
    }
    /// Momentum along y (GeV/c).
    pub fn py(&self) -> f64 {
        self.vec3().py()
    }
    /// Momentum along the beam axis (GeV/c).
    pub fn pz(&self) -> f64 {
        self.vec3().pz()
    }
    /// Total momentum magnitude (GeV/c).
    pub fn p(&self) -> f64 {
        self.vec3().mag()
    }
}

impl CollisionLinked for Track {
    fn collision_id(&self) -> Option<usize> {
        self.collision_id
    }
}

aod_table! {
    /// A reconstructed V0: a neutral-particle decay into a positive and a negative daughter track.
    pub struct V0 in "V0DATA" as "v0s" {
        pub collision_id: Option<usize> => "fIndexCollisions",
        pub pos_track_id: usize => "fIndexPosTracks",
        pub neg_track_id: usize => "fIndexNegTracks",
        /// Decay vertex $`x`$ (cm).
        pub x: f32 => "fX",
        /// Decay vertex $`y`$ (cm).
        pub y: f32 => "fY",
        /// Decay vertex $`z`$ (cm).
        pub z: f32 => "fZ",
        pub px_pos: f32 => "fPxPos",
        pub py_pos: f32 => "fPyPos",
        pub pz_pos: f32 => "fPzPos",
        pub px_neg: f32 => "fPxNeg",
        pub py_neg: f32 => "fPyNeg",
        pub pz_neg: f32 => "fPzNeg",
        /// Distance of closest approach between the daughters (cm).
        pub dca_v0_daughters: f32 => "fDCAV0Daughters",
        pub dca_pos_to_pv: f32 => "fDCAPosToPV",
        pub dca_neg_to_pv: f32 => "fDCANegToPV",
        /// Monte-Carlo truth label of the V0 itself.
        pub mc_particle_id: Option<usize> => "fIndexMcParticles",
    }
}

impl V0 {
    /// Position of the decay vertex (cm).
    pub fn decay_vertex(&self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }
    /// Momentum of the positive daughter.
    pub fn p_pos(&self) -> Vec3 {
        Vec3::new(self.px_pos as f64, self.py_pos as f64, self.pz_pos as f64)
    }
    /// Momentum of the negative daughter.
    pub fn p_neg(&self) -> Vec3 {
        Vec3::new(self.px_neg as f64, self.py_neg as f64, self.pz_neg as f64)
    }
    /// Total momentum of the V0.
    pub fn p(&self) -> Vec3 {
        self.p_pos() + self.p_neg()
    }
    /// Transverse momentum of the V0.
    pub fn pt(&self) -> f64 {
        self.p().pt()
    }
    /// Transverse decay radius (cm).
    pub fn v0_radius(&self) -> f64 {
        (self.x as f64).hypot(self.y as f64)
    }
    /// Cosine of the pointing angle with respect to the primary vertex at `(pvx, pvy, pvz)`.
    pub fn v0_cos_pa(&self, pvx: f64, pvy: f64, pvz: f64) -> f64 {
        let flight = self.decay_vertex() - Vec3::new(pvx, pvy, pvz);
        flight.cos_angle(&self.p())
    }
    /// Invariant mass with the given mass hypotheses for the positive and negative daughters.
    pub fn invariant_mass(&self, positive: Species, negative: Species) -> f64 {
        (self.p_pos().with_mass(positive.mass()) + self.p_neg().with_mass(negative.mass())).m()
    }
    /// $`K^0_S \to \pi^+\pi^-`$ mass hypothesis.
    pub fn m_k0_short(&self) -> f64 {
        self.invariant_mass(Species::Pion, Species::Pion)
    }
    /// $`\Lambda \to p\pi^-`$ mass hypothesis.
    pub fn m_lambda(&self) -> f64 {
        self.invariant_mass(Species::Proton, Species::Pion)
    }
    /// $`\bar{\Lambda} \to \pi^+\bar{p}`$ mass hypothesis.
    pub fn m_anti_lambda(&self) -> f64 {
        self.invariant_mass(Species::Pion, Species::Proton)
    }
}

impl CollisionLinked for V0 {
    fn collision_id(&self) -> Option<usize> {
        self.collision_id
    }
}

aod_table! {
    /// A generated (Monte-Carlo truth) particle.
    pub struct McParticle in "MCPARTICLE" as "mc_particles" {
        pub pdg_code: i32 => "fPdgCode",
        pub px: f32 => "fPx",
        pub py: f32 => "fPy",
        pub pz: f32 => "fPz",
    }
}

impl McParticle {
    /// Generated momentum vector.
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.px as f64, self.py as f64, self.pz as f64)
    }
    /// Generated transverse momentum.
    pub fn pt(&self) -> f64 {
        self.vec3().pt()
    }
    /// Generated pseudorapidity.
    pub fn eta(&self) -> f64 {
        self.vec3().eta()
    }
    /// Generated azimuth.
    pub fn phi(&self) -> f64 {
        self.vec3().phi()
    }
}

aod_table! {
    /// A two-prong heavy-flavour decay candidate built from two tracks.
    pub struct HfCand2Prong in "HFCAND2PRONG" as "hf_cand_2prongs" {
        pub prong0_id: usize => "fIndexProng0",
        pub prong1_id: usize => "fIndexProng1",
        /// Bit field of [`DecayType`]s the candidate is compatible with.
        pub hfflag: u8 => "fHFflag",
        pub x_pv: f32 => "fPosX",
        pub y_pv: f32 => "fPosY",
        pub z_pv: f32 => "fPosZ",
        pub x_sv: f32 => "fXSecondaryVertex",
        pub y_sv: f32 => "fYSecondaryVertex",
        pub z_sv: f32 => "fZSecondaryVertex",
        pub px_prong0: f32 => "fPxProng0",
        pub py_prong0: f32 => "fPyProng0",
        pub pz_prong0: f32 => "fPzProng0",
        pub px_prong1: f32 => "fPxProng1",
        pub py_prong1: f32 => "fPyProng1",
        pub pz_prong1: f32 => "fPzProng1",
    }
}

impl HfCand2Prong {
    /// Momentum of prong 0.
    pub fn p_prong0(&self) -> Vec3 {
        Vec3::new(
            self.px_prong0 as f64,
            self.py_prong0 as f64,
            self.pz_prong0 as f64,
        )
    }
    /// Momentum of prong 1.
    pub fn p_prong1(&self) -> Vec3 {
        Vec3::new(
            self.px_prong1 as f64,
            self.py_prong1 as f64,
            self.pz_prong1 as f64,
        )
    }
    /// Total momentum of the candidate.
    pub fn p(&self) -> Vec3 {
        self.p_prong0() + self.p_prong1()
    }
    /// Transverse momentum of the candidate.
    pub fn pt(&self) -> f64 {
        self.p().pt()
    }
    /// Cosine of the pointing angle between the flight line and the candidate momentum.
    pub fn cpa(&self) -> f64 {
        let pv = Vec3::new(self.x_pv as f64, self.y_pv as f64, self.z_pv as f64);
        let sv = Vec3::new(self.x_sv as f64, self.y_sv as f64, self.z_sv as f64);
        (sv - pv).cos_angle(&self.p())
    }
    /// Whether the candidate is flagged as compatible with `decay`.
    pub fn is_selected(&self, decay: DecayType) -> bool {
        decay.is_set(self.hfflag)
    }
    fn invariant_mass(&self, prong0: Species, prong1: Species) -> f64 {
        (self.p_prong0().with_mass(prong0.mass()) + self.p_prong1().with_mass(prong1.mass())).m()
    }
    /// $`D^0 \to \pi^+ K^-`$ hypothesis: prong 0 is the pion, prong 1 the kaon.
    pub fn inv_mass_d0_to_pi_k(&self) -> f64 {
        self.invariant_mass(Species::Pion, Species::Kaon)
    }
    /// $`\bar{D}^0 \to K^+ \pi^-`$ hypothesis: prong 0 is the kaon, prong 1 the pion.
    pub fn inv_mass_d0bar_to_k_pi(&self) -> f64 {
        self.invariant_mass(Species::Kaon, Species::Pion)
    }
}

aod_table! {
    /// A selected $`D^0`$ candidate, the derived table written by the candidate producer and read
    /// back by downstream tasks.
    pub struct D0Candidate in "D0CANDIDATES" as "d0_candidates" {
        pub inv_mass_d0: f32 => "fInvMassD0",
        pub inv_mass_d0bar: f32 => "fInvMassD0bar",
        pub pt: f32 => "fPt",
        pub cosine_pointing: f32 => "fCosinePointing",
        pub collision_id: Option<usize> => "fIndexCollisions",
    }
}

impl CollisionLinked for D0Candidate {
    fn collision_id(&self) -> Option<usize> {
        self.collision_id
    }
}

/// A borrowed row which remembers its global index in the table it came from.
#[derive(Debug)]
pub struct Row<'a, R> {
    index: usize,
    row: &'a R,
}

impl<R> Clone for Row<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Row<'_, R> {}

impl<'a, R> Row<'a, R> {
    /// The position of this row in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Borrow the underlying record.
    pub fn get(&self) -> &'a R {
        self.row
    }
}

impl<R> Deref for Row<'_, R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        self.row
    }
}

/// An append-only table of rows addressed by global index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> From<Vec<R>> for Table<R> {
    fn from(rows: Vec<R>) -> Self {
        Self { rows }
    }
}

impl<R> FromIterator<R> for Table<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<R> Table<R> {
    /// Create a table from rows in global-index order.
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, returning its global index.
    pub fn push(&mut self, row: R) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    /// Borrow the raw rows.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Look up a row by global index.
    pub fn get(&self, index: usize) -> Option<Row<'_, R>> {
        self.rows.get(index).map(|row| Row { index, row })
    }

    /// Iterate over all rows along with their global indices.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_, R>> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| Row { index, row })
    }

    /// A view of every row.
    pub fn all(&self) -> Filtered<'_, R> {
        Filtered {
            rows: self.iter().collect(),
        }
    }

    /// A view of the rows which pass `selection`.
    pub fn filter<V>(&self, selection: &Selection<V>) -> Filtered<'_, R>
    where
        V: Variable<Row = R>,
    {
        Filtered {
            rows: self.iter().filter(|row| selection.passes(row)).collect(),
        }
    }
}

impl<R: AodRow> Table<R> {
    /// Resolve an index column value against this table.
    pub fn resolve(&self, index: usize) -> AodResult<Row<'_, R>> {
        self.get(index).ok_or_else(|| AodError::DanglingIndex {
            table: R::TABLE_NAME.to_string(),
            index,
            len: self.len(),
        })
    }
}

impl<R: CollisionLinked> Table<R> {
    /// Rows belonging to the collision at `collision_index`.
    pub fn slice_by_collision(&self, collision_index: usize) -> Filtered<'_, R> {
        self.all().slice_by_collision(collision_index)
    }

    /// Group rows by parent collision. The result has one (possibly empty) entry per collision;
    /// rows without a collision belong to no group.
    ///
    /// # Errors
    ///
    /// Returns [`AodError::DanglingIndex`] if a row points past `n_collisions`.
    pub fn grouped_by_collision(&self, n_collisions: usize) -> AodResult<Vec<Filtered<'_, R>>> {
        self.all().grouped_by_collision(n_collisions)
    }
}

/// A subset of a table's rows, in table order. Filters, partitions, and per-collision slices
/// all produce this view.
#[derive(Debug)]
pub struct Filtered<'a, R> {
    rows: Vec<Row<'a, R>>,
}

impl<R> Clone for Filtered<'_, R> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

impl<R> Default for Filtered<'_, R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<'a, R> Filtered<'a, R> {
    /// Number of rows in the view.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the view selects no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The selected rows, in table order.
    pub fn rows(&self) -> &[Row<'a, R>] {
        &self.rows
    }

    /// Iterate over the selected rows, in table order.
    pub fn iter(&self) -> impl Iterator<Item = Row<'a, R>> + '_ {
        self.rows.iter().copied()
    }

    /// The subset of this view which passes `selection`.
    pub fn partition<V>(&self, selection: &Selection<V>) -> Filtered<'a, R>
    where
        V: Variable<Row = R>,
    {
        Filtered {
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|row| selection.passes(row))
                .collect(),
        }
    }
}

impl<'a, R: CollisionLinked> Filtered<'a, R> {
    /// The subset of this view belonging to the collision at `collision_index`.
    pub fn slice_by_collision(&self, collision_index: usize) -> Filtered<'a, R> {
        Filtered {
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|row| row.collision_id() == Some(collision_index))
                .collect(),
        }
    }

    /// Group this view by parent collision in a single pass. See [`Table::grouped_by_collision`].
    pub fn grouped_by_collision(&self, n_collisions: usize) -> AodResult<Vec<Filtered<'a, R>>> {
        let mut groups: Vec<Filtered<'a, R>> =
            (0..n_collisions).map(|_| Filtered::default()).collect();
        for row in self.rows.iter().copied() {
            let Some(id) = row.collision_id() else {
                continue;
            };
            groups
                .get_mut(id)
                .ok_or_else(|| AodError::DanglingIndex {
                    table: Collision::TABLE_NAME.to_string(),
                    index: id,
                    len: n_collisions,
                })?
                .rows
                .push(row);
        }
        Ok(groups)
    }
}

impl<'a, R> IntoIterator for Filtered<'a, R> {
    type Item = Row<'a, R>;
    type IntoIter = std::vec::IntoIter<Row<'a, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// The read-only table capability handed to analysis tasks.
///
/// Tasks never load or own input tables themselves; the host (the [`Workflow`](crate::Workflow)
/// runner, a test, or an embedding application) provides them through this trait.
pub trait AodSource {
    fn collisions(&self) -> &Table<Collision>;
    /// Tracks propagated to the primary vertex.
    fn tracks(&self) -> &Table<Track>;
    /// Tracks at their innermost update point. Sources which do not distinguish the two
    /// return the propagated tracks.
    fn tracks_iu(&self) -> &Table<Track> {
        self.tracks()
    }
    fn v0s(&self) -> &Table<V0>;
    fn mc_particles(&self) -> &Table<McParticle>;
    fn hf_cand_2prongs(&self) -> &Table<HfCand2Prong>;
}

/// An in-memory set of AOD tables.
#[derive(Debug, Clone, Default)]
pub struct AodFrame {
    pub collisions: Table<Collision>,
    pub tracks: Table<Track>,
    /// Present only when the input provides a separate innermost-update track table.
    pub tracks_iu: Option<Table<Track>>,
    pub v0s: Table<V0>,
    pub mc_particles: Table<McParticle>,
    pub hf_cand_2prongs: Table<HfCand2Prong>,
}

impl AodSource for AodFrame {
    fn collisions(&self) -> &Table<Collision> {
        &self.collisions
    }
    fn tracks(&self) -> &Table<Track> {
        &self.tracks
    }
    fn tracks_iu(&self) -> &Table<Track> {
        self.tracks_iu.as_ref().unwrap_or(&self.tracks)
    }
    fn v0s(&self) -> &Table<V0> {
        &self.v0s
    }
    fn mc_particles(&self) -> &Table<McParticle> {
        &self.mc_particles
    }
    fn hf_cand_2prongs(&self) -> &Table<HfCand2Prong> {
        &self.hf_cand_2prongs
    }
}

impl Display for AodFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AOD frame:")?;
        writeln!(f, "  collisions:      {}", self.collisions.len())?;
        writeln!(f, "  tracks:          {}", self.tracks.len())?;
        if let Some(tracks_iu) = &self.tracks_iu {
            writeln!(f, "  tracks (IU):     {}", tracks_iu.len())?;
        }
        writeln!(f, "  V0s:             {}", self.v0s.len())?;
        writeln!(f, "  MC particles:    {}", self.mc_particles.len())?;
        writeln!(f, "  2-prong HF cand: {}", self.hf_cand_2prongs.len())
    }
}

/// Tables produced by tasks during a workflow and consumed by later tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedTables {
    pub d0_candidates: Table<D0Candidate>,
}

impl DerivedTables {
    /// Whether no derived rows exist.
    pub fn is_empty(&self) -> bool {
        self.d0_candidates.is_empty()
    }

    /// Remove every row of the derived table called `table`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`AodError::Custom`] if `table` is not a derived table.
    pub fn clear(&mut self, table: &str) -> AodResult<usize> {
        if table == D0Candidate::TABLE_NAME {
            Ok(std::mem::take(&mut self.d0_candidates).len())
        } else {
            Err(AodError::Custom(format!(
                "\"{table}\" is not a derived table"
            )))
        }
    }
}

/// A small frame that can be used to test tasks. It contains three collisions, thirteen tracks
/// (including V0 daughters and one track without a collision), five V0s, ten MC particles, and
/// five two-prong heavy-flavour candidates.
pub fn test_frame() -> AodFrame {
    let collisions = Table::new(vec![
        Collision {
            pos_x: 0.01,
            pos_y: -0.02,
            pos_z: 3.5,
            sel7: true,
            sel8: true,
        },
        Collision {
            pos_x: 0.0,
            pos_y: 0.01,
            pos_z: -7.2,
            sel7: false,
            sel8: true,
        },
        Collision {
            pos_x: 0.02,
            pos_y: 0.0,
            pos_z: 12.0,
            sel7: true,
            sel8: false,
        },
    ]);

    #[allow(clippy::too_many_arguments)]
    fn track(
        collision_id: Option<usize>,
        pt: f32,
        eta: f32,
        phi: f32,
        sign: i32,
        dca_xy: f32,
        tpc_n_cls_crossed_rows: i32,
        tpc_n_sigma_pi: f32,
        tpc_n_sigma_pr: f32,
        mc_particle_id: Option<usize>,
    ) -> Track {
        Track {
            collision_id,
            pt,
            eta,
            phi,
            sign,
            dca_xy,
            dca_z: 0.1,
            tpc_n_cls_crossed_rows,
            tpc_n_sigma_pi,
            tpc_n_sigma_pr,
            mc_particle_id,
        }
    }
    let tracks = Table::new(vec![
        track(Some(0), 5.0, 0.5, 0.3, 1, 0.05, 120, 0.5, 6.0, Some(0)),
        track(Some(0), 2.5, -0.3, 1.0, -1, -0.1, 100, -0.8, 5.0, Some(1)),
        track(Some(0), 3.0, 0.7, 3.5, 1, 0.15, 60, 1.2, 3.0, Some(2)),
        track(Some(0), 1.0, 0.2, 2.0, -1, 0.01, 110, 0.1, 8.0, None),
        track(Some(0), 6.0, 0.9, 5.0, 1, 0.02, 130, 2.0, 2.5, Some(3)),
        track(Some(1), 4.5, 0.1, 6.0, -1, 0.3, 90, 0.3, 0.2, Some(4)),
        track(Some(1), 2.2, -0.6, 0.2, 1, -0.05, 80, 0.7, 4.0, Some(5)),
        track(Some(1), 8.0, 0.4, 3.0, -1, 0.0, 140, -0.2, 6.5, Some(6)),
        // V0 daughters
        track(Some(0), 0.8, 0.3, 0.6, 1, 0.5, 50, 0.5, 5.0, None),
        track(Some(0), 0.8, 0.1, 0.9, -1, -0.6, 50, -1.0, 4.5, None),
        track(Some(1), 1.3, 0.3, 1.6, 1, 0.4, 50, 6.0, 1.0, None),
        track(Some(1), 0.3, 0.3, 1.7, -1, -0.7, 50, 0.3, 7.0, None),
        // not associated to any collision
        track(None, 3.0, 0.1, 4.0, 1, 0.0, 100, 0.0, 0.0, None),
    ]);

    fn mc(pdg_code: i32, pt: f64, eta: f64, phi: f64) -> McParticle {
        let p = Vec3::from_pt_eta_phi(pt, eta, phi);
        McParticle {
            pdg_code,
            px: p.x as f32,
            py: p.y as f32,
            pz: p.z as f32,
        }
    }
    let mc_particles = Table::new(vec![
        mc(211, 4.895, 0.5, 0.3),
        mc(-211, 2.6, -0.3, 1.0),
        mc(211, 3.1, 0.7, 3.5),
        mc(321, 6.0, 0.9, 5.0),
        mc(2212, 4.4, 0.1, 6.0),
        mc(-211, 2.25, -0.6, 0.2),
        mc(211, 7.9, 0.4, 3.0),
        mc(310, 1.13, 0.17, 0.46),
        mc(3122, 1.5, 0.33, 1.57),
        mc(-3122, 1.0, 0.0, 0.0),
    ]);

    #[allow(clippy::too_many_arguments)]
    fn v0(
        collision_id: usize,
        daughters: (usize, usize),
        vertex: [f32; 3],
        p_pos: [f32; 3],
        p_neg: [f32; 3],
        dca_v0_daughters: f32,
        mc_particle_id: Option<usize>,
    ) -> V0 {
        V0 {
            collision_id: Some(collision_id),
            pos_track_id: daughters.0,
            neg_track_id: daughters.1,
            x: vertex[0],
            y: vertex[1],
            z: vertex[2],
            px_pos: p_pos[0],
            py_pos: p_pos[1],
            pz_pos: p_pos[2],
            px_neg: p_neg[0],
            py_neg: p_neg[1],
            pz_neg: p_neg[2],
            dca_v0_daughters,
            dca_pos_to_pv: 0.5,
            dca_neg_to_pv: -0.6,
            mc_particle_id,
        }
    }
    // daughters of a K0S-like V0 with momentum (1.0, 0.5, 0.2)
    let k0_pos = [0.592108, 0.065784, 0.1];
    let k0_neg = [0.407892, 0.434216, 0.1];
    let v0s = Table::new(vec![
        v0(0, (8, 9), [2.01, 0.98, 3.9], k0_pos, k0_neg, 0.3, Some(7)),
        v0(1, (10, 11), [0.0, 3.01, -6.2], [0.05, 1.2, 0.4], [-0.05, 0.3, 0.1], 0.2, Some(8)),
        // rejected by the daughter-DCA pre-filter
        v0(0, (8, 9), [2.01, 0.98, 3.9], k0_pos, k0_neg, 1.5, None),
        // momentum perpendicular to the flight line
        v0(0, (10, 9), [1.01, -0.02, 3.5], [0.0, 0.1, 0.5], [0.0, -0.1, 0.5], 0.4, Some(9)),
        v0(2, (8, 9), [2.02, 1.0, 12.4], k0_pos, k0_neg, 0.3, None),
    ]);

    #[allow(clippy::too_many_arguments)]
    fn hf(
        prongs: (usize, usize),
        hfflag: u8,
        pv: [f32; 3],
        sv: [f32; 3],
        p0: [f32; 3],
        p1: [f32; 3],
    ) -> HfCand2Prong {
        HfCand2Prong {
            prong0_id: prongs.0,
            prong1_id: prongs.1,
            hfflag,
            x_pv: pv[0],
            y_pv: pv[1],
            z_pv: pv[2],
            x_sv: sv[0],
            y_sv: sv[1],
            z_sv: sv[2],
            px_prong0: p0[0],
            py_prong0: p0[1],
            pz_prong0: p0[2],
            px_prong1: p1[0],
            py_prong1: p1[1],
            pz_prong1: p1[2],
        }
    }
    let pv0 = [0.01, -0.02, 3.5];
    let pv1 = [0.0, 0.01, -7.2];
    let hf_cand_2prongs = Table::new(vec![
        hf((0, 1), 0b001, pv0, [0.26, 0.055, 3.535], [3.0, 1.0, 0.5], [2.0, 0.5, 0.2]),
        hf((0, 1), 0b000, pv0, [0.26, 0.055, 3.535], [3.0, 1.0, 0.5], [2.0, 0.5, 0.2]),
        hf((0, 1), 0b001, pv0, [0.06, -0.01, 3.51], [1.5, 0.5, 0.1], [1.0, 0.3, 0.1]),
        hf((7, 6), 0b011, pv1, [0.5, -0.19, -7.1], [4.0, -2.0, 1.0], [1.0, -0.5, 0.0]),
        hf((12, 1), 0b001, pv0, [0.11, 0.03, 3.6], [3.0, 2.0, 0.0], [2.5, 1.0, 0.0]),
    ]);

    AodFrame {
        collisions,
        tracks,
        tracks_iu: None,
        v0s,
        mc_particles,
        hf_cand_2prongs,
    }
}
