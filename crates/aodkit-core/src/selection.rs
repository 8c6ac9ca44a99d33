use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

use crate::data::{Track, V0};

/// A named numeric quantity computed from one row type.
pub trait Variable: Copy + Debug + Display {
    /// The row type this variable reads.
    type Row;
    /// Evaluate the variable on a row.
    fn value(&self, row: &Self::Row) -> f64;
}

/// Builder methods available on every [`Variable`].
pub trait VariableExt: Variable {
    /// Wrap the variable in an absolute value.
    fn abs(self) -> Term<Self> {
        Term {
            variable: self,
            abs: true,
        }
    }
    /// Use the variable as-is.
    fn term(self) -> Term<Self> {
        Term {
            variable: self,
            abs: false,
        }
    }
    fn gt(self, threshold: f64) -> Selection<Self> {
        self.term().gt(threshold)
    }
    fn ge(self, threshold: f64) -> Selection<Self> {
        self.term().ge(threshold)
    }
    fn lt(self, threshold: f64) -> Selection<Self> {
        self.term().lt(threshold)
    }
    fn le(self, threshold: f64) -> Selection<Self> {
        self.term().le(threshold)
    }
}

impl<V: Variable> VariableExt for V {}

/// A [`Variable`], optionally taken in absolute value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Term<V> {
    pub variable: V,
    pub abs: bool,
}

impl<V: Variable> Term<V> {
    pub fn value(&self, row: &V::Row) -> f64 {
        let value = self.variable.value(row);
        if self.abs {
            value.abs()
        } else {
            value
        }
    }
    fn cut(self, comparison: Comparison, threshold: f64) -> Selection<V> {
        Selection::Cut {
            term: self,
            comparison,
            threshold,
        }
    }
    pub fn gt(self, threshold: f64) -> Selection<V> {
        self.cut(Comparison::Gt, threshold)
    }
    pub fn ge(self, threshold: f64) -> Selection<V> {
        self.cut(Comparison::Ge, threshold)
    }
    pub fn lt(self, threshold: f64) -> Selection<V> {
        self.cut(Comparison::Lt, threshold)
    }
    pub fn le(self, threshold: f64) -> Selection<V> {
        self.cut(Comparison::Le, threshold)
    }
}

impl<V: Display> Display for Term<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.abs {
            write!(f, "|{}|", self.variable)
        } else {
            write!(f, "{}", self.variable)
        }
    }
}

/// Comparison operators for a [`Selection::Cut`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    /// Compare `value` to `threshold`. Any comparison involving NaN is false.
    pub fn apply(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Le => value <= threshold,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparison::Gt => write!(f, ">"),
            Comparison::Ge => write!(f, ">="),
            Comparison::Lt => write!(f, "<"),
            Comparison::Le => write!(f, "<="),
        }
    }
}

/// A boolean expression over one row type, built from cuts on [`Variable`]s.
///
/// ```
/// use aodkit_core::{traits::VariableExt, Track, TrackVar};
///
/// let selection = TrackVar::Eta.abs().lt(0.8).and(TrackVar::Pt.gt(2.0));
/// let track = Track { pt: 5.0, eta: -0.5, ..Default::default() };
/// assert!(selection.passes(&track));
/// assert_eq!(selection.to_string(), "(|eta| < 0.8 && pt > 2)");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Selection<V> {
    /// Accept every row.
    All,
    Cut {
        term: Term<V>,
        comparison: Comparison,
        threshold: f64,
    },
    And(Box<Selection<V>>, Box<Selection<V>>),
    Or(Box<Selection<V>>, Box<Selection<V>>),
    Not(Box<Selection<V>>),
}

impl<V: Variable> Selection<V> {
    /// Evaluate the selection on a row.
    pub fn passes(&self, row: &V::Row) -> bool {
        match self {
            Selection::All => true,
            Selection::Cut {
                term,
                comparison,
                threshold,
            } => comparison.apply(term.value(row), *threshold),
            Selection::And(a, b) => a.passes(row) && b.passes(row),
            Selection::Or(a, b) => a.passes(row) || b.passes(row),
            Selection::Not(a) => !a.passes(row),
        }
    }

    pub fn and(self, other: Self) -> Self {
        Selection::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Selection::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Selection::Not(Box::new(self))
    }
}

impl<V: Variable> std::ops::BitAnd for Selection<V> {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<V: Variable> std::ops::BitOr for Selection<V> {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<V: Variable> std::ops::Not for Selection<V> {
    type Output = Self;
    fn not(self) -> Self::Output {
        Selection::Not(Box::new(self))
    }
}

impl<V: Display> Display for Selection<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::All => write!(f, "all"),
            Selection::Cut {
                term,
                comparison,
                threshold,
            } => write!(f, "{} {} {}", term, comparison, threshold),
            Selection::And(a, b) => write!(f, "({} && {})", a, b),
            Selection::Or(a, b) => write!(f, "({} || {})", a, b),
            Selection::Not(a) => write!(f, "!{}", a),
        }
    }
}

/// Per-track quantities usable in a [`Selection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackVar {
    Pt,
    Eta,
    Phi,
    Sign,
    DcaXY,
    DcaZ,
    TpcNClsCrossedRows,
    TpcNSigmaPi,
    TpcNSigmaPr,
}

impl Variable for TrackVar {
    type Row = Track;

    fn value(&self, row: &Track) -> f64 {
        match self {
            TrackVar::Pt => row.pt as f64,
            TrackVar::Eta => row.eta as f64,
            TrackVar::Phi => row.phi as f64,
            TrackVar::Sign => row.sign as f64,
            TrackVar::DcaXY => row.dca_xy as f64,
            TrackVar::DcaZ => row.dca_z as f64,
            TrackVar::TpcNClsCrossedRows => row.tpc_n_cls_crossed_rows as f64,
            TrackVar::TpcNSigmaPi => row.tpc_n_sigma_pi as f64,
            TrackVar::TpcNSigmaPr => row.tpc_n_sigma_pr as f64,
        }
    }
}

impl Display for TrackVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrackVar::Pt => "pt",
            TrackVar::Eta => "eta",
            TrackVar::Phi => "phi",
            TrackVar::Sign => "sign",
            TrackVar::DcaXY => "dcaXY",
            TrackVar::DcaZ => "dcaZ",
            TrackVar::TpcNClsCrossedRows => "tpcNClsCrossedRows",
            TrackVar::TpcNSigmaPi => "tpcNSigmaPi",
            TrackVar::TpcNSigmaPr => "tpcNSigmaPr",
        };
        write!(f, "{}", name)
    }
}

/// Per-V0 quantities usable in a [`Selection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum V0Var {
    Pt,
    Radius,
    DcaV0Daughters,
    DcaPosToPV,
    DcaNegToPV,
}

impl Variable for V0Var {
    type Row = V0;

    fn value(&self, row: &V0) -> f64 {
        match self {
            V0Var::Pt => row.pt(),
            V0Var::Radius => row.v0_radius(),
            V0Var::DcaV0Daughters => row.dca_v0_daughters as f64,
            V0Var::DcaPosToPV => row.dca_pos_to_pv as f64,
            V0Var::DcaNegToPV => row.dca_neg_to_pv as f64,
        }
    }
}

impl Display for V0Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            V0Var::Pt => "pt",
            V0Var::Radius => "v0radius",
            V0Var::DcaV0Daughters => "dcaV0daughters",
            V0Var::DcaPosToPV => "dcapostopv",
            V0Var::DcaNegToPV => "dcanegtopv",
        };
        write!(f, "{}", name)
    }
}

/// The track-quality cut shared by the tutorial tasks: enough TPC crossed rows and a small
/// transverse DCA to the primary vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSelection {
    /// Minimum number of crossed TPC pad rows (inclusive).
    pub min_tpc_crossed_rows: i32,
    /// Maximum $`|\text{DCA}_{xy}|`$ in cm (inclusive).
    pub max_dca_xy: f64,
}

impl Default for TrackSelection {
    fn default() -> Self {
        Self {
            min_tpc_crossed_rows: 70,
            max_dca_xy: 0.2,
        }
    }
}

impl TrackSelection {
    /// Whether the track passes both quality requirements.
    pub fn passes(&self, track: &Track) -> bool {
        self.to_selection().passes(track)
    }

    /// The equivalent [`Selection`] expression.
    pub fn to_selection(&self) -> Selection<TrackVar> {
        TrackVar::TpcNClsCrossedRows
            .ge(self.min_tpc_crossed_rows as f64)
            .and(TrackVar::DcaXY.abs().le(self.max_dca_xy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(pt: f32, eta: f32) -> Track {
        Track {
            pt,
            eta,
            ..Default::default()
        }
    }

    fn kinematic_selection() -> Selection<TrackVar> {
        TrackVar::Eta.abs().lt(0.8) & TrackVar::Pt.gt(2.0)
    }

    #[test]
    fn test_kinematic_selection() {
        let selection = kinematic_selection();
        assert!(selection.passes(&track(5.0, 0.5)));
        assert!(selection.passes(&track(5.0, -0.5)));
        assert!(!selection.passes(&track(1.0, 0.5)));
        assert!(!selection.passes(&track(5.0, 0.9)));
    }

    #[test]
    fn test_thresholds_are_exact() {
        let t = track(2.0, 0.0);
        assert!(!TrackVar::Pt.gt(2.0).passes(&t));
        assert!(TrackVar::Pt.ge(2.0).passes(&t));
        assert!(!TrackVar::Pt.lt(2.0).passes(&t));
        assert!(TrackVar::Pt.le(2.0).passes(&t));
    }

    #[test]
    fn test_nan_fails_every_comparison() {
        let t = track(f32::NAN, 0.0);
        for selection in [
            TrackVar::Pt.gt(0.0),
            TrackVar::Pt.ge(0.0),
            TrackVar::Pt.lt(0.0),
            TrackVar::Pt.le(0.0),
        ] {
            assert!(!selection.passes(&t));
            assert!((!selection).passes(&t));
        }
    }

    #[test]
    fn test_boolean_combinators() {
        let low = TrackVar::Pt.lt(1.0);
        let high = TrackVar::Pt.gt(4.0);
        let either = low.clone() | high.clone();
        assert!(either.passes(&track(0.5, 0.0)));
        assert!(either.passes(&track(5.0, 0.0)));
        assert!(!either.passes(&track(2.0, 0.0)));
        let neither = either.not();
        assert!(neither.passes(&track(2.0, 0.0)));
        assert!(Selection::<TrackVar>::All.passes(&track(f32::NAN, f32::NAN)));
        assert!(!(low & high).passes(&track(2.0, 0.0)));
    }

    #[test]
    fn test_display() {
        let selection = kinematic_selection().or(TrackVar::Sign.lt(0.0).not());
        assert_eq!(
            selection.to_string(),
            "((|eta| < 0.8 && pt > 2) || !sign < 0)"
        );
    }

    #[test]
    fn test_track_selection() {
        let cut = TrackSelection::default();
        let good = Track {
            tpc_n_cls_crossed_rows: 70,
            dca_xy: -0.1,
            ..Default::default()
        };
        assert!(cut.passes(&good));
        let few_rows = Track {
            tpc_n_cls_crossed_rows: 69,
            ..good
        };
        assert!(!cut.passes(&few_rows));
        let displaced = Track {
            dca_xy: -0.25,
            ..good
        };
        assert!(!cut.passes(&displaced));
    }

    #[test]
    fn test_track_selection_defaults_from_json() {
        let cut: TrackSelection = serde_json::from_str(r#"{"max_dca_xy": 0.1}"#).unwrap();
        assert_eq!(cut.min_tpc_crossed_rows, 70);
        assert_eq!(cut.max_dca_xy, 0.1);
    }

    #[test]
    fn test_v0_variables() {
        let v0 = V0 {
            x: 3.0,
            y: 4.0,
            dca_v0_daughters: 0.5,
            ..Default::default()
        };
        assert_eq!(V0Var::Radius.value(&v0), 5.0);
        let prefilter = V0Var::DcaV0Daughters.lt(1.0) & V0Var::Radius.gt(0.5);
        assert!(prefilter.passes(&v0));
    }
}
