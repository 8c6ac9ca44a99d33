use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    utils::get_bin_index,
    AodError, AodResult,
};

/// An evenly-binned axis over `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl Axis {
    /// Create a new [`Axis`].
    ///
    /// # Errors
    ///
    /// Returns [`AodError::InvalidAxis`] if there are no bins, either edge is not finite, or
    /// `min >= max`.
    pub fn new(bins: usize, min: f64, max: f64) -> AodResult<Self> {
        let reason = if bins == 0 {
            Some("an axis needs at least one bin")
        } else if !(min.is_finite() && max.is_finite()) {
            Some("axis edges must be finite")
        } else if min >= max {
            Some("the lower edge must be below the upper edge")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(AodError::InvalidAxis {
                bins,
                min,
                max,
                reason,
            }),
            None => Ok(Self { bins, min, max }),
        }
    }

    /// The bin containing `value`, if it lies inside the axis range.
    pub fn index(&self, value: f64) -> Option<usize> {
        get_bin_index(value, self.bins, (self.min, self.max))
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    /// The center of bin `index`.
    pub fn center(&self, index: usize) -> f64 {
        self.min + (index as f64 + 0.5) * self.width()
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bins in [{}, {})", self.bins, self.min, self.max)
    }
}

/// A one-dimensional histogram with per-bin sums of weights and squared weights.
///
/// Every fill call increments [`Hist1D::entries`], whether or not the value lands inside the axis
/// range. Values below the range go to the underflow; values at or above the upper edge, and NaN,
/// go to the overflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hist1D {
    pub title: String,
    pub axis: Axis,
    pub sumw: Vec<f64>,
    pub sumw2: Vec<f64>,
    pub underflow: f64,
    pub overflow: f64,
    pub entries: u64,
}

impl Hist1D {
    pub fn new(title: &str, axis: Axis) -> Self {
        Self {
            title: title.to_string(),
            axis,
            sumw: vec![0.0; axis.bins],
            sumw2: vec![0.0; axis.bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        self.entries += 1;
        match self.axis.index(x) {
            Some(bin) => {
                self.sumw[bin] += weight;
                self.sumw2[bin] += weight * weight;
            }
            None if x < self.axis.min => self.underflow += weight,
            None => self.overflow += weight,
        }
    }

    pub fn bin_content(&self, bin: usize) -> f64 {
        self.sumw.get(bin).copied().unwrap_or_default()
    }

    /// Sum of weights inside the axis range.
    pub fn integral(&self) -> f64 {
        self.sumw.iter().sum()
    }

    /// Weighted mean of the in-range bin centers, or NaN for an empty histogram.
    pub fn mean(&self) -> f64 {
        let integral = self.integral();
        self.sumw
            .iter()
            .enumerate()
            .map(|(bin, w)| w * self.axis.center(bin))
            .sum::<f64>()
            / integral
    }
}

/// A two-dimensional histogram stored x-major (`ix * y.bins + iy`).
///
/// A fill where either coordinate falls outside its axis (or is NaN) adds to
/// [`Hist2D::out_of_range`] instead of a bin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hist2D {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub sumw: Vec<f64>,
    pub sumw2: Vec<f64>,
    pub out_of_range: f64,
    pub entries: u64,
}

impl Hist2D {
    pub fn new(title: &str, x_axis: Axis, y_axis: Axis) -> Self {
        let n = x_axis.bins * y_axis.bins;
        Self {
            title: title.to_string(),
            x_axis,
            y_axis,
            sumw: vec![0.0; n],
            sumw2: vec![0.0; n],
            out_of_range: 0.0,
            entries: 0,
        }
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        self.fill_weighted(x, y, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, y: f64, weight: f64) {
        self.entries += 1;
        match (self.x_axis.index(x), self.y_axis.index(y)) {
            (Some(ix), Some(iy)) => {
                let bin = ix * self.y_axis.bins + iy;
                self.sumw[bin] += weight;
                self.sumw2[bin] += weight * weight;
            }
            _ => self.out_of_range += weight,
        }
    }

    pub fn bin_content(&self, ix: usize, iy: usize) -> f64 {
        if ix >= self.x_axis.bins || iy >= self.y_axis.bins {
            return 0.0;
        }
        self.sumw[ix * self.y_axis.bins + iy]
    }

    pub fn integral(&self) -> f64 {
        self.sumw.iter().sum()
    }
}

/// Any histogram held by a [`HistogramRegistry`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Histogram {
    H1(Hist1D),
    H2(Hist2D),
}

impl Histogram {
    pub fn title(&self) -> &str {
        match self {
            Histogram::H1(h) => &h.title,
            Histogram::H2(h) => &h.title,
        }
    }

    /// The number of fill calls.
    pub fn entries(&self) -> u64 {
        match self {
            Histogram::H1(h) => h.entries,
            Histogram::H2(h) => h.entries,
        }
    }

    /// Sum of in-range weights.
    pub fn integral(&self) -> f64 {
        match self {
            Histogram::H1(h) => h.integral(),
            Histogram::H2(h) => h.integral(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Histogram::H1(_) => "1D",
            Histogram::H2(_) => "2D",
        }
    }
}

/// The shape of a histogram to register.
#[derive(Clone, Debug, PartialEq)]
pub enum HistSpec {
    H1 { title: String, x: Axis },
    H2 { title: String, x: Axis, y: Axis },
}

impl HistSpec {
    pub fn h1(title: &str, x: Axis) -> Self {
        Self::H1 {
            title: title.to_string(),
            x,
        }
    }

    pub fn h2(title: &str, x: Axis, y: Axis) -> Self {
        Self::H2 {
            title: title.to_string(),
            x,
            y,
        }
    }

    fn build(self) -> Histogram {
        match self {
            HistSpec::H1 { title, x } => Histogram::H1(Hist1D::new(&title, x)),
            HistSpec::H2 { title, x, y } => Histogram::H2(Hist2D::new(&title, x, y)),
        }
    }
}

/// A tag which refers to a histogram in a [`HistogramRegistry`], obtained from
/// [`HistogramRegistry::add`].
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistID(pub(crate) String, pub(crate) usize);

impl HistID {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for HistID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(id={})", self.0, self.1)
    }
}

/// A named, insertion-ordered collection of histograms owned by one task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistogramRegistry {
    histograms: IndexMap<String, Histogram>,
}

impl HistogramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a histogram under a unique name.
    ///
    /// # Errors
    ///
    /// The name must not already be registered, else this will return a
    /// [`RegistrationError`][AodError::RegistrationError].
    pub fn add(&mut self, name: &str, spec: HistSpec) -> AodResult<HistID> {
        if self.histograms.contains_key(name) {
            return Err(AodError::RegistrationError {
                name: name.to_string(),
            });
        }
        let (index, _) = self
            .histograms
            .insert_full(name.to_string(), spec.build());
        Ok(HistID(name.to_string(), index))
    }

    fn get_by_id_mut(&mut self, id: &HistID) -> AodResult<&mut Histogram> {
        match self.histograms.get_index_mut(id.1) {
            Some((name, histogram)) if *name == id.0 => Ok(histogram),
            _ => Err(AodError::HistogramNotFound {
                name: id.0.clone(),
            }),
        }
    }

    /// Fill a 1-D histogram.
    pub fn fill(&mut self, id: &HistID, x: f64) -> AodResult<()> {
        self.fill_weighted(id, x, 1.0)
    }

    pub fn fill_weighted(&mut self, id: &HistID, x: f64, weight: f64) -> AodResult<()> {
        match self.get_by_id_mut(id)? {
            Histogram::H1(h) => {
                h.fill_weighted(x, weight);
                Ok(())
            }
            Histogram::H2(_) => Err(AodError::HistogramKindMismatch {
                name: id.0.clone(),
                expected: "1D",
            }),
        }
    }

    /// Fill a 2-D histogram.
    pub fn fill_2d(&mut self, id: &HistID, x: f64, y: f64) -> AodResult<()> {
        match self.get_by_id_mut(id)? {
            Histogram::H2(h) => {
                h.fill(x, y);
                Ok(())
            }
            Histogram::H1(_) => Err(AodError::HistogramKindMismatch {
                name: id.0.clone(),
                expected: "2D",
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name)
    }

    pub fn get_1d(&self, name: &str) -> AodResult<&Hist1D> {
        match self.histograms.get(name) {
            Some(Histogram::H1(h)) => Ok(h),
            Some(Histogram::H2(_)) => Err(AodError::HistogramKindMismatch {
                name: name.to_string(),
                expected: "1D",
            }),
            None => Err(AodError::HistogramNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn get_2d(&self, name: &str) -> AodResult<&Hist2D> {
        match self.histograms.get(name) {
            Some(Histogram::H2(h)) => Ok(h),
            Some(Histogram::H1(_)) => Err(AodError::HistogramKindMismatch {
                name: name.to_string(),
                expected: "2D",
            }),
            None => Err(AodError::HistogramNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Iterate over `(name, histogram)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Histogram)> {
        self.histograms
            .iter()
            .map(|(name, histogram)| (name.as_str(), histogram))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::test_frame,
        selection::{TrackVar, VariableExt},
    };
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_validation() {
        assert!(Axis::new(10, 0.0, 1.0).is_ok());
        assert!(matches!(
            Axis::new(0, 0.0, 1.0),
            Err(AodError::InvalidAxis { bins: 0, .. })
        ));
        assert!(Axis::new(10, 1.0, 1.0).is_err());
        assert!(Axis::new(10, 2.0, 1.0).is_err());
        assert!(Axis::new(10, f64::NEG_INFINITY, 1.0).is_err());
        assert!(Axis::new(10, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_axis_geometry() {
        let axis = Axis::new(4, -1.0, 1.0).unwrap();
        assert_relative_eq!(axis.width(), 0.5);
        assert_relative_eq!(axis.center(0), -0.75);
        assert_eq!(axis.index(0.0), Some(2));
        assert_eq!(axis.index(1.0), None);
    }

    #[test]
    fn test_hist1d_flows_and_entries() {
        let mut h = Hist1D::new("test", Axis::new(10, 0.0, 10.0).unwrap());
        h.fill(0.0);
        h.fill(9.99);
        h.fill(-0.1);
        h.fill(10.0);
        h.fill(f64::NAN);
        h.fill_weighted(4.5, 2.0);
        assert_eq!(h.entries, 6);
        assert_relative_eq!(h.bin_content(0), 1.0);
        assert_relative_eq!(h.bin_content(9), 1.0);
        assert_relative_eq!(h.bin_content(4), 2.0);
        assert_relative_eq!(h.sumw2[4], 4.0);
        assert_relative_eq!(h.underflow, 1.0);
        assert_relative_eq!(h.overflow, 2.0);
        assert_relative_eq!(h.integral(), 4.0);
    }

    #[test]
    fn test_hist1d_mean() {
        let mut h = Hist1D::new("mean", Axis::new(10, 0.0, 10.0).unwrap());
        h.fill(1.2);
        h.fill(3.7);
        assert_relative_eq!(h.mean(), 2.5);
        assert!(Hist1D::new("empty", Axis::new(1, 0.0, 1.0).unwrap())
            .mean()
            .is_nan());
    }

    #[test]
    fn test_hist2d_fill() {
        let mut h = Hist2D::new(
            "test",
            Axis::new(2, 0.0, 2.0).unwrap(),
            Axis::new(3, 0.0, 3.0).unwrap(),
        );
        h.fill(1.5, 0.5);
        h.fill(1.5, 0.7);
        h.fill(0.5, 2.5);
        h.fill(2.5, 0.5);
        h.fill(0.5, f64::NAN);
        assert_eq!(h.entries, 5);
        assert_relative_eq!(h.bin_content(1, 0), 2.0);
        assert_relative_eq!(h.bin_content(0, 2), 1.0);
        assert_relative_eq!(h.bin_content(5, 5), 0.0);
        assert_relative_eq!(h.out_of_range, 2.0);
        assert_relative_eq!(h.integral(), 3.0);
    }

    #[test]
    fn test_registry_add_and_fill() {
        let mut registry = HistogramRegistry::new();
        let axis = Axis::new(10, 0.0, 10.0).unwrap();
        let pt = registry.add("pt", HistSpec::h1("p_T", axis)).unwrap();
        let reso = registry
            .add("reso", HistSpec::h2("reso", axis, axis))
            .unwrap();
        assert_eq!(pt.to_string(), "pt(id=0)");
        registry.fill(&pt, 1.5).unwrap();
        registry.fill_2d(&reso, 1.5, 2.5).unwrap();
        registry.fill(&pt, 2.5).unwrap();
        assert_eq!(registry.get_1d("pt").unwrap().entries, 2);
        assert_eq!(registry.get_2d("reso").unwrap().entries, 1);
        assert_eq!(
            registry.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["pt", "reso"]
        );
    }

    #[test]
    fn test_registry_errors() {
        let mut registry = HistogramRegistry::new();
        let axis = Axis::new(10, 0.0, 10.0).unwrap();
        let pt = registry.add("pt", HistSpec::h1("p_T", axis)).unwrap();
        assert!(matches!(
            registry.add("pt", HistSpec::h1("again", axis)),
            Err(AodError::RegistrationError { .. })
        ));
        assert!(matches!(
            registry.fill_2d(&pt, 1.0, 1.0),
            Err(AodError::HistogramKindMismatch { expected: "2D", .. })
        ));
        assert!(matches!(
            registry.get_1d("eta"),
            Err(AodError::HistogramNotFound { .. })
        ));
        assert!(matches!(
            registry.get_2d("pt"),
            Err(AodError::HistogramKindMismatch { .. })
        ));
        let mut other = HistogramRegistry::new();
        assert!(matches!(
            other.fill(&pt, 1.0),
            Err(AodError::HistogramNotFound { .. })
        ));
    }

    #[test]
    fn test_entries_count_only_selected_fills() {
        let frame = test_frame();
        let mut registry = HistogramRegistry::new();
        let id = registry
            .add("pt", HistSpec::h1("p_T", Axis::new(100, 0.0, 10.0).unwrap()))
            .unwrap();
        let selection = TrackVar::Eta.abs().lt(0.8) & TrackVar::Pt.gt(2.0);
        let passing = frame.tracks.filter(&selection);
        let n_passing = passing.len();
        let n_failing = frame.tracks.len() - n_passing;
        assert!(n_passing > 0 && n_failing > 0);
        for track in passing.iter() {
            registry.fill(&id, track.pt as f64).unwrap();
        }
        assert_eq!(registry.get_1d("pt").unwrap().entries, n_passing as u64);
    }

    #[test]
    fn test_registry_json() {
        let mut registry = HistogramRegistry::new();
        let id = registry
            .add("z", HistSpec::h1("z", Axis::new(2, -1.0, 1.0).unwrap()))
            .unwrap();
        registry.fill(&id, 0.5).unwrap();
        let json = serde_json::to_string(&registry).unwrap();
        assert!(json.contains("\"kind\":\"H1\""));
        let back: HistogramRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, registry);
    }
}
