/// Azimuthal-angle helpers for correlation analyses.
pub mod angles;
/// Useful enumerations for run periods, particle species, and decay channels.
pub mod enums;
/// Plain three- and four-vectors for momentum kinematics.
pub mod vectors;

/// PDG Monte-Carlo particle codes used by the tutorial tasks.
pub mod pdg {
    /// $`K^0_S`$
    pub const K0_SHORT: i32 = 310;
    /// $`\Lambda`$
    pub const LAMBDA: i32 = 3122;
    /// $`\bar{\Lambda}`$
    pub const ANTI_LAMBDA: i32 = -3122;
}

/// A helper method to obtain the index of a bin where a value should go in a histogram with evenly
/// spaced `bins` over a given `range`. Values outside `[limits.0, limits.1)` (and NaN) have no bin.
pub fn get_bin_index(value: f64, bins: usize, limits: (f64, f64)) -> Option<usize> {
    if value >= limits.0 && value < limits.1 {
        let bin_width = (limits.1 - limits.0) / bins as f64;
        let bin_index = ((value - limits.0) / bin_width).floor() as usize;
        Some(bin_index.min(bins - 1))
    } else {
        None
    }
}
