use std::f64::consts::PI;

/// Below this magnitude the cross product of two unit vectors is treated as zero.
const COLLINEAR_TOLERANCE: f64 = 1e-8;

/// The azimuthal difference $`\varphi_2 - \varphi_1`$ folded into $`[-\pi/2, 3\pi/2)`$, the
/// conventional range for two-particle correlation functions.
///
/// The angle is obtained from the scalar and vector products of the two unit vectors in the
/// transverse plane rather than by subtracting the inputs, so it does not depend on how either
/// angle was wrapped. Inputs whose vector product is within `1e-8` of zero give exactly `0.0`,
/// anti-parallel ones included.
///
/// ```
/// use aodkit_core::delta_phi;
/// use std::f64::consts::PI;
///
/// assert!((delta_phi(0.1, 0.4) - 0.3).abs() < 1e-12);
/// assert!((delta_phi(0.4, 0.1) - (-0.3)).abs() < 1e-12);
/// assert!((delta_phi(0.0, 1.5 * PI - 0.1) - (1.5 * PI - 0.1)).abs() < 1e-9);
/// ```
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let (y1, x1) = phi1.sin_cos();
    let (y2, x2) = phi2.sin_cos();
    let inner = (x1 * x2 + y1 * y2).clamp(-1.0, 1.0);
    let cross = x1 * y2 - x2 * y1;

    let mut dphi = if cross > COLLINEAR_TOLERANCE {
        inner.acos()
    } else if cross < -COLLINEAR_TOLERANCE {
        -inner.acos()
    } else {
        0.0
    };
    if dphi < -PI / 2.0 {
        dphi += 2.0 * PI;
    }
    dphi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const TWO_PI: f64 = 2.0 * PI;

    #[test]
    fn test_delta_phi_simple() {
        assert_relative_eq!(delta_phi(0.5, 1.5), 1.0, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(1.5, 0.5), -1.0, epsilon = 1e-12);
        assert_eq!(delta_phi(2.0, 2.0), 0.0);
    }

    #[test]
    fn test_delta_phi_wraps_across_zero() {
        // 6.2 rad is just below 2 pi, so the associate sits 0.1 + (2 pi - 6.2) behind
        let expected = -(0.1 + (TWO_PI - 6.2));
        assert_relative_eq!(delta_phi(0.1, 6.2), expected, epsilon = 1e-9);
        assert_relative_eq!(delta_phi(6.2, 0.1), -expected, epsilon = 1e-9);
    }

    #[test]
    fn test_delta_phi_folds_below_minus_half_pi() {
        // a raw difference of -3 pi / 4 is folded up to 5 pi / 4
        assert_relative_eq!(delta_phi(0.75 * PI, 0.0), 1.25 * PI, epsilon = 1e-9);
    }

    #[test]
    fn test_delta_phi_back_to_back() {
        // exactly back-to-back pairs fall in the collinear band
        assert_eq!(delta_phi(0.0, PI), 0.0);
        assert_eq!(delta_phi(PI, 0.0), 0.0);
        assert_eq!(delta_phi(1.0, 1.0 + PI), 0.0);
        // just outside the band the usual value is recovered
        assert_relative_eq!(delta_phi(0.0, PI - 1e-3), PI - 1e-3, epsilon = 1e-9);
        assert_relative_eq!(delta_phi(0.0, PI + 1e-3), PI + 1e-3, epsilon = 1e-9);
    }

    #[test]
    fn test_delta_phi_ignores_input_wrapping() {
        assert_relative_eq!(delta_phi(0.2, 1.0), delta_phi(0.2 + TWO_PI, 1.0 - TWO_PI), epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn prop_delta_phi_in_range(phi1 in 0.0..TWO_PI, phi2 in 0.0..TWO_PI) {
            let dphi = delta_phi(phi1, phi2);
            prop_assert!(dphi >= -PI / 2.0);
            prop_assert!(dphi < 1.5 * PI);
        }

        #[test]
        fn prop_delta_phi_self_is_zero(phi in 0.0..TWO_PI) {
            prop_assert_eq!(delta_phi(phi, phi), 0.0);
        }

        #[test]
        fn prop_delta_phi_antisymmetric_mod_two_pi(phi1 in 0.0..TWO_PI, phi2 in 0.0..TWO_PI) {
            let sum = delta_phi(phi1, phi2) + delta_phi(phi2, phi1);
            let wrapped = sum.rem_euclid(TWO_PI);
            prop_assert!(wrapped < 1e-6 || (TWO_PI - wrapped) < 1e-6, "sum = {}", sum);
        }
    }
}
