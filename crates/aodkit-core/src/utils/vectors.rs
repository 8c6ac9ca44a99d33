use std::fmt::Display;

use auto_ops::{impl_op_ex, impl_op_ex_commutative};
use serde::{Deserialize, Serialize};

/// A three-momentum (or position) with Cartesian components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// The $`x`$ component.
    pub x: f64,
    /// The $`y`$ component.
    pub y: f64,
    /// The $`z`$ component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new [`Vec3`] from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a momentum from transverse momentum, pseudorapidity, and azimuth.
    pub fn from_pt_eta_phi(pt: f64, eta: f64, phi: f64) -> Self {
        let (sin_phi, cos_phi) = phi.sin_cos();
        Self::new(pt * cos_phi, pt * sin_phi, pt * eta.sinh())
    }

    pub fn px(&self) -> f64 {
        self.x
    }
    pub fn py(&self) -> f64 {
        self.y
    }
    pub fn pz(&self) -> f64 {
        self.z
    }

    /// Attach a mass hypothesis, producing an on-shell four-momentum.
    pub fn with_mass(&self, mass: f64) -> Vec4 {
        let e = (mass.powi(2) + self.mag2()).sqrt();
        Vec4::new(self.x, self.y, self.z, e)
    }

    /// Attach an explicit energy.
    pub fn with_energy(&self, energy: f64) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, energy)
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn mag2(&self) -> f64 {
        self.dot(self)
    }

    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }

    /// The magnitude of the transverse ($`xy`$) projection.
    pub fn pt(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn costheta(&self) -> f64 {
        self.z / self.mag()
    }

    pub fn theta(&self) -> f64 {
        self.costheta().acos()
    }

    /// Azimuth in $`(-\pi, \pi]`$.
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Pseudorapidity $`\eta = \sinh^{-1}(p_z / p_T)`$.
    pub fn eta(&self) -> f64 {
        (self.z / self.pt()).asinh()
    }

    pub fn unit(&self) -> Self {
        let mag = self.mag();
        Self::new(self.x / mag, self.y / mag, self.z / mag)
    }

    /// Cosine of the opening angle between two vectors.
    pub fn cos_angle(&self, other: &Self) -> f64 {
        self.dot(other) / (self.mag() * other.mag())
    }
}

impl_op_ex!(+ |a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z) });
impl_op_ex!(-|a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z) });
impl_op_ex!(-|a: &Vec3| -> Vec3 { Vec3::new(-a.x, -a.y, -a.z) });
impl_op_ex_commutative!(*|a: &Vec3, b: &f64| -> Vec3 { Vec3::new(a.x * b, a.y * b, a.z * b) });
impl_op_ex!(/ |a: &Vec3, b: &f64| -> Vec3 { Vec3::new(a.x / b, a.y / b, a.z / b) });

impl Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:6.3}, {:6.3}, {:6.3}]", self.x, self.y, self.z)
    }
}

/// A four-momentum $`(p_x, p_y, p_z, E)`$.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec4 {
    /// The $`p_x`$ component.
    pub x: f64,
    /// The $`p_y`$ component.
    pub y: f64,
    /// The $`p_z`$ component.
    pub z: f64,
    /// The energy component.
    pub t: f64,
}

impl Vec4 {
    /// Create a new [`Vec4`] from its components.
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self {
            x: px,
            y: py,
            z: pz,
            t: e,
        }
    }

    pub fn px(&self) -> f64 {
        self.x
    }
    pub fn py(&self) -> f64 {
        self.y
    }
    pub fn pz(&self) -> f64 {
        self.z
    }
    pub fn e(&self) -> f64 {
        self.t
    }

    /// The spatial part of the four-momentum.
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// The invariant mass squared, $`E^2 - |\vec{p}|^2`$.
    pub fn m2(&self) -> f64 {
        self.t.powi(2) - self.vec3().mag2()
    }

    /// The invariant mass. A space-like vector returns $`-\sqrt{-m^2}`$ so that rounding noise
    /// around zero does not produce NaN.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        self.vec3().pt()
    }

    /// The velocity $`\vec{\beta} = \vec{p}/E`$.
    pub fn beta(&self) -> Vec3 {
        self.vec3() / self.t
    }

    pub fn to_p4_string(&self) -> String {
        format!(
            "[e = {:.5}; p = ({:.5}, {:.5}, {:.5}); m = {:.5}]",
            self.t,
            self.x,
            self.y,
            self.z,
            self.m()
        )
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x + b.x, a.y + b.y, a.z + b.z, a.t + b.t) });
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x - b.x, a.y - b.y, a.z - b.z, a.t - b.t) });

impl std::iter::Sum<Vec4> for Vec4 {
    fn sum<I: Iterator<Item = Vec4>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |acc, p4| acc + p4)
    }
}

impl Display for Vec4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_p4_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_three_momentum_basics() {
        let p = Vec3::new(3.0, 4.0, 5.0);
        let q = Vec3::new(1.2, -3.4, 7.6);
        assert_relative_eq!(p.mag(), 50.0_f64.sqrt());
        assert_relative_eq!(p.mag2(), 50.0);
        assert_relative_eq!(p.pt(), 5.0);
        assert_relative_eq!(p.costheta(), 5.0 / 50.0_f64.sqrt());
        assert_relative_eq!(p.phi(), 4.0_f64.atan2(3.0));
        let cross = p.cross(&q);
        assert_relative_eq!(cross.x, 47.4);
        assert_relative_eq!(cross.y, -16.8);
        assert_relative_eq!(cross.z, -15.0);
        assert_relative_eq!(p.unit().mag(), 1.0);
    }

    #[test]
    fn test_from_pt_eta_phi() {
        let p = Vec3::from_pt_eta_phi(2.0, 0.5, PI / 3.0);
        assert_relative_eq!(p.pt(), 2.0);
        assert_relative_eq!(p.eta(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.phi(), PI / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_four_momentum_basics() {
        let p = Vec4::new(3.0, 4.0, 5.0, 10.0);
        assert_relative_eq!(p.m2(), 50.0);
        assert_relative_eq!(p.m(), 50.0_f64.sqrt());
        assert_relative_eq!(p.beta().x, 0.3);
        assert_relative_eq!(p.beta().y, 0.4);
        assert_relative_eq!(p.beta().z, 0.5);
    }

    #[test]
    fn test_with_mass_and_sum() {
        let a = Vec3::new(0.5, 0.0, 0.0).with_mass(0.13957039);
        let b = Vec3::new(-0.5, 0.0, 0.0).with_mass(0.13957039);
        let total: Vec4 = [a, b].into_iter().sum();
        assert_relative_eq!(total.pt(), 0.0);
        assert_relative_eq!(total.m(), a.e() + b.e());
    }

    #[test]
    fn test_spacelike_mass_is_negative() {
        let p = Vec4::new(1.0, 0.0, 0.0, 0.5);
        assert!(p.m() < 0.0);
    }
}
