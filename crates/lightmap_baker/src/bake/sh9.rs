//! Order-3 (9 coefficient) spherical harmonics, RGB
//!
//! The baker never computes SH from a radiance field itself; it stores the
//! coefficients produced by the irradiance sampler, accumulates bounces, and
//! evaluates the result for a surface normal during flush.

use std::f32::consts::PI;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Number of coefficients in an order-3 SH set
pub const SH9_COEFFICIENTS: usize = 9;

/// Cosine lobe convolution weights per band
pub const COSINE_A0: f32 = PI;
/// Band 1 cosine weight
pub const COSINE_A1: f32 = (2.0 * PI) / 3.0;
/// Band 2 cosine weight
pub const COSINE_A2: f32 = PI / 4.0;

const BASIS_L0: f32 = 0.282_095;
const BASIS_L1: f32 = 0.488_603;
const BASIS_L2_XY: f32 = 1.092_548;
const BASIS_L2_ZZ: f32 = 0.315_392;
const BASIS_L2_XX_YY: f32 = 0.546_274;

/// Nine RGB spherical-harmonic coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sh9 {
    /// Coefficients in band order: L0, L1 (y, z, x), L2 (xy, yz, 3z²-1, xz, x²-y²)
    pub coefficients: [Vec3; SH9_COEFFICIENTS],
}

impl Default for Sh9 {
    fn default() -> Self {
        Self::zero()
    }
}

impl Sh9 {
    /// All-zero coefficient set
    pub fn zero() -> Self {
        Self {
            coefficients: [Vec3::zeros(); SH9_COEFFICIENTS],
        }
    }

    /// Project a colored direction onto the basis, replacing the current set
    pub fn project_onto(n: &Vec3, color: &Vec3, a0: f32, a1: f32, a2: f32) -> Self {
        let mut sh = Self::zero();
        sh.project_add(n, color, a0, a1, a2);
        sh
    }

    /// Project a colored direction onto the basis and add it to this set
    pub fn project_add(&mut self, n: &Vec3, color: &Vec3, a0: f32, a1: f32, a2: f32) {
        let c = &mut self.coefficients;

        c[0] += color * (BASIS_L0 * a0);

        c[1] += color * (BASIS_L1 * n.y * a1);
        c[2] += color * (BASIS_L1 * n.z * a1);
        c[3] += color * (BASIS_L1 * n.x * a1);

        c[4] += color * (BASIS_L2_XY * n.x * n.y * a2);
        c[5] += color * (BASIS_L2_XY * n.y * n.z * a2);
        c[6] += color * (BASIS_L2_ZZ * (3.0 * n.z * n.z - 1.0) * a2);
        c[7] += color * (BASIS_L2_XY * n.x * n.z * a2);
        c[8] += color * (BASIS_L2_XX_YY * (n.x * n.x - n.y * n.y) * a2);
    }

    /// Sum of the component-wise products of two sets
    pub fn dot(&self, other: &Self) -> Vec3 {
        self.coefficients
            .iter()
            .zip(other.coefficients.iter())
            .fold(Vec3::zeros(), |acc, (a, b)| acc + a.component_mul(b))
    }

    /// Radiance in direction `n` (no convolution)
    pub fn evaluate(&self, n: &Vec3) -> Vec3 {
        let basis = Self::project_onto(n, &Vec3::new(1.0, 1.0, 1.0), 1.0, 1.0, 1.0);
        basis.dot(self)
    }

    /// Irradiance for a surface facing `n` (cosine lobe convolution)
    pub fn irradiance(&self, n: &Vec3) -> Vec3 {
        let basis = Self::project_onto(
            n,
            &Vec3::new(1.0, 1.0, 1.0),
            COSINE_A0,
            COSINE_A1,
            COSINE_A2,
        );
        basis.dot(self)
    }

    /// Irradiance using only bands 0 and 1, as stored in directional lightmaps
    pub fn lm_irradiance(&self, n: &Vec3) -> Vec3 {
        let c = &self.coefficients;
        c[0] * (BASIS_L0 * COSINE_A0)
            + c[1] * (BASIS_L1 * n.y * COSINE_A1)
            + c[2] * (BASIS_L1 * n.z * COSINE_A1)
            + c[3] * (BASIS_L1 * n.x * COSINE_A1)
    }

    /// Convolve the set with the cosine kernel in place
    pub fn convolve_with_cosine_kernel(&mut self) {
        for (band, coefficient) in self.coefficients.iter_mut().enumerate() {
            let weight = match band {
                0 => COSINE_A0,
                1..=3 => COSINE_A1,
                _ => COSINE_A2,
            };
            *coefficient *= weight;
        }
    }

    fn map(mut self, f: impl Fn(Vec3) -> Vec3) -> Self {
        for c in &mut self.coefficients {
            *c = f(*c);
        }
        self
    }

    fn zip_map(mut self, other: &Self, f: impl Fn(Vec3, Vec3) -> Vec3) -> Self {
        for (c, o) in self.coefficients.iter_mut().zip(other.coefficients.iter()) {
            *c = f(*c, *o);
        }
        self
    }
}

impl Neg for Sh9 {
    type Output = Self;
    fn neg(self) -> Self {
        self.map(|c| -c)
    }
}

impl Add for Sh9 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        self.zip_map(&other, |a, b| a + b)
    }
}

impl AddAssign for Sh9 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Sh9 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        self.zip_map(&other, |a, b| a - b)
    }
}

impl SubAssign for Sh9 {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Mul for Sh9 {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        self.zip_map(&other, |a, b| a.component_mul(&b))
    }
}

impl MulAssign for Sh9 {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl Mul<f32> for Sh9 {
    type Output = Self;
    fn mul(self, v: f32) -> Self {
        self.map(|c| c * v)
    }
}

impl MulAssign<f32> for Sh9 {
    fn mul_assign(&mut self, v: f32) {
        *self = *self * v;
    }
}

impl Div for Sh9 {
    type Output = Self;
    fn div(self, other: Self) -> Self {
        self.zip_map(&other, |a, b| a.component_div(&b))
    }
}

impl DivAssign for Sh9 {
    fn div_assign(&mut self, other: Self) {
        *self = *self / other;
    }
}

impl Div<f32> for Sh9 {
    type Output = Self;
    fn div(self, v: f32) -> Self {
        let inv = 1.0 / v;
        self.map(|c| c * inv)
    }
}

impl DivAssign<f32> for Sh9 {
    fn div_assign(&mut self, v: f32) {
        *self = *self / v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// SH of a uniform environment with radiance `color`
    fn uniform(color: Vec3) -> Sh9 {
        let mut sh = Sh9::zero();
        sh.coefficients[0] = color * (BASIS_L0 * 4.0 * PI);
        sh
    }

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Sh9::default(), Sh9::zero());
        assert_eq!(Sh9::zero().irradiance(&Vec3::new(0.0, 1.0, 0.0)), Vec3::zeros());
    }

    #[test]
    fn test_uniform_irradiance_is_pi_radiance() {
        // A uniform environment of radiance L yields irradiance pi * L on any surface.
        let sh = uniform(Vec3::new(1.0, 0.5, 0.25));
        for n in [Vec3::x(), Vec3::y(), -Vec3::z()] {
            let e = sh.irradiance(&n);
            assert_relative_eq!(e, Vec3::new(PI, 0.5 * PI, 0.25 * PI), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_evaluate_recovers_projected_direction() {
        let n = Vec3::new(0.0, 0.0, 1.0);
        let sh = Sh9::project_onto(&n, &Vec3::new(1.0, 1.0, 1.0), 1.0, 1.0, 1.0);
        let toward = sh.evaluate(&n);
        let away = sh.evaluate(&-n);
        assert!(toward.x > away.x);
    }

    #[test]
    fn test_lm_irradiance_ignores_band_two() {
        let mut sh = uniform(Vec3::new(1.0, 1.0, 1.0));
        let base = sh.lm_irradiance(&Vec3::y());
        sh.coefficients[6] = Vec3::new(5.0, 5.0, 5.0);
        assert_relative_eq!(sh.lm_irradiance(&Vec3::y()), base);
    }

    #[test]
    fn test_convolution_matches_kernel_evaluation() {
        let n = Vec3::new(0.3, 0.8, 0.2).normalize();
        let mut sh = Sh9::project_onto(&Vec3::new(0.1, 0.2, 0.9).normalize(), &Vec3::new(1.0, 0.7, 0.2), 1.0, 1.0, 1.0);
        let direct = sh.irradiance(&n);
        sh.convolve_with_cosine_kernel();
        assert_relative_eq!(sh.evaluate(&n), direct, epsilon = 1e-5);
    }

    #[test]
    fn test_arithmetic() {
        let a = uniform(Vec3::new(1.0, 2.0, 3.0));
        let b = uniform(Vec3::new(1.0, 1.0, 1.0));
        let mut sum = a;
        sum += b;
        assert_relative_eq!(sum.coefficients[0], a.coefficients[0] + b.coefficients[0]);
        assert_relative_eq!((sum - b).coefficients[0], a.coefficients[0]);
        assert_relative_eq!((a * 2.0 / 2.0).coefficients[0], a.coefficients[0], epsilon = 1e-6);
        assert_eq!(-(-a), a);
    }
}
