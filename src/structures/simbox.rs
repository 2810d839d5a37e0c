// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of the SimBox structure and the minimum-image convention.

use crate::{errors::SimBoxError, structures::vector3d::Vector3D};
use float_cmp::approx_eq;
use nalgebra::Matrix3;

/// Structure defining the shape and dimensions of a periodic simulation cell.
///
/// Box vectors follow the Gromacs convention: `a` lies along the x-axis,
/// `b` lies in the xy-plane and `c` has a positive z-component.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBox {
    /// Edge lengths `a`, `b`, `c`.
    lengths: Vector3D,
    /// Angles `alpha`, `beta`, `gamma` in degrees.
    angles: Vector3D,
    /// Half of each edge length.
    half: Vector3D,
    /// Box vectors stored as columns.
    vectors: Matrix3<f64>,
    /// Half of the diagonal elements of the box matrix (used for triclinic folding).
    diag_half: Vector3D,
    orthogonal: bool,
}

impl Default for SimBox {
    /// Create a zero-sized orthogonal box. Folding in such box is an identity.
    fn default() -> Self {
        SimBox::orthogonal(Vector3D::default())
    }
}

/// Fold a single component of a displacement into `[-half, half]`.
/// Returns the folded component and the (integral) number of `length`s subtracted from it.
///
/// Runs in constant time for any finite `d`. Non-finite components and zero lengths are left unchanged.
#[inline(always)]
fn fold_count(d: f64, length: f64, half: f64) -> (f64, f64) {
    if length == 0.0 || !d.is_finite() {
        return (d, 0.0);
    }

    // `%` is exact for floats
    let r = d % length;
    let whole = ((d - r) / length).round();

    if r > half {
        (r - length, whole + 1.0)
    } else if r < -half {
        (r + length, whole - 1.0)
    } else {
        (r, whole)
    }
}

#[inline(always)]
fn fold(d: f64, length: f64, half: f64) -> f64 {
    fold_count(d, length, half).0
}

impl SimBox {
    /// Create a new orthogonal simulation box from its edge lengths.
    pub fn orthogonal(lengths: Vector3D) -> Self {
        SimBox {
            lengths,
            angles: Vector3D::new(90.0, 90.0, 90.0),
            half: lengths / 2.0,
            vectors: Matrix3::from_diagonal(&lengths.0),
            diag_half: lengths / 2.0,
            orthogonal: true,
        }
    }

    /// Create new simulation box from lengths and angles (in degrees).
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let simbox = SimBox::from_lengths_angles([5.0, 4.0, 3.0].into(), [80.0, 70.0, 120.0].into()).unwrap();
    /// let vectors = simbox.vectors();
    ///
    /// assert_approx_eq!(f64, vectors[(0, 0)],  5.000000, epsilon = 0.0001);
    /// assert_approx_eq!(f64, vectors[(0, 1)], -2.000000, epsilon = 0.0001);
    /// assert_approx_eq!(f64, vectors[(1, 1)],  3.464102, epsilon = 0.0001);
    /// assert_approx_eq!(f64, vectors[(0, 2)],  1.026060, epsilon = 0.0001);
    /// assert_approx_eq!(f64, vectors[(1, 2)],  1.193930, epsilon = 0.0001);
    /// assert_approx_eq!(f64, vectors[(2, 2)],  2.553768, epsilon = 0.0001);
    /// ```
    ///
    /// ## Notes
    /// - Adapted from Tsjerk Wassenaar's `triclinic` function:
    /// <https://www.mail-archive.com/gmx-users@gromacs.org/msg28032.html>
    pub fn from_lengths_angles(lengths: Vector3D, angles: Vector3D) -> Result<Self, SimBoxError> {
        if lengths.x < 0.0 || lengths.y < 0.0 || lengths.z < 0.0 {
            return Err(SimBoxError::NegativeLength(format!(
                "{} {} {}",
                lengths.x, lengths.y, lengths.z
            )));
        }

        let is_right = |angle: f64| approx_eq!(f64, angle, 90.0, epsilon = 1e-6);
        if is_right(angles.x) && is_right(angles.y) && is_right(angles.z) {
            return Ok(SimBox::orthogonal(lengths));
        }

        let invalid = || SimBoxError::InvalidAngles(format!("{} {} {}", angles.x, angles.y, angles.z));

        if [angles.x, angles.y, angles.z]
            .iter()
            .any(|&angle| angle <= 0.0 || angle >= 180.0)
        {
            return Err(invalid());
        }

        let alpha = angles.x.to_radians();
        let beta = angles.y.to_radians();
        let gamma = angles.z.to_radians();

        let v2x = lengths.y * gamma.cos();
        let v2y = lengths.y * gamma.sin();

        let v3x = lengths.z * beta.cos();
        let v3y = lengths.z * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let v3z_squared = lengths.z * lengths.z - v3x * v3x - v3y * v3y;

        if v3z_squared < 0.0 {
            return Err(invalid());
        }
        let v3z = v3z_squared.sqrt();

        #[rustfmt::skip]
        let vectors = Matrix3::new(
            lengths.x, v2x, v3x,
            0.0,       v2y, v3y,
            0.0,       0.0, v3z,
        );

        Ok(SimBox {
            lengths,
            angles,
            half: lengths / 2.0,
            vectors,
            diag_half: Vector3D::new(lengths.x / 2.0, v2y / 2.0, v3z / 2.0),
            orthogonal: false,
        })
    }

    /// Fold a displacement into the primary cell using the minimum-image convention.
    ///
    /// For orthogonal boxes, each component is shifted by the box length
    /// until its magnitude is at most half of the box length.
    /// For triclinic boxes, the displacement is shifted along `c`, `b` and `a` (in this order).
    /// Axes with zero length are left untouched.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let simbox = SimBox::orthogonal([10.0, 10.0, 10.0].into());
    /// let (dx, dy, dz) = simbox.image(5.5, -12.0, 3.0);
    ///
    /// assert_approx_eq!(f64, dx, -4.5);
    /// assert_approx_eq!(f64, dy, -2.0);
    /// assert_approx_eq!(f64, dz, 3.0);
    /// ```
    #[inline]
    pub fn image(&self, dx: f64, dy: f64, dz: f64) -> (f64, f64, f64) {
        if self.orthogonal {
            (
                fold(dx, self.lengths.x, self.half.x),
                fold(dy, self.lengths.y, self.half.y),
                fold(dz, self.lengths.z, self.half.z),
            )
        } else {
            self.image_triclinic(dx, dy, dz)
        }
    }

    /// Fold a displacement vector into the primary cell using the minimum-image convention.
    #[inline]
    pub fn image_vector(&self, vector: Vector3D) -> Vector3D {
        let (x, y, z) = self.image(vector.x, vector.y, vector.z);
        Vector3D::new(x, y, z)
    }

    fn image_triclinic(&self, mut dx: f64, mut dy: f64, mut dz: f64) -> (f64, f64, f64) {
        if !(dx.is_finite() && dy.is_finite() && dz.is_finite()) {
            return (dx, dy, dz);
        }

        let v = &self.vectors;

        let (z, shift) = fold_count(dz, v[(2, 2)], self.diag_half.z);
        if shift != 0.0 {
            dx -= shift * v[(0, 2)];
            dy -= shift * v[(1, 2)];
            dz = z;
        }

        let (y, shift) = fold_count(dy, v[(1, 1)], self.diag_half.y);
        if shift != 0.0 {
            dx -= shift * v[(0, 1)];
            dy = y;
        }

        (fold(dx, v[(0, 0)], self.diag_half.x), dy, dz)
    }

    /// Get edge lengths of the box.
    #[inline(always)]
    pub fn lengths(&self) -> Vector3D {
        self.lengths
    }

    /// Get box angles (in degrees).
    #[inline(always)]
    pub fn angles(&self) -> Vector3D {
        self.angles
    }

    /// Get half of each edge length.
    #[inline(always)]
    pub fn half_lengths(&self) -> Vector3D {
        self.half
    }

    /// Get box vectors as columns of a matrix.
    #[inline(always)]
    pub fn vectors(&self) -> &Matrix3<f64> {
        &self.vectors
    }

    /// Check that the simulation box is orthogonal.
    #[inline(always)]
    pub fn is_orthogonal(&self) -> bool {
        self.orthogonal
    }

    /// Check whether all dimensions of the simulation box are zero.
    pub fn is_zero(&self) -> bool {
        self.lengths.is_zero()
    }

    /// Calculate the volume of the box.
    pub fn volume(&self) -> f64 {
        self.vectors[(0, 0)] * self.vectors[(1, 1)] * self.vectors[(2, 2)]
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    macro_rules! image_orthogonal {
        ($name:ident, $length:expr, $input:expr, $expected:expr) => {
            paste::paste! {
                #[test]
                fn [<image_orthogonal_ $name>]() {
                    let simbox = SimBox::orthogonal([$length, $length, $length].into());
                    let (x, y, z) = simbox.image($input, $input, $input);
                    assert_approx_eq!(f64, x, $expected, epsilon = 1e-10);
                    assert_approx_eq!(f64, y, $expected, epsilon = 1e-10);
                    assert_approx_eq!(f64, z, $expected, epsilon = 1e-10);
                }
            }
        };
    }

    image_orthogonal!(inside, 10.0, 3.0, 3.0);
    image_orthogonal!(inside_negative, 10.0, -3.0, -3.0);
    image_orthogonal!(exactly_half, 10.0, 5.0, 5.0);
    image_orthogonal!(exactly_minus_half, 10.0, -5.0, -5.0);
    image_orthogonal!(half_plus_epsilon, 10.0, 5.001, -4.999);
    image_orthogonal!(minus_half_minus_epsilon, 10.0, -5.001, 4.999);
    image_orthogonal!(several_lengths, 10.0, 37.0, -3.0);
    image_orthogonal!(several_lengths_negative, 10.0, -37.0, 3.0);
    image_orthogonal!(zero_box, 0.0, 37.0, 37.0);
    image_orthogonal!(huge, 10.0, 1.0e17 + 48.0, -2.0);
    image_orthogonal!(huge_negative, 10.0, -4.0e17 - 64.0, -4.0);

    #[test]
    fn image_large_displacement() {
        let simbox = SimBox::orthogonal([10.0, 7.0, 3.3].into());

        for &d in &[1.0e17, -3.7e18, 9.1e25, f64::MAX, f64::MIN] {
            let (x, y, z) = simbox.image(d, d, d);
            assert!(x.abs() <= 5.0, "{} folded to {}", d, x);
            assert!(y.abs() <= 3.5, "{} folded to {}", d, y);
            assert!(z.abs() <= 1.65, "{} folded to {}", d, z);
        }
    }

    #[test]
    fn image_idempotent() {
        let simbox = SimBox::orthogonal([4.0, 7.5, 12.0].into());

        for &(dx, dy, dz) in &[
            (2.1, -3.9, 6.2),
            (-19.3, 11.1, -0.5),
            (4.0, 7.5, 12.0),
            (0.0, -7.5, 100.0),
        ] {
            let once = simbox.image(dx, dy, dz);
            let twice = simbox.image(once.0, once.1, once.2);
            assert_eq!(once, twice);

            assert!(once.0.abs() <= 2.0);
            assert!(once.1.abs() <= 3.75);
            assert!(once.2.abs() <= 6.0);
        }
    }

    #[test]
    fn image_non_finite() {
        let simbox = SimBox::orthogonal([4.0, 4.0, 4.0].into());
        let (x, y, z) = simbox.image(f64::INFINITY, f64::NEG_INFINITY, 1.0);
        assert!(x.is_infinite());
        assert!(y.is_infinite());
        assert_approx_eq!(f64, z, 1.0);

        let (x, _, _) = simbox.image(f64::NAN, 0.0, 0.0);
        assert!(x.is_nan());
    }

    #[test]
    fn half_lengths() {
        let simbox = SimBox::from_lengths_angles([5.0, 4.0, 3.0].into(), [90.0, 90.0, 90.0].into())
            .unwrap();
        assert!(simbox.is_orthogonal());
        assert_eq!(simbox.half_lengths(), Vector3D::new(2.5, 2.0, 1.5));
        assert_approx_eq!(f64, simbox.volume(), 60.0);
    }

    #[test]
    fn triclinic_construction() {
        let simbox =
            SimBox::from_lengths_angles([5.0, 4.0, 3.0].into(), [80.0, 70.0, 120.0].into())
                .unwrap();
        assert!(!simbox.is_orthogonal());
        assert_eq!(simbox.half_lengths(), Vector3D::new(2.5, 2.0, 1.5));

        let v = simbox.vectors();
        assert_approx_eq!(f64, v[(0, 0)], 5.0, epsilon = 1e-5);
        assert_approx_eq!(f64, v[(1, 0)], 0.0, epsilon = 1e-5);
        assert_approx_eq!(f64, v[(2, 0)], 0.0, epsilon = 1e-5);
        assert_approx_eq!(f64, v[(0, 1)], -2.0, epsilon = 1e-5);
        assert_approx_eq!(f64, v[(1, 1)], 3.464102, epsilon = 1e-5);
        assert_approx_eq!(f64, v[(2, 1)], 0.0, epsilon = 1e-5);
        assert_approx_eq!(f64, v[(0, 2)], 1.026060, epsilon = 1e-5);
        assert_approx_eq!(f64, v[(1, 2)], 1.193930, epsilon = 1e-5);
        assert_approx_eq!(f64, v[(2, 2)], 2.553768, epsilon = 1e-5);
    }

    #[test]
    fn triclinic_invalid() {
        assert!(matches!(
            SimBox::from_lengths_angles([5.0, 4.0, 3.0].into(), [10.0, 10.0, 150.0].into()),
            Err(SimBoxError::InvalidAngles(_))
        ));

        assert!(matches!(
            SimBox::from_lengths_angles([5.0, 4.0, 3.0].into(), [0.0, 90.0, 90.0].into()),
            Err(SimBoxError::InvalidAngles(_))
        ));

        assert!(matches!(
            SimBox::from_lengths_angles([5.0, -4.0, 3.0].into(), [90.0, 90.0, 90.0].into()),
            Err(SimBoxError::NegativeLength(_))
        ));
    }

    #[test]
    fn triclinic_image() {
        let simbox =
            SimBox::from_lengths_angles([5.0, 4.0, 3.0].into(), [80.0, 70.0, 120.0].into())
                .unwrap();
        let v = *simbox.vectors();

        for &(dx, dy, dz) in &[(7.3, -4.1, 2.9), (-0.4, 0.2, 0.1), (-11.0, 9.0, -6.5)] {
            let (x, y, z) = simbox.image(dx, dy, dz);

            // folded displacement must differ from the original by a lattice vector
            let shift = nalgebra::Vector3::new(dx - x, dy - y, dz - z);
            let coefficients = v.try_inverse().unwrap() * shift;
            for c in coefficients.iter() {
                assert_approx_eq!(f64, *c, c.round(), epsilon = 1e-8);
            }

            assert!(z.abs() <= v[(2, 2)] / 2.0 + 1e-12);
            assert!(y.abs() <= v[(1, 1)] / 2.0 + 1e-12);
            assert!(x.abs() <= v[(0, 0)] / 2.0 + 1e-12);

            let again = simbox.image(x, y, z);
            assert_approx_eq!(f64, again.0, x, epsilon = 1e-12);
            assert_approx_eq!(f64, again.1, y, epsilon = 1e-12);
            assert_approx_eq!(f64, again.2, z, epsilon = 1e-12);
        }
    }

    #[test]
    fn triclinic_image_large_displacement() {
        let simbox =
            SimBox::from_lengths_angles([5.0, 4.0, 3.0].into(), [80.0, 70.0, 120.0].into())
                .unwrap();
        let v = *simbox.vectors();

        for &(dx, dy, dz) in &[(1.0e17, -2.0e16, 3.0e17), (-7.0e20, 5.5e19, -1.0e18)] {
            let (x, y, z) = simbox.image(dx, dy, dz);
            assert!(z.abs() <= v[(2, 2)] / 2.0 + 1e-12);
            assert!(y.abs() <= v[(1, 1)] / 2.0 + 1e-12);
            assert!(x.abs() <= v[(0, 0)] / 2.0 + 1e-12);
        }
    }
}
