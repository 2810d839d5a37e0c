// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Quaternion-based least-squares superposition of coordinate sets.

use getset::CopyGetters;
use nalgebra::{Matrix3, Matrix4, Vector4};

use crate::errors::AlignmentError;
use crate::structures::vector3d::Vector3D;

use super::jacobi::jacobi;

/// Rotation obtained by superposing a target coordinate set onto a reference.
#[derive(Debug, Clone, Copy, CopyGetters)]
pub struct Superposition {
    /// Rotation matrix applied to the target points.
    #[getset(get_copy = "pub")]
    rotation: Matrix3<f64>,
    /// Unit quaternion corresponding to the rotation.
    #[getset(get_copy = "pub")]
    quaternion: Vector4<f64>,
    /// Largest eigenvalue of the key matrix.
    #[getset(get_copy = "pub")]
    eigenvalue: f64,
    /// Number of Jacobi sweeps performed.
    #[getset(get_copy = "pub")]
    sweeps: usize,
    /// Was the diagonalization converged?
    #[getset(get_copy = "pub")]
    converged: bool,
}

impl Superposition {
    /// Rotate a single point using the rotation of this superposition.
    #[inline(always)]
    pub fn rotate(&self, point: &Vector3D) -> Vector3D {
        Vector3D::from(self.rotation * point.0)
    }
}

/// Check that the coordinate sets can be superposed using `nfit` points.
fn check_sizes(reference: usize, target: usize, nfit: usize) -> Result<(), AlignmentError> {
    if reference != target {
        return Err(AlignmentError::InconsistentSize(reference, target));
    }

    if nfit == 0 {
        return Err(AlignmentError::EmptyFit);
    }

    if nfit > reference {
        return Err(AlignmentError::FitOutOfRange(nfit, reference));
    }

    Ok(())
}

/// Translate all points so that the centroid of the first `nfit` points lies at the origin.
///
/// Returns the removed centroid. Points are left untouched if `nfit` is zero.
/// `nfit` larger than the number of points is clamped.
pub fn center(points: &mut [Vector3D], nfit: usize) -> Vector3D {
    let nfit = nfit.min(points.len());
    if nfit == 0 {
        return Vector3D::default();
    }

    let mut centroid = Vector3D::default();
    for point in points.iter().take(nfit) {
        centroid += *point;
    }
    let centroid = centroid / nfit as f64;

    for point in points.iter_mut() {
        *point = *point - centroid;
    }

    centroid
}

/// Rotate `target` onto `reference` so that the first `nfit` pairs of points
/// have the minimal root-mean-square deviation.
///
/// Both sets must already be centered (see [`center`]).
/// The rotation is applied to every point of `target`, not only to the fitted ones.
///
/// ## Returns
/// - `Superposition` describing the applied rotation.
///   If the diagonalization did not converge, the rotation is still applied and
///   `Superposition::converged()` returns `false`.
/// - `AlignmentError` if the sets have different lengths, `nfit` is zero
///   or `nfit` is larger than the number of points.
pub fn quatfit(
    reference: &[Vector3D],
    target: &mut [Vector3D],
    nfit: usize,
) -> Result<Superposition, AlignmentError> {
    check_sizes(reference.len(), target.len(), nfit)?;

    let (mut xxyx, mut xxyy, mut xxyz) = (0.0, 0.0, 0.0);
    let (mut xyyx, mut xyyy, mut xyyz) = (0.0, 0.0, 0.0);
    let (mut xzyx, mut xzyy, mut xzyz) = (0.0, 0.0, 0.0);

    for (r, t) in reference.iter().zip(target.iter()).take(nfit) {
        xxyx += r.x * t.x;
        xxyy += r.y * t.x;
        xxyz += r.z * t.x;
        xyyx += r.x * t.y;
        xyyy += r.y * t.y;
        xyyz += r.z * t.y;
        xzyx += r.x * t.z;
        xzyy += r.y * t.z;
        xzyz += r.z * t.z;
    }

    // only the upper triangle is used by the diagonalization
    let mut key = Matrix4::<f64>::zeros();
    key[(0, 0)] = xxyx + xyyy + xzyz;
    key[(0, 1)] = xzyy - xyyz;
    key[(1, 1)] = xxyx - xyyy - xzyz;
    key[(0, 2)] = xxyz - xzyx;
    key[(1, 2)] = xxyy + xyyx;
    key[(2, 2)] = xyyy - xzyz - xxyx;
    key[(0, 3)] = xyyx - xxyy;
    key[(1, 3)] = xzyx + xxyz;
    key[(2, 3)] = xyyz + xzyy;
    key[(3, 3)] = xzyz - xxyx - xyyy;

    let result = jacobi(&key);
    let q = result.eigenvectors().column(3).into_owned();

    let rotation = Matrix3::new(
        q[0] * q[0] + q[1] * q[1] - q[2] * q[2] - q[3] * q[3],
        2.0 * (q[2] * q[1] + q[0] * q[3]),
        2.0 * (q[3] * q[1] - q[0] * q[2]),
        2.0 * (q[1] * q[2] - q[0] * q[3]),
        q[0] * q[0] - q[1] * q[1] + q[2] * q[2] - q[3] * q[3],
        2.0 * (q[3] * q[2] + q[0] * q[1]),
        2.0 * (q[1] * q[3] + q[0] * q[2]),
        2.0 * (q[2] * q[3] - q[0] * q[1]),
        q[0] * q[0] - q[1] * q[1] - q[2] * q[2] + q[3] * q[3],
    );

    let superposition = Superposition {
        rotation,
        quaternion: q,
        eigenvalue: result.eigenvalues()[3],
        sweeps: result.sweeps(),
        converged: result.converged(),
    };

    for point in target.iter_mut() {
        *point = superposition.rotate(point);
    }

    Ok(superposition)
}

/// Calculate the root-mean-square deviation between two coordinate sets
/// without any fitting.
pub fn rmsfit(reference: &[Vector3D], target: &[Vector3D]) -> Result<f64, AlignmentError> {
    check_sizes(reference.len(), target.len(), reference.len())?;

    let sum: f64 = reference
        .iter()
        .zip(target.iter())
        .map(|(r, t)| (*r - *t).len_squared())
        .sum();

    Ok((sum / reference.len() as f64).sqrt())
}

/// Calculate the root-mean-square deviation between two coordinate sets
/// using only the points with the given indices.
///
/// ## Returns
/// - `AlignmentError::EmptyFit` if no indices are provided.
/// - `AlignmentError::FitOutOfRange` if any index points outside of the sets.
pub fn rmsd_subset(
    reference: &[Vector3D],
    target: &[Vector3D],
    indices: &[usize],
) -> Result<f64, AlignmentError> {
    if reference.len() != target.len() {
        return Err(AlignmentError::InconsistentSize(reference.len(), target.len()));
    }

    if indices.is_empty() {
        return Err(AlignmentError::EmptyFit);
    }

    let mut sum = 0.0;
    for &index in indices {
        let (r, t) = match (reference.get(index), target.get(index)) {
            (Some(r), Some(t)) => (r, t),
            _ => return Err(AlignmentError::FitOutOfRange(index + 1, reference.len())),
        };
        sum += (*r - *t).len_squared();
    }

    Ok((sum / indices.len() as f64).sqrt())
}

/// Center both coordinate sets using their first `nfit` points and
/// rotate `target` onto `reference`.
///
/// ## Example
/// ```
/// # use trajan_rs::prelude::*;
/// # use trajan_rs::alignment::{superpose, rmsfit};
/// let mut reference: Vec<Vector3D> = vec![
///     [0.0, 0.0, 0.0].into(),
///     [1.0, 0.0, 0.0].into(),
///     [0.0, 2.0, 0.0].into(),
/// ];
/// // rotated by 90 degrees around z and translated
/// let mut target: Vec<Vector3D> = vec![
///     [5.0, 5.0, 5.0].into(),
///     [5.0, 6.0, 5.0].into(),
///     [3.0, 5.0, 5.0].into(),
/// ];
///
/// let fit = superpose(&mut reference, &mut target, 3).unwrap();
/// assert!(fit.converged());
/// assert!(rmsfit(&reference, &target).unwrap() < 1e-10);
/// ```
pub fn superpose(
    reference: &mut [Vector3D],
    target: &mut [Vector3D],
    nfit: usize,
) -> Result<Superposition, AlignmentError> {
    check_sizes(reference.len(), target.len(), nfit)?;

    center(target, nfit);
    center(reference, nfit);
    quatfit(reference, target, nfit)
}

/******************************/
/*         UNIT TESTS         */
/******************************/
