// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Cyclic Jacobi diagonalization of small symmetric matrices.

use getset::{CopyGetters, Getters};
use nalgebra::{Matrix4, Vector4};

/// Maximal number of sweeps over the off-diagonal elements.
pub const MAX_SWEEPS: usize = 100;

/// Result of a Jacobi diagonalization.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct JacobiResult {
    /// Eigenvalues sorted in ascending order.
    #[getset(get = "pub")]
    eigenvalues: Vector4<f64>,
    /// Eigenvectors stored as columns, in the order of `eigenvalues`.
    #[getset(get = "pub")]
    eigenvectors: Matrix4<f64>,
    /// Number of sweeps performed.
    #[getset(get_copy = "pub")]
    sweeps: usize,
    /// Number of rotations performed.
    #[getset(get_copy = "pub")]
    rotations: usize,
    /// True if all off-diagonal elements vanished before `MAX_SWEEPS` was reached.
    #[getset(get_copy = "pub")]
    converged: bool,
}

/// Apply one plane rotation to the pair of elements `(i1, j1)` and `(i2, j2)`.
#[inline(always)]
fn rotate(
    matrix: &mut Matrix4<f64>,
    first: (usize, usize),
    second: (usize, usize),
    s: f64,
    tau: f64,
) {
    let g = matrix[first];
    let h = matrix[second];
    matrix[first] = g - s * (h + g * tau);
    matrix[second] = h + s * (g - h * tau);
}

/// Diagonalize a symmetric 4x4 matrix using cyclic Jacobi rotations.
///
/// Only the diagonal and the upper triangle of `matrix` are read.
///
/// During the first three sweeps, only elements larger than `0.2 * sm / 16` are rotated
/// (`sm` being the sum of absolute values of the off-diagonal elements).
/// After the fourth sweep, elements negligible relative to both corresponding
/// diagonal elements are set to zero without rotation.
///
/// ## Example
/// ```
/// # use trajan_rs::alignment::jacobi;
/// # use nalgebra::Matrix4;
/// let matrix = Matrix4::new(
///     2.0, 1.0, 0.0, 0.0,
///     1.0, 2.0, 0.0, 0.0,
///     0.0, 0.0, 5.0, 0.0,
///     0.0, 0.0, 0.0, -1.0,
/// );
///
/// let result = jacobi(&matrix);
/// assert!(result.converged());
/// assert!((result.eigenvalues()[0] + 1.0).abs() < 1e-12);
/// assert!((result.eigenvalues()[3] - 5.0).abs() < 1e-12);
/// ```
pub fn jacobi(matrix: &Matrix4<f64>) -> JacobiResult {
    const N: usize = 4;

    let mut a = *matrix;
    let mut v = Matrix4::<f64>::identity();

    let mut b = [0.0; N];
    let mut d = [0.0; N];
    let mut z = [0.0; N];
    for ip in 0..N {
        b[ip] = a[(ip, ip)];
        d[ip] = b[ip];
    }

    let mut rotations = 0;
    let mut sweeps = 0;
    let mut converged = false;

    for sweep in 0..MAX_SWEEPS {
        let mut sm = 0.0;
        for ip in 0..N - 1 {
            for iq in ip + 1..N {
                sm += a[(ip, iq)].abs();
            }
        }

        if sm == 0.0 {
            converged = true;
            break;
        }

        sweeps += 1;

        let tresh = if sweep < 3 {
            0.2 * sm / (N * N) as f64
        } else {
            0.0
        };

        for ip in 0..N - 1 {
            for iq in ip + 1..N {
                let apq = a[(ip, iq)];
                let g = 100.0 * apq.abs();

                if sweep > 3 && d[ip].abs() + g == d[ip].abs() && d[iq].abs() + g == d[iq].abs()
                {
                    a[(ip, iq)] = 0.0;
                } else if apq.abs() > tresh {
                    let h = d[iq] - d[ip];
                    let t = if h.abs() + g == h.abs() {
                        apq / h
                    } else {
                        let theta = 0.5 * h / apq;
                        let t = 1.0 / (theta.abs() + (1.0 + theta * theta).sqrt());
                        if theta < 0.0 {
                            -t
                        } else {
                            t
                        }
                    };

                    let c = 1.0 / (1.0 + t * t).sqrt();
                    let s = t * c;
                    let tau = s / (1.0 + c);
                    let h = t * apq;

                    z[ip] -= h;
                    z[iq] += h;
                    d[ip] -= h;
                    d[iq] += h;
                    a[(ip, iq)] = 0.0;

                    for j in 0..ip {
                        rotate(&mut a, (j, ip), (j, iq), s, tau);
                    }
                    for j in ip + 1..iq {
                        rotate(&mut a, (ip, j), (j, iq), s, tau);
                    }
                    for j in iq + 1..N {
                        rotate(&mut a, (ip, j), (iq, j), s, tau);
                    }
                    for j in 0..N {
                        rotate(&mut v, (j, ip), (j, iq), s, tau);
                    }

                    rotations += 1;
                }
            }
        }

        for ip in 0..N {
            b[ip] += z[ip];
            d[ip] = b[ip];
            z[ip] = 0.0;
        }
    }

    // selection sort, ascending
    for i in 0..N - 1 {
        let mut k = i;
        let mut p = d[i];
        for (j, &value) in d.iter().enumerate().skip(i + 1) {
            if value < p {
                k = j;
                p = value;
            }
        }

        if k != i {
            d[k] = d[i];
            d[i] = p;
            v.swap_columns(i, k);
        }
    }

    JacobiResult {
        eigenvalues: Vector4::from(d),
        eigenvectors: v,
        sweeps,
        rotations,
        converged,
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
