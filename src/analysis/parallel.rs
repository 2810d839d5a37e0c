// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Fork-join reduction over an index range and its use for pairwise RMSD matrices.

use ndarray::Array2;
use std::ops::Add;

use crate::alignment::{rmsfit, superpose};
use crate::errors::AlignmentError;
use crate::structures::vector3d::Vector3D;

/// Get the number of threads to use. Zero means all available cores.
pub fn resolve_threads(n_threads: usize) -> usize {
    if n_threads != 0 {
        return n_threads;
    }

    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Apply `body` to every index in `0..n_items` using `n_threads` threads and reduce the results.
///
/// The range is split into contiguous partitions, one per thread. Every thread
/// accumulates into its own `Data::default()` and the partial results are combined using `+`
/// in the order of the partitions. The result therefore does not depend on scheduling,
/// but may differ from a sequential run by floating-point rounding if `+` is not exactly associative.
///
/// `n_threads == 0` uses all available cores.
///
/// ## Example
/// ```
/// # use trajan_rs::analysis::parallel::parallel_reduce;
/// let sum: u64 = parallel_reduce(1000, 4, |i, acc: &mut u64| *acc += i as u64);
/// assert_eq!(sum, 499500);
/// ```
///
/// ## Panics
/// Panics if `body` panics in any thread.
pub fn parallel_reduce<Data, F>(n_items: usize, n_threads: usize, body: F) -> Data
where
    Data: Add<Output = Data> + Default + Send,
    F: Fn(usize, &mut Data) + Sync,
{
    let n_threads = resolve_threads(n_threads).min(n_items).max(1);

    if n_threads == 1 {
        let mut data = Data::default();
        for i in 0..n_items {
            body(i, &mut data);
        }
        return data;
    }

    let chunk = n_items.div_ceil(n_threads);
    let body = &body;

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..n_threads)
            .map(|t| {
                s.spawn(move || {
                    let mut data = Data::default();
                    let start = t * chunk;
                    let end = ((t + 1) * chunk).min(n_items);
                    for i in start..end {
                        body(i, &mut data);
                    }
                    data
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .fold(Data::default(), |acc, data| acc + data)
    })
}

/// Map the `k`th work item of a triangular `n x n` workload to a matrix row.
///
/// Rows are taken alternately from the start and from the end of the matrix,
/// so that every contiguous partition of items contains a similar number of pairs.
fn balanced_row(k: usize, n: usize) -> usize {
    if k % 2 == 0 {
        k / 2
    } else {
        n - 1 - k / 2
    }
}

/// Partial results of a pairwise RMSD calculation.
#[derive(Debug, Default)]
struct PairwiseValues {
    values: Vec<(usize, usize, f64)>,
    error: Option<AlignmentError>,
}

impl Add for PairwiseValues {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self.values.extend(other.values);
        self.error = self.error.or(other.error);
        self
    }
}

/// Calculate the symmetric matrix of RMSD values between all pairs of coordinate sets.
/// Every pair is superposed using all of its points.
///
/// ## Returns
/// - `Array2<f64>` of shape `(n, n)` with zeros on the diagonal.
/// - `AlignmentError::InconsistentSize` if the sets do not all have the same length.
/// - `AlignmentError::EmptyFit` if the sets contain no points.
pub fn pairwise_rmsd(
    frames: &[Vec<Vector3D>],
    n_threads: usize,
) -> Result<Array2<f64>, AlignmentError> {
    let n = frames.len();
    let mut matrix = Array2::<f64>::zeros((n, n));

    let Some(first) = frames.first() else {
        return Ok(matrix);
    };

    if let Some(other) = frames.iter().find(|frame| frame.len() != first.len()) {
        return Err(AlignmentError::InconsistentSize(first.len(), other.len()));
    }

    if first.is_empty() {
        return Err(AlignmentError::EmptyFit);
    }

    let result = parallel_reduce(n, n_threads, |k, data: &mut PairwiseValues| {
        let i = balanced_row(k, n);
        for j in (i + 1)..n {
            let mut reference = frames[i].clone();
            let mut target = frames[j].clone();

            let nfit = reference.len();
            let value = superpose(&mut reference, &mut target, nfit)
                .and_then(|_| rmsfit(&reference, &target));

            match value {
                Ok(value) => data.values.push((i, j, value)),
                Err(e) => {
                    data.error.get_or_insert(e);
                }
            }
        }
    });

    if let Some(e) = result.error {
        return Err(e);
    }

    for (i, j, value) in result.values {
        matrix[[i, j]] = value;
        matrix[[j, i]] = value;
    }

    Ok(matrix)
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use nalgebra::{Rotation3, Vector3};

    #[derive(Debug, Default, PartialEq)]
    struct Histogram(Vec<usize>);

    impl Add for Histogram {
        type Output = Self;

        fn add(self, other: Self) -> Self {
            let len = self.0.len().max(other.0.len());
            let mut bins = vec![0; len];
            for (i, count) in self.0.into_iter().enumerate() {
                bins[i] += count;
            }
            for (i, count) in other.0.into_iter().enumerate() {
                bins[i] += count;
            }
            Histogram(bins)
        }
    }

    macro_rules! reduce_sum {
        ($name:ident, $n_items:expr, $n_threads:expr) => {
            paste::paste! {
                #[test]
                fn [<sum_ $name>]() {
                    let sum: u64 = parallel_reduce($n_items, $n_threads, |i, acc: &mut u64| *acc += i as u64);
                    let n = $n_items as u64;
                    assert_eq!(sum, n * n.saturating_sub(1) / 2);
                }
            }
        };
    }

    reduce_sum!(sequential, 1000, 1);
    reduce_sum!(two_threads, 1000, 2);
    reduce_sum!(many_threads, 1001, 7);
    reduce_sum!(more_threads_than_items, 3, 16);
    reduce_sum!(no_items, 0, 4);
    reduce_sum!(all_cores, 12345, 0);

    #[test]
    fn histogram_independent_of_threads() {
        let body = |i: usize, hist: &mut Histogram| {
            let bin = (i * 7) % 10;
            if hist.0.len() <= bin {
                hist.0.resize(bin + 1, 0);
            }
            hist.0[bin] += 1;
        };

        let sequential = parallel_reduce(5000, 1, body);
        for threads in [2, 3, 8] {
            assert_eq!(parallel_reduce(5000, threads, body), sequential);
        }
        assert_eq!(sequential.0.iter().sum::<usize>(), 5000);
    }

    #[test]
    fn float_sum_within_tolerance() {
        let body = |i: usize, acc: &mut f64| *acc += (i as f64).sqrt();
        let sequential = parallel_reduce(10000, 1, body);
        let parallel = parallel_reduce(10000, 4, body);
        assert_approx_eq!(f64, sequential, parallel, epsilon = 1e-8);
    }

    fn structure() -> Vec<Vector3D> {
        vec![
            [0.0, 0.0, 0.0].into(),
            [1.5, 0.0, 0.0].into(),
            [1.5, 1.5, 0.0].into(),
            [0.0, 1.5, 1.0].into(),
        ]
    }

    #[test]
    fn pairwise_matrix() {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.7);
        let moved: Vec<Vector3D> = structure()
            .iter()
            .map(|p| Vector3D::from(rotation * p.0) + Vector3D::new(3.0, -1.0, 2.0))
            .collect();

        let mut distorted = structure();
        distorted[3] = Vector3D::new(0.0, 1.5, 2.0);

        let frames = vec![structure(), moved, distorted];
        let sequential = pairwise_rmsd(&frames, 1).unwrap();
        let parallel = pairwise_rmsd(&frames, 3).unwrap();

        assert_eq!(sequential.shape(), &[3, 3]);
        for i in 0..3 {
            assert_eq!(sequential[[i, i]], 0.0);
            for j in 0..3 {
                assert_eq!(sequential[[i, j]], sequential[[j, i]]);
                assert_approx_eq!(f64, sequential[[i, j]], parallel[[i, j]], epsilon = 1e-12);
            }
        }

        assert_approx_eq!(f64, sequential[[0, 1]], 0.0, epsilon = 1e-8);
        assert!(sequential[[0, 2]] > 0.1);
        assert_approx_eq!(f64, sequential[[0, 2]], sequential[[1, 2]], epsilon = 1e-8);
    }

    #[test]
    fn balanced_rows() {
        for n in [1, 2, 5, 10, 11] {
            let mut rows: Vec<usize> = (0..n).map(|k| balanced_row(k, n)).collect();
            rows.sort();
            assert_eq!(rows, (0..n).collect::<Vec<usize>>());
        }

        // pairs handled by each of 4 contiguous partitions of 100 rows
        let n = 100;
        let pairs: Vec<usize> = (0..4)
            .map(|t| {
                (t * 25..(t + 1) * 25)
                    .map(|k| n - 1 - balanced_row(k, n))
                    .sum()
            })
            .collect();

        let total = n * (n - 1) / 2;
        assert_eq!(pairs.iter().sum::<usize>(), total);
        for count in pairs {
            assert!(count.abs_diff(total / 4) <= n, "unbalanced partition: {}", count);
        }
    }

    #[test]
    fn pairwise_many_threads() {
        let frames: Vec<Vec<Vector3D>> = (0..9)
            .map(|k| {
                let mut frame = structure();
                frame[3].z += 0.1 * k as f64;
                frame
            })
            .collect();

        let sequential = pairwise_rmsd(&frames, 1).unwrap();
        for threads in [2, 4, 9] {
            let parallel = pairwise_rmsd(&frames, threads).unwrap();
            for i in 0..9 {
                for j in 0..9 {
                    assert_eq!(sequential[[i, j]], parallel[[i, j]]);
                }
            }
        }

        for i in 0..9 {
            for j in (i + 1)..9 {
                assert!(sequential[[i, j]] > 0.0);
            }
        }
    }

    #[test]
    fn pairwise_errors() {
        let frames = vec![structure(), structure()[..3].to_vec()];
        assert_eq!(
            pairwise_rmsd(&frames, 2).unwrap_err(),
            AlignmentError::InconsistentSize(4, 3)
        );

        let frames = vec![Vec::new(), Vec::new()];
        assert_eq!(pairwise_rmsd(&frames, 2).unwrap_err(), AlignmentError::EmptyFit);

        assert_eq!(pairwise_rmsd(&[], 2).unwrap().shape(), &[0, 0]);
    }
}
