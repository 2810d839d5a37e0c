// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Structural alignment: quaternion least-squares superposition and RMSD.
//!
//! The superposition follows the classic quaternion approach:
//! both coordinate sets are centered on the centroid of their fitted points,
//! a symmetric 4x4 key matrix is built from the cross-correlation of the fitted points,
//! and the eigenvector of its largest eigenvalue (obtained by Jacobi diagonalization)
//! is the quaternion of the optimal rotation.

mod jacobi;
mod superpose;

pub use jacobi::{jacobi, JacobiResult, MAX_SWEEPS};
pub use superpose::{center, quatfit, rmsd_subset, rmsfit, superpose, Superposition};
