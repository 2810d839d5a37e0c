// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of the Molecule structure and its methods.

use crate::errors::AtomError;
use crate::structures::{atom::Atom, frame::Frame, vector3d::Vector3D};

/// Connected component of the bonded-atom graph of a frame.
///
/// Molecule does not own its atoms. It stores indices of the atoms
/// in the atom list of the `Frame` it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    /// Sequence number of the molecule. Counted from 1.
    number: usize,
    /// Indices of the atoms of the molecule in ascending order.
    atoms: Vec<usize>,
    /// Transient flag used by analyses to skip the molecule.
    excluded: bool,
    mass: Option<f64>,
    center: Option<Vector3D>,
}

impl Molecule {
    pub(crate) fn new(number: usize, atoms: Vec<usize>) -> Self {
        Molecule {
            number,
            atoms,
            excluded: false,
            mass: None,
            center: None,
        }
    }

    /// Get the sequence number of the molecule.
    #[inline(always)]
    pub fn get_number(&self) -> usize {
        self.number
    }

    /// Get indices of the atoms forming the molecule.
    #[inline(always)]
    pub fn get_atoms(&self) -> &[usize] {
        &self.atoms
    }

    /// Get the number of atoms in the molecule.
    #[inline(always)]
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Iterate over the atoms of the molecule.
    pub fn iter_atoms<'a>(&'a self, frame: &'a Frame) -> impl Iterator<Item = &'a Atom> + 'a {
        self.atoms.iter().map(move |&index| &frame.atoms()[index])
    }

    #[inline(always)]
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub fn set_excluded(&mut self, excluded: bool) {
        self.excluded = excluded;
    }

    /// Get the cached mass of the molecule. `None` if it has not been calculated yet.
    #[inline(always)]
    pub fn get_mass(&self) -> Option<f64> {
        self.mass
    }

    /// Get the cached center of the molecule. `None` if it has not been calculated yet.
    #[inline(always)]
    pub fn get_center(&self) -> Option<&Vector3D> {
        self.center.as_ref()
    }

    pub(crate) fn set_mass(&mut self, mass: f64) {
        self.mass = Some(mass);
    }

    pub(crate) fn set_center(&mut self, center: Vector3D) {
        self.center = Some(center);
    }

    /// Calculate the total mass of the molecule.
    ///
    /// ## Returns
    /// - `AtomError::MissingMass` if any atom of the molecule has no mass.
    pub fn calc_mass(&self, frame: &Frame) -> Result<f64, AtomError> {
        self.iter_atoms(frame).try_fold(0.0, |acc, atom| {
            atom.get_mass()
                .map(|mass| acc + mass)
                .ok_or(AtomError::MissingMass(atom.get_atom_number()))
        })
    }

    /// Calculate the geometric center of the molecule.
    ///
    /// All atoms are made whole relative to the first atom of the molecule
    /// using the minimum-image convention before averaging.
    pub fn calc_geometric_center(&self, frame: &Frame) -> Vector3D {
        match frame.center_of_indices(&self.atoms, false) {
            Ok(Some(center)) => center,
            // unweighted center can not fail and molecules are never empty
            _ => Vector3D::default(),
        }
    }

    /// Calculate the center of mass of the molecule.
    ///
    /// ## Returns
    /// - `AtomError::MissingMass` if any atom of the molecule has no mass.
    pub fn calc_mass_center(&self, frame: &Frame) -> Result<Vector3D, AtomError> {
        Ok(frame
            .center_of_indices(&self.atoms, true)?
            .unwrap_or_default())
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
