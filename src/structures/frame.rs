// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of the Frame structure: a single snapshot of a trajectory.

use hashbrown::HashMap;

use crate::errors::{AtomError, SelectError, TopologyError};
use crate::select::AmberMask;
use crate::structures::{
    atom::Atom, forcefield::MassLookup, molecule::Molecule, simbox::SimBox, vector3d::Vector3D,
};

/// One snapshot of a trajectory.
///
/// A single `Frame` is typically reused for the whole trajectory:
/// the topology (atoms, connectivity, molecules) is constructed once
/// and only positions, velocities and the box are updated per frame.
#[derive(Debug, Clone)]
pub struct Frame {
    title: String,
    simbox: SimBox,
    /// Is the minimum-image convention applied?
    periodic: bool,
    atoms: Vec<Atom>,
    /// Maps atom sequence numbers to indices in `atoms`.
    atom_map: HashMap<usize, usize>,
    molecules: Vec<Molecule>,
}

impl Frame {
    /// Create a new frame from a list of atoms.
    ///
    /// Periodicity is enabled if a simulation box is provided.
    /// Molecules are not constructed. Use `Frame::build_molecules` to construct them.
    ///
    /// ## Returns
    /// - `TopologyError::DuplicateAtomNumber` if two atoms share a sequence number.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// let atoms = vec![
    ///     Atom::new(1, "C1", [0.5, 0.0, 0.0].into()).with_bonded(vec![2]),
    ///     Atom::new(2, "C2", [1.5, 0.0, 0.0].into()).with_bonded(vec![1]),
    /// ];
    ///
    /// let frame = Frame::new("ethane skeleton", atoms, None).unwrap();
    /// assert_eq!(frame.n_atoms(), 2);
    /// assert!(!frame.is_periodic());
    /// ```
    pub fn new(title: &str, atoms: Vec<Atom>, simbox: Option<SimBox>) -> Result<Self, TopologyError> {
        let mut atom_map = HashMap::with_capacity(atoms.len());
        for (index, atom) in atoms.iter().enumerate() {
            if atom_map.insert(atom.get_atom_number(), index).is_some() {
                return Err(TopologyError::DuplicateAtomNumber(atom.get_atom_number()));
            }
        }

        Ok(Frame {
            title: title.to_string(),
            periodic: simbox.is_some(),
            simbox: simbox.unwrap_or_default(),
            atoms,
            atom_map,
            molecules: Vec::new(),
        })
    }

    #[inline(always)]
    pub fn get_title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Get the simulation box of the frame.
    #[inline(always)]
    pub fn get_box(&self) -> &SimBox {
        &self.simbox
    }

    /// Set the simulation box. `None` disables periodicity.
    pub fn set_box(&mut self, simbox: Option<SimBox>) {
        self.periodic = simbox.is_some();
        self.simbox = simbox.unwrap_or_default();
    }

    /// Check whether the minimum-image convention is applied in this frame.
    #[inline(always)]
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Get all atoms of the frame.
    #[inline(always)]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    #[inline(always)]
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Get the atom with the given sequence number.
    pub fn get_atom(&self, number: usize) -> Result<&Atom, AtomError> {
        self.get_atom_index(number)
            .map(|index| &self.atoms[index])
            .ok_or(AtomError::NotFound(number))
    }

    /// Get mutable reference to the atom with the given sequence number.
    pub fn get_atom_mut(&mut self, number: usize) -> Result<&mut Atom, AtomError> {
        match self.get_atom_index(number) {
            Some(index) => Ok(&mut self.atoms[index]),
            None => Err(AtomError::NotFound(number)),
        }
    }

    /// Get the index of the atom with the given sequence number.
    #[inline(always)]
    pub fn get_atom_index(&self, number: usize) -> Option<usize> {
        self.atom_map.get(&number).copied()
    }

    /// Get all molecules of the frame.
    #[inline(always)]
    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    /// Get mutable access to the molecules of the frame.
    #[inline(always)]
    pub fn molecules_mut(&mut self) -> &mut [Molecule] {
        &mut self.molecules
    }

    /// Check whether the molecules of the frame have been constructed.
    #[inline(always)]
    pub fn has_molecules(&self) -> bool {
        !self.molecules.is_empty() || self.atoms.is_empty()
    }

    /// Partition atoms into molecules, i.e. connected components of the bonded-atom graph.
    ///
    /// Uses a flood fill with an explicit stack, so no recursion depth limits apply.
    /// Any previously constructed molecules are replaced.
    /// If an error occurs, the frame is not modified.
    ///
    /// ## Returns
    /// - `TopologyError::UnknownBondPartner` if an atom is bonded to a non-existent atom.
    /// - `TopologyError::AtomInMultipleMolecules` if an atom is reached from two different molecules.
    ///   This happens if the connectivity is not symmetric.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// let atoms = vec![
    ///     Atom::new(1, "O", [0.0, 0.0, 0.0].into()).with_bonded(vec![2, 3]),
    ///     Atom::new(2, "H", [0.1, 0.0, 0.0].into()).with_bonded(vec![1]),
    ///     Atom::new(3, "H", [0.0, 0.1, 0.0].into()).with_bonded(vec![1]),
    ///     Atom::new(4, "NA", [5.0, 5.0, 5.0].into()),
    /// ];
    ///
    /// let mut frame = Frame::new("water and ion", atoms, None).unwrap();
    /// frame.build_molecules().unwrap();
    ///
    /// assert_eq!(frame.molecules().len(), 2);
    /// assert_eq!(frame.molecules()[0].get_atoms(), &[0, 1, 2]);
    /// assert_eq!(frame.get_atom(4).unwrap().get_molecule_number(), Some(2));
    /// ```
    pub fn build_molecules(&mut self) -> Result<(), TopologyError> {
        let mut owner: Vec<Option<usize>> = vec![None; self.atoms.len()];
        let mut molecules = Vec::new();
        let mut stack = Vec::new();

        for start in 0..self.atoms.len() {
            if owner[start].is_some() {
                continue;
            }

            let molecule_index = molecules.len();
            let mut members = Vec::new();

            owner[start] = Some(molecule_index);
            stack.push(start);

            while let Some(current) = stack.pop() {
                members.push(current);
                let atom = &self.atoms[current];

                for &partner in atom.get_bonded() {
                    let partner_index = self.get_atom_index(partner).ok_or(
                        TopologyError::UnknownBondPartner(atom.get_atom_number(), partner),
                    )?;

                    match owner[partner_index] {
                        None => {
                            owner[partner_index] = Some(molecule_index);
                            stack.push(partner_index);
                        }
                        Some(index) if index == molecule_index => (),
                        Some(_) => return Err(TopologyError::AtomInMultipleMolecules(partner)),
                    }
                }
            }

            members.sort_unstable();
            molecules.push(Molecule::new(molecule_index + 1, members));
        }

        for (atom, molecule) in self.atoms.iter_mut().zip(owner) {
            atom.set_molecule_index(molecule);
        }
        self.molecules = molecules;

        Ok(())
    }

    /// Overwrite positions of all atoms, preserving atom identity.
    ///
    /// ## Returns
    /// - `TopologyError::InconsistentAtomCount` if the number of positions does not match
    ///   the number of atoms. In such case, the frame is not modified.
    pub fn set_positions(&mut self, positions: &[Vector3D]) -> Result<(), TopologyError> {
        if positions.len() != self.atoms.len() {
            return Err(TopologyError::InconsistentAtomCount(
                self.atoms.len(),
                positions.len(),
            ));
        }

        for (atom, position) in self.atoms.iter_mut().zip(positions) {
            atom.set_position(*position);
        }

        Ok(())
    }

    /// Apply the minimum-image convention to a displacement.
    /// If periodicity is disabled, the displacement is returned unmodified.
    #[inline(always)]
    pub fn image(&self, dx: f64, dy: f64, dz: f64) -> (f64, f64, f64) {
        if self.periodic {
            self.simbox.image(dx, dy, dz)
        } else {
            (dx, dy, dz)
        }
    }

    /// Apply the minimum-image convention to a displacement vector.
    #[inline(always)]
    pub fn image_vector(&self, vector: Vector3D) -> Vector3D {
        if self.periodic {
            self.simbox.image_vector(vector)
        } else {
            vector
        }
    }

    /// Calculate the minimum-image distance between two atoms specified by their sequence numbers.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// let atoms = vec![
    ///     Atom::new(1, "C1", [0.5, 0.0, 0.0].into()),
    ///     Atom::new(2, "C2", [19.5, 0.0, 0.0].into()),
    /// ];
    /// let simbox = SimBox::orthogonal([20.0, 20.0, 20.0].into());
    /// let frame = Frame::new("", atoms, Some(simbox)).unwrap();
    ///
    /// assert_approx_eq!(f64, frame.distance(1, 2).unwrap(), 1.0);
    /// ```
    pub fn distance(&self, number1: usize, number2: usize) -> Result<f64, AtomError> {
        let pos1 = self.get_atom(number1)?.get_position();
        let pos2 = self.get_atom(number2)?.get_position();

        Ok(self.image_vector(*pos2 - *pos1).len())
    }

    /// Select atoms matching the mask. Returns indices of the atoms in the order of the atom list.
    pub fn select(&self, mask: &AmberMask) -> Result<Vec<usize>, SelectError> {
        let mut selected = Vec::new();
        for (index, atom) in self.atoms.iter().enumerate() {
            if mask.is_match(atom)? {
                selected.push(index);
            }
        }

        Ok(selected)
    }

    /// Select atoms matching the mask. Returns sequence numbers of the atoms.
    pub fn select_numbers(&self, mask: &AmberMask) -> Result<Vec<usize>, SelectError> {
        Ok(self
            .select(mask)?
            .into_iter()
            .map(|index| self.atoms[index].get_atom_number())
            .collect())
    }

    /// Select molecules containing at least one atom matching the mask.
    /// Returns indices of the molecules.
    pub fn select_molecules(&self, mask: &AmberMask) -> Result<Vec<usize>, SelectError> {
        let mut selected = Vec::new();
        for (index, molecule) in self.molecules.iter().enumerate() {
            for &atom in molecule.get_atoms() {
                if mask.is_match(&self.atoms[atom])? {
                    selected.push(index);
                    break;
                }
            }
        }

        Ok(selected)
    }

    /// Assign masses to all atoms using the provided mass source.
    ///
    /// ## Returns
    /// - `AtomError::UnknownMass` if the mass of any atom is not known.
    ///   In such case, no mass is assigned.
    pub fn assign_masses(&mut self, lookup: &dyn MassLookup) -> Result<(), AtomError> {
        let masses = self
            .atoms
            .iter()
            .map(|atom| {
                lookup.mass_of(atom).ok_or_else(|| {
                    AtomError::UnknownMass(atom.get_atom_number(), atom.get_atom_name().to_string())
                })
            })
            .collect::<Result<Vec<f64>, AtomError>>()?;

        for (atom, mass) in self.atoms.iter_mut().zip(masses) {
            atom.set_mass(mass);
        }

        Ok(())
    }

    /// Check whether all atoms have a mass assigned.
    pub fn has_masses(&self) -> bool {
        self.atoms.iter().all(|atom| atom.get_mass().is_some())
    }

    /// Calculate and cache the mass and the center of every molecule.
    ///
    /// Geometric centers are used if `mass_weighted` is `false`.
    pub fn update_molecules(&mut self, mass_weighted: bool) -> Result<(), AtomError> {
        let mut properties = Vec::with_capacity(self.molecules.len());
        for molecule in self.molecules.iter() {
            let center = if mass_weighted {
                molecule.calc_mass_center(self)?
            } else {
                molecule.calc_geometric_center(self)
            };
            properties.push((molecule.calc_mass(self).ok(), center));
        }

        for (molecule, (mass, center)) in self.molecules.iter_mut().zip(properties) {
            if let Some(mass) = mass {
                molecule.set_mass(mass);
            }
            molecule.set_center(center);
        }

        Ok(())
    }

    /// Calculate the (optionally mass-weighted) center of the atoms with the given indices.
    /// Atoms are made whole relative to the first atom using the minimum-image convention.
    ///
    /// Returns `None` if `indices` is empty.
    pub(crate) fn center_of_indices(
        &self,
        indices: &[usize],
        mass_weighted: bool,
    ) -> Result<Option<Vector3D>, AtomError> {
        let Some(&first) = indices.first() else {
            return Ok(None);
        };

        let reference = *self.atoms[first].get_position();
        let mut sum = Vector3D::default();
        let mut total = 0.0;

        for &index in indices {
            let atom = &self.atoms[index];
            let weight = if mass_weighted {
                atom.get_mass()
                    .ok_or(AtomError::MissingMass(atom.get_atom_number()))?
            } else {
                1.0
            };

            let unwrapped = reference + self.image_vector(*atom.get_position() - reference);
            sum += unwrapped * weight;
            total += weight;
        }

        Ok(Some(sum / total))
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
