// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of the Atom structure and its methods.

use crate::structures::vector3d::Vector3D;

/// A single particle of a trajectory frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Sequence number of the atom. Unique within a frame, counted from 1.
    atom_number: usize,
    atom_name: String,
    element_symbol: Option<String>,
    type_name: Option<String>,
    type_code: Option<usize>,
    residue_name: Option<String>,
    residue_number: Option<usize>,
    position: Vector3D,
    velocity: Option<Vector3D>,
    charge: Option<f64>,
    mass: Option<f64>,
    /// Sequence numbers of the atoms this atom is bonded to.
    bonded: Vec<usize>,
    /// Index of the molecule this atom belongs to (in the frame's molecule list).
    molecule: Option<usize>,
}

impl Atom {
    /// Create new Atom structure with the specified sequence number, name and position.
    ///
    /// ## Notes
    /// - All optional properties are unset. Use the `with_*` methods to provide them.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// let atom = Atom::new(1, "CA", [1.4, 1.5, 1.7].into())
    ///     .with_residue("ALA", 3)
    ///     .with_element("C")
    ///     .with_bonded(vec![2, 5]);
    ///
    /// assert_eq!(atom.get_residue_number(), Some(3));
    /// assert_eq!(atom.get_element_symbol(), Some("C"));
    /// assert_eq!(atom.get_bonded(), &[2, 5]);
    /// ```
    pub fn new(atom_number: usize, atom_name: &str, position: Vector3D) -> Self {
        Atom {
            atom_number,
            atom_name: atom_name.to_string(),
            element_symbol: None,
            type_name: None,
            type_code: None,
            residue_name: None,
            residue_number: None,
            position,
            velocity: None,
            charge: None,
            mass: None,
            bonded: Vec::new(),
            molecule: None,
        }
    }

    /// Add residue information to the atom.
    pub fn with_residue(mut self, residue_name: &str, residue_number: usize) -> Self {
        self.residue_name = Some(residue_name.to_string());
        self.residue_number = Some(residue_number);
        self
    }

    /// Add residue name without a residue number.
    pub fn with_residue_name(mut self, residue_name: &str) -> Self {
        self.residue_name = Some(residue_name.to_string());
        self
    }

    /// Add chemical element symbol.
    pub fn with_element(mut self, symbol: &str) -> Self {
        self.element_symbol = Some(symbol.to_string());
        self
    }

    /// Add force-field atom type name.
    pub fn with_type_name(mut self, type_name: &str) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    /// Add force-field atom type code.
    pub fn with_type_code(mut self, type_code: usize) -> Self {
        self.type_code = Some(type_code);
        self
    }

    /// Add velocity.
    pub fn with_velocity(mut self, velocity: Vector3D) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Add point charge.
    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = Some(charge);
        self
    }

    /// Add mass.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Add sequence numbers of bonded atoms.
    pub fn with_bonded(mut self, bonded: Vec<usize>) -> Self {
        self.bonded = bonded;
        self
    }

    /// Get the sequence number of the atom.
    #[inline(always)]
    pub fn get_atom_number(&self) -> usize {
        self.atom_number
    }

    /// Get the name of the atom.
    #[inline(always)]
    pub fn get_atom_name(&self) -> &str {
        &self.atom_name
    }

    #[inline(always)]
    pub fn get_element_symbol(&self) -> Option<&str> {
        self.element_symbol.as_deref()
    }

    /// Set the chemical element symbol of the atom.
    pub fn set_element_symbol(&mut self, symbol: &str) {
        self.element_symbol = Some(symbol.to_string());
    }

    #[inline(always)]
    pub fn get_type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    #[inline(always)]
    pub fn get_type_code(&self) -> Option<usize> {
        self.type_code
    }

    #[inline(always)]
    pub fn get_residue_name(&self) -> Option<&str> {
        self.residue_name.as_deref()
    }

    #[inline(always)]
    pub fn get_residue_number(&self) -> Option<usize> {
        self.residue_number
    }

    /// Get the coordinates of the atom.
    #[inline(always)]
    pub fn get_position(&self) -> &Vector3D {
        &self.position
    }

    /// Set the coordinates of the atom.
    #[inline(always)]
    pub fn set_position(&mut self, position: Vector3D) {
        self.position = position;
    }

    #[inline(always)]
    pub fn get_velocity(&self) -> Option<&Vector3D> {
        self.velocity.as_ref()
    }

    pub fn set_velocity(&mut self, velocity: Vector3D) {
        self.velocity = Some(velocity);
    }

    #[inline(always)]
    pub fn get_charge(&self) -> Option<f64> {
        self.charge
    }

    #[inline(always)]
    pub fn get_mass(&self) -> Option<f64> {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f64) {
        self.mass = Some(mass);
    }

    /// Get sequence numbers of the atoms bonded to this atom.
    #[inline(always)]
    pub fn get_bonded(&self) -> &[usize] {
        &self.bonded
    }

    /// Get the index of the molecule this atom belongs to.
    #[inline(always)]
    pub fn get_molecule_index(&self) -> Option<usize> {
        self.molecule
    }

    /// Get the sequence number (counted from 1) of the molecule this atom belongs to.
    #[inline(always)]
    pub fn get_molecule_number(&self) -> Option<usize> {
        self.molecule.map(|index| index + 1)
    }

    pub(crate) fn set_molecule_index(&mut self, index: Option<usize>) {
        self.molecule = index;
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_no_optional_properties() {
        let atom = Atom::new(7, "OW", [1.0, 2.0, 3.0].into());

        assert_eq!(atom.get_atom_number(), 7);
        assert_eq!(atom.get_atom_name(), "OW");
        assert!(atom.get_element_symbol().is_none());
        assert!(atom.get_type_name().is_none());
        assert!(atom.get_type_code().is_none());
        assert!(atom.get_residue_name().is_none());
        assert!(atom.get_residue_number().is_none());
        assert!(atom.get_velocity().is_none());
        assert!(atom.get_charge().is_none());
        assert!(atom.get_mass().is_none());
        assert!(atom.get_bonded().is_empty());
        assert!(atom.get_molecule_number().is_none());
    }

    #[test]
    fn builders() {
        let atom = Atom::new(3, "HW1", Vector3D::default())
            .with_residue("SOL", 12)
            .with_element("H")
            .with_type_name("HT")
            .with_type_code(22)
            .with_velocity([0.1, 0.2, 0.3].into())
            .with_charge(0.417)
            .with_mass(1.008)
            .with_bonded(vec![1]);

        assert_eq!(atom.get_residue_name(), Some("SOL"));
        assert_eq!(atom.get_residue_number(), Some(12));
        assert_eq!(atom.get_element_symbol(), Some("H"));
        assert_eq!(atom.get_type_name(), Some("HT"));
        assert_eq!(atom.get_type_code(), Some(22));
        assert_eq!(atom.get_velocity(), Some(&Vector3D::new(0.1, 0.2, 0.3)));
        assert_eq!(atom.get_charge(), Some(0.417));
        assert_eq!(atom.get_mass(), Some(1.008));
        assert_eq!(atom.get_bonded(), &[1]);
    }

    #[test]
    fn molecule_number() {
        let mut atom = Atom::new(1, "C", Vector3D::default());
        atom.set_molecule_index(Some(4));

        assert_eq!(atom.get_molecule_index(), Some(4));
        assert_eq!(atom.get_molecule_number(), Some(5));
    }
}
