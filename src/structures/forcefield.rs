// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Narrow interface for obtaining atom masses from an external force field.

use hashbrown::HashMap;

use crate::auxiliary::{guess_element_symbol, ELEMENT_MASSES};
use crate::structures::atom::Atom;

/// Source of atomic masses.
pub trait MassLookup {
    /// Get the mass of the atom. Returns `None` if the mass is not known.
    fn mass_of(&self, atom: &Atom) -> Option<f64>;
}

/// Masses looked up by the chemical element of the atom.
/// If the atom has no element symbol, the element is guessed from its name.
#[derive(Debug, Clone, Default)]
pub struct ElementMasses;

impl MassLookup for ElementMasses {
    fn mass_of(&self, atom: &Atom) -> Option<f64> {
        let symbol = match atom.get_element_symbol() {
            Some(symbol) => symbol.to_string(),
            None => guess_element_symbol(atom.get_atom_name())?,
        };

        ELEMENT_MASSES
            .iter()
            .find(|(element, _)| *element == symbol)
            .map(|(_, mass)| *mass)
    }
}

/// Masses looked up by the force-field type name of the atom,
/// falling back to the atom name for atoms without a type name.
impl MassLookup for HashMap<String, f64> {
    fn mass_of(&self, atom: &Atom) -> Option<f64> {
        let key = atom.get_type_name().unwrap_or(atom.get_atom_name());
        self.get(key).copied()
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
