// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Simple, auxiliary functions and constants used through the `trajan_rs` library.

/******************************/
/*         CONSTANTS          */
/******************************/

/// Residue names selected by the `Protein` keyword.
pub(crate) const PROTEIN_RESIDUES: [&str; 23] = [
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLU", "GLN", "GLY", "HIS", "HYP", "ILE", "LLE", "LEU",
    "LYS", "MET", "PHE", "PRO", "GLP", "SER", "THR", "TRP", "TYR", "VAL",
];

/// Two-letter element symbols recognized when guessing an element from an atom name.
const TWO_LETTER_ELEMENTS: [&str; 14] = [
    "Cl", "Br", "Na", "Mg", "Ca", "Zn", "Fe", "Li", "Cu", "Mn", "Al", "Si", "Se", "He",
];

/// Standard atomic masses (in g/mol) of commonly simulated elements.
pub(crate) const ELEMENT_MASSES: [(&str, f64); 21] = [
    ("H", 1.008),
    ("He", 4.0026),
    ("Li", 6.94),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("F", 18.998),
    ("Na", 22.990),
    ("Mg", 24.305),
    ("Al", 26.982),
    ("Si", 28.085),
    ("P", 30.974),
    ("S", 32.06),
    ("Cl", 35.45),
    ("K", 39.098),
    ("Ca", 40.078),
    ("Mn", 54.938),
    ("Fe", 55.845),
    ("Cu", 63.546),
    ("Zn", 65.38),
    ("Br", 79.904),
];

/******************************/
/*       ELEMENT GUESSING     */
/******************************/

/// Guess the chemical element symbol from the name of an atom.
///
/// Leading digits are skipped. If the first two letters form a known two-letter
/// element symbol written in mixed case (e.g. `Cl`), it is returned. Otherwise the first letter
/// is returned in upper case. Returns `None` if the name contains no letter.
pub(crate) fn guess_element_symbol(atom_name: &str) -> Option<String> {
    let letters: Vec<char> = atom_name
        .chars()
        .skip_while(|c| c.is_ascii_digit())
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect();

    let first = letters.first()?.to_ascii_uppercase();

    if let Some(second) = letters.get(1) {
        let candidate = format!("{}{}", first, second.to_ascii_lowercase());
        // two-letter symbols only in mixed case, so that `CA` stays a carbon
        if second.is_ascii_lowercase() && TWO_LETTER_ELEMENTS.contains(&candidate.as_str()) {
            return Some(candidate);
        }
    }

    Some(first.to_string())
}

/******************************/
/*         UNIT TESTS         */
/******************************/
