// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of the Amber mask language for selecting atoms.
//!
//! ## Syntax
//! - `:ALA,GLY` selects residues by name, `:1-10#2` by number (range with a stride).
//! - `@CA` selects atoms by name, `@1,3,5-9` by sequence number.
//! - `@%CT` selects atoms by type name, `@%1-3` by type code.
//! - `@/C` selects atoms by element symbol.
//! - `$1-4` selects atoms by the number of the molecule they belong to.
//! - Names may contain wildcards: `*` (or `=`) matches any sequence of characters, `?` matches one character.
//! - Selections are combined using `!` (not), `&` (and), `|` (or) and parentheses,
//!   in the order of decreasing precedence: parentheses, `!`, `&`, `|`.
//! - Keywords `System` (all atoms) and `Protein` (standard amino acid residues).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::SelectError;
use crate::structures::atom::Atom;

pub mod center;
mod name;
mod numbers;
mod parser;

pub use name::Name;
pub use numbers::NumberRange;

/// Item of a residue, atom or atom type selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Number(NumberRange),
    Name(Name),
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectItem::Number(range) => write!(f, "{}", range),
            SelectItem::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Parsed Amber mask: a predicate over atom properties.
#[derive(Debug, Clone, PartialEq)]
pub enum AmberMask {
    ResidueNameNumber(Vec<SelectItem>),
    MoleculeNumber(Vec<NumberRange>),
    AtomNameNumber(Vec<SelectItem>),
    AtomType(Vec<SelectItem>),
    ElementSymbol(Vec<Name>),
    And(Box<AmberMask>, Box<AmberMask>),
    Or(Box<AmberMask>, Box<AmberMask>),
    Not(Box<AmberMask>),
}

/// Check whether the atom matches the mask.
/// Equivalent to `AmberMask::is_match`.
#[inline]
pub fn is_match(atom: &Atom, mask: &AmberMask) -> Result<bool, SelectError> {
    mask.is_match(atom)
}

/// Labels of the atom properties used in context errors.
struct Attributes {
    number: &'static str,
    name: &'static str,
}

const RESIDUE: Attributes = Attributes {
    number: "residue number",
    name: "residue name or number",
};

const ATOM: Attributes = Attributes {
    number: "atom number",
    name: "atom name",
};

const TYPE: Attributes = Attributes {
    number: "type code",
    name: "type name or type code",
};

/// Check whether any of the items matches the provided name or number.
fn match_items(
    items: &[SelectItem],
    name: Option<&str>,
    number: Option<usize>,
    attributes: &Attributes,
    atom: &Atom,
) -> Result<bool, SelectError> {
    let context_error = |attribute| SelectError::InvalidContext {
        attribute,
        atom: atom.get_atom_number(),
    };

    for item in items {
        let matched = match item {
            SelectItem::Number(range) => {
                range.contains(number.ok_or_else(|| context_error(attributes.number))?)
            }
            SelectItem::Name(pattern @ Name::Literal(_)) => {
                pattern.is_match(name.ok_or_else(|| context_error(attributes.name))?)
            }
            // wildcard patterns are also matched against numbers
            SelectItem::Name(pattern) => match (name, number) {
                (None, None) => return Err(context_error(attributes.name)),
                (name, number) => {
                    name.is_some_and(|name| pattern.is_match(name))
                        || number.is_some_and(|number| pattern.is_match(&number.to_string()))
                }
            },
        };

        if matched {
            return Ok(true);
        }
    }

    Ok(false)
}

impl AmberMask {
    /// Parse an Amber mask query.
    ///
    /// ## Returns
    /// - `SelectError::EmptyQuery` if the query contains only whitespace.
    /// - `SelectError::Syntax` with the byte offset of the error and the description
    ///   of the expected token if the query is malformed.
    /// - `SelectError::ZeroStride` if a range has a stride of zero.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// let mask = AmberMask::parse(":1-10#2 & !@H*").unwrap();
    /// assert_eq!(mask.to_string(), ":1-10#2 & !@H*");
    ///
    /// match AmberMask::parse(":1-10 & ") {
    ///     Err(SelectError::Syntax { offset, .. }) => assert_eq!(offset, 8),
    ///     _ => panic!("Parsing should fail."),
    /// }
    /// ```
    pub fn parse(query: &str) -> Result<Self, SelectError> {
        parser::Parser::new(query).parse()
    }

    /// Check whether the atom matches the mask.
    ///
    /// ## Returns
    /// - `Ok(true)` or `Ok(false)` depending on whether the atom matches.
    /// - `SelectError::InvalidContext` if the mask uses a property the atom does not have
    ///   (e.g. residue number of an atom without residue information).
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// let atom = Atom::new(5, "CA", [0.0, 0.0, 0.0].into()).with_residue("ASP", 10);
    ///
    /// assert!(AmberMask::parse(":A?P").unwrap().is_match(&atom).unwrap());
    /// assert!(AmberMask::parse(":1*").unwrap().is_match(&atom).unwrap());
    /// assert!(!AmberMask::parse("@C").unwrap().is_match(&atom).unwrap());
    /// assert!(AmberMask::parse("@1-9#2").unwrap().is_match(&atom).unwrap());
    /// ```
    pub fn is_match(&self, atom: &Atom) -> Result<bool, SelectError> {
        match self {
            AmberMask::ResidueNameNumber(items) => match_items(
                items,
                atom.get_residue_name(),
                atom.get_residue_number(),
                &RESIDUE,
                atom,
            ),
            AmberMask::MoleculeNumber(ranges) => {
                let number = atom
                    .get_molecule_number()
                    .ok_or(SelectError::InvalidContext {
                        attribute: "molecule assignment",
                        atom: atom.get_atom_number(),
                    })?;
                Ok(ranges.iter().any(|range| range.contains(number)))
            }
            AmberMask::AtomNameNumber(items) => match_items(
                items,
                Some(atom.get_atom_name()),
                Some(atom.get_atom_number()),
                &ATOM,
                atom,
            ),
            AmberMask::AtomType(items) => match_items(
                items,
                atom.get_type_name(),
                atom.get_type_code(),
                &TYPE,
                atom,
            ),
            AmberMask::ElementSymbol(names) => {
                let symbol = atom
                    .get_element_symbol()
                    .ok_or(SelectError::InvalidContext {
                        attribute: "element symbol",
                        atom: atom.get_atom_number(),
                    })?;
                Ok(names.iter().any(|name| name.is_match(symbol)))
            }
            AmberMask::And(left, right) => Ok(left.is_match(atom)? && right.is_match(atom)?),
            AmberMask::Or(left, right) => Ok(left.is_match(atom)? || right.is_match(atom)?),
            AmberMask::Not(inner) => Ok(!inner.is_match(atom)?),
        }
    }

    /// Is this node a logical operator combining two subtrees?
    fn is_binary(&self) -> bool {
        matches!(self, AmberMask::And(_, _) | AmberMask::Or(_, _))
    }
}

/// Write items separated by commas.
fn write_list<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i != 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", item)?;
    }

    Ok(())
}

/// Write an operand of a logical operator, enclosing compound operands in parentheses.
fn write_operand(f: &mut fmt::Formatter, operand: &AmberMask) -> fmt::Result {
    if operand.is_binary() {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

impl fmt::Display for AmberMask {
    /// Convert `AmberMask` into a valid query.
    ///
    /// ## Warning
    /// - The query may differ from the string the mask was parsed from
    ///   (whitespace, parentheses, keywords are expanded).
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AmberMask::ResidueNameNumber(items) => {
                write!(f, ":")?;
                write_list(f, items)
            }
            AmberMask::MoleculeNumber(ranges) => {
                write!(f, "$")?;
                write_list(f, ranges)
            }
            AmberMask::AtomNameNumber(items) => {
                write!(f, "@")?;
                write_list(f, items)
            }
            AmberMask::AtomType(items) => {
                write!(f, "@%")?;
                write_list(f, items)
            }
            AmberMask::ElementSymbol(names) => {
                write!(f, "@/")?;
                write_list(f, names)
            }
            AmberMask::And(left, right) => {
                write_operand(f, left)?;
                write!(f, " & ")?;
                write_operand(f, right)
            }
            AmberMask::Or(left, right) => {
                write_operand(f, left)?;
                write!(f, " | ")?;
                write_operand(f, right)
            }
            AmberMask::Not(inner) => {
                write!(f, "!")?;
                write_operand(f, inner)
            }
        }
    }
}

impl FromStr for AmberMask {
    type Err = SelectError;

    fn from_str(query: &str) -> Result<Self, Self::Err> {
        AmberMask::parse(query)
    }
}

impl Serialize for AmberMask {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AmberMask {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let query = String::deserialize(deserializer)?;
        AmberMask::parse(&query).map_err(serde::de::Error::custom)
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
