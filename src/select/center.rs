// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of center rules: selections with an associated center calculation.
//!
//! ## Syntax
//! - `com of <mask>`: center of mass of the selected atoms.
//! - `geom of <mask>`: geometric center of the selected atoms.
//! - `<mask>`: selection without a center.
//!
//! Each rule may be enclosed in curly braces, e.g. `{com of :1-10}`.

use regex::Regex;
use std::fmt;

use crate::errors::{AnalysisError, SelectError};
use crate::select::AmberMask;
use crate::structures::{frame::Frame, vector3d::Vector3D};

#[derive(Debug, Clone, PartialEq)]
pub enum CenterRule {
    MassCenter(AmberMask),
    GeometricCenter(AmberMask),
    Selection(AmberMask),
}

/// Shift the position reported by a parsing error of a subquery into the full query.
fn shift_error(error: SelectError, query: &str, base: usize) -> SelectError {
    match error {
        SelectError::Syntax {
            offset, expected, ..
        } => SelectError::Syntax {
            query: query.to_owned(),
            offset: offset + base,
            expected,
        },
        SelectError::ZeroStride { offset, .. } => SelectError::ZeroStride {
            query: query.to_owned(),
            offset: offset + base,
        },
        SelectError::EmptyQuery => SelectError::Syntax {
            query: query.to_owned(),
            offset: query.len(),
            expected: "a selection".to_owned(),
        },
        other => other,
    }
}

impl CenterRule {
    /// Parse a center rule.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// let rule = CenterRule::parse("{com of :1-10}").unwrap();
    /// assert_eq!(rule, CenterRule::MassCenter(AmberMask::parse(":1-10").unwrap()));
    ///
    /// let rule = CenterRule::parse("@CA").unwrap();
    /// assert_eq!(rule, CenterRule::Selection(AmberMask::parse("@CA").unwrap()));
    /// ```
    pub fn parse(query: &str) -> Result<Self, SelectError> {
        if query.trim().is_empty() {
            return Err(SelectError::EmptyQuery);
        }

        let mut start = query.len() - query.trim_start().len();
        let mut end = query.trim_end().len();

        if query[start..].starts_with('{') {
            if !query[..end].ends_with('}') || end - start < 2 {
                return Err(SelectError::Syntax {
                    query: query.to_owned(),
                    offset: end,
                    expected: "'}'".to_owned(),
                });
            }
            start += 1;
            end -= 1;
        }

        let inner = &query[start..end];

        let prefix = Regex::new(r"^\s*(com|geom)\s+of\s+")
            .expect("FATAL TRAJAN ERROR | CenterRule::parse | Could not construct regex pattern.");

        let (kind, mask_start) = match prefix.captures(inner) {
            Some(captures) => {
                let whole = captures.get(0).map_or(0, |m| m.end());
                let kind = captures.get(1).map_or("", |m| m.as_str());
                (kind, whole)
            }
            None => ("", 0),
        };

        let base = start + mask_start;
        let mask = AmberMask::parse(&inner[mask_start..])
            .map_err(|e| shift_error(e, query, base))?;

        Ok(match kind {
            "com" => CenterRule::MassCenter(mask),
            "geom" => CenterRule::GeometricCenter(mask),
            _ => CenterRule::Selection(mask),
        })
    }

    /// Get the selection of the rule.
    pub fn mask(&self) -> &AmberMask {
        match self {
            CenterRule::MassCenter(mask)
            | CenterRule::GeometricCenter(mask)
            | CenterRule::Selection(mask) => mask,
        }
    }
}

impl fmt::Display for CenterRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CenterRule::MassCenter(mask) => write!(f, "com of {}", mask),
            CenterRule::GeometricCenter(mask) => write!(f, "geom of {}", mask),
            CenterRule::Selection(mask) => write!(f, "{}", mask),
        }
    }
}

impl Frame {
    /// Calculate the center described by the rule.
    ///
    /// Atoms are made whole relative to the first selected atom before averaging.
    ///
    /// ## Returns
    /// - `Ok(None)` if the rule is a plain selection without a center.
    /// - `AnalysisError::EmptySelection` if the rule selects no atoms.
    /// - `AnalysisError::Atom` if the center of mass is requested and any selected atom has no mass.
    pub fn calc_center(&self, rule: &CenterRule) -> Result<Option<Vector3D>, AnalysisError> {
        let mass_weighted = match rule {
            CenterRule::MassCenter(_) => true,
            CenterRule::GeometricCenter(_) => false,
            CenterRule::Selection(_) => return Ok(None),
        };

        let indices = self.select(rule.mask())?;
        if indices.is_empty() {
            return Err(AnalysisError::EmptySelection(rule.mask().to_string()));
        }

        Ok(self.center_of_indices(&indices, mass_weighted)?)
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
