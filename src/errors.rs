// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of errors that can be returned by the library.

use colored::{ColoredString, Colorize};
use std::path::Path;
use thiserror::Error;

/// Helper function to colorize a path.
fn path_to_yellow(path: &Path) -> ColoredString {
    path.to_str().unwrap_or("<invalid path>").yellow()
}

/// Errors that can occur when constructing a simulation box.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimBoxError {
    #[error("{} box angles '{}' do not describe a valid periodic cell", "error:".red().bold(), .0.yellow())]
    InvalidAngles(String),
    #[error("{} box lengths '{}' must not be negative", "error:".red().bold(), .0.yellow())]
    NegativeLength(String),
}

/// Errors that can occur when working with individual atoms.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AtomError {
    #[error("{} atom with sequence number '{}' does not exist", "error:".red().bold(), .0.to_string().yellow())]
    NotFound(usize),
    #[error("{} atom '{}' has no mass assigned", "error:".red().bold(), .0.to_string().yellow())]
    MissingMass(usize),
    #[error("{} no mass is known for atom '{}' ('{}')", "error:".red().bold(), .0.to_string().yellow(), .1.yellow())]
    UnknownMass(usize, String),
}

/// Errors that can occur when building the topology of a frame.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TopologyError {
    #[error("{} atom sequence number '{}' is used by more than one atom", "error:".red().bold(), .0.to_string().yellow())]
    DuplicateAtomNumber(usize),
    #[error("{} atom '{}' is bonded to atom '{}' which does not exist", "error:".red().bold(), .0.to_string().yellow(), .1.to_string().yellow())]
    UnknownBondPartner(usize, usize),
    #[error("{} atom '{}' was reached from two different molecules (corrupted connectivity)", "error:".red().bold(), .0.to_string().yellow())]
    AtomInMultipleMolecules(usize),
    #[error("{} frame contains '{}' atoms but '{}' positions were provided", "error:".red().bold(), .0.to_string().yellow(), .1.to_string().yellow())]
    InconsistentAtomCount(usize, usize),
}

/// Errors that can occur when parsing or evaluating an atom selection.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectError {
    #[error("{} the provided selection query is empty", "error:".red().bold())]
    EmptyQuery,
    #[error("{} could not parse selection query '{}' at position {}: expected {}", "error:".red().bold(), .query.yellow(), .offset.to_string().yellow(), .expected)]
    Syntax {
        query: String,
        offset: usize,
        expected: String,
    },
    #[error("{} stride of a range in selection query '{}' at position {} must not be zero", "error:".red().bold(), .query.yellow(), .offset.to_string().yellow())]
    ZeroStride { query: String, offset: usize },
    #[error("{} selection syntax is invalid in the current context: atom '{}' has no {}", "error:".red().bold(), .atom.to_string().yellow(), .attribute)]
    InvalidContext {
        attribute: &'static str,
        atom: usize,
    },
}

impl SelectError {
    /// Render the query with a caret pointing at the position where parsing failed.
    /// Returns `None` for errors that are not associated with a position in the query.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// let error = AmberMask::parse(":1-10#0").unwrap_err();
    /// assert_eq!(error.highlight().unwrap(), ":1-10#0\n      ^");
    /// ```
    pub fn highlight(&self) -> Option<String> {
        match self {
            SelectError::Syntax { query, offset, .. } | SelectError::ZeroStride { query, offset } => {
                let column = query
                    .get(..*offset)
                    .map(|prefix| prefix.chars().count())
                    .unwrap_or(*offset);
                Some(format!("{}\n{}^", query, " ".repeat(column)))
            }
            _ => None,
        }
    }
}

/// Errors that can occur during structural superposition.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("{} coordinate sets have inconsistent sizes ('{}' reference points, '{}' target points)", "error:".red().bold(), .0.to_string().yellow(), .1.to_string().yellow())]
    InconsistentSize(usize, usize),
    #[error("{} no points were provided for the superposition", "error:".red().bold())]
    EmptyFit,
    #[error("{} requested '{}' fitting points but only '{}' points are available", "error:".red().bold(), .0.to_string().yellow(), .1.to_string().yellow())]
    FitOutOfRange(usize, usize),
    #[error("{} diagonalization of the superposition matrix did not converge after '{}' sweeps; the fit may be inaccurate", "warning:".yellow().bold(), .0.to_string().yellow())]
    NotConvergedWarning(usize),
}

/// Errors that can occur when reading a trajectory.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReadTrajError {
    #[error("{} file '{}' was not found", "error:".red().bold(), path_to_yellow(.0))]
    FileNotFound(Box<Path>),
    #[error("{} could not read from the trajectory ({})", "error:".red().bold(), .0)]
    CouldNotRead(String),
    #[error("{} could not parse line '{}'", "error:".red().bold(), .0.yellow())]
    ParseLine(String),
    #[error("{} trajectory frame ended unexpectedly", "error:".red().bold())]
    UnexpectedEof,
    #[error("{} frame is inconsistent with the topology of the first frame ({})", "error:".red().bold(), .0)]
    InconsistentFrame(String),
    #[error("{}", .0)]
    Topology(#[from] TopologyError),
    #[error("{}", .0)]
    SimBox(#[from] SimBoxError),
}

/// Errors that can occur when reading or validating configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{} file '{}' was not found", "error:".red().bold(), path_to_yellow(.0))]
    FileNotFound(Box<Path>),
    #[error("{} could not parse configuration ({})", "error:".red().bold(), .0)]
    CouldNotParse(String),
    #[error("{} step '{}' is not valid (must be at least 1)", "error:".red().bold(), .0.to_string().yellow())]
    InvalidStep(usize),
    #[error("{} start frame '{}' is not valid (frames are counted from 1)", "error:".red().bold(), .0.to_string().yellow())]
    InvalidStart(usize),
    #[error("{} total number of frames '{}' is smaller than start frame '{}'", "error:".red().bold(), .0.to_string().yellow(), .1.to_string().yellow())]
    InvalidEnd(usize, usize),
}

/// Errors that can occur while running an analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{}", .0)]
    Select(#[from] SelectError),
    #[error("{}", .0)]
    Alignment(#[from] AlignmentError),
    #[error("{}", .0)]
    Topology(#[from] TopologyError),
    #[error("{}", .0)]
    Atom(#[from] AtomError),
    #[error("{}", .0)]
    Read(#[from] ReadTrajError),
    #[error("{}", .0)]
    Config(#[from] ConfigError),
    #[error("{} selection '{}' matches no atoms", "error:".red().bold(), .0.yellow())]
    EmptySelection(String),
    #[error("{} module '{}' requires masses but no mass source was provided", "error:".red().bold(), .0.yellow())]
    MassesRequired(String),
    #[error("{} could not create file '{}'", "error:".red().bold(), path_to_yellow(.0))]
    CouldNotCreate(Box<Path>),
    #[error("{} could not write output ({})", "error:".red().bold(), .0)]
    CouldNotWrite(#[from] std::io::Error),
}
