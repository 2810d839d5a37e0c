// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of a reader of Tinker ARC trajectories (concatenated Tinker XYZ frames).
//!
//! ## Format
//! ```text
//! <natoms> [title]
//! [a b c alpha beta gamma]
//! <seq> <name> <x> <y> <z> [<type code> [<bonded seq>...]]
//! ...
//! ```
//! The optional box line is detected on the first frame. If present, it must
//! be present in every frame. A line is only read as a box line if it consists
//! of six numbers and its first item is not an integer.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::auxiliary::guess_element_symbol;
use crate::errors::ReadTrajError;
use crate::structures::{atom::Atom, frame::Frame, simbox::SimBox, vector3d::Vector3D};

use super::traj_io::FrameSource;

/// Reader of Tinker ARC trajectories.
///
/// ## Example
/// ```no_run
/// # use trajan_rs::prelude::*;
/// let mut reader = ArcReader::open("trajectory.arc").unwrap();
///
/// while let Some(frame) = reader.next_frame() {
///     let frame = frame.unwrap();
///     println!("{}", frame.distance(1, 2).unwrap());
/// }
/// ```
pub struct ArcReader<R: BufRead> {
    reader: R,
    frame: Option<Frame>,
    /// Is there a box line in each frame? Decided when reading the first frame.
    periodic: bool,
    line: String,
    positions: Vec<Vector3D>,
}

impl ArcReader<BufReader<File>> {
    /// Open an ARC file for reading.
    pub fn open(filename: impl AsRef<Path>) -> Result<Self, ReadTrajError> {
        let file = File::open(filename.as_ref())
            .map_err(|_| ReadTrajError::FileNotFound(Box::from(filename.as_ref())))?;

        Ok(ArcReader::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ArcReader<R> {
    /// Create a new reader from any buffered stream.
    pub fn new(reader: R) -> Self {
        ArcReader {
            reader,
            frame: None,
            periodic: false,
            line: String::new(),
            positions: Vec::new(),
        }
    }

    /// Read the next line into the internal buffer. Returns `false` at the end of the stream.
    fn next_line(&mut self) -> Result<bool, ReadTrajError> {
        self.line.clear();
        match self.reader.read_line(&mut self.line) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(e) => Err(ReadTrajError::CouldNotRead(e.to_string())),
        }
    }

    /// Read the next line which must exist.
    fn expect_line(&mut self) -> Result<(), ReadTrajError> {
        if self.next_line()? {
            Ok(())
        } else {
            Err(ReadTrajError::UnexpectedEof)
        }
    }

    /// Read the header of the next frame. Returns `None` at the end of the stream.
    fn read_header(&mut self) -> Result<Option<(usize, String)>, ReadTrajError> {
        // skip empty lines between frames
        loop {
            if !self.next_line()? {
                return Ok(None);
            }

            if !self.line.trim().is_empty() {
                break;
            }
        }

        let line = self.line.trim();
        let (natoms, title) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        let natoms = natoms
            .parse::<usize>()
            .map_err(|_| ReadTrajError::ParseLine(line.to_string()))?;

        Ok(Some((natoms, title.trim().to_string())))
    }

    /// Read the next frame into the internal `Frame`.
    fn read_frame(&mut self) -> Option<Result<(), ReadTrajError>> {
        let (natoms, title) = match self.read_header() {
            Ok(Some(header)) => header,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };

        let result = if self.frame.is_none() {
            self.read_first_frame(natoms, &title)
        } else {
            self.read_next_frame(natoms, &title)
        };

        Some(result)
    }

    /// Read the first frame, constructing the topology.
    fn read_first_frame(&mut self, natoms: usize, title: &str) -> Result<(), ReadTrajError> {
        let mut simbox = None;

        if natoms != 0 {
            self.expect_line()?;

            if let Some(parsed) = line_as_box(&self.line) {
                self.periodic = true;
                simbox = Some(parsed?);
                self.expect_line()?;
            }
        }

        let mut atoms = Vec::with_capacity(natoms);
        for i in 0..natoms {
            if i != 0 {
                self.expect_line()?;
            }
            atoms.push(line_as_atom(&self.line)?);
        }

        let mut frame = Frame::new(title, atoms, simbox)?;
        frame.build_molecules()?;

        self.frame = Some(frame);
        Ok(())
    }

    /// Read any other frame, updating positions and box.
    fn read_next_frame(&mut self, natoms: usize, title: &str) -> Result<(), ReadTrajError> {
        let expected = self.frame.as_ref().map_or(0, |frame| frame.n_atoms());
        if natoms != expected {
            return Err(ReadTrajError::InconsistentFrame(format!(
                "expected {} atoms, found {}",
                expected, natoms
            )));
        }

        let simbox = if self.periodic {
            self.expect_line()?;
            match line_as_box(&self.line) {
                Some(simbox) => Some(simbox?),
                None => {
                    return Err(ReadTrajError::InconsistentFrame(
                        "missing simulation box".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        self.positions.clear();
        for i in 0..natoms {
            self.expect_line()?;
            let (number, position) = line_as_position(&self.line)?;

            let expected = self
                .frame
                .as_ref()
                .and_then(|frame| frame.atoms().get(i))
                .map(|atom| atom.get_atom_number());

            if expected != Some(number) {
                return Err(ReadTrajError::InconsistentFrame(format!(
                    "expected atom {} at position {}, found atom {}",
                    expected.unwrap_or_default(),
                    i + 1,
                    number
                )));
            }

            self.positions.push(position);
        }

        if let Some(frame) = self.frame.as_mut() {
            frame.set_positions(&self.positions)?;
            frame.set_title(title);
            if simbox.is_some() {
                frame.set_box(simbox);
            }
        }

        Ok(())
    }
}

impl<R: BufRead> FrameSource for ArcReader<R> {
    fn next_frame(&mut self) -> Option<Result<&mut Frame, ReadTrajError>> {
        match self.read_frame()? {
            Ok(()) => self.frame.as_mut().map(Ok),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Try to parse a line as a box line (six floating-point numbers).
/// Returns `None` if the line is not a box line.
fn line_as_box(line: &str) -> Option<Result<SimBox, ReadTrajError>> {
    // atom lines start with the sequence number
    if line
        .split_whitespace()
        .next()
        .is_some_and(|s| s.parse::<usize>().is_ok())
    {
        return None;
    }

    let values: Vec<f64> = line
        .split_whitespace()
        .map(|s| s.parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .ok()?;

    if values.len() != 6 {
        return None;
    }

    Some(
        SimBox::from_lengths_angles(
            Vector3D::new(values[0], values[1], values[2]),
            Vector3D::new(values[3], values[4], values[5]),
        )
        .map_err(ReadTrajError::from),
    )
}

/// Parse the sequence number and position of an atom line.
fn line_as_position(line: &str) -> Result<(usize, Vector3D), ReadTrajError> {
    let error = || ReadTrajError::ParseLine(line.trim().to_string());
    let mut split = line.split_whitespace();

    let number = split
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(error)?;

    // atom name
    split.next().ok_or_else(error)?;

    let mut position = [0.0; 3];
    for item in position.iter_mut() {
        *item = split
            .next()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(error)?;
    }

    Ok((number, position.into()))
}

/// Parse a complete atom line.
fn line_as_atom(line: &str) -> Result<Atom, ReadTrajError> {
    let error = || ReadTrajError::ParseLine(line.trim().to_string());

    let (number, position) = line_as_position(line)?;
    let mut split = line.split_whitespace();
    let name = split.nth(1).ok_or_else(error)?;

    let mut atom = Atom::new(number, name, position);
    if let Some(element) = guess_element_symbol(name) {
        atom = atom.with_element(&element);
    }

    // skip position
    let mut split = split.skip(3);

    if let Some(code) = split.next() {
        let code = code.parse::<usize>().map_err(|_| error())?;
        atom = atom.with_type_code(code);
    }

    let bonded = split
        .map(|s| s.parse::<usize>().map_err(|_| error()))
        .collect::<Result<Vec<usize>, ReadTrajError>>()?;

    Ok(atom.with_bonded(bonded))
}

/******************************/
/*         UNIT TESTS         */
/******************************/
