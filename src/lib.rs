// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! # trajan_rs: Trajectory Analysis Library for Rust
//!
//! Rust library for streaming analysis of molecular dynamics trajectories.
//!
//! ## Usage
//!
//! Run
//!
//! ```bash
//! $ cargo add trajan_rs
//! ```
//!
//! Import the crate in your Rust code:
//! ```
//! use trajan_rs::prelude::*;
//! ```
//!
//! ## Examples
//!
//! #### Selecting atoms
//!
//! Read the first frame of a Tinker ARC trajectory and select atoms using an Amber-style mask.
//!
//! ```no_run
//! use trajan_rs::prelude::*;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let mut reader = ArcReader::open("trajectory.arc")?;
//!     let frame = reader.next_frame().ok_or("empty trajectory")??;
//!
//!     // alpha carbons of the first ten residues except for residue 5
//!     let mask = AmberMask::parse(":1-10 & !:5 & @CA")?;
//!     let selected = frame.select_numbers(&mask)?;
//!
//!     println!("{:?}", selected);
//!     Ok(())
//! }
//! ```
//!
//! #### Calculating RMSD
//!
//! Superpose the backbone of every frame onto the first frame and
//! write the RMSD of the whole protein into a file.
//!
//! ```no_run
//! use trajan_rs::prelude::*;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let mut reader = ArcReader::open("trajectory.arc")?;
//!
//!     let analysis = RmsdAnalysis::new(AmberMask::parse("@CA,C,N")?, AmberMask::parse("Protein")?)
//!         .with_output("rmsd.dat");
//!
//!     let settings = AnalysisSettings {
//!         step: 10,
//!         ..Default::default()
//!     };
//!
//!     let mut engine = AnalysisEngine::new(settings)
//!         .with_module(analysis)
//!         .with_progress(ProgressPrinter::new());
//!
//!     engine.run(&mut reader, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```
//!
//! #### Running analyses from a configuration file
//!
//! ```no_run
//! use trajan_rs::prelude::*;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let config = AnalysisConfig::from_file("analysis.yaml")?;
//!     let mut engine = config.build_engine()?;
//!
//!     let mut reader = ArcReader::open("trajectory.arc")?;
//!     let summary = engine.run(&mut reader, &mut std::io::stdout())?;
//!
//!     eprintln!("Processed {} frames.", summary.frames_processed());
//!     Ok(())
//! }
//! ```
//!
//! ## Amber masks
//!
//! Atoms are selected using Amber-style masks:
//! - `:` selects residues by names or numbers (`:ALA,GLY`, `:1-10#2`),
//! - `@` selects atoms by names or numbers (`@CA`, `@1-100`),
//! - `@%` selects atoms by force-field types (`@%CT`),
//! - `@/` selects atoms by element symbols (`@/C,N`),
//! - `$` selects molecules by numbers (`$1-3`).
//!
//! Names may contain the wildcards `*`, `?` and `=`. Masks can be combined using `&`, `|`, `!` and parentheses.
//! `&` binds tighter than `|`.
//!
//! ## Error handling
//! The error types provided by `trajan_rs` are exported into the `prelude` module
//! together with the basic structures. Every error can also be included explicitly from the `errors` module:
//! ```
//! use trajan_rs::errors::AlignmentError;
//! ```
//!
//! ## License
//! This library is released under the MIT License.

/// Current version of the `trajan_rs` library.
pub const TRAJAN_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod alignment;
pub mod analysis;
mod auxiliary;
pub mod config;
pub mod errors;
pub mod io {
    pub mod arc_io;
    pub mod traj_io;
}
pub mod progress;
pub mod select;
pub mod structures {
    pub mod atom;
    pub mod forcefield;
    pub mod frame;
    pub mod molecule;
    pub mod simbox;
    pub mod vector3d;
}
mod test_utilities;

/// Reexported basic `trajan_rs` structures, traits and errors.
pub mod prelude {
    pub use crate::analysis::{
        AnalysisEngine, AnalysisModule, Requirements, RmsdAnalysis, RunContext, RunSummary,
    };
    pub use crate::config::{AnalysisConfig, AnalysisSettings, RmsdConfig};
    pub use crate::errors::{
        AlignmentError, AnalysisError, AtomError, ConfigError, ReadTrajError, SelectError,
        SimBoxError, TopologyError,
    };
    pub use crate::io::arc_io::ArcReader;
    pub use crate::io::traj_io::{FrameSource, MemoryTrajectory};
    pub use crate::progress::{ProgressPrinter, ProgressStatus};
    pub use crate::select::center::CenterRule;
    pub use crate::select::{AmberMask, Name, NumberRange};
    pub use crate::structures::atom::Atom;
    pub use crate::structures::forcefield::{ElementMasses, MassLookup};
    pub use crate::structures::frame::Frame;
    pub use crate::structures::molecule::Molecule;
    pub use crate::structures::simbox::SimBox;
    pub use crate::structures::vector3d::Vector3D;
}
