// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Streaming analysis engine.
//!
//! Analysis modules are registered with an [`AnalysisEngine`] which reads a trajectory
//! frame by frame and hands every processed frame to all modules in registration order.
//! Once the trajectory is exhausted, each module prints its results.
//!
//! ## Example
//! ```
//! # use trajan_rs::prelude::*;
//! # use trajan_rs::analysis::{AnalysisModule, RmsdAnalysis};
//! let atoms = vec![
//!     Atom::new(1, "CA", [0.0, 0.0, 0.0].into()).with_residue("ALA", 1),
//!     Atom::new(2, "CA", [1.0, 0.0, 0.0].into()).with_residue("GLY", 2),
//!     Atom::new(3, "CA", [0.0, 1.0, 0.0].into()).with_residue("SER", 3),
//! ];
//! let topology = Frame::new("peptide", atoms, None).unwrap();
//! let positions = vec![
//!     vec![[0.0, 0.0, 0.0].into(), [1.0, 0.0, 0.0].into(), [0.0, 1.0, 0.0].into()],
//!     vec![[5.0, 5.0, 5.0].into(), [5.0, 6.0, 5.0].into(), [4.0, 5.0, 5.0].into()],
//! ];
//! let mut trajectory = MemoryTrajectory::new(topology, positions);
//!
//! let mask = AmberMask::parse("@CA").unwrap();
//! let mut engine = AnalysisEngine::new(AnalysisSettings::default())
//!     .with_module(RmsdAnalysis::new(mask.clone(), mask));
//!
//! let mut output = Vec::new();
//! let summary = engine.run(&mut trajectory, &mut output).unwrap();
//! assert_eq!(summary.frames_processed(), 2);
//! ```

pub mod parallel;
pub mod rmsd;

pub use rmsd::RmsdAnalysis;

use getset::CopyGetters;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::{BitOr, BitOrAssign};
use std::path::Path;

use crate::config::AnalysisSettings;
use crate::errors::AnalysisError;
use crate::io::traj_io::FrameSource;
use crate::progress::{ProgressPrinter, ProgressStatus};
use crate::structures::{forcefield::MassLookup, frame::Frame};

/// Capabilities a module needs from the engine.
/// Requirements of all registered modules are merged using `|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirements {
    /// Atoms must have masses assigned.
    pub masses: bool,
    /// Atoms must be partitioned into molecules.
    pub molecules: bool,
    /// Module performs a data-parallel reduction and wants a thread count.
    pub parallel: bool,
    /// Module writes its results into its own file.
    pub output_file: bool,
}

impl Requirements {
    pub fn with_masses(mut self) -> Self {
        self.masses = true;
        self
    }

    pub fn with_molecules(mut self) -> Self {
        self.molecules = true;
        self
    }

    pub fn with_parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn with_output_file(mut self) -> Self {
        self.output_file = true;
        self
    }
}

impl BitOr for Requirements {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Requirements {
            masses: self.masses || rhs.masses,
            molecules: self.molecules || rhs.molecules,
            parallel: self.parallel || rhs.parallel,
            output_file: self.output_file || rhs.output_file,
        }
    }
}

impl BitOrAssign for Requirements {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// Information about the run provided to every module before the first frame is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct RunContext {
    /// Merged requirements of all modules.
    #[getset(get_copy = "pub")]
    requirements: Requirements,
    /// Number of threads available for data-parallel work. Always at least 1.
    #[getset(get_copy = "pub")]
    threads: usize,
    /// First frame to process (counted from 1).
    #[getset(get_copy = "pub")]
    start: usize,
    /// Process every `step`th frame.
    #[getset(get_copy = "pub")]
    step: usize,
    /// Maximal number of frames to read. Zero means all.
    #[getset(get_copy = "pub")]
    total_frames: usize,
}

/// Counts of frames handled during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
pub struct RunSummary {
    /// Number of frames read from the trajectory.
    #[getset(get_copy = "pub")]
    frames_read: usize,
    /// Number of frames handed to the modules.
    #[getset(get_copy = "pub")]
    frames_processed: usize,
}

/// Any analysis that can be plugged into the `AnalysisEngine` must implement this trait.
pub trait AnalysisModule {
    /// Name of the analysis used in messages.
    fn name(&self) -> &str;

    /// Capabilities required by the analysis.
    fn requirements(&self) -> Requirements {
        Requirements::default()
    }

    /// Called once before the first frame is read.
    fn prepare(&mut self, _context: &RunContext) -> Result<(), AnalysisError> {
        Ok(())
    }

    /// Called once with the first processed frame, before `process`.
    /// Typically used to resolve selections into atom indices.
    fn process_first_frame(&mut self, _frame: &Frame) -> Result<(), AnalysisError> {
        Ok(())
    }

    /// Called for every processed frame. `frame_number` is counted from 1
    /// and refers to the position of the frame in the trajectory.
    fn process(&mut self, frame: &Frame, frame_number: usize) -> Result<(), AnalysisError>;

    /// Write the results of the analysis. Called exactly once after the trajectory is exhausted.
    fn print(&mut self, output: &mut dyn Write) -> Result<(), AnalysisError>;

    /// File into which the results should be written instead of the engine's stream.
    fn output_path(&self) -> Option<&Path> {
        None
    }
}

/// Should the frame with the given number be processed?
#[inline(always)]
pub(crate) fn should_process(frame_number: usize, start: usize, step: usize) -> bool {
    frame_number >= start && (frame_number - start) % step == 0
}

/// Engine driving a set of analysis modules over a trajectory.
pub struct AnalysisEngine {
    settings: AnalysisSettings,
    modules: Vec<Box<dyn AnalysisModule>>,
    masses: Option<Box<dyn MassLookup>>,
    progress: Option<ProgressPrinter>,
}

impl AnalysisEngine {
    /// Create a new engine without any modules.
    pub fn new(settings: AnalysisSettings) -> Self {
        AnalysisEngine {
            settings,
            modules: Vec::new(),
            masses: None,
            progress: None,
        }
    }

    /// Register a module. Modules are processed in the order of registration.
    pub fn with_module(mut self, module: impl AnalysisModule + 'static) -> Self {
        self.add_module(Box::new(module));
        self
    }

    /// Register an already boxed module.
    pub fn add_module(&mut self, module: Box<dyn AnalysisModule>) {
        self.modules.push(module);
    }

    /// Assign masses to atoms of the first processed frame using the provided source.
    /// Centers of molecules are then mass-weighted.
    pub fn with_masses(mut self, lookup: impl MassLookup + 'static) -> Self {
        self.masses = Some(Box::new(lookup));
        self
    }

    /// Report progress of the run using the provided printer.
    pub fn with_progress(mut self, printer: ProgressPrinter) -> Self {
        self.progress = Some(printer);
        self
    }

    #[inline(always)]
    pub fn get_settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    #[inline(always)]
    pub fn n_modules(&self) -> usize {
        self.modules.len()
    }

    /// Merged requirements of all registered modules.
    pub fn requirements(&self) -> Requirements {
        self.modules
            .iter()
            .fold(Requirements::default(), |acc, module| acc | module.requirements())
    }

    /// Run all registered modules over the trajectory.
    ///
    /// Frames are counted from 1. Reading stops after `total_frames` frames
    /// (if non-zero) or at the end of the trajectory. A frame is processed if its number
    /// is at least `start` and `(number - start)` is divisible by `step`.
    ///
    /// After the trajectory is exhausted, every module prints its results,
    /// either into its own output file or into `output`.
    ///
    /// ## Returns
    /// `RunSummary` if successful. Otherwise the first error raised
    /// by the trajectory source, topology construction or any module.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        output: &mut dyn Write,
    ) -> Result<RunSummary, AnalysisError> {
        self.settings.validate()?;

        let requirements = self.requirements();
        if requirements.masses && self.masses.is_none() {
            let name = self
                .modules
                .iter()
                .find(|module| module.requirements().masses)
                .map_or("unknown", |module| module.name())
                .to_string();
            return Err(AnalysisError::MassesRequired(name));
        }

        let threads = if requirements.parallel {
            parallel::resolve_threads(self.settings.threads)
        } else {
            1
        };

        let context = RunContext {
            requirements,
            threads,
            start: self.settings.start,
            step: self.settings.step,
            total_frames: self.settings.total_frames,
        };

        for module in self.modules.iter_mut() {
            module.prepare(&context)?;
        }

        let mut summary = RunSummary::default();
        let result = self.read_frames(source, &context, &mut summary);

        if let Some(printer) = self.progress.as_mut() {
            printer.set_status(match result {
                Ok(_) => ProgressStatus::Completed,
                Err(_) => ProgressStatus::Failed,
            });
            printer.print(summary.frames_read, summary.frames_processed)?;
        }
        result?;

        self.print_results(output)?;
        Ok(summary)
    }

    /// Read the trajectory and pass frames to the modules.
    fn read_frames(
        &mut self,
        source: &mut dyn FrameSource,
        context: &RunContext,
        summary: &mut RunSummary,
    ) -> Result<(), AnalysisError> {
        let requirements = context.requirements;
        let mass_weighted = self.masses.is_some();
        let mut first = true;

        loop {
            if context.total_frames != 0 && summary.frames_read >= context.total_frames {
                break;
            }

            let frame = match source.next_frame() {
                None => break,
                Some(frame) => frame?,
            };

            summary.frames_read += 1;
            let frame_number = summary.frames_read;

            if should_process(frame_number, context.start, context.step) {
                if first {
                    if requirements.molecules && !frame.has_molecules() {
                        frame.build_molecules()?;
                    }

                    if let Some(lookup) = self.masses.as_ref() {
                        frame.assign_masses(lookup.as_ref())?;
                    }

                    for module in self.modules.iter_mut() {
                        module.process_first_frame(frame)?;
                    }

                    first = false;
                }

                if requirements.molecules {
                    frame.update_molecules(mass_weighted)?;
                }

                for module in self.modules.iter_mut() {
                    module.process(frame, frame_number)?;
                }

                summary.frames_processed += 1;
            }

            if let Some(printer) = self.progress.as_mut() {
                printer.print(summary.frames_read, summary.frames_processed)?;
            }
        }

        Ok(())
    }

    /// Let every module print its results.
    fn print_results(&mut self, output: &mut dyn Write) -> Result<(), AnalysisError> {
        for module in self.modules.iter_mut() {
            match module.output_path().map(Path::to_path_buf) {
                Some(path) => {
                    let file = File::create(&path)
                        .map_err(|_| AnalysisError::CouldNotCreate(Box::from(path.as_path())))?;
                    let mut writer = BufWriter::new(file);
                    module.print(&mut writer)?;
                    writer.flush()?;
                }
                None => module.print(output)?,
            }
        }

        output.flush()?;
        Ok(())
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
