// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Root-mean-square deviation of a selection from its structure in the first processed frame.

use hashbrown::HashSet;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::alignment::{center, quatfit, rmsfit};
use crate::config::RmsdConfig;
use crate::errors::{AlignmentError, AnalysisError};
use crate::select::AmberMask;
use crate::structures::{frame::Frame, vector3d::Vector3D};

use super::parallel::pairwise_rmsd;
use super::{AnalysisModule, Requirements, RunContext};

/// Calculates RMSD of atoms selected by `superpose` and `rms` masks after superposing
/// atoms selected by `superpose` mask onto the reference structure.
///
/// The reference structure is the first processed frame and it is never updated.
pub struct RmsdAnalysis {
    superpose_mask: AmberMask,
    rms_mask: AmberMask,
    output: Option<PathBuf>,
    matrix: Option<PathBuf>,
    threads: usize,
    /// Indices of atoms in the coordinate layout: fitted atoms first, then rms-only atoms.
    layout: Vec<usize>,
    /// Number of fitted atoms at the start of the layout.
    nfit: usize,
    /// Centered coordinates of the first processed frame.
    reference: Option<Vec<Vector3D>>,
    values: IndexMap<usize, f64>,
    /// Uncentered coordinates of fitted atoms from every processed frame.
    fit_coordinates: Vec<Vec<Vector3D>>,
}

impl RmsdAnalysis {
    /// Create a new RMSD analysis writing its results into the engine's stream.
    pub fn new(superpose_mask: AmberMask, rms_mask: AmberMask) -> Self {
        RmsdAnalysis {
            superpose_mask,
            rms_mask,
            output: None,
            matrix: None,
            threads: 1,
            layout: Vec::new(),
            nfit: 0,
            reference: None,
            values: IndexMap::new(),
            fit_coordinates: Vec::new(),
        }
    }

    /// Write the RMSD values into the specified file.
    pub fn with_output(mut self, output: impl AsRef<Path>) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    /// Calculate the pairwise RMSD matrix of all processed frames and write it into the specified file.
    pub fn with_matrix(mut self, matrix: impl AsRef<Path>) -> Self {
        self.matrix = Some(matrix.as_ref().to_path_buf());
        self
    }

    pub fn from_config(config: &RmsdConfig) -> Self {
        RmsdAnalysis {
            output: config.output.clone(),
            matrix: config.matrix.clone(),
            ..RmsdAnalysis::new(config.superpose.clone(), config.rms.clone())
        }
    }

    /// Get the calculated RMSD values indexed by frame numbers.
    #[inline(always)]
    pub fn get_values(&self) -> &IndexMap<usize, f64> {
        &self.values
    }

    /// Extract coordinates of the layout atoms. All atoms are made whole
    /// relative to the first atom of the layout.
    fn extract(&self, frame: &Frame) -> Result<Vec<Vector3D>, AnalysisError> {
        let atoms = frame.atoms();
        let Some(first) = self.layout.first().and_then(|&index| atoms.get(index)) else {
            return Err(AnalysisError::EmptySelection(self.superpose_mask.to_string()));
        };
        let first = *first.get_position();

        let mut coordinates = Vec::with_capacity(self.layout.len());
        for &index in self.layout.iter() {
            let atom = atoms
                .get(index)
                .ok_or(AlignmentError::InconsistentSize(self.layout.len(), atoms.len()))?;
            coordinates.push(first + frame.image_vector(*atom.get_position() - first));
        }

        Ok(coordinates)
    }

    /// Write the pairwise RMSD matrix into a file.
    fn write_matrix(&self, path: &Path) -> Result<(), AnalysisError> {
        let matrix = pairwise_rmsd(&self.fit_coordinates, self.threads)?;

        let file = File::create(path).map_err(|_| AnalysisError::CouldNotCreate(Box::from(path)))?;
        let mut writer = BufWriter::new(file);

        for row in matrix.rows() {
            for value in row.iter() {
                write!(writer, "{:>12.6}", value)?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl AnalysisModule for RmsdAnalysis {
    fn name(&self) -> &str {
        "rmsd"
    }

    fn requirements(&self) -> Requirements {
        let mut requirements = Requirements::default();
        if self.output.is_some() {
            requirements = requirements.with_output_file();
        }
        if self.matrix.is_some() {
            requirements = requirements.with_parallel();
        }

        requirements
    }

    fn prepare(&mut self, context: &RunContext) -> Result<(), AnalysisError> {
        self.threads = context.threads();
        Ok(())
    }

    fn process_first_frame(&mut self, frame: &Frame) -> Result<(), AnalysisError> {
        let fit = frame.select(&self.superpose_mask)?;
        if fit.is_empty() {
            return Err(AnalysisError::EmptySelection(self.superpose_mask.to_string()));
        }

        let rms = frame.select(&self.rms_mask)?;
        if rms.is_empty() {
            return Err(AnalysisError::EmptySelection(self.rms_mask.to_string()));
        }

        let mut in_layout: HashSet<usize> = fit.iter().copied().collect();

        self.nfit = fit.len();
        self.layout = fit;

        for atom in rms {
            if in_layout.insert(atom) {
                self.layout.push(atom);
            }
        }

        Ok(())
    }

    fn process(&mut self, frame: &Frame, frame_number: usize) -> Result<(), AnalysisError> {
        let mut coordinates = self.extract(frame)?;

        if self.matrix.is_some() {
            self.fit_coordinates.push(coordinates[..self.nfit].to_vec());
        }

        center(&mut coordinates, self.nfit);

        match self.reference.as_ref() {
            None => {
                self.values.insert(frame_number, 0.0);
                self.reference = Some(coordinates);
            }
            Some(reference) => {
                let superposition = quatfit(reference, &mut coordinates, self.nfit)?;
                if !superposition.converged() {
                    eprintln!("{}", AlignmentError::NotConvergedWarning(superposition.sweeps()));
                }

                let value = rmsfit(reference, &coordinates)?;
                self.values.insert(frame_number, value);
            }
        }

        Ok(())
    }

    fn print(&mut self, output: &mut dyn Write) -> Result<(), AnalysisError> {
        writeln!(output, "# superpose mask: {}", self.superpose_mask)?;
        writeln!(output, "# rms mask: {}", self.rms_mask)?;
        writeln!(output, "# {:>7} {:>14}", "frame", "rmsd")?;

        for (frame, value) in self.values.iter() {
            writeln!(output, "{:>9} {:>14.6}", frame, value)?;
        }

        if let Some(path) = self.matrix.as_deref() {
            self.write_matrix(path)?;
        }

        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisEngine;
    use crate::config::AnalysisSettings;
    use crate::io::traj_io::MemoryTrajectory;
    use crate::structures::{atom::Atom, simbox::SimBox};
    use file_diff::diff_files;
    use float_cmp::assert_approx_eq;
    use nalgebra::{Rotation3, Vector3};
    use std::fs::File;

    fn topology() -> Frame {
        let atoms = vec![
            Atom::new(1, "CA", [0.0, 0.0, 0.0].into()).with_residue("ALA", 1),
            Atom::new(2, "CB", [-0.5, -0.5, 1.0].into()).with_residue("ALA", 1),
            Atom::new(3, "CA", [1.5, 0.0, 0.0].into()).with_residue("GLY", 2),
            Atom::new(4, "CA", [1.5, 1.5, 0.0].into()).with_residue("SER", 3),
            Atom::new(5, "CA", [0.0, 1.5, 1.0].into()).with_residue("LYS", 4),
        ];

        Frame::new("peptide", atoms, None).unwrap()
    }

    /// Reference structure, the same structure rotated and translated,
    /// and the reference with the CB atom shifted by 1 along z.
    fn positions() -> Vec<Vec<Vector3D>> {
        let reference: Vec<Vector3D> = topology()
            .atoms()
            .iter()
            .map(|atom| *atom.get_position())
            .collect();

        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.7);
        let moved = reference
            .iter()
            .map(|p| Vector3D::from(rotation * p.0) + Vector3D::new(3.0, -1.0, 2.0))
            .collect();

        let mut shifted = reference.clone();
        shifted[1] = shifted[1] + Vector3D::new(0.0, 0.0, 1.0);

        vec![reference, moved, shifted]
    }

    fn run(analysis: RmsdAnalysis, settings: AnalysisSettings) -> (AnalysisEngine, String) {
        let mut trajectory = MemoryTrajectory::new(topology(), positions());
        let mut engine = AnalysisEngine::new(settings).with_module(analysis);

        let mut output = Vec::new();
        engine.run(&mut trajectory, &mut output).unwrap();
        (engine, String::from_utf8(output).unwrap())
    }

    fn mask(query: &str) -> AmberMask {
        AmberMask::parse(query).unwrap()
    }

    fn process_all(analysis: &mut RmsdAnalysis, frames: &[Vec<Vector3D>]) {
        let mut frame = topology();
        for (i, positions) in frames.iter().enumerate() {
            frame.set_positions(positions).unwrap();
            if i == 0 {
                analysis.process_first_frame(&frame).unwrap();
            }
            analysis.process(&frame, i + 1).unwrap();
        }
    }

    #[test]
    fn layout() {
        let mut analysis = RmsdAnalysis::new(mask("@CA"), mask(":1"));
        analysis.process_first_frame(&topology()).unwrap();

        assert_eq!(analysis.layout, vec![0, 2, 3, 4, 1]);
        assert_eq!(analysis.nfit, 4);

        let mut analysis = RmsdAnalysis::new(mask(":1"), mask("@CA"));
        analysis.process_first_frame(&topology()).unwrap();

        assert_eq!(analysis.layout, vec![0, 1, 2, 3, 4]);
        assert_eq!(analysis.nfit, 2);
    }

    #[test]
    fn first_frame_zero() {
        let mut analysis = RmsdAnalysis::new(mask("@CA"), mask("@CA"));
        process_all(&mut analysis, &positions()[..1]);

        assert_eq!(analysis.get_values().len(), 1);
        assert_eq!(analysis.get_values().get(&1), Some(&0.0));
    }

    #[test]
    fn all_atoms() {
        let mut analysis = RmsdAnalysis::new(mask("@CA"), mask("@CA,CB"));
        process_all(&mut analysis, &positions());

        let values = analysis.get_values();
        assert_eq!(values.keys().copied().collect::<Vec<usize>>(), vec![1, 2, 3]);
        assert_eq!(values[&1], 0.0);
        assert_approx_eq!(f64, values[&2], 0.0, epsilon = 1e-8);
        assert_approx_eq!(f64, values[&3], (1.0f64 / 5.0).sqrt(), epsilon = 1e-8);
    }

    #[test]
    fn rms_only_atoms() {
        let mut analysis = RmsdAnalysis::new(mask("@CA"), mask("@CB"));
        process_all(&mut analysis, &positions());

        // value is calculated over the fitted atoms together with the rms atoms
        let values = analysis.get_values();
        assert_approx_eq!(f64, values[&2], 0.0, epsilon = 1e-8);
        assert_approx_eq!(f64, values[&3], (1.0f64 / 5.0).sqrt(), epsilon = 1e-8);
        assert_eq!(analysis.layout, vec![0, 2, 3, 4, 1]);
    }

    #[test]
    fn fitted_atoms_only() {
        let mut analysis = RmsdAnalysis::new(mask("@CA"), mask("@CA"));
        process_all(&mut analysis, &positions());

        for value in analysis.get_values().values() {
            assert_approx_eq!(f64, *value, 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn periodic_unwrapping() {
        let atoms = vec![
            Atom::new(1, "CA", [9.5, 5.0, 5.0].into()).with_residue("ALA", 1),
            Atom::new(2, "CA", [0.5, 5.0, 5.0].into()).with_residue("ALA", 2),
            Atom::new(3, "CA", [0.5, 6.0, 5.0].into()).with_residue("ALA", 3),
            Atom::new(4, "CA", [9.5, 6.0, 6.0].into()).with_residue("ALA", 4),
        ];
        let simbox = SimBox::orthogonal([10.0, 10.0, 10.0].into());
        let mut frame = Frame::new("wrapped", atoms, Some(simbox)).unwrap();

        let mut analysis = RmsdAnalysis::new(mask("@CA"), mask("@CA"));
        analysis.process_first_frame(&frame).unwrap();
        analysis.process(&frame, 1).unwrap();

        // the whole structure shifted by +1 along x and wrapped into the box
        let shifted: Vec<Vector3D> = vec![
            [0.5, 5.0, 5.0].into(),
            [1.5, 5.0, 5.0].into(),
            [1.5, 6.0, 5.0].into(),
            [0.5, 6.0, 6.0].into(),
        ];
        frame.set_positions(&shifted).unwrap();
        analysis.process(&frame, 2).unwrap();

        assert_approx_eq!(f64, analysis.get_values()[&2], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn not_converged_value_kept() {
        let mut broken = positions()[0].clone();
        broken[2] = Vector3D::new(f64::NAN, 0.0, 0.0);
        let frames = vec![positions()[0].clone(), broken, positions()[1].clone()];

        let mut analysis = RmsdAnalysis::new(mask("@CA"), mask("@CA"));
        process_all(&mut analysis, &frames);

        let values = analysis.get_values();
        assert_eq!(values.keys().copied().collect::<Vec<usize>>(), vec![1, 2, 3]);
        assert!(values[&2].is_nan());
        assert_approx_eq!(f64, values[&3], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn empty_selection() {
        let mut analysis = RmsdAnalysis::new(mask("@N"), mask("@CA"));
        match analysis.process_first_frame(&topology()) {
            Err(AnalysisError::EmptySelection(query)) => assert_eq!(query, "@N"),
            other => panic!("Unexpected result {:?}", other),
        }

        let mut analysis = RmsdAnalysis::new(mask("@CA"), mask(":5"));
        match analysis.process_first_frame(&topology()) {
            Err(AnalysisError::EmptySelection(query)) => assert_eq!(query, ":5"),
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn invalid_context() {
        // atoms have no molecules assigned
        let mut analysis = RmsdAnalysis::new(mask("$1"), mask("@CA"));
        assert!(matches!(
            analysis.process_first_frame(&topology()),
            Err(AnalysisError::Select(_))
        ));
    }

    #[test]
    fn requirements() {
        let analysis = RmsdAnalysis::new(mask("@CA"), mask("@CA"));
        assert_eq!(analysis.requirements(), Requirements::default());
        assert_eq!(analysis.output_path(), None);

        let analysis = RmsdAnalysis::new(mask("@CA"), mask("@CA"))
            .with_output("rmsd.dat")
            .with_matrix("matrix.dat");
        assert_eq!(
            analysis.requirements(),
            Requirements::default().with_output_file().with_parallel()
        );
        assert_eq!(analysis.output_path(), Some(Path::new("rmsd.dat")));
    }

    #[test]
    fn from_config() {
        let config = RmsdConfig {
            superpose: mask("@CA"),
            rms: mask(":1-2"),
            output: Some(PathBuf::from("rmsd.dat")),
            matrix: None,
        };

        let analysis = RmsdAnalysis::from_config(&config);
        assert_eq!(analysis.superpose_mask, config.superpose);
        assert_eq!(analysis.rms_mask, config.rms);
        assert_eq!(analysis.output_path(), Some(Path::new("rmsd.dat")));
        assert_eq!(analysis.matrix, None);
    }

    #[test]
    fn report() {
        let (_, output) = run(
            RmsdAnalysis::new(mask("@CA"), mask("@CA,CB")),
            AnalysisSettings::default(),
        );

        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("rmsd.dat");
        std::fs::write(&path, output).unwrap();

        let mut result = File::open(&path).unwrap();
        let mut expected = File::open("test_files/rmsd_expected.dat").unwrap();
        assert!(diff_files(&mut result, &mut expected));
    }

    #[test]
    fn report_to_file_with_step() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("rmsd.dat");

        let settings = AnalysisSettings {
            step: 2,
            ..Default::default()
        };
        let (_, output) = run(
            RmsdAnalysis::new(mask("@CA"), mask("@CA,CB")).with_output(&path),
            settings,
        );
        assert!(output.is_empty());

        let mut result = File::open(&path).unwrap();
        let mut expected = File::open("test_files/rmsd_step_expected.dat").unwrap();
        assert!(diff_files(&mut result, &mut expected));
    }

    fn read_matrix(path: &Path) -> Vec<Vec<f64>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| {
                line.split_whitespace()
                    .map(|value| value.parse::<f64>().unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn matrix() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("matrix.dat");

        let settings = AnalysisSettings {
            threads: 2,
            ..Default::default()
        };
        run(
            RmsdAnalysis::new(mask("@CA"), mask("@CA")).with_matrix(&path),
            settings,
        );

        // frames differ only in the position of a non-fitted atom
        let rows = read_matrix(&path);
        assert_eq!(rows.len(), 3);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), 3);
            assert_eq!(row[i], 0.0);
            for value in row {
                assert_approx_eq!(f64, *value, 0.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn matrix_distorted_fit() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("matrix.dat");

        let mut frames = positions();
        let mut distorted = frames[0].clone();
        distorted[4] = Vector3D::new(0.0, 1.5, 2.0);
        frames.push(distorted);

        let mut trajectory = MemoryTrajectory::new(topology(), frames);
        let settings = AnalysisSettings {
            threads: 3,
            ..Default::default()
        };
        let mut engine = AnalysisEngine::new(settings)
            .with_module(RmsdAnalysis::new(mask("@CA"), mask("@CA")).with_matrix(&path));
        engine.run(&mut trajectory, &mut std::io::sink()).unwrap();

        let rows = read_matrix(&path);
        assert_eq!(rows.len(), 4);
        for i in 0..4 {
            assert_eq!(rows[i].len(), 4);
            assert_eq!(rows[i][i], 0.0);
            for j in 0..4 {
                assert_eq!(rows[i][j], rows[j][i]);
            }
        }

        assert!(rows[0][3] > 0.1);
        assert_approx_eq!(f64, rows[0][3], rows[1][3], epsilon = 1e-6);
        assert_approx_eq!(f64, rows[0][3], rows[2][3], epsilon = 1e-6);
        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            assert_approx_eq!(f64, rows[i][j], 0.0, epsilon = 1e-6);
        }
    }
}
