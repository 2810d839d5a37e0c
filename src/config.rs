// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Configuration of an analysis run loaded from YAML.
//!
//! ## Example configuration
//! ```yaml
//! settings:
//!   start: 1
//!   step: 2
//!   total_frames: 0
//!   threads: 0
//!   progress: true
//! element_masses: true
//! rmsd:
//!   - superpose: "@CA"
//!     rms: ":1-10"
//!     output: rmsd.dat
//!     matrix: rmsd_matrix.dat
//! ```

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisEngine, RmsdAnalysis};
use crate::errors::ConfigError;
use crate::progress::ProgressPrinter;
use crate::select::AmberMask;
use crate::structures::forcefield::ElementMasses;

/// Frame selection and execution settings of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSettings {
    /// First frame to process. Frames are counted from 1. Default: 1.
    pub start: usize,
    /// Process every `step`th frame starting from `start`. Default: 1.
    pub step: usize,
    /// Maximal number of frames to read. Zero means the whole trajectory.
    /// Must not be smaller than `start` unless zero. Default: 0.
    pub total_frames: usize,
    /// Number of threads for data-parallel work. Zero means all available cores. Default: 0.
    pub threads: usize,
    /// Print progress of the run to standard error. Default: false.
    pub progress: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            start: 1,
            step: 1,
            total_frames: 0,
            threads: 0,
            progress: false,
        }
    }
}

impl AnalysisSettings {
    /// Check that the settings describe a valid frame selection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step == 0 {
            return Err(ConfigError::InvalidStep(self.step));
        }

        if self.start == 0 {
            return Err(ConfigError::InvalidStart(self.start));
        }

        if self.total_frames != 0 && self.total_frames < self.start {
            return Err(ConfigError::InvalidEnd(self.total_frames, self.start));
        }

        Ok(())
    }
}

/// Configuration of a single RMSD analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RmsdConfig {
    /// Atoms used for the superposition.
    pub superpose: AmberMask,
    /// Atoms used for the RMSD calculation in addition to the superposed atoms.
    pub rms: AmberMask,
    /// File to write the RMSD values to. If not set, values are written to the engine's stream.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// File to write the pairwise RMSD matrix to. The matrix is only calculated if set.
    #[serde(default)]
    pub matrix: Option<PathBuf>,
}

/// Complete configuration of an analysis run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub settings: AnalysisSettings,
    /// Assign masses based on element symbols (guessed from atom names if missing).
    pub element_masses: bool,
    /// Masses of atom types (or atom names for atoms without a type).
    /// Takes precedence over `element_masses` if not empty.
    pub masses: IndexMap<String, f64>,
    /// RMSD analyses to perform.
    pub rmsd: Vec<RmsdConfig>,
}

impl AnalysisConfig {
    /// Read configuration from a YAML file.
    ///
    /// ## Returns
    /// - `ConfigError::FileNotFound` if the file could not be read.
    /// - `ConfigError::CouldNotParse` if the content is not a valid configuration.
    pub fn from_file(filename: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(filename.as_ref())
            .map_err(|_| ConfigError::FileNotFound(Box::from(filename.as_ref())))?;

        AnalysisConfig::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::CouldNotParse(e.to_string()))?;

        config.settings.validate()?;
        Ok(config)
    }

    /// Construct an `AnalysisEngine` with all configured analyses registered.
    pub fn build_engine(&self) -> Result<AnalysisEngine, ConfigError> {
        self.settings.validate()?;

        let mut engine = AnalysisEngine::new(self.settings.clone());

        if self.settings.progress {
            engine = engine.with_progress(ProgressPrinter::new());
        }

        if !self.masses.is_empty() {
            let table: HashMap<String, f64> = self
                .masses
                .iter()
                .map(|(name, &mass)| (name.clone(), mass))
                .collect();
            engine = engine.with_masses(table);
        } else if self.element_masses {
            engine = engine.with_masses(ElementMasses);
        }

        for rmsd in self.rmsd.iter() {
            engine.add_module(Box::new(RmsdAnalysis::from_config(rmsd)));
        }

        Ok(engine)
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisModule;
    use crate::errors::AnalysisError;
    use crate::io::arc_io::ArcReader;
    use crate::structures::frame::Frame;
    use float_cmp::assert_approx_eq;
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    /// Stores masses of atoms in the first processed frame.
    struct MassObserver(Rc<RefCell<Vec<Option<f64>>>>);

    impl AnalysisModule for MassObserver {
        fn name(&self) -> &str {
            "mass observer"
        }

        fn process_first_frame(&mut self, frame: &Frame) -> Result<(), AnalysisError> {
            *self.0.borrow_mut() = frame.atoms().iter().map(|atom| atom.get_mass()).collect();
            Ok(())
        }

        fn process(&mut self, _frame: &Frame, _frame_number: usize) -> Result<(), AnalysisError> {
            Ok(())
        }

        fn print(&mut self, _output: &mut dyn Write) -> Result<(), AnalysisError> {
            Ok(())
        }
    }

    fn observe_masses(yaml: &str) -> Vec<Option<f64>> {
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        let mut engine = config.build_engine().unwrap();

        let masses = Rc::new(RefCell::new(Vec::new()));
        engine.add_module(Box::new(MassObserver(Rc::clone(&masses))));

        let mut reader = ArcReader::open("test_files/peptide.arc").unwrap();
        engine.run(&mut reader, &mut std::io::sink()).unwrap();

        let observed = masses.borrow().clone();
        observed
    }

    #[test]
    fn default_settings() {
        let settings = AnalysisSettings::default();
        assert_eq!(settings.start, 1);
        assert_eq!(settings.step, 1);
        assert_eq!(settings.total_frames, 0);
        assert_eq!(settings.threads, 0);
        assert!(!settings.progress);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_fails() {
        let settings = AnalysisSettings {
            step: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::InvalidStep(0)));

        let settings = AnalysisSettings {
            start: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::InvalidStart(0)));

        let settings = AnalysisSettings {
            start: 5,
            total_frames: 3,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::InvalidEnd(3, 5)));

        // the last read frame is the start frame
        let settings = AnalysisSettings {
            start: 5,
            total_frames: 5,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn from_file() {
        let config = AnalysisConfig::from_file("test_files/config.yaml").unwrap();

        assert_eq!(config.settings.start, 2);
        assert_eq!(config.settings.step, 3);
        assert_eq!(config.settings.total_frames, 100);
        assert_eq!(config.settings.threads, 2);
        assert!(!config.settings.progress);
        assert!(config.element_masses);
        assert!(config.masses.is_empty());

        assert_eq!(config.rmsd.len(), 2);
        assert_eq!(config.rmsd[0].superpose, AmberMask::parse("@CA").unwrap());
        assert_eq!(config.rmsd[0].rms, AmberMask::parse(":1-10 & !@H*").unwrap());
        assert_eq!(config.rmsd[0].output, Some(PathBuf::from("rmsd.dat")));
        assert_eq!(config.rmsd[0].matrix, None);

        assert_eq!(config.rmsd[1].superpose, AmberMask::parse(":LIG").unwrap());
        assert_eq!(config.rmsd[1].output, None);
        assert_eq!(config.rmsd[1].matrix, Some(PathBuf::from("matrix.dat")));

        let engine = config.build_engine().unwrap();
        assert_eq!(engine.n_modules(), 2);
        assert_eq!(engine.get_settings(), &config.settings);
        assert!(engine.requirements().parallel);
        assert!(engine.requirements().output_file);
    }

    #[test]
    fn run_configured_engine() {
        let yaml = "rmsd:\n  - superpose: \"@CA\"\n    rms: \"@CA,CB\"\n";
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        let mut engine = config.build_engine().unwrap();

        let mut reader = ArcReader::open("test_files/peptide.arc").unwrap();
        let mut output = Vec::new();
        let summary = engine.run(&mut reader, &mut output).unwrap();
        assert_eq!(summary.frames_read(), 3);
        assert_eq!(summary.frames_processed(), 3);

        let expected = std::fs::read_to_string("test_files/rmsd_expected.dat").unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }

    #[test]
    fn from_file_nonexistent() {
        match AnalysisConfig::from_file("test_files/nonexistent.yaml") {
            Err(ConfigError::FileNotFound(path)) => {
                assert_eq!(path, Box::from(Path::new("test_files/nonexistent.yaml")))
            }
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn from_yaml_defaults() {
        let config = AnalysisConfig::from_yaml("rmsd:\n  - superpose: \"@CA\"\n    rms: \"@CA\"\n").unwrap();

        assert_eq!(config.settings, AnalysisSettings::default());
        assert!(!config.element_masses);
        assert_eq!(config.rmsd.len(), 1);
    }

    #[test]
    fn from_yaml_masses() {
        let yaml = "masses:\n  OT: 15.999\n  HT: 1.008\n";
        let config = AnalysisConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.masses.len(), 2);
        assert_eq!(config.masses.get_index(0), Some((&"OT".to_string(), &15.999)));
        assert!(config.rmsd.is_empty());
    }

    #[test]
    fn run_with_element_masses() {
        let masses = observe_masses("element_masses: true\n");
        assert_eq!(masses.len(), 5);
        for mass in masses {
            assert_approx_eq!(f64, mass.unwrap(), 12.011);
        }
    }

    #[test]
    fn run_with_mass_table() {
        let masses = observe_masses("element_masses: true\nmasses:\n  CA: 12.5\n  CB: 14.0\n");
        let expected = [12.5, 14.0, 12.5, 12.5, 12.5];
        for (mass, expected) in masses.into_iter().zip(expected) {
            assert_approx_eq!(f64, mass.unwrap(), expected);
        }
    }

    #[test]
    fn run_without_masses() {
        let masses = observe_masses("settings:\n  step: 1\n");
        assert_eq!(masses, vec![None; 5]);
    }

    macro_rules! config_fails {
        ($name:ident, $yaml:expr, $pattern:pat) => {
            #[test]
            fn $name() {
                match AnalysisConfig::from_yaml($yaml) {
                    Err($pattern) => (),
                    other => panic!("Unexpected result {:?}", other),
                }
            }
        };
    }

    config_fails!(
        fails_invalid_mask,
        "rmsd:\n  - superpose: \"@CA &\"\n    rms: \"@CA\"\n",
        ConfigError::CouldNotParse(_)
    );
    config_fails!(
        fails_unknown_field,
        "settings:\n  stride: 2\n",
        ConfigError::CouldNotParse(_)
    );
    config_fails!(
        fails_missing_rms,
        "rmsd:\n  - superpose: \"@CA\"\n",
        ConfigError::CouldNotParse(_)
    );
    config_fails!(
        fails_zero_step,
        "settings:\n  step: 0\n",
        ConfigError::InvalidStep(0)
    );
    config_fails!(
        fails_zero_start,
        "settings:\n  start: 0\n",
        ConfigError::InvalidStart(0)
    );
    config_fails!(
        fails_end_before_start,
        "settings:\n  start: 5\n  total_frames: 3\n",
        ConfigError::InvalidEnd(3, 5)
    );
}
