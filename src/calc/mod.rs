//! File-based calculator boundary.
//!
//! A [`Calculator`] exchanges configurations with an external executable through CFG
//! files in a working directory: [`Calculator::write_input`] prepares the input file,
//! the caller runs the command line, then [`Calculator::read_results`] collects the
//! computed properties. Spawning the process is left to the caller.

mod error;

pub use error::Error;

use crate::io::{WriteMode, read_cfg_file, write_cfg_file};
use crate::model::configuration::{Configuration, Vector3};
use crate::model::mapping::TypeMap;
use crate::model::stress::Stress;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input file name the external executable reads.
pub const INPUT_FILE: &str = "ASE_IN.CFG";
/// Output file name the external executable writes.
pub const OUTPUT_FILE: &str = "ASE_OUT.CFG";

/// Properties computed for a single configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalcResults {
    pub energy: f64,
    pub forces: Vec<Vector3>,
    pub stress: Option<Stress>,
}

pub trait Calculator {
    /// Writes `config` as the calculator input, replacing any previous input.
    fn write_input(&self, config: &Configuration) -> Result<(), Error>;

    /// Reads the properties produced by the last run.
    fn read_results(&self) -> Result<CalcResults, Error>;
}

/// Energy, forces and stress through `mlp calc-efs`.
#[derive(Debug, Clone)]
pub struct MtpCalculator {
    workdir: PathBuf,
    exe: PathBuf,
    potential: PathBuf,
    types: TypeMap,
}

impl MtpCalculator {
    pub fn new(
        workdir: impl Into<PathBuf>,
        exe: impl Into<PathBuf>,
        potential: impl Into<PathBuf>,
        types: TypeMap,
    ) -> Self {
        Self {
            workdir: workdir.into(),
            exe: exe.into(),
            potential: potential.into(),
            types,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn types(&self) -> &TypeMap {
        &self.types
    }

    pub fn input_path(&self) -> PathBuf {
        self.workdir.join(INPUT_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.workdir.join(OUTPUT_FILE)
    }

    /// Program and arguments to run inside [`workdir`](Self::workdir).
    ///
    /// File names are relative, so the process must be started with the working
    /// directory as its current directory.
    pub fn command_line(&self) -> Vec<OsString> {
        vec![
            self.exe.clone().into_os_string(),
            "calc-efs".into(),
            self.potential.clone().into_os_string(),
            INPUT_FILE.into(),
            OUTPUT_FILE.into(),
        ]
    }
}

impl Calculator for MtpCalculator {
    fn write_input(&self, config: &Configuration) -> Result<(), Error> {
        // Only the geometry is sent; stale results must not leak into the input.
        let input = Configuration {
            forces: None,
            energy: None,
            stress: None,
            identification: None,
            ..config.clone()
        };
        let path = self.input_path();
        write_cfg_file(&path, [&input], &self.types, WriteMode::Truncate)?;
        debug!(path = %path.display(), atoms = input.atom_count(), "wrote calculator input");
        Ok(())
    }

    fn read_results(&self) -> Result<CalcResults, Error> {
        let path = self.output_path();
        let config = read_cfg_file(&path, &self.types)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyOutput(path.clone()))?;

        let energy = config.energy.ok_or(Error::MissingProperty("energy"))?;
        let forces = config.forces.ok_or(Error::MissingProperty("forces"))?;
        debug!(path = %path.display(), energy, stress = config.stress.is_some(), "read calculator results");

        Ok(CalcResults {
            energy,
            forces,
            stress: config.stress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn calculator(dir: &Path) -> MtpCalculator {
        MtpCalculator::new(
            dir,
            "mlp",
            "pot.mtp",
            TypeMap::from_labels(["Si", "O"]).unwrap(),
        )
    }

    fn quartz_fragment() -> Configuration {
        Configuration::builder()
            .atom("Si", [0.0, 0.0, 0.0])
            .atom("O", [1.6, 0.0, 0.0])
            .cell([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]], 3)
            .energy(-12.5)
            .forces(vec![[0.1, 0.0, 0.0], [-0.1, 0.0, 0.0]])
            .stress(Stress::new([0.5; 6]))
            .identification(9)
            .build()
            .unwrap()
    }

    #[test]
    fn command_line_uses_relative_exchange_files() {
        let calc = calculator(Path::new("/tmp/run"));
        let args: Vec<_> = calc
            .command_line()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(
            args,
            vec!["mlp", "calc-efs", "pot.mtp", "ASE_IN.CFG", "ASE_OUT.CFG"]
        );
        assert_eq!(calc.input_path(), Path::new("/tmp/run/ASE_IN.CFG"));
        assert_eq!(calc.output_path(), Path::new("/tmp/run/ASE_OUT.CFG"));
    }

    #[test]
    fn write_input_strips_computed_properties() {
        let dir = tempfile::tempdir().unwrap();
        let calc = calculator(dir.path());
        calc.write_input(&quartz_fragment()).unwrap();

        let text = fs::read_to_string(calc.input_path()).unwrap();
        assert!(text.contains("Supercell"));
        for keyword in ["Energy", "PlusStress", "Feature", "fx"] {
            assert!(!text.contains(keyword), "unexpected {keyword}");
        }
    }

    #[test]
    fn write_input_replaces_previous_input() {
        let dir = tempfile::tempdir().unwrap();
        let calc = calculator(dir.path());
        calc.write_input(&quartz_fragment()).unwrap();
        calc.write_input(&quartz_fragment()).unwrap();

        let text = fs::read_to_string(calc.input_path()).unwrap();
        assert_eq!(text.matches("BEGIN_CFG").count(), 1);
    }

    #[test]
    fn read_results_returns_first_frame_properties() {
        let dir = tempfile::tempdir().unwrap();
        let calc = calculator(dir.path());
        let frames = [quartz_fragment(), Configuration::new(vec!["O".into()], vec![[0.0; 3]])];
        write_cfg_file(calc.output_path(), &frames, calc.types(), WriteMode::Truncate).unwrap();

        let results = calc.read_results().unwrap();
        assert_eq!(results.energy, -12.5);
        assert_eq!(results.forces.len(), 2);
        let stress = results.stress.unwrap().components();
        for component in stress {
            assert!((component - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn missing_energy_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let calc = calculator(dir.path());
        let mut config = quartz_fragment();
        config.energy = None;
        write_cfg_file(calc.output_path(), [&config], calc.types(), WriteMode::Truncate).unwrap();

        let err = calc.read_results().unwrap_err();
        assert!(matches!(err, Error::MissingProperty("energy")));
    }

    #[test]
    fn missing_forces_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let calc = calculator(dir.path());
        let mut config = quartz_fragment();
        config.forces = None;
        write_cfg_file(calc.output_path(), [&config], calc.types(), WriteMode::Truncate).unwrap();

        let err = calc.read_results().unwrap_err();
        assert!(matches!(err, Error::MissingProperty("forces")));
    }

    #[test]
    fn empty_output_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let calc = calculator(dir.path());
        fs::write(calc.output_path(), "").unwrap();

        let err = calc.read_results().unwrap_err();
        assert!(matches!(err, Error::EmptyOutput(ref p) if p == &calc.output_path()));
    }

    #[test]
    fn missing_output_is_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = calculator(dir.path()).read_results().unwrap_err();
        assert!(matches!(err, Error::Codec(crate::io::Error::Io { .. })));
    }
}
