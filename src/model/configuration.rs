use super::stress::Stress;
use thiserror::Error;

/// Cartesian 3-vector.
pub type Vector3 = [f64; 3];

/// Lattice vectors stored row-wise: `cell[i]` is the i-th lattice vector.
pub type Cell = [[f64; 3]; 3];

/// Invariant violations detected when validating or building a [`Configuration`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("configuration contains no atoms")]
    Empty,

    #[error("{field} has {found} entries but the configuration has {expected} atoms")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("periodic rank must be between 0 and 3, got {0}")]
    PeriodicRank(usize),

    #[error("stress is undefined for a fully periodic cell with zero volume")]
    DegenerateCell,
}

/// A single atomic configuration: geometry plus optional computed properties.
///
/// `species`, `positions` and (when present) `forces` are index-aligned. Only the
/// first `periodic_rank` rows of `cell` are meaningful; periodic directions always
/// form a prefix of the axes, so rank 2 means the first two lattice vectors are
/// periodic and the third is not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    pub species: Vec<String>,
    pub positions: Vec<Vector3>,
    pub cell: Cell,
    pub periodic_rank: usize,
    pub forces: Option<Vec<Vector3>>,
    pub energy: Option<f64>,
    pub stress: Option<Stress>,
    pub identification: Option<i64>,
}

impl Configuration {
    /// Creates a non-periodic configuration without properties.
    pub fn new(species: Vec<String>, positions: Vec<Vector3>) -> Self {
        Self {
            species,
            positions,
            ..Self::default()
        }
    }

    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    /// Periodic boundary flags derived from the rank: the first `periodic_rank` axes are periodic.
    pub fn pbc(&self) -> [bool; 3] {
        [
            self.periodic_rank > 0,
            self.periodic_rank > 1,
            self.periodic_rank > 2,
        ]
    }

    #[inline]
    pub fn is_fully_periodic(&self) -> bool {
        self.periodic_rank == 3
    }

    /// Absolute volume spanned by all three rows of `cell`.
    pub fn volume(&self) -> f64 {
        cell_volume(&self.cell)
    }

    #[inline]
    pub fn has_forces(&self) -> bool {
        self.forces.is_some()
    }

    /// Checks the data-model invariants.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let n = self.positions.len();
        if n == 0 {
            return Err(ConfigurationError::Empty);
        }
        if self.species.len() != n {
            return Err(ConfigurationError::LengthMismatch {
                field: "species",
                expected: n,
                found: self.species.len(),
            });
        }
        if let Some(forces) = &self.forces {
            if forces.len() != n {
                return Err(ConfigurationError::LengthMismatch {
                    field: "forces",
                    expected: n,
                    found: forces.len(),
                });
            }
        }
        if self.periodic_rank > 3 {
            return Err(ConfigurationError::PeriodicRank(self.periodic_rank));
        }
        if self.stress.is_some() && self.is_fully_periodic() && self.volume() == 0.0 {
            return Err(ConfigurationError::DegenerateCell);
        }
        Ok(())
    }
}

pub(crate) fn cell_volume(cell: &Cell) -> f64 {
    let [a, b, c] = cell;
    let det = a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
        + a[2] * (b[0] * c[1] - b[1] * c[0]);
    det.abs()
}

/// Incremental constructor for [`Configuration`] that enforces its invariants on [`build`].
///
/// Lattice vectors are appended one at a time in axis order; the number appended becomes
/// the periodic rank.
///
/// [`build`]: ConfigurationBuilder::build
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    expected_atoms: Option<usize>,
    species: Vec<String>,
    positions: Vec<Vector3>,
    forces: Option<Vec<Vector3>>,
    lattice: Vec<Vector3>,
    energy: Option<f64>,
    stress: Option<Stress>,
    identification: Option<i64>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the atom count the finished configuration must have.
    pub fn expected_atoms(mut self, count: usize) -> Self {
        self.expected_atoms = Some(count);
        self
    }

    pub fn atom(mut self, species: impl Into<String>, position: Vector3) -> Self {
        self.species.push(species.into());
        self.positions.push(position);
        self
    }

    pub fn atoms(mut self, species: Vec<String>, positions: Vec<Vector3>) -> Self {
        self.species = species;
        self.positions = positions;
        self
    }

    pub fn forces(mut self, forces: Vec<Vector3>) -> Self {
        self.forces = Some(forces);
        self
    }

    pub fn forces_opt(mut self, forces: Option<Vec<Vector3>>) -> Self {
        self.forces = forces;
        self
    }

    pub fn lattice_vector(mut self, vector: Vector3) -> Self {
        self.lattice.push(vector);
        self
    }

    /// Sets the first `rank` rows of `cell` as the periodic lattice vectors.
    pub fn cell(mut self, cell: Cell, rank: usize) -> Self {
        self.lattice = cell.iter().take(rank).copied().collect();
        self
    }

    pub fn energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn energy_opt(mut self, energy: Option<f64>) -> Self {
        self.energy = energy;
        self
    }

    pub fn stress(mut self, stress: Stress) -> Self {
        self.stress = Some(stress);
        self
    }

    pub fn stress_opt(mut self, stress: Option<Stress>) -> Self {
        self.stress = stress;
        self
    }

    pub fn identification(mut self, id: i64) -> Self {
        self.identification = Some(id);
        self
    }

    pub fn identification_opt(mut self, id: Option<i64>) -> Self {
        self.identification = id;
        self
    }

    pub fn build(self) -> Result<Configuration, ConfigurationError> {
        if self.lattice.len() > 3 {
            return Err(ConfigurationError::PeriodicRank(self.lattice.len()));
        }
        if let Some(expected) = self.expected_atoms {
            if expected != self.positions.len() {
                return Err(ConfigurationError::LengthMismatch {
                    field: "positions",
                    expected,
                    found: self.positions.len(),
                });
            }
        }

        let mut cell = [[0.0; 3]; 3];
        for (row, vector) in cell.iter_mut().zip(&self.lattice) {
            *row = *vector;
        }

        let config = Configuration {
            species: self.species,
            positions: self.positions,
            cell,
            periodic_rank: self.lattice.len(),
            forces: self.forces,
            energy: self.energy,
            stress: self.stress,
            identification: self.identification,
        };
        config.validate()?;
        Ok(config)
    }
}
