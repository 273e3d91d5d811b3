//! Reader and writer for the CFG atomic-configuration format used by Moment Tensor
//! Potential (MTP) training and evaluation tools.
//!
//! A CFG stream is a sequence of `BEGIN_CFG` … `END_CFG` blocks, each describing one
//! atomic configuration: atom count, optional periodic lattice vectors, per-atom
//! integer types and Cartesian positions, and optionally forces, total energy, a
//! volume-scaled stress tensor and an integer identification tag.
//!
//! # Features
//!
//! - **Lossless round trips** — floats are written in shortest round-trip form, so a
//!   written configuration reads back bit-identical apart from stress rescaling
//! - **Partial periodicity** — periodic rank 0 through 3, one `Supercell` row per
//!   periodic axis
//! - **Injected type mapping** — species labels are translated to CFG type IDs
//!   through any [`TypeMapping`]; [`TypeMap`] loads one from TOML
//! - **Streaming** — [`CfgReader::frames`] yields one configuration at a time, and
//!   every parse error carries the offending line number
//! - **Calculator exchange** — [`calc::MtpCalculator`] prepares input and collects
//!   results for the `mlp calc-efs` command
//!
//! # Quick Start
//!
//! ```
//! use mtp_cfg::{CfgReader, CfgWriter, Configuration, Stress, TypeMap};
//! use std::io::Cursor;
//!
//! let types = TypeMap::from_labels(["Si"])?;
//!
//! let config = Configuration::builder()
//!     .atom("Si", [0.0, 0.0, 0.0])
//!     .cell([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]], 3)
//!     .energy(-5.0)
//!     .stress(Stress::new([1.0, 1.0, 1.0, 0.0, 0.0, 0.0]))
//!     .build()?;
//!
//! let mut buf = Vec::new();
//! CfgWriter::new(&mut buf, &types).write_one(&config)?;
//!
//! // Stress is stored as -stress * volume.
//! let text = String::from_utf8(buf.clone()).unwrap();
//! assert!(text.contains("-27 -27 -27 0 0 0"));
//!
//! let frames = CfgReader::new(Cursor::new(buf), &types).read()?;
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].species, vec!["Si"]);
//! assert_eq!(frames[0].energy, Some(-5.0));
//! assert_eq!(frames[0].pbc(), [true, true, true]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`] — CFG reader, writer and path-based helpers
//! - [`calc`] — Calculator exchange through CFG files
//!
//! # Data Types
//!
//! - [`Configuration`] — Species, positions, cell, periodic rank and optional properties
//! - [`ConfigurationBuilder`] — Incremental construction with validation
//! - [`Stress`] — Voigt-ordered stress (`xx yy zz yz xz xy`)
//! - [`TypeMap`] — Bijective species ⇄ type ID mapping

mod model;

pub mod calc;
pub mod io;

pub use model::configuration::{
    Cell, Configuration, ConfigurationBuilder, ConfigurationError, Vector3,
};
pub use model::mapping::{TypeMap, TypeMapError, TypeMapping};
pub use model::stress::Stress;

pub use io::{CfgReader, CfgWriter, WriteMode, read_cfg_file, write_cfg_file};
