//! Reading and writing CFG streams.
//!
//! [`CfgReader`] and [`CfgWriter`] wrap any `BufRead` / `Write` together with the
//! [`TypeMapping`] used to translate species labels. [`read_cfg_file`] and
//! [`write_cfg_file`] are path-based shorthands; the file handle is closed when they
//! return, on success or error.

use crate::model::configuration::Configuration;
use crate::model::mapping::TypeMapping;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub mod cfg;
pub mod error;

pub use cfg::State;
pub use cfg::reader::Frames;
pub use error::Error;

/// How [`write_cfg_file`] opens an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Truncate,
    Append,
}

pub struct CfgReader<R: BufRead, M: TypeMapping> {
    reader: R,
    types: M,
}

impl<R: BufRead, M: TypeMapping> CfgReader<R, M> {
    pub fn new(reader: R, types: M) -> Self {
        Self { reader, types }
    }

    /// Streams configurations one block at a time.
    pub fn frames(self) -> Frames<R, M> {
        Frames::new(self.reader, self.types)
    }

    pub fn read(self) -> Result<Vec<Configuration>, Error> {
        cfg::reader::read(self.reader, self.types)
    }
}

pub struct CfgWriter<W: Write, M: TypeMapping> {
    writer: W,
    types: M,
}

impl<W: Write, M: TypeMapping> CfgWriter<W, M> {
    pub fn new(writer: W, types: M) -> Self {
        Self { writer, types }
    }

    pub fn write<'a, I>(&mut self, frames: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = &'a Configuration>,
    {
        cfg::writer::write(&mut self.writer, frames, &self.types)
    }

    pub fn write_one(&mut self, config: &Configuration) -> Result<(), Error> {
        self.write(std::iter::once(config))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub fn read_cfg_file<M: TypeMapping>(
    path: impl AsRef<Path>,
    types: M,
) -> Result<Vec<Configuration>, Error> {
    let file = File::open(path)?;
    CfgReader::new(BufReader::new(file), types).read()
}

pub fn write_cfg_file<'a, M, I>(
    path: impl AsRef<Path>,
    frames: I,
    types: M,
    mode: WriteMode,
) -> Result<(), Error>
where
    M: TypeMapping,
    I: IntoIterator<Item = &'a Configuration>,
{
    let file = match mode {
        WriteMode::Truncate => File::create(path)?,
        WriteMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
    };
    let mut writer = CfgWriter::new(BufWriter::new(file), types);
    writer.write(frames)?;
    writer.into_inner().flush()?;
    Ok(())
}
