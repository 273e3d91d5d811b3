use super::cfg::State;
use crate::model::configuration::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("malformed CFG record in {state} section: {details} (at line {line})")]
    Malformed {
        line: usize,
        state: State,
        details: String,
    },

    #[error("unknown type ID {type_id} in AtomData (at line {line})")]
    UnknownTypeId { line: usize, type_id: u32 },

    #[error("species '{label}' in frame {frame} has no type ID in the type map")]
    UnknownSpecies { frame: usize, label: String },

    #[error("frame {frame} is not a valid configuration: {source}")]
    InvalidConfiguration {
        frame: usize,
        #[source]
        source: ConfigurationError,
    },
}

impl Error {
    pub fn malformed(state: State, line: usize, details: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            state,
            details: details.into(),
        }
    }

    /// Line number the error refers to, when it was raised while reading.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Malformed { line, .. } | Self::UnknownTypeId { line, .. } => Some(*line),
            _ => None,
        }
    }
}
