use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing calculator input or collecting its results.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a CFG exchange file failed.
    #[error("CFG exchange failed: {0}")]
    Codec(#[from] crate::io::Error),

    /// The calculator output file holds no configuration.
    #[error("calculator output {} contains no configuration", .0.display())]
    EmptyOutput(PathBuf),

    /// A property the calculator must always report is missing from its output.
    #[error("calculator output is missing required property '{0}'")]
    MissingProperty(&'static str),
}
