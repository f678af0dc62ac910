use std::io;
use thiserror::Error;

/// Errors that abort a NAC calculation. None of them leave a partial result behind.
#[derive(Debug, Error)]
pub enum NacError {
    /// The two snapshots can not be compared: band or plane-wave counts differ.
    #[error("#{what} not match! ({a} vs. {b})")]
    StructuralMismatch {
        what: &'static str,
        a: usize,
        b: usize,
    },
    /// A spin, k-point or band selector (1-based) is out of range.
    #[error("Invalid {what} index {index}, it has to be between 1 and {max}")]
    InvalidIndex {
        what: &'static str,
        index: usize,
        max: usize,
    },
    /// The time step must be finite and positive.
    #[error("The time step has to be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    /// I/O failure of the underlying wavefunction reader.
    #[error("Unable to read from <{name}>: {error}")]
    SourceRead {
        name: String,
        #[source]
        error: io::Error,
    },
    /// The file is not a wavefunction file this crate understands.
    #[error("Invalid wavefunction file <{name}>: {message}")]
    Format { name: String, message: String },
}

impl NacError {
    pub fn source_read<S: Into<String>>(name: S, error: io::Error) -> Self {
        NacError::SourceRead {
            name: name.into(),
            error,
        }
    }

    pub fn format<S: Into<String>, M: Into<String>>(name: S, message: M) -> Self {
        NacError::Format {
            name: name.into(),
            message: message.into(),
        }
    }
}
