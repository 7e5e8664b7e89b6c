// Error Types
// Failure taxonomy shared by the big integer engine and the RSA layer

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the library
#[derive(Debug, Error)]
pub enum Error {
    /// Limb storage could not be reserved
    #[error("failed to allocate storage for {limbs} limbs")]
    AllocationFailure { limbs: usize },

    /// `allocate` was called on a digit store that already owns storage
    #[error("digit store is already allocated")]
    AlreadyAllocated,

    #[error("division by zero")]
    DivisionByZero,

    /// Operand combination the arithmetic does not support
    #[error("arithmetic error: {0}")]
    Arithmetic(&'static str),

    #[error("invalid hexadecimal number: {0:?}")]
    InvalidHex(String),

    /// A file could not be opened, created, read or written
    #[error("unable to access file {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O failure on a caller-supplied stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("message too large: max {max} bytes, got {len}")]
    MessageTooLarge { len: usize, max: usize },

    #[error("malformed block: {0}")]
    MalformedBlock(String),

    /// Bounded prime or key search gave up
    #[error("no suitable candidate found after {attempts} attempts")]
    NoSuitableCandidate { attempts: usize },
}

impl Error {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
