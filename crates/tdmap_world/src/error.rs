//! # Map Error Types
//!
//! All errors that can occur in the map core.

use thiserror::Error;

/// Why a resource identifier was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The canonical form needs one `@` followed by one `:`.
    #[error("`{input}` is not of the form kind@namespace:path")]
    MissingSeparator {
        /// The rejected input.
        input: String,
    },

    /// Kind must be a non-empty run of word characters.
    #[error("invalid kind `{0}`: expected word characters")]
    InvalidKind(String),

    /// Namespace must be a non-empty run of word characters.
    #[error("invalid namespace `{0}`: expected word characters")]
    InvalidNamespace(String),

    /// Path must be `/`-separated word segments with an optional extension.
    #[error("invalid path `{0}`: expected word segments separated by single `/`")]
    InvalidPath(String),

    /// A typed identifier was parsed from a string carrying another kind.
    #[error("expected kind `{expected}`, found `{found}`")]
    KindMismatch {
        /// Kind fixed by the identifier type.
        expected: &'static str,
        /// Kind embedded in the input.
        found: String,
    },
}

/// Errors reported by a noise source.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum NoiseError {
    /// Frequency must be finite and strictly positive.
    #[error("invalid noise frequency {0}")]
    InvalidFrequency(f32),

    /// The source does not accept this seed.
    #[error("seed {0} outside the range accepted by the noise source")]
    InvalidSeed(i32),
}

/// Errors that can occur in the map core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    /// Malformed resource identifier.
    #[error("invalid resource identifier: {0}")]
    InvalidFormat(#[from] FormatError),

    /// Chunk cell access outside `[0, size)`.
    #[error("cell ({x}, {y}) outside chunk bounds 0..{size}")]
    OutOfRange {
        /// Requested local x.
        x: usize,
        /// Requested local y.
        y: usize,
        /// Chunk edge length.
        size: usize,
    },

    /// The noise source failed during a generation pass.
    #[error("map generation failed: {0}")]
    GenerationFailed(#[from] NoiseError),

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for map operations.
pub type MapResult<T> = Result<T, MapError>;
