// This module defines error types for the SGN encoder using the thiserror crate for
// idiomatic Rust error handling. EncodeError is the main error enum covering every
// failure stage of the encoding pipeline: malformed hexadecimal input at the host
// boundary, unknown architecture ids, garbage instruction generation failures,
// decoder stub assembly failures, cipher schema generation/embedding failures,
// exhaustion of the bounded constraint search, and invalid configurations. Each
// variant carries relevant context (reasons, ids, attempt counts) so a failed call
// reports which stage failed. The module also provides EncodeResult<T> as a
// convenience type alias for Result<T, EncodeError>. Every internal failure is
// propagated as a value up the call chain; the library never aborts the process.

//! Error types for the SGN encoder.
//!
//! Using thiserror for more idiomatic error handling.

use thiserror::Error;

/// Main error type for payload encoding.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Malformed hex input: {reason}")]
    InputDecode { reason: String },

    #[error("Unsupported architecture id: {arch_id}")]
    UnsupportedArchitecture { arch_id: u32 },

    #[error("Garbage generation failed: {reason}")]
    GarbageGeneration { reason: String },

    #[error("Decoder assembly failed: {reason}")]
    Assembly { reason: String },

    #[error("Schema encoding failed: {reason}")]
    SchemaEncoding { reason: String },

    #[error("Constraint search exhausted after {attempts} attempts")]
    SearchExhausted { attempts: usize },

    #[error("Invalid encoder configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Result type alias for encode operations.
pub type EncodeResult<T> = Result<T, EncodeError>;
