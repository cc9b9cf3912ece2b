// This module serves as the central hub for the encoder's core infrastructure,
// the architecture-independent orchestration layer. It exports and organizes the
// key subsystems: the constraint search driver (bounded seed search against
// byte-content predicates), the encoding pipeline (explicit multi-layer
// composition of adapter primitives with strict budget accounting), the
// architecture adapter contract (the narrow trait the pipeline drives), the
// ADFL stream cipher, the cipher schema data model with its software transform,
// the encoder configuration, and the error taxonomy. All components propagate
// failures as values and own their buffers; nothing here touches process state.

//! Core encoder infrastructure.
//!
//! This module provides the architecture-independent orchestration layer:
//! the constraint search driver, the multi-layer encoding pipeline, and the
//! contracts they drive.
//!
//! # Key Components
//!
//! ## Search Driver (`driver`)
//! - Single pipeline run when no content constraint is requested
//! - Bounded seed search with ASCII / forbidden-byte predicates
//!
//! ## Encoding Pipeline (`pipeline`)
//! - Explicit per-layer iteration with owned buffers
//! - Garbage budget accounting that never goes negative
//!
//! ## Adapter Contract (`adapter`)
//! - The primitives a target architecture profile must provide
//! - Injectable randomness for deterministic testing
//!
//! ## Primitives (`cipher`, `schema`)
//! - ADFL stream cipher and its inverse
//! - Cipher schema model and software transform

pub mod adapter;
pub mod cipher;
pub mod config;
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod test_utils;

// Re-export core components
pub use adapter::{
    ArchAdapter,
    CounterWidth,
    DecoderAssembly,
    OsRandom,
    RandomSource,
    RegisterFraming,
};

pub use config::{
    EncoderConfig,
    DEFAULT_OBFUSCATION_BUDGET,
    DEFAULT_SEARCH_ATTEMPTS,
    SEED_MODULUS,
};

pub use driver::{Encoded, Encoder};

pub use error::{EncodeError, EncodeResult};

pub use pipeline::PipelineOutput;

pub use schema::{CipherSchema, SchemaOp, SchemaOpKind, WordWidth};
