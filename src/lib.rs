//! SGN - Polymorphic Binary Encoding.
//!
//! SGN produces a functionally equivalent but byte-signature-varying encoding
//! of an arbitrary payload: the payload is prefixed with garbage instructions,
//! ciphered with a seed-keyed stream cipher, and prepended with a generated
//! decoder stub that restores the original bytes before execution. Output can
//! optionally be constrained to printable ASCII or to exclude a forbidden
//! byte set, searched for by mutating the cipher seed.
//!
//! # Primary Usage
//!
//! ```ignore
//! use sgn::{Encoder, EncoderConfig, X64Adapter};
//!
//! let mut encoder = Encoder::new(X64Adapter::new());
//! let mut config = EncoderConfig::new(64);
//! config.pass_count = 2;
//!
//! let encoded = encoder.encode(&config, &payload)?;
//! println!("{}", hex::encode(&encoded.bytes));
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Orchestration layer (search driver, encoding pipeline,
//!   adapter contract, cipher and schema primitives)
//! - [`x64`] - x86/x86-64 adapter built on iced-x86
//! - [`host`] - Hex-text host boundary that never panics across the call

pub mod core;
pub mod host;
pub mod x64;

// Re-export common types from organized modules
pub use crate::core::{
    // Driver
    Encoded, Encoder,
    // Configuration
    EncoderConfig, DEFAULT_OBFUSCATION_BUDGET, DEFAULT_SEARCH_ATTEMPTS, SEED_MODULUS,
    // Errors
    EncodeError, EncodeResult,
    // Adapter contract
    ArchAdapter, CounterWidth, DecoderAssembly, OsRandom, RandomSource, RegisterFraming,
    // Schema model
    CipherSchema, SchemaOp, SchemaOpKind, WordWidth,
};
pub use crate::host::{encode_hex, EncodeRequest, EncodeResponse};
pub use crate::x64::{X64Adapter, ARCH_X64, ARCH_X86};
