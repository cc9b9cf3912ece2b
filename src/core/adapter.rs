// This module defines the ArchAdapter trait, which serves as the bridge between
// the encoding pipeline and a target architecture profile. The trait provides the
// narrow set of primitives the pipeline composes: register save/restore framing,
// budget-bounded garbage instruction generation, the stream cipher, decoder stub
// selection and assembly, cipher schema generation/application/embedding, and a
// random byte source. The design assumes nothing about how a profile produces
// machine code; the pipeline only sequences the primitives and threads buffers
// between them. Callers gate every call with supports_architecture, so profile
// implementations may treat an unknown architecture id as unreachable and answer
// defensively. The module also defines the injectable RandomSource capability and
// the symbolic DecoderAssembly description consumed by the adapter's assembler.

//! Architecture adapter responsibilities.
//!
//! The adapter is the glue between the orchestration core and an instruction
//! set profile. The pipeline drives it through a fixed step order per layer:
//! garbage, stream cipher, decoder stub, optional schema obfuscation. The
//! framework assumes:
//! - Garbage output never exceeds the requested budget.
//! - `cipher_stream` is exactly inverted by the assembled decoder stub.
//! - A schema produced by `new_schema` is reversed by the stub that
//!   `embed_schema_decoder` prepends.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::core::error::EncodeResult;
use crate::core::schema::CipherSchema;

/// Injectable random byte source.
///
/// Both the seed mutation at pass boundaries and the schema generator draw
/// from this; tests substitute a deterministic implementation.
pub trait RandomSource {
    fn random_byte(&mut self) -> u8;

    fn random_u32(&mut self) -> u32 {
        u32::from_le_bytes([
            self.random_byte(),
            self.random_byte(),
            self.random_byte(),
            self.random_byte(),
        ])
    }
}

/// Operating-system-backed random source.
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn random_byte(&mut self) -> u8 {
        let mut buf = [0u8; 1];
        OsRng.fill_bytes(&mut buf);
        buf[0]
    }

    fn random_u32(&mut self) -> u32 {
        OsRng.next_u32()
    }
}

/// Fixed register save/restore byte sequences for one architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFraming {
    /// Prologue saving register state, prepended to the finished layer.
    pub prefix: Vec<u8>,
    /// Epilogue restoring register state, appended behind the payload.
    pub suffix: Vec<u8>,
}

/// Loop counter width of a decoder stub template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterWidth {
    /// Payload length fits an 8-bit immediate.
    Byte,
    /// Payload length needs a 32-bit immediate.
    Dword,
}

/// Symbolic description of the instructions that reverse the stream cipher
/// for a ciphered payload of a given length.
///
/// Produced by [`ArchAdapter::select_decoder`], consumed by
/// [`ArchAdapter::assemble_decoder`]. The assembled byte length is
/// architecture- and length-dependent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderAssembly {
    pub arch_id: u32,
    pub payload_len: usize,
    pub seed: u8,
    pub counter: CounterWidth,
}

impl DecoderAssembly {
    /// Select the template for a ciphered payload of `payload_len` bytes.
    pub fn for_payload(arch_id: u32, payload_len: usize, seed: u8) -> Self {
        let counter = if payload_len <= u8::MAX as usize {
            CounterWidth::Byte
        } else {
            CounterWidth::Dword
        };
        Self {
            arch_id,
            payload_len,
            seed,
            counter,
        }
    }
}

impl fmt::Display for DecoderAssembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arch_id == 64 {
            writeln!(f, "LEA RSI,[RIP+data]")?;
        } else {
            writeln!(f, "JMP SHORT trampoline")?;
            writeln!(f, "decoder: POP ESI")?;
            writeln!(f, "PUSH ESI")?;
        }
        writeln!(f, "MOV AL,{:#04x}", self.seed)?;
        match self.counter {
            CounterWidth::Byte => {
                writeln!(f, "XOR ECX,ECX")?;
                writeln!(f, "MOV CL,{:#04x}", self.payload_len)?;
            }
            CounterWidth::Dword => writeln!(f, "MOV ECX,{:#010x}", self.payload_len)?,
        }
        let ptr = if self.arch_id == 64 { "RSI" } else { "ESI" };
        writeln!(f, "decode: XOR BYTE PTR [{ptr}],AL")?;
        writeln!(f, "ADD AL,BYTE PTR [{ptr}]")?;
        writeln!(f, "INC {ptr}")?;
        writeln!(f, "LOOP decode")?;
        if self.arch_id == 64 {
            writeln!(f, "data:")?;
        } else {
            writeln!(f, "RET")?;
            writeln!(f, "trampoline: CALL decoder")?;
        }
        Ok(())
    }
}

/// Bridge between the encoding pipeline and one or more architecture profiles.
pub trait ArchAdapter {
    /// Whether `arch_id` resolves to a known profile. Every other operation
    /// may assume this returned true for the id it is handed.
    fn supports_architecture(&self, arch_id: u32) -> bool;

    /// Register width of the profile in bits.
    fn register_width_bits(&self, arch_id: u32) -> u32;

    /// Fixed register save/restore framing sequences.
    fn register_framing(&self, arch_id: u32) -> RegisterFraming;

    /// Generate semantically inert instructions no longer than `budget` bytes.
    fn garbage(&mut self, arch_id: u32, budget: usize) -> EncodeResult<Vec<u8>>;

    /// Seed-keyed stream cipher; must be exactly inverted by the stub that
    /// [`ArchAdapter::assemble_decoder`] produces for the same seed.
    fn cipher_stream(&self, data: &[u8], seed: u8) -> Vec<u8> {
        crate::core::cipher::adfl_encode(data, seed)
    }

    /// Choose a decoder stub template for a ciphered payload length.
    fn select_decoder(&self, arch_id: u32, ciphered_len: usize, seed: u8) -> DecoderAssembly {
        DecoderAssembly::for_payload(arch_id, ciphered_len, seed)
    }

    /// Assemble a symbolic decoder description into raw machine bytes.
    fn assemble_decoder(&self, assembly: &DecoderAssembly) -> EncodeResult<Vec<u8>>;

    /// Generate a fresh schema of `size` per-word transform descriptors.
    fn new_schema(&mut self, arch_id: u32, size: usize) -> EncodeResult<CipherSchema>;

    /// Apply a schema transform to `data` starting at `offset`.
    fn apply_schema(&self, data: &[u8], offset: usize, schema: &CipherSchema) -> Vec<u8> {
        schema.apply(data, offset)
    }

    /// Prepend a stub that reverses `schema` over `data` at runtime.
    fn embed_schema_decoder(
        &self,
        arch_id: u32,
        data: &[u8],
        schema: &CipherSchema,
    ) -> EncodeResult<Vec<u8>>;

    /// Uniform random byte; no cross-call ordering guarantee required.
    fn random_byte(&mut self) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_selection() {
        let small = DecoderAssembly::for_payload(64, 255, 0);
        assert_eq!(small.counter, CounterWidth::Byte);
        let large = DecoderAssembly::for_payload(64, 256, 0);
        assert_eq!(large.counter, CounterWidth::Dword);
    }

    #[test]
    fn test_display_names_template_parts() {
        let stub = DecoderAssembly::for_payload(64, 16, 0x41);
        let listing = stub.to_string();
        assert!(listing.contains("LEA RSI"));
        assert!(listing.contains("MOV AL,0x41"));
        assert!(listing.contains("LOOP decode"));

        let stub = DecoderAssembly::for_payload(32, 300, 7);
        let listing = stub.to_string();
        assert!(listing.contains("CALL decoder"));
        assert!(listing.contains("MOV ECX"));
    }

    #[test]
    fn test_os_random_is_not_constant() {
        let mut rng = OsRandom;
        let draws: Vec<u8> = (0..64).map(|_| rng.random_byte()).collect();
        assert!(draws.iter().any(|&b| b != draws[0]));
    }
}
