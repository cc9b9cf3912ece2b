// This module implements the ArchAdapter contract for the two x86 family
// profiles the encoder ships: 32-bit (arch id 32) and 64-bit (arch id 64), the
// id doubling as the register width in bits. Register framing uses fixed byte
// sequences (pushad/popad on 32-bit, a push/pop sweep over the general purpose
// registers on 64-bit); garbage generation, decoder stub assembly and schema
// embedding delegate to the sibling modules, all built on iced-x86. The adapter
// owns the injectable RandomSource that feeds garbage sizing, schema generation
// and the per-pass reseeding of the pipeline.

//! x86/x86-64 architecture adapter.

use crate::core::adapter::{ArchAdapter, DecoderAssembly, OsRandom, RandomSource, RegisterFraming};
use crate::core::error::EncodeResult;
use crate::core::schema::CipherSchema;
use crate::x64::{decoder, garbage, schema};

/// Architecture id of the 32-bit profile.
pub const ARCH_X86: u32 = 32;

/// Architecture id of the 64-bit profile.
pub const ARCH_X64: u32 = 64;

// pushad / popad
const X86_PREFIX: &[u8] = &[0x60];
const X86_SUFFIX: &[u8] = &[0x61];

// push rax,rbx,rcx,rdx,rsi,rdi,rbp then r8..r15
const X64_PREFIX: &[u8] = &[
    0x50, 0x53, 0x51, 0x52, 0x56, 0x57, 0x55, 0x41, 0x50, 0x41, 0x51, 0x41, 0x52, 0x41, 0x53,
    0x41, 0x54, 0x41, 0x55, 0x41, 0x56, 0x41, 0x57,
];
// pops in reverse order
const X64_SUFFIX: &[u8] = &[
    0x41, 0x5f, 0x41, 0x5e, 0x41, 0x5d, 0x41, 0x5c, 0x41, 0x5b, 0x41, 0x5a, 0x41, 0x59, 0x41,
    0x58, 0x5d, 0x5f, 0x5e, 0x5a, 0x59, 0x5b, 0x58,
];

/// Adapter for the x86 family profiles.
pub struct X64Adapter<R: RandomSource = OsRandom> {
    rng: R,
}

impl X64Adapter<OsRandom> {
    /// Adapter backed by the operating system random source.
    pub fn new() -> Self {
        Self::with_random(OsRandom)
    }
}

impl Default for X64Adapter<OsRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> X64Adapter<R> {
    /// Adapter backed by a caller-supplied random source.
    pub fn with_random(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RandomSource> ArchAdapter for X64Adapter<R> {
    fn supports_architecture(&self, arch_id: u32) -> bool {
        matches!(arch_id, ARCH_X86 | ARCH_X64)
    }

    fn register_width_bits(&self, arch_id: u32) -> u32 {
        arch_id
    }

    fn register_framing(&self, arch_id: u32) -> RegisterFraming {
        match arch_id {
            ARCH_X64 => RegisterFraming {
                prefix: X64_PREFIX.to_vec(),
                suffix: X64_SUFFIX.to_vec(),
            },
            _ => RegisterFraming {
                prefix: X86_PREFIX.to_vec(),
                suffix: X86_SUFFIX.to_vec(),
            },
        }
    }

    fn garbage(&mut self, arch_id: u32, budget: usize) -> EncodeResult<Vec<u8>> {
        garbage::generate(arch_id, budget, &mut self.rng)
    }

    fn assemble_decoder(&self, assembly: &DecoderAssembly) -> EncodeResult<Vec<u8>> {
        decoder::assemble(assembly)
    }

    fn new_schema(&mut self, arch_id: u32, size: usize) -> EncodeResult<CipherSchema> {
        schema::generate(arch_id, size, &mut self.rng)
    }

    fn embed_schema_decoder(
        &self,
        arch_id: u32,
        data: &[u8],
        schema: &CipherSchema,
    ) -> EncodeResult<Vec<u8>> {
        schema::embed_decoder(arch_id, data, schema)
    }

    fn random_byte(&mut self) -> u8 {
        self.rng.random_byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::FixedRandom;

    #[test]
    fn test_profiles() {
        let adapter = X64Adapter::new();
        assert!(adapter.supports_architecture(32));
        assert!(adapter.supports_architecture(64));
        assert!(!adapter.supports_architecture(16));
        assert_eq!(adapter.register_width_bits(32), 32);
        assert_eq!(adapter.register_width_bits(64), 64);
    }

    #[test]
    fn test_framing_sequences_pair_up() {
        let adapter = X64Adapter::new();
        let framing = adapter.register_framing(32);
        assert_eq!(framing.prefix, vec![0x60]);
        assert_eq!(framing.suffix, vec![0x61]);

        let framing = adapter.register_framing(64);
        assert_eq!(framing.prefix.len(), framing.suffix.len());
        // push rax first, pop rax last
        assert_eq!(framing.prefix[0], 0x50);
        assert_eq!(*framing.suffix.last().unwrap(), 0x58);
    }

    #[test]
    fn test_cipher_stream_default_is_adfl() {
        let adapter = X64Adapter::with_random(FixedRandom::new(vec![1]));
        let data = b"\x01\x02\x03";
        assert_eq!(
            adapter.cipher_stream(data, 9),
            crate::core::cipher::adfl_encode(data, 9)
        );
    }
}
