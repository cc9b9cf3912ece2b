//! Deterministic test doubles for the encoding pipeline and search driver.
//!
//! `MockAdapter` implements the full [`ArchAdapter`] contract with fixed,
//! observable outputs so unit and integration tests can assert budget
//! accounting, layer structure and search behavior without real machine
//! code generation.

use crate::core::adapter::{ArchAdapter, DecoderAssembly, RandomSource, RegisterFraming};
use crate::core::error::{EncodeError, EncodeResult};
use crate::core::schema::{CipherSchema, SchemaOp, SchemaOpKind, WordWidth};

/// Random source replaying a fixed byte sequence, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct FixedRandom {
    values: Vec<u8>,
    cursor: usize,
}

impl FixedRandom {
    pub fn new(values: Vec<u8>) -> Self {
        assert!(!values.is_empty(), "FixedRandom needs at least one value");
        Self { values, cursor: 0 }
    }
}

impl RandomSource for FixedRandom {
    fn random_byte(&mut self) -> u8 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

/// Scriptable architecture adapter double.
///
/// Supports the same profile ids as the real adapter (32 and 64). Garbage is
/// a fixed fill truncated to the requested budget, the decoder stub is a
/// fixed marker, and the schema reversal stub is another marker. Budgets and
/// schema sizes handed in by the pipeline are recorded for assertions.
pub struct MockAdapter {
    pub garbage_fill: Vec<u8>,
    pub decoder_marker: Vec<u8>,
    pub schema_stub_marker: Vec<u8>,
    pub framing: RegisterFraming,
    pub rng: FixedRandom,
    pub garbage_budgets: Vec<usize>,
    pub schema_sizes: Vec<usize>,
    pub fail_garbage: bool,
    pub fail_assembly: bool,
    pub fail_schema: bool,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            garbage_fill: vec![0x90; 3],
            decoder_marker: b"STUB".to_vec(),
            schema_stub_marker: b"SCHM".to_vec(),
            framing: RegisterFraming {
                prefix: vec![0x60],
                suffix: vec![0x61],
            },
            rng: FixedRandom::new(vec![0]),
            garbage_budgets: Vec::new(),
            schema_sizes: Vec::new(),
            fail_garbage: false,
            fail_assembly: false,
            fail_schema: false,
        }
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchAdapter for MockAdapter {
    fn supports_architecture(&self, arch_id: u32) -> bool {
        matches!(arch_id, 32 | 64)
    }

    fn register_width_bits(&self, arch_id: u32) -> u32 {
        arch_id
    }

    fn register_framing(&self, _arch_id: u32) -> RegisterFraming {
        self.framing.clone()
    }

    fn garbage(&mut self, _arch_id: u32, budget: usize) -> EncodeResult<Vec<u8>> {
        if self.fail_garbage {
            return Err(EncodeError::GarbageGeneration {
                reason: "mock failure".to_string(),
            });
        }
        self.garbage_budgets.push(budget);
        let len = self.garbage_fill.len().min(budget);
        Ok(self.garbage_fill[..len].to_vec())
    }

    fn assemble_decoder(&self, assembly: &DecoderAssembly) -> EncodeResult<Vec<u8>> {
        if self.fail_assembly {
            return Err(EncodeError::Assembly {
                reason: format!("mock failure for length {}", assembly.payload_len),
            });
        }
        Ok(self.decoder_marker.clone())
    }

    fn new_schema(&mut self, arch_id: u32, size: usize) -> EncodeResult<CipherSchema> {
        if self.fail_schema {
            return Err(EncodeError::SchemaEncoding {
                reason: "mock failure".to_string(),
            });
        }
        self.schema_sizes.push(size);
        let word = WordWidth::from_arch(arch_id).expect("mock profile gated by supports");
        let ops = (0..size)
            .map(|_| match self.rng.random_byte() % 4 {
                0 => SchemaOp {
                    kind: SchemaOpKind::Xor,
                    operand: Some(self.rng.random_u32().max(1)),
                },
                1 => SchemaOp {
                    kind: SchemaOpKind::Add,
                    operand: Some(self.rng.random_u32().max(1)),
                },
                2 => SchemaOp {
                    kind: SchemaOpKind::Sub,
                    operand: Some(self.rng.random_u32().max(1)),
                },
                _ => SchemaOp {
                    kind: SchemaOpKind::Not,
                    operand: None,
                },
            })
            .collect();
        Ok(CipherSchema::new(word, ops))
    }

    fn embed_schema_decoder(
        &self,
        _arch_id: u32,
        data: &[u8],
        _schema: &CipherSchema,
    ) -> EncodeResult<Vec<u8>> {
        let mut out = self.schema_stub_marker.clone();
        out.extend_from_slice(data);
        Ok(out)
    }

    fn random_byte(&mut self) -> u8 {
        self.rng.random_byte()
    }
}
