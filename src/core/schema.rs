// This module defines the cipher schema data model used for the second
// obfuscation layer beyond the base stream cipher. A CipherSchema is an ordered
// list of per-chunk transform descriptors, one per machine-word-sized chunk of
// the region it obfuscates: an operation (XOR, ADD, SUB, NOT) plus an optional
// 32-bit operand (NOT carries none). The schema owns the software transform and
// its inverse; the architecture adapter emits the matching machine-code reversal
// stub. On the 64-bit profile the operand is applied as a sign-extended 32-bit
// immediate because that is what the emitted instruction does, and the software
// transform reproduces that bit-for-bit. A schema is generated fresh per
// non-plain encoding pass, consumed exactly once, and never mutated afterwards.

//! Cipher schema data model and software transform.

use std::fmt;

/// Machine word width of the region a schema obfuscates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordWidth {
    Bits32,
    Bits64,
}

impl WordWidth {
    /// Resolve a width from an architecture id (32 or 64).
    pub fn from_arch(arch_id: u32) -> Option<Self> {
        match arch_id {
            32 => Some(WordWidth::Bits32),
            64 => Some(WordWidth::Bits64),
            _ => None,
        }
    }

    /// Chunk size in bytes.
    pub fn bytes(self) -> usize {
        match self {
            WordWidth::Bits32 => 4,
            WordWidth::Bits64 => 8,
        }
    }
}

/// Per-chunk transform operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOpKind {
    Xor,
    Add,
    Sub,
    Not,
}

impl SchemaOpKind {
    /// The operation that undoes this one with the same operand.
    pub fn inverse(self) -> Self {
        match self {
            SchemaOpKind::Xor => SchemaOpKind::Xor,
            SchemaOpKind::Add => SchemaOpKind::Sub,
            SchemaOpKind::Sub => SchemaOpKind::Add,
            SchemaOpKind::Not => SchemaOpKind::Not,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            SchemaOpKind::Xor => "XOR",
            SchemaOpKind::Add => "ADD",
            SchemaOpKind::Sub => "SUB",
            SchemaOpKind::Not => "NOT",
        }
    }
}

/// One per-chunk transform descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOp {
    pub kind: SchemaOpKind,
    /// Immediate operand; `None` for NOT.
    pub operand: Option<u32>,
}

/// Ordered sequence of per-chunk transform descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherSchema {
    word: WordWidth,
    ops: Vec<SchemaOp>,
}

impl CipherSchema {
    pub fn new(word: WordWidth, ops: Vec<SchemaOp>) -> Self {
        Self { word, ops }
    }

    pub fn word(&self) -> WordWidth {
        self.word
    }

    pub fn ops(&self) -> &[SchemaOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of schema chunks that fit entirely inside `data_len` bytes
    /// starting at `offset`. A trailing partial word is left untouched by
    /// both the software transform and the embedded reversal stub.
    pub fn effective_chunks(&self, data_len: usize, offset: usize) -> usize {
        let available = data_len.saturating_sub(offset) / self.word.bytes();
        self.ops.len().min(available)
    }

    /// Apply the schema to `data` starting at `offset`, returning a new buffer.
    pub fn apply(&self, data: &[u8], offset: usize) -> Vec<u8> {
        self.transform(data, offset, false)
    }

    /// Apply the inverse of every op, undoing [`CipherSchema::apply`].
    pub fn apply_inverse(&self, data: &[u8], offset: usize) -> Vec<u8> {
        self.transform(data, offset, true)
    }

    fn transform(&self, data: &[u8], offset: usize, invert: bool) -> Vec<u8> {
        let mut out = data.to_vec();
        let word = self.word.bytes();
        let chunks = self.effective_chunks(data.len(), offset);
        for (index, op) in self.ops[..chunks].iter().enumerate() {
            let at = offset + index * word;
            let kind = if invert { op.kind.inverse() } else { op.kind };
            match self.word {
                WordWidth::Bits32 => {
                    let mut bytes = [0u8; 4];
                    bytes.copy_from_slice(&out[at..at + 4]);
                    let value = u32::from_le_bytes(bytes);
                    let operand = op.operand.unwrap_or(0);
                    let value = match kind {
                        SchemaOpKind::Xor => value ^ operand,
                        SchemaOpKind::Add => value.wrapping_add(operand),
                        SchemaOpKind::Sub => value.wrapping_sub(operand),
                        SchemaOpKind::Not => !value,
                    };
                    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
                }
                WordWidth::Bits64 => {
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(&out[at..at + 8]);
                    let value = u64::from_le_bytes(bytes);
                    // The embedded stub uses 32-bit immediates, which the
                    // processor sign-extends to 64 bits.
                    let operand = op.operand.unwrap_or(0) as i32 as i64 as u64;
                    let value = match kind {
                        SchemaOpKind::Xor => value ^ operand,
                        SchemaOpKind::Add => value.wrapping_add(operand),
                        SchemaOpKind::Sub => value.wrapping_sub(operand),
                        SchemaOpKind::Not => !value,
                    };
                    out[at..at + 8].copy_from_slice(&value.to_le_bytes());
                }
            }
        }
        out
    }
}

impl fmt::Display for CipherSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| OP  | OPERAND    |")?;
        for op in &self.ops {
            match op.operand {
                Some(operand) => writeln!(f, "| {} | {:#010x} |", op.kind.mnemonic(), operand)?,
                None => writeln!(f, "| {} |            |", op.kind.mnemonic())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ops() -> Vec<SchemaOp> {
        vec![
            SchemaOp {
                kind: SchemaOpKind::Xor,
                operand: Some(0xdead_beef),
            },
            SchemaOp {
                kind: SchemaOpKind::Add,
                operand: Some(0x0000_0101),
            },
            SchemaOp {
                kind: SchemaOpKind::Not,
                operand: None,
            },
            SchemaOp {
                kind: SchemaOpKind::Sub,
                operand: Some(0xffff_fff0),
            },
        ]
    }

    #[test]
    fn test_roundtrip_32() {
        let schema = CipherSchema::new(WordWidth::Bits32, sample_ops());
        let data: Vec<u8> = (0u8..32).collect();
        let transformed = schema.apply(&data, 0);
        assert_ne!(transformed, data);
        assert_eq!(schema.apply_inverse(&transformed, 0), data);
    }

    #[test]
    fn test_roundtrip_64_sign_extension() {
        // Operands with the high bit set exercise the sign-extended
        // immediate path on the 64-bit profile.
        let schema = CipherSchema::new(WordWidth::Bits64, sample_ops());
        let data: Vec<u8> = (0u8..64).map(|b| b.wrapping_mul(37)).collect();
        let transformed = schema.apply(&data, 0);
        assert_eq!(schema.apply_inverse(&transformed, 0), data);
    }

    #[test]
    fn test_offset_preserves_prefix() {
        let schema = CipherSchema::new(WordWidth::Bits32, sample_ops());
        let data = vec![0xaa; 24];
        let transformed = schema.apply(&data, 4);
        assert_eq!(&transformed[..4], &data[..4]);
        assert_ne!(&transformed[4..], &data[4..]);
    }

    #[test]
    fn test_trailing_partial_chunk_untouched() {
        let schema = CipherSchema::new(WordWidth::Bits32, sample_ops());
        // Room for two full chunks plus three spare bytes.
        let data = vec![0x11; 11];
        assert_eq!(schema.effective_chunks(data.len(), 0), 2);
        let transformed = schema.apply(&data, 0);
        assert_eq!(&transformed[8..], &data[8..]);
    }

    #[test]
    fn test_inverse_kinds() {
        assert_eq!(SchemaOpKind::Add.inverse(), SchemaOpKind::Sub);
        assert_eq!(SchemaOpKind::Sub.inverse(), SchemaOpKind::Add);
        assert_eq!(SchemaOpKind::Xor.inverse(), SchemaOpKind::Xor);
        assert_eq!(SchemaOpKind::Not.inverse(), SchemaOpKind::Not);
    }

    #[test]
    fn test_schema_table_display() {
        let schema = CipherSchema::new(WordWidth::Bits32, sample_ops());
        let table = schema.to_string();
        assert!(table.contains("XOR"));
        assert!(table.contains("0xdeadbeef"));
        assert!(table.contains("NOT"));
    }
}
