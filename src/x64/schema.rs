// This module provides the architecture-facing half of schema obfuscation:
// generating fresh random schemas and embedding the machine-code stub that
// reverses a schema at runtime. The stub addresses the obfuscated body the same
// way the decoder stubs address their data (RIP-relative LEA on 64-bit,
// jmp/call/pop plus RET dispatch on 32-bit) and emits one inverse instruction
// per effective chunk: XOR undoes XOR, SUB undoes ADD, ADD undoes SUB, NOT
// undoes NOT. Operands are 32-bit immediates; on the 64-bit profile the
// processor sign-extends them, which the software transform in core::schema
// mirrors exactly.

//! Cipher schema generation and decoder embedding.

use iced_x86::code_asm::*;
use iced_x86::IcedError;

use crate::core::adapter::RandomSource;
use crate::core::error::{EncodeError, EncodeResult};
use crate::core::schema::{CipherSchema, SchemaOp, SchemaOpKind, WordWidth};

fn schema_err(err: IcedError) -> EncodeError {
    EncodeError::SchemaEncoding {
        reason: err.to_string(),
    }
}

/// Generate a fresh schema of `size` per-word descriptors.
pub fn generate<R>(arch_id: u32, size: usize, rng: &mut R) -> EncodeResult<CipherSchema>
where
    R: RandomSource + ?Sized,
{
    let word = WordWidth::from_arch(arch_id).ok_or(EncodeError::SchemaEncoding {
        reason: format!("no schema profile for architecture {arch_id}"),
    })?;
    if size == 0 {
        return Err(EncodeError::SchemaEncoding {
            reason: "schema size must be nonzero".to_string(),
        });
    }
    let ops = (0..size)
        .map(|_| {
            let kind = match rng.random_byte() % 4 {
                0 => SchemaOpKind::Xor,
                1 => SchemaOpKind::Add,
                2 => SchemaOpKind::Sub,
                _ => SchemaOpKind::Not,
            };
            let operand = match kind {
                SchemaOpKind::Not => None,
                _ => {
                    // An operand of zero would make the op a no-op.
                    let value = rng.random_u32();
                    Some(if value == 0 { 1 } else { value })
                }
            };
            SchemaOp { kind, operand }
        })
        .collect();
    Ok(CipherSchema::new(word, ops))
}

/// Prepend the stub that reverses `schema` over `data` at runtime.
pub fn embed_decoder(
    arch_id: u32,
    data: &[u8],
    schema: &CipherSchema,
) -> EncodeResult<Vec<u8>> {
    let stub = match arch_id {
        64 => embed_x64(data, schema).map_err(schema_err)?,
        32 => embed_x86(data, schema).map_err(schema_err)?,
        other => {
            return Err(EncodeError::SchemaEncoding {
                reason: format!("no schema decoder template for architecture {other}"),
            })
        }
    };
    let mut out = stub;
    out.extend_from_slice(data);
    Ok(out)
}

fn embed_x64(data: &[u8], schema: &CipherSchema) -> Result<Vec<u8>, IcedError> {
    let mut a = CodeAssembler::new(64)?;
    let mut body = a.create_label();

    a.lea(rdi, qword_ptr(body))?;
    for (index, op) in reversal_ops(data, schema) {
        let chunk = qword_ptr(rdi + (index * 8) as i32);
        let operand = op.operand.unwrap_or(0) as i32;
        match op.kind.inverse() {
            SchemaOpKind::Xor => a.xor(chunk, operand)?,
            SchemaOpKind::Add => a.add(chunk, operand)?,
            SchemaOpKind::Sub => a.sub(chunk, operand)?,
            SchemaOpKind::Not => a.not(chunk)?,
        }
    }
    a.set_label(&mut body)?;
    a.zero_bytes()?;
    a.assemble(0)
}

fn embed_x86(data: &[u8], schema: &CipherSchema) -> Result<Vec<u8>, IcedError> {
    let mut a = CodeAssembler::new(32)?;
    let mut reverse = a.create_label();
    let mut trampoline = a.create_label();

    a.jmp(trampoline)?;
    a.set_label(&mut reverse)?;
    a.pop(edi)?;
    a.push(edi)?;
    for (index, op) in reversal_ops(data, schema) {
        let chunk = dword_ptr(edi + (index * 4) as i32);
        let operand = op.operand.unwrap_or(0) as i32;
        match op.kind.inverse() {
            SchemaOpKind::Xor => a.xor(chunk, operand)?,
            SchemaOpKind::Add => a.add(chunk, operand)?,
            SchemaOpKind::Sub => a.sub(chunk, operand)?,
            SchemaOpKind::Not => a.not(chunk)?,
        }
    }
    a.ret()?;
    a.set_label(&mut trampoline)?;
    a.call(reverse)?;
    a.assemble(0)
}

/// Ops paired with their chunk index, limited to chunks fully inside `data`.
fn reversal_ops<'s>(
    data: &[u8],
    schema: &'s CipherSchema,
) -> impl Iterator<Item = (usize, &'s SchemaOp)> {
    let chunks = schema.effective_chunks(data.len(), 0);
    schema.ops()[..chunks].iter().enumerate()
}
