// This module assembles decoder stubs: the machine code that reverses the ADFL
// stream cipher over the ciphered region immediately before the payload's
// logical execution. Templates are selected by ciphered-payload length (8-bit
// versus 32-bit loop counter immediates). The 64-bit template materializes the
// data address with a RIP-relative LEA and falls through into the decoded bytes
// after the loop; the 32-bit template uses the classic jmp/call/pop sequence to
// obtain the data address and dispatches into the decoded bytes with RET, using
// the return address the trampoline call pushed. Both loops advance one byte at
// a time: XOR with the running key in AL, re-key by adding the recovered
// plaintext byte, advance the pointer, LOOP on the counter register.

//! Decoder stub assembly using iced-x86.

use iced_x86::code_asm::{registers::cl, *};
use iced_x86::IcedError;

use crate::core::adapter::{CounterWidth, DecoderAssembly};
use crate::core::error::{EncodeError, EncodeResult};

fn assembly_err(err: IcedError) -> EncodeError {
    EncodeError::Assembly {
        reason: err.to_string(),
    }
}

/// Assemble the stub described by `assembly` into raw machine bytes.
pub fn assemble(assembly: &DecoderAssembly) -> EncodeResult<Vec<u8>> {
    if assembly.payload_len == 0 {
        return Err(EncodeError::Assembly {
            reason: "ciphered region is empty".to_string(),
        });
    }
    if assembly.payload_len > u32::MAX as usize {
        return Err(EncodeError::Assembly {
            reason: format!(
                "ciphered region of {} bytes exceeds the decoder counter",
                assembly.payload_len
            ),
        });
    }
    match assembly.arch_id {
        64 => assemble_x64(assembly).map_err(assembly_err),
        32 => assemble_x86(assembly).map_err(assembly_err),
        other => Err(EncodeError::Assembly {
            reason: format!("no decoder template for architecture {other}"),
        }),
    }
}

fn emit_counter(a: &mut CodeAssembler, counter: CounterWidth, len: usize) -> Result<(), IcedError> {
    match counter {
        CounterWidth::Byte => {
            a.xor(ecx, ecx)?;
            a.mov(cl, len as u32)?;
        }
        CounterWidth::Dword => a.mov(ecx, len as u32)?,
    }
    Ok(())
}

fn assemble_x64(assembly: &DecoderAssembly) -> Result<Vec<u8>, IcedError> {
    let mut a = CodeAssembler::new(64)?;
    let mut data = a.create_label();
    let mut decode = a.create_label();

    a.lea(rsi, qword_ptr(data))?;
    a.mov(al, assembly.seed as u32)?;
    emit_counter(&mut a, assembly.counter, assembly.payload_len)?;
    a.set_label(&mut decode)?;
    a.xor(byte_ptr(rsi), al)?;
    a.add(al, byte_ptr(rsi))?;
    a.inc(rsi)?;
    a.loop_(decode)?;
    // The ciphered region follows the stub; execution falls through into
    // the decoded bytes after the loop.
    a.set_label(&mut data)?;
    a.zero_bytes()?;
    a.assemble(0)
}

fn assemble_x86(assembly: &DecoderAssembly) -> Result<Vec<u8>, IcedError> {
    let mut a = CodeAssembler::new(32)?;
    let mut decoder = a.create_label();
    let mut decode = a.create_label();
    let mut trampoline = a.create_label();

    a.jmp(trampoline)?;
    a.set_label(&mut decoder)?;
    // The trampoline call pushed the data address; keep a copy on the
    // stack so RET dispatches into the decoded bytes.
    a.pop(esi)?;
    a.push(esi)?;
    a.mov(al, assembly.seed as u32)?;
    emit_counter(&mut a, assembly.counter, assembly.payload_len)?;
    a.set_label(&mut decode)?;
    a.xor(byte_ptr(esi), al)?;
    a.add(al, byte_ptr(esi))?;
    a.inc(esi)?;
    a.loop_(decode)?;
    a.ret()?;
    a.set_label(&mut trampoline)?;
    a.call(decoder)?;
    a.assemble(0)
}
