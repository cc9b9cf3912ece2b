// This module generates garbage instructions: architecture-valid, semantically
// inert sequences inserted ahead of the payload purely to vary its byte
// signature, bounded by an obfuscation budget measured in bytes. Fragments are
// drawn from a small set of patterns (single nops, same-register moves and
// exchanges, push/pop pairs, paired NOTs, and short jumps over random junk
// bytes) and appended until the budget runs out or the random source decides to
// stop, so fragment counts vary between encoding attempts. Generation never
// exceeds the budget and a zero budget yields an empty sequence.

//! Garbage instruction generation.

use iced_x86::code_asm::*;
use iced_x86::IcedError;

use crate::core::adapter::RandomSource;
use crate::core::error::{EncodeError, EncodeResult};

/// Upper bound on junk bytes hidden behind a skip jump.
const MAX_JUNK: usize = 15;

fn garbage_err(err: IcedError) -> EncodeError {
    EncodeError::GarbageGeneration {
        reason: err.to_string(),
    }
}

/// Generate inert instructions no longer than `budget` bytes.
pub fn generate<R>(bitness: u32, budget: usize, rng: &mut R) -> EncodeResult<Vec<u8>>
where
    R: RandomSource + ?Sized,
{
    let mut out = Vec::new();
    while out.len() < budget {
        // Random stop keeps fragment counts varied between attempts.
        if rng.random_byte() & 0x03 == 0 {
            break;
        }
        let remaining = budget - out.len();
        let fragment = fragment(bitness, remaining, rng)?;
        if fragment.is_empty() {
            break;
        }
        out.extend_from_slice(&fragment);
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Nop,
    PushPop,
    MovSelf,
    XchgSelf,
    NotNot,
    JumpOverJunk,
}

fn fragment<R>(bitness: u32, remaining: usize, rng: &mut R) -> EncodeResult<Vec<u8>>
where
    R: RandomSource + ?Sized,
{
    // Worst-case encoded size of a register-to-itself operation.
    let reg_op = if bitness == 64 { 3 } else { 2 };

    let mut candidates = Vec::new();
    if remaining >= 1 {
        candidates.push(Pattern::Nop);
    }
    if remaining >= 2 {
        candidates.push(Pattern::PushPop);
    }
    if remaining >= reg_op {
        candidates.push(Pattern::MovSelf);
        candidates.push(Pattern::XchgSelf);
    }
    if remaining >= 2 * reg_op {
        candidates.push(Pattern::NotNot);
    }
    if remaining >= 3 {
        candidates.push(Pattern::JumpOverJunk);
    }
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let pattern = candidates[rng.random_byte() as usize % candidates.len()];
    emit(bitness, pattern, remaining, rng).map_err(garbage_err)
}

fn emit<R>(
    bitness: u32,
    pattern: Pattern,
    remaining: usize,
    rng: &mut R,
) -> Result<Vec<u8>, IcedError>
where
    R: RandomSource + ?Sized,
{
    let mut a = CodeAssembler::new(bitness)?;
    let pick = (rng.random_byte() % 6) as usize;

    match pattern {
        Pattern::JumpOverJunk => {
            let junk_cap = (remaining - 2).min(MAX_JUNK);
            let junk_len = 1 + rng.random_byte() as usize % junk_cap;
            let junk: Vec<u8> = (0..junk_len).map(|_| rng.random_byte()).collect();
            let mut skip = a.create_label();
            a.jmp(skip)?;
            a.db(&junk)?;
            a.set_label(&mut skip)?;
            a.zero_bytes()?;
        }
        _ if bitness == 64 => {
            let regs: [AsmRegister64; 6] = [rax, rcx, rdx, rbx, rsi, rdi];
            let reg = regs[pick];
            match pattern {
                Pattern::Nop => a.nop()?,
                Pattern::PushPop => {
                    a.push(reg)?;
                    a.pop(reg)?;
                }
                Pattern::MovSelf => a.mov(reg, reg)?,
                Pattern::XchgSelf => a.xchg(reg, reg)?,
                Pattern::NotNot => {
                    a.not(reg)?;
                    a.not(reg)?;
                }
                Pattern::JumpOverJunk => unreachable!(),
            }
        }
        _ => {
            let regs: [AsmRegister32; 6] = [eax, ecx, edx, ebx, esi, edi];
            let reg = regs[pick];
            match pattern {
                Pattern::Nop => a.nop()?,
                Pattern::PushPop => {
                    a.push(reg)?;
                    a.pop(reg)?;
                }
                Pattern::MovSelf => a.mov(reg, reg)?,
                Pattern::XchgSelf => a.xchg(reg, reg)?,
                Pattern::NotNot => {
                    a.not(reg)?;
                    a.not(reg)?;
                }
                Pattern::JumpOverJunk => unreachable!(),
            }
        }
    }
    a.assemble(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::FixedRandom;

    #[test]
    fn test_zero_budget_is_empty() {
        let mut rng = FixedRandom::new(vec![1]);
        assert!(generate(64, 0, &mut rng).unwrap().is_empty());
        assert!(generate(32, 0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_never_exceeds_budget() {
        for bitness in [32u32, 64] {
            for budget in 1..=48 {
                let mut rng = FixedRandom::new(vec![1, 7, 13, 201, 55, 3]);
                let garbage = generate(bitness, budget, &mut rng).unwrap();
                assert!(
                    garbage.len() <= budget,
                    "{} bytes generated for budget {budget}",
                    garbage.len()
                );
            }
        }
    }

    #[test]
    fn test_deterministic_for_fixed_randomness() {
        let mut first = FixedRandom::new(vec![3, 9, 27, 81, 243]);
        let mut second = FixedRandom::new(vec![3, 9, 27, 81, 243]);
        assert_eq!(
            generate(64, 32, &mut first).unwrap(),
            generate(64, 32, &mut second).unwrap()
        );
    }

    #[test]
    fn test_random_stop_yields_short_sequences() {
        // A random source that always says stop produces no garbage even
        // with budget available.
        let mut rng = FixedRandom::new(vec![0]);
        assert!(generate(64, 32, &mut rng).unwrap().is_empty());
    }
}
