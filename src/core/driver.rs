// This module implements the constraint search driver, the top-level entry point
// of the encoder. It validates the configuration, rejects unknown architecture
// ids, and runs the encoding pipeline. When the caller requests byte-content
// constraints (printable ASCII, a forbidden byte set, or both) the driver loops:
// one pipeline attempt per seed value, predicate evaluation over the produced
// bytes, and a seed mutation of (seed + 1) mod 255 on predicate failure. The
// loop is bounded; exhausting the configured attempt budget yields a
// SearchExhausted error instead of looping forever. Errors raised inside a
// pipeline attempt are never reinterpreted as a failed predicate; they abort the
// whole search immediately so a partially encoded buffer can never surface.

//! Constraint search driver.

use crate::core::adapter::ArchAdapter;
use crate::core::config::{EncoderConfig, SEED_MODULUS};
use crate::core::error::{EncodeError, EncodeResult};
use crate::core::pipeline;

/// A successfully encoded payload.
#[derive(Debug, Clone)]
pub struct Encoded {
    /// The final encoded bytes.
    pub bytes: Vec<u8>,
    /// Seed of the outermost encoding layer.
    pub seed: u8,
    /// Number of pipeline attempts the search used.
    pub attempts: usize,
}

/// Top-level encoder driving an architecture adapter.
pub struct Encoder<A: ArchAdapter> {
    adapter: A,
}

impl<A: ArchAdapter> Encoder<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Encode `payload` under `config`.
    ///
    /// Without content constraints this is a single pipeline run. With
    /// constraints the seed is mutated between attempts until the output
    /// satisfies every requested predicate or the attempt bound is reached.
    pub fn encode(&mut self, config: &EncoderConfig, payload: &[u8]) -> EncodeResult<Encoded> {
        config.validate()?;
        if payload.is_empty() {
            return Err(EncodeError::InputDecode {
                reason: "empty payload".to_string(),
            });
        }
        if !self.adapter.supports_architecture(config.arch_id) {
            return Err(EncodeError::UnsupportedArchitecture {
                arch_id: config.arch_id,
            });
        }

        if !config.wants_constraints() {
            let run = pipeline::run(&mut self.adapter, config, payload)?;
            return Ok(Encoded {
                bytes: run.bytes,
                seed: run.seed,
                attempts: 1,
            });
        }

        let mut attempt_config = config.clone();
        for attempt in 1..=config.max_search_attempts {
            let run = pipeline::run(&mut self.adapter, &attempt_config, payload)?;
            if satisfies_constraints(&run.bytes, config) {
                log::debug!("Content constraints satisfied after {attempt} attempt(s)");
                return Ok(Encoded {
                    bytes: run.bytes,
                    seed: run.seed,
                    attempts: attempt,
                });
            }
            log::trace!(
                "Attempt {attempt} rejected by content constraints, mutating seed {}",
                attempt_config.seed
            );
            attempt_config.seed = (attempt_config.seed + 1) % SEED_MODULUS;
        }
        Err(EncodeError::SearchExhausted {
            attempts: config.max_search_attempts,
        })
    }
}

/// Evaluate every requested content predicate; all must pass.
fn satisfies_constraints(bytes: &[u8], config: &EncoderConfig) -> bool {
    if config.ascii_only && !is_printable_ascii(bytes) {
        return false;
    }
    if !config.forbidden.is_empty() && contains_any(bytes, &config.forbidden) {
        return false;
    }
    true
}

/// Printable ASCII: space through tilde, no control bytes, nothing above 127.
fn is_printable_ascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| (0x20..=0x7e).contains(b))
}

fn contains_any(data: &[u8], set: &[u8]) -> bool {
    data.iter().any(|b| set.contains(b))
}
