// This module implements the encoding pipeline: the multi-layer composition of
// the architecture adapter's primitives into a single transformation. Each layer
// appends the register-restore suffix when framing is requested, prepends
// budget-bounded garbage instructions, ciphers the result with the layer seed,
// prepends an assembled decoder stub sized for the ciphered length, optionally
// wraps the decoder+body region with a schema transform plus its reversal stub,
// and finally prepends the register-save prefix. Layers iterate with an explicit
// loop rather than call-stack recursion, threading one owned buffer plus the
// seed and the shrinking obfuscation budget; every step returns a new buffer and
// any failure aborts the whole chain without surfacing a partial result.

//! The encoding pipeline.

use crate::core::adapter::ArchAdapter;
use crate::core::config::{EncoderConfig, SEED_MODULUS};
use crate::core::error::EncodeResult;

/// Output of one full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The fully encoded buffer.
    pub bytes: Vec<u8>,
    /// Seed the outermost layer was ciphered with; decoding the outermost
    /// ciphered region requires exactly this value.
    pub seed: u8,
}

/// Run `pass_count` encoding layers over `payload`.
///
/// The first layer uses `config.seed`; every further layer draws a fresh
/// seed from the adapter. The obfuscation budget shrinks by the garbage
/// actually produced and never goes negative.
pub fn run<A>(adapter: &mut A, config: &EncoderConfig, payload: &[u8]) -> EncodeResult<PipelineOutput>
where
    A: ArchAdapter + ?Sized,
{
    let framing = config
        .preserve_registers
        .then(|| adapter.register_framing(config.arch_id));
    let word_bytes = (adapter.register_width_bits(config.arch_id) / 8) as usize;

    let mut body = payload.to_vec();
    let mut seed = config.seed;
    let mut budget = config.obfuscation_budget;

    for layer in 0..config.pass_count {
        // The restore sequence rides behind the payload so it executes after
        // the decoded payload at runtime.
        let mut plain = body;
        if let Some(framing) = &framing {
            plain.extend_from_slice(&framing.suffix);
        }

        let garbage = adapter.garbage(config.arch_id, budget)?;
        budget = budget.saturating_sub(garbage.len());
        let mut prefixed = garbage;
        prefixed.extend_from_slice(&plain);

        log::debug!("Ciphering payload...");
        let ciphered = adapter.cipher_stream(&prefixed, seed);

        let assembly = adapter.select_decoder(config.arch_id, ciphered.len(), seed);
        log::debug!("Selected decoder:\n{assembly}");
        let decoder = adapter.assemble_decoder(&assembly)?;

        let mut encoded = decoder;
        encoded.extend_from_slice(&ciphered);

        body = if config.plain_decoder {
            encoded
        } else {
            let schema_size = (encoded.len() - ciphered.len()) / word_bytes + 1;
            let schema = adapter.new_schema(config.arch_id, schema_size)?;
            log::debug!("Cipher schema:\n{schema}");
            let obfuscated = adapter.apply_schema(&encoded, 0, &schema);
            adapter.embed_schema_decoder(config.arch_id, &obfuscated, &schema)?
        };

        if let Some(framing) = &framing {
            let mut framed = framing.prefix.clone();
            framed.extend_from_slice(&body);
            body = framed;
        }

        if layer + 1 < config.pass_count {
            seed = adapter.random_byte() % SEED_MODULUS;
            log::trace!("Layer {} complete, reseeding for the next pass", layer + 1);
        }
    }

    Ok(PipelineOutput { bytes: body, seed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::adfl_decode;
    use crate::core::test_utils::{FixedRandom, MockAdapter};

    fn plain_config(pass_count: u32, budget: usize) -> EncoderConfig {
        let mut config = EncoderConfig::new(64);
        config.pass_count = pass_count;
        config.obfuscation_budget = budget;
        config.plain_decoder = true;
        config
    }

    #[test]
    fn test_single_layer_structure() {
        let mut adapter = MockAdapter::new();
        let config = plain_config(1, 0);
        let payload = b"\x48\x31\xc0";

        let out = run(&mut adapter, &config, payload).unwrap();
        assert_eq!(out.seed, config.seed);

        // Zero budget means no garbage: stub marker followed by the
        // ciphered payload.
        let marker_len = adapter.decoder_marker.len();
        assert_eq!(out.bytes.len(), marker_len + payload.len());
        assert_eq!(&out.bytes[..marker_len], &adapter.decoder_marker[..]);
        assert_eq!(
            adfl_decode(&out.bytes[marker_len..], out.seed),
            payload.to_vec()
        );
    }

    #[test]
    fn test_budget_accounting_across_layers() {
        let mut adapter = MockAdapter::new();
        adapter.garbage_fill = vec![0x90; 4];
        let config = plain_config(3, 10);

        run(&mut adapter, &config, b"\x01").unwrap();

        // Layer k+1 sees the layer-k budget minus the garbage actually
        // produced, saturating at zero.
        assert_eq!(adapter.garbage_budgets, vec![10, 6, 2]);
    }

    #[test]
    fn test_each_layer_grows_output() {
        let payload = b"\xcc";
        let mut previous = payload.len();
        for passes in 1..=4 {
            let mut adapter = MockAdapter::new();
            adapter.rng = FixedRandom::new(vec![9]);
            let out = run(&mut adapter, &plain_config(passes, 8), payload).unwrap();
            assert!(out.bytes.len() > previous);
            previous = out.bytes.len();
        }
    }

    #[test]
    fn test_layer_peel_reconstructs_payload() {
        let mut adapter = MockAdapter::new();
        adapter.garbage_fill = vec![0x90; 2];
        adapter.rng = FixedRandom::new(vec![7]);
        let config = plain_config(3, 6);
        let payload = b"\xde\xad\xbe\xef";

        let out = run(&mut adapter, &config, payload).unwrap();
        let marker_len = adapter.decoder_marker.len();

        // Outermost layer used the last reseed value; inner layers peel in
        // reverse order of construction. Garbage lengths per layer follow
        // the recorded budget sequence.
        let garbage = [2usize, 2, 2];
        let seeds = [7u8, 7, config.seed];
        let mut bytes = out.bytes.clone();
        assert_eq!(out.seed, 7);
        for (layer, (&garbage_len, &seed)) in garbage.iter().zip(seeds.iter()).enumerate() {
            let ciphered = &bytes[marker_len..];
            let plain = adfl_decode(ciphered, seed);
            bytes = plain[garbage_len..].to_vec();
            if layer + 1 < 3 {
                assert_eq!(&bytes[..marker_len], &adapter.decoder_marker[..]);
            }
        }
        assert_eq!(bytes, payload.to_vec());
    }

    #[test]
    fn test_suffix_rides_inside_ciphered_region() {
        let mut adapter = MockAdapter::new();
        let mut config = plain_config(1, 0);
        config.preserve_registers = true;
        let payload = b"\x31\xc0";

        let out = run(&mut adapter, &config, payload).unwrap();
        let framing = adapter.framing.clone();

        assert!(out.bytes.starts_with(&framing.prefix));
        let marker_len = adapter.decoder_marker.len();
        let ciphered = &out.bytes[framing.prefix.len() + marker_len..];
        let plain = adfl_decode(ciphered, out.seed);
        assert!(plain.ends_with(&framing.suffix));
        assert_eq!(&plain[..payload.len()], payload);
    }

    #[test]
    fn test_schema_pass_wraps_encoded_region() {
        let mut adapter = MockAdapter::new();
        let mut config = plain_config(1, 0);
        config.plain_decoder = false;

        let out = run(&mut adapter, &config, b"\x90\x90\x90\x90").unwrap();

        // Schema size follows (encoded - ciphered) / word + 1.
        let expected_size = adapter.decoder_marker.len() / 8 + 1;
        assert_eq!(adapter.schema_sizes, vec![expected_size]);
        assert!(out.bytes.starts_with(&adapter.schema_stub_marker));
    }

    #[test]
    fn test_garbage_failure_aborts() {
        let mut adapter = MockAdapter::new();
        adapter.fail_garbage = true;
        let err = run(&mut adapter, &plain_config(2, 4), b"\x01").unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::EncodeError::GarbageGeneration { .. }
        ));
    }

    #[test]
    fn test_determinism_with_fixed_randomness() {
        let payload = b"\x11\x22\x33";
        let mut config = EncoderConfig::new(64);
        config.pass_count = 3;
        config.obfuscation_budget = 12;
        config.plain_decoder = false;
        config.seed = 42;

        let mut first = MockAdapter::new();
        first.rng = FixedRandom::new(vec![1, 2, 3, 4, 5]);
        let mut second = MockAdapter::new();
        second.rng = FixedRandom::new(vec![1, 2, 3, 4, 5]);

        let a = run(&mut first, &config, payload).unwrap();
        let b = run(&mut second, &config, payload).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.seed, b.seed);
    }
}
