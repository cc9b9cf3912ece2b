// This module is the host boundary: the single caller-facing operation exposed
// to a foreign embedding environment. Payload and forbidden-byte parameters
// arrive as hexadecimal text (case-insensitive, with literal \x separators
// allowed); results leave as hexadecimal text. The operation never panics or
// raises across the boundary - every failure, including malformed hex, comes
// back as a structured response with the error field set and the result null.

//! Hex-text host boundary.

use crate::core::adapter::ArchAdapter;
use crate::core::config::SEED_MODULUS;
use crate::core::driver::Encoder;
use crate::core::error::{EncodeError, EncodeResult};
use crate::core::EncoderConfig;
use crate::x64::X64Adapter;

/// Parameters of one boundary call.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub arch_id: u32,
    pub pass_count: u32,
    pub obfuscation_budget: usize,
    pub plain_decoder: bool,
    pub ascii_only: bool,
    pub preserve_registers: bool,
    /// Bytes the output must not contain, as hex text; empty for none.
    pub forbidden_hex: String,
    /// The payload to protect, as hex text.
    pub payload_hex: String,
}

/// Structured result of one boundary call; exactly one field is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeResponse {
    pub error: Option<String>,
    pub result_hex: Option<String>,
}

/// Encode a hex-text payload, reporting failure through the response value.
pub fn encode_hex(request: &EncodeRequest) -> EncodeResponse {
    match encode_inner(request) {
        Ok(result_hex) => EncodeResponse {
            error: None,
            result_hex: Some(result_hex),
        },
        Err(err) => EncodeResponse {
            error: Some(err.to_string()),
            result_hex: None,
        },
    }
}

fn encode_inner(request: &EncodeRequest) -> EncodeResult<String> {
    let payload = decode_hex_field(&request.payload_hex)?;
    let forbidden = if request.forbidden_hex.is_empty() {
        Vec::new()
    } else {
        decode_hex_field(&request.forbidden_hex)?
    };

    let mut adapter = X64Adapter::new();
    let mut config = EncoderConfig::new(request.arch_id);
    config.pass_count = request.pass_count;
    config.obfuscation_budget = request.obfuscation_budget;
    config.plain_decoder = request.plain_decoder;
    config.ascii_only = request.ascii_only;
    config.preserve_registers = request.preserve_registers;
    config.forbidden = forbidden;
    config.seed = adapter.random_byte() % SEED_MODULUS;

    let encoded = Encoder::new(adapter).encode(&config, &payload)?;
    log::info!(
        "Encoded {} payload bytes into {} bytes ({} attempt(s), seed {:#04x})",
        payload.len(),
        encoded.bytes.len(),
        encoded.attempts,
        encoded.seed
    );
    Ok(hex::encode(&encoded.bytes))
}

/// Decode case-insensitive hex text, stripping literal `\x` separators first.
pub fn decode_hex_field(text: &str) -> EncodeResult<Vec<u8>> {
    let stripped = text.replace("\\x", "");
    hex::decode(stripped.trim()).map_err(|err| EncodeError::InputDecode {
        reason: err.to_string(),
    })
}
