//! Host boundary tests: the call never throws, it reports through the value.

use sgn::host::{encode_hex, EncodeRequest};

fn request(payload_hex: &str) -> EncodeRequest {
    EncodeRequest {
        arch_id: 64,
        pass_count: 1,
        obfuscation_budget: 10,
        plain_decoder: true,
        ascii_only: false,
        preserve_registers: false,
        forbidden_hex: String::new(),
        payload_hex: payload_hex.to_string(),
    }
}

#[test]
fn encodes_plain_hex_payload() {
    let response = encode_hex(&request("4831c0"));
    assert_eq!(response.error, None);
    let result_hex = response.result_hex.expect("result expected");
    let bytes = hex::decode(&result_hex).unwrap();
    assert!(bytes.len() > 3);
}

#[test]
fn accepts_escaped_hex_separators() {
    let response = encode_hex(&request("\\x48\\x31\\xc0"));
    assert_eq!(response.error, None);
    assert!(response.result_hex.is_some());
}

#[test]
fn reports_malformed_payload_hex() {
    let response = encode_hex(&request("zzzz"));
    assert!(response.result_hex.is_none());
    assert!(response.error.unwrap().contains("hex"));
}

#[test]
fn reports_malformed_forbidden_hex() {
    let mut req = request("4831c0");
    req.forbidden_hex = "0g".to_string();
    let response = encode_hex(&req);
    assert!(response.result_hex.is_none());
    assert!(response.error.is_some());
}

#[test]
fn reports_unsupported_architecture() {
    let mut req = request("4831c0");
    req.arch_id = 16;
    let response = encode_hex(&req);
    assert!(response.result_hex.is_none());
    assert!(response.error.unwrap().contains("architecture"));
}

#[test]
fn reports_empty_payload() {
    let response = encode_hex(&request(""));
    assert!(response.result_hex.is_none());
    assert!(response.error.is_some());
}
