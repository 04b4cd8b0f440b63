use super::*;
use crate::runtime::hb1::write_varint;

fn request_payload(
    module_id: u64,
    interface_id: u64,
    method_id: u64,
    encoding: u64,
    stream_id: u64,
    body: &[u8],
) -> Vec<u8> {
    let mut payload = Vec::new();
    write_varint(&mut payload, module_id);
    write_varint(&mut payload, interface_id);
    write_varint(&mut payload, method_id);
    write_varint(&mut payload, encoding);
    write_varint(&mut payload, stream_id);
    payload.extend_from_slice(body);
    payload
}

#[test]
fn test_parse_rpc_request_prefix_and_body() {
    let payload = request_payload(11, 22, 33, 0, 44, b"body");
    let parsed = parse_rpc_request(&payload).expect("request should parse");
    assert_eq!(parsed.request.module_id, 11);
    assert_eq!(parsed.request.interface_id, 22);
    assert_eq!(parsed.request.method_id, 33);
    assert_eq!(parsed.request.encoding, Encoding::Hb1);
    assert_eq!(parsed.stream_id, 44);
    assert_eq!(parsed.request.payload, b"body");
}

#[test]
fn test_parse_rpc_request_rejects_unknown_encoding() {
    let payload = request_payload(1, 2, 3, 9, 4, b"");
    let err = parse_rpc_request(&payload).unwrap_err();
    assert!(err.message.contains("unsupported encoding"));
}

#[test]
fn test_parse_rpc_request_truncated() {
    let mut payload = Vec::new();
    write_varint(&mut payload, 1);
    let err = parse_rpc_request(&payload).unwrap_err();
    assert!(err.message.contains("truncated varint"));
}

#[test]
fn test_response_payload_round_trip() {
    let payload = build_response_payload(Status::ApplicationError, b"details");
    let response = parse_rpc_response(&payload).expect("response should parse");
    assert_eq!(response.status, Status::ApplicationError);
    assert_eq!(response.body, b"details");
}

#[test]
fn test_response_payload_layout() {
    // varint(encoding=0) | u8(status) | body
    let payload = build_response_payload(Status::NotFound, b"x");
    assert_eq!(payload[0], 0);
    assert_eq!(payload[1], Status::NotFound as u8);
    assert_eq!(&payload[2..], b"x");
}

#[test]
fn test_parse_rpc_response_missing_status() {
    let mut payload = Vec::new();
    write_varint(&mut payload, 0);
    let err = parse_rpc_response(&payload).unwrap_err();
    assert!(err.message.contains("missing response status"));
}

#[test]
fn test_parse_rpc_response_unknown_status() {
    let mut payload = Vec::new();
    write_varint(&mut payload, 0);
    payload.push(0xFF);
    let err = parse_rpc_response(&payload).unwrap_err();
    assert!(err.message.contains("unknown response status"));
}

#[test]
fn test_context_config_defaults() {
    let config = ContextConfig::default();
    assert!(config.managed_reactor);
    assert_eq!(config.worker_threads, 0);
}
