use super::*;
use crate::runtime::error::RuntimeErrorKind;

fn sample_header() -> FrameHeader {
    FrameHeader {
        frame_type: FrameType::Data,
        flags: FLAG_END_STREAM,
        length: 512,
        stream_id: 0x0102_0304_0506_0708,
    }
}

#[test]
fn test_header_round_trip() {
    let header = sample_header();
    let encoded = encode_header(&header);
    let decoded = decode_header(&encoded).expect("decode should succeed");
    assert_eq!(decoded, header);
}

#[test]
fn test_header_layout_is_big_endian() {
    let encoded = encode_header(&sample_header());
    assert_eq!(&encoded[0..4], &0x4842_5331u32.to_be_bytes());
    assert_eq!(&encoded[4..6], &0x0001u16.to_be_bytes());
    assert_eq!(encoded[6], FrameType::Data as u8);
    assert_eq!(encoded[7], FLAG_END_STREAM);
    assert_eq!(&encoded[8..12], &512u32.to_be_bytes());
    assert_eq!(&encoded[12..20], &0x0102_0304_0506_0708u64.to_be_bytes());
}

#[test]
fn test_single_bit_corruption_detected() {
    let header = sample_header();
    let encoded = encode_header(&header);

    // Flip one bit in each covered byte; every corruption must be caught
    // (as a CRC mismatch or an earlier structural check).
    for byte_index in 0..20 {
        let mut corrupted = encoded;
        corrupted[byte_index] ^= 0x10;
        let result = decode_header(&corrupted);
        assert!(
            result.is_err(),
            "corruption at byte {byte_index} went undetected"
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind(), RuntimeErrorKind::Transport);
    }
}

#[test]
fn test_bad_magic_rejected() {
    let mut encoded = encode_header(&sample_header());
    encoded[0] = 0x00;
    let err = decode_header(&encoded).unwrap_err();
    assert!(err.message.contains("invalid frame magic"));
}

#[test]
fn test_unknown_frame_type_rejected() {
    let header = sample_header();
    let mut encoded = encode_header(&header);
    encoded[6] = 0x2A;
    // Re-seal the CRC so only the type check can fail.
    let crc = crc32fast::hash(&encoded[0..20]);
    encoded[20..24].copy_from_slice(&crc.to_be_bytes());
    let err = decode_header(&encoded).unwrap_err();
    assert!(err.message.contains("unknown frame type"));
}

#[test]
fn test_unsupported_version_rejected() {
    let header = sample_header();
    let mut encoded = encode_header(&header);
    encoded[4..6].copy_from_slice(&0x0002u16.to_be_bytes());
    let crc = crc32fast::hash(&encoded[0..20]);
    encoded[20..24].copy_from_slice(&crc.to_be_bytes());
    let err = decode_header(&encoded).unwrap_err();
    assert!(err.message.contains("unsupported frame version"));
}

#[test]
fn test_frame_type_values_match_wire() {
    assert_eq!(FrameType::Data as u8, 0);
    assert_eq!(FrameType::Settings as u8, 1);
    assert_eq!(FrameType::Goodbye as u8, 2);
    assert_eq!(FrameType::Ping as u8, 3);
    assert_eq!(FrameType::Cancel as u8, 4);
    assert_eq!(FrameType::Error as u8, 5);
    assert_eq!(FrameType::from_u8(6), None);
}

#[test]
fn test_end_stream_flag() {
    let mut header = FrameHeader::new(FrameType::Data);
    assert!(!header.end_stream());
    header.flags = FLAG_END_STREAM;
    assert!(header.end_stream());
}
