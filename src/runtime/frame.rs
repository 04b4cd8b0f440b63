//! Frame layer: a fixed 24-byte big-endian header followed by the payload.
//!
//! ```text
//! offset  size   field
//! 0       4      magic   = 0x48425331
//! 4       2      version = 0x0001
//! 6       1      type
//! 7       1      flags  (bit 0 = end-of-stream)
//! 8       4      length = payload byte count
//! 12      8      stream id
//! 20      4      crc32 of bytes [0, 20)
//! ```

use crate::runtime::error::{Result, RuntimeError};

pub const FRAME_HEADER_SIZE: usize = 24;

/// Reserved connection preface for future version negotiation. Not sent
/// today; receivers must not require it.
pub const PREFACE_MAGIC: &[u8; 8] = b"HASTEN/1";

pub const FLAG_END_STREAM: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Data = 0x00,
    Settings = 0x01,
    Goodbye = 0x02,
    Ping = 0x03,
    Cancel = 0x04,
    Error = 0x05,
}

impl FrameType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(FrameType::Data),
            0x01 => Some(FrameType::Settings),
            0x02 => Some(FrameType::Goodbye),
            0x03 => Some(FrameType::Ping),
            0x04 => Some(FrameType::Cancel),
            0x05 => Some(FrameType::Error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FrameType::Data => "DATA",
            FrameType::Settings => "SETTINGS",
            FrameType::Goodbye => "GOODBYE",
            FrameType::Ping => "PING",
            FrameType::Cancel => "CANCEL",
            FrameType::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub flags: u8,
    pub length: u32,
    pub stream_id: u64,
}

impl FrameHeader {
    pub const MAGIC: u32 = 0x4842_5331; // "HBS1"
    pub const VERSION: u16 = 0x0001;

    pub fn new(frame_type: FrameType) -> Self {
        FrameHeader {
            frame_type,
            flags: 0,
            length: 0,
            stream_id: 0,
        }
    }

    pub fn end_stream(&self) -> bool {
        self.flags & FLAG_END_STREAM != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(frame_type: FrameType) -> Self {
        Frame {
            header: FrameHeader::new(frame_type),
            payload: Vec::new(),
        }
    }
}

/// Serializes a header. Magic and version are always written from the
/// constants; `length` must already reflect the payload size.
pub fn encode_header(header: &FrameHeader) -> [u8; FRAME_HEADER_SIZE] {
    let mut out = [0u8; FRAME_HEADER_SIZE];
    out[0..4].copy_from_slice(&FrameHeader::MAGIC.to_be_bytes());
    out[4..6].copy_from_slice(&FrameHeader::VERSION.to_be_bytes());
    out[6] = header.frame_type as u8;
    out[7] = header.flags;
    out[8..12].copy_from_slice(&header.length.to_be_bytes());
    out[12..20].copy_from_slice(&header.stream_id.to_be_bytes());
    let crc = crc32fast::hash(&out[0..FRAME_HEADER_SIZE - 4]);
    out[20..24].copy_from_slice(&crc.to_be_bytes());
    out
}

pub fn decode_header(buffer: &[u8; FRAME_HEADER_SIZE]) -> Result<FrameHeader> {
    let magic = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
    if magic != FrameHeader::MAGIC {
        return Err(RuntimeError::transport("invalid frame magic"));
    }
    let version = u16::from_be_bytes([buffer[4], buffer[5]]);
    if version != FrameHeader::VERSION {
        return Err(RuntimeError::transport("unsupported frame version"));
    }
    let frame_type = FrameType::from_u8(buffer[6])
        .ok_or_else(|| RuntimeError::transport("unknown frame type"))?;
    let flags = buffer[7];
    let length = u32::from_be_bytes([buffer[8], buffer[9], buffer[10], buffer[11]]);
    let stream_id = u64::from_be_bytes([
        buffer[12], buffer[13], buffer[14], buffer[15], buffer[16], buffer[17], buffer[18],
        buffer[19],
    ]);
    let header_crc = u32::from_be_bytes([buffer[20], buffer[21], buffer[22], buffer[23]]);
    let computed = crc32fast::hash(&buffer[0..FRAME_HEADER_SIZE - 4]);
    if computed != header_crc {
        return Err(RuntimeError::transport("frame header crc mismatch"));
    }

    Ok(FrameHeader {
        frame_type,
        flags,
        length,
        stream_id,
    })
}

#[cfg(test)]
#[path = "../tests/t_frame.rs"]
mod tests;
