//! RFC 6455 framing, restricted to what CDP needs.
//!
//! Client-to-server frames are FIN-only text and control frames with a
//! 4-byte mask. Server-to-client frames arrive unmasked; extended 16- and
//! 64-bit length encodings are accepted on read. Fragmentation and
//! extensions are not supported: Chromium sends CDP messages as single
//! text frames.

use crate::error::CdpError;

/// Frame opcodes used by the CDP transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// UTF-8 text payload (every CDP message).
    Text,
    /// Binary payload; ignored by the reader but decoded for completeness.
    Binary,
    /// Connection close.
    Close,
    /// Keepalive probe.
    Ping,
    /// Keepalive answer.
    Pong,
}

impl OpCode {
    fn to_bits(self) -> u8 {
        match self {
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
        }
    }

    fn from_bits(bits: u8) -> Result<Self, CdpError> {
        match bits {
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xA => Ok(Self::Pong),
            other => Err(CdpError::InvalidFrame(format!("unsupported opcode {other:#x}"))),
        }
    }

    /// Control frames are handled inline by the reader.
    pub fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Ping | Self::Pong)
    }
}

/// A decoded WebSocket frame. The payload is stored unmasked; the original
/// mask key is kept so that re-encoding a decoded client frame reproduces
/// the exact wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsFrame {
    /// Final-fragment flag; always set on frames we produce.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    /// Client mask key, `None` on server frames.
    pub mask: Option<[u8; 4]>,
    /// Unmasked payload bytes.
    pub payload: Vec<u8>,
}

impl WsFrame {
    /// A masked client text frame.
    pub fn text(payload: Vec<u8>, mask: [u8; 4]) -> Self {
        Self {
            fin: true,
            opcode: OpCode::Text,
            mask: Some(mask),
            payload,
        }
    }

    /// A masked client ping frame.
    pub fn ping(payload: Vec<u8>, mask: [u8; 4]) -> Self {
        Self {
            fin: true,
            opcode: OpCode::Ping,
            mask: Some(mask),
            payload,
        }
    }

    /// A masked client pong frame echoing a ping payload.
    pub fn pong(payload: Vec<u8>, mask: [u8; 4]) -> Self {
        Self {
            fin: true,
            opcode: OpCode::Pong,
            mask: Some(mask),
            payload,
        }
    }

    /// A masked client close frame with no status code.
    pub fn close(mask: [u8; 4]) -> Self {
        Self {
            fin: true,
            opcode: OpCode::Close,
            mask: Some(mask),
            payload: Vec::new(),
        }
    }

    /// An unmasked server frame (used by tests standing in for Chromium).
    pub fn server(opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            fin: true,
            opcode,
            mask: None,
            payload,
        }
    }

    /// Encode to wire bytes with the minimal length encoding, applying the
    /// mask when present.
    pub fn encode(&self) -> Vec<u8> {
        let len = self.payload.len();
        let mut out = Vec::with_capacity(len + 14);

        let mut b0 = self.opcode.to_bits();
        if self.fin {
            b0 |= 0x80;
        }
        out.push(b0);

        let mask_bit = if self.mask.is_some() { 0x80 } else { 0x00 };
        if len < 126 {
            out.push(mask_bit | len as u8);
        } else if len <= usize::from(u16::MAX) {
            out.push(mask_bit | 126);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            out.push(mask_bit | 127);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }

        match self.mask {
            Some(key) => {
                out.extend_from_slice(&key);
                let start = out.len();
                out.extend_from_slice(&self.payload);
                apply_mask(&mut out[start..], key);
            }
            None => out.extend_from_slice(&self.payload),
        }
        out
    }
}

/// XOR a payload with a 4-byte mask key, in place. Applying twice restores
/// the original bytes.
pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= key[i & 3];
    }
}

/// A parsed frame header. `header_len` bytes of prefix precede
/// `payload_len` bytes of (possibly masked) payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Final-fragment flag.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    /// Mask key, when the mask bit is set.
    pub mask: Option<[u8; 4]>,
    /// Length of the header itself.
    pub header_len: usize,
    /// Length of the payload that follows.
    pub payload_len: usize,
}

impl FrameHeader {
    /// Total wire length of the frame this header describes.
    pub fn frame_len(&self) -> usize {
        self.header_len + self.payload_len
    }
}

/// Parse a frame header from the front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed; the reader keeps
/// appending and retries.
pub fn parse_header(buf: &[u8]) -> Result<Option<FrameHeader>, CdpError> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let b0 = buf[0];
    if b0 & 0x70 != 0 {
        return Err(CdpError::InvalidFrame("reserved bits set".to_string()));
    }
    let fin = b0 & 0x80 != 0;
    let opcode = OpCode::from_bits(b0 & 0x0F)?;
    if opcode.is_control() && !fin {
        return Err(CdpError::InvalidFrame("fragmented control frame".to_string()));
    }

    let masked = buf[1] & 0x80 != 0;
    let length_code = buf[1] & 0x7F;
    let (extra, mut header_len) = match length_code {
        126 => (2usize, 4usize),
        127 => (8, 10),
        _ => (0, 2),
    };
    if buf.len() < 2 + extra {
        return Ok(None);
    }

    let payload_len = match extra {
        2 => usize::from(u16::from_be_bytes([buf[2], buf[3]])),
        8 => {
            let len = u64::from_be_bytes(buf[2..10].try_into().expect("8 bytes"));
            usize::try_from(len)
                .map_err(|_| CdpError::InvalidFrame(format!("frame too large: {len}")))?
        }
        _ => usize::from(length_code),
    };

    let mask = if masked {
        if buf.len() < header_len + 4 {
            return Ok(None);
        }
        let key = buf[header_len..header_len + 4].try_into().expect("4 bytes");
        header_len += 4;
        Some(key)
    } else {
        None
    };

    Ok(Some(FrameHeader {
        fin,
        opcode,
        mask,
        header_len,
        payload_len,
    }))
}

/// Decode one complete frame from the front of `buf`.
///
/// Returns the frame (payload unmasked) and the number of bytes consumed,
/// or `Ok(None)` when the buffer does not yet hold a whole frame.
pub fn decode(buf: &[u8]) -> Result<Option<(WsFrame, usize)>, CdpError> {
    let Some(header) = parse_header(buf)? else {
        return Ok(None);
    };
    if buf.len() < header.frame_len() {
        return Ok(None);
    }

    let mut payload = buf[header.header_len..header.frame_len()].to_vec();
    if let Some(key) = header.mask {
        apply_mask(&mut payload, key);
    }

    Ok(Some((
        WsFrame {
            fin: header.fin,
            opcode: header.opcode,
            mask: header.mask,
            payload,
        },
        header.frame_len(),
    )))
}
