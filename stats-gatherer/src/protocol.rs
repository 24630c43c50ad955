//! Memcached binary protocol, restricted to the `STAT` command.
//!
//! A stats request is a bare 24 byte header. The server answers with one response packet per
//! stat (key = stat name, value = stat value) and terminates the stream with a packet whose key
//! is empty.
//!
//! ```text
//!  0      1      2      3      4      5      6      7
//! +------+------+-------------+------+------+-------------+
//! |magic |opcode| key length  |extras| data |vbucket/status|
//! +------+------+-------------+------+------+-------------+
//! |      total body length    |          opaque           |
//! +---------------------------+---------------------------+
//! |                          cas                          |
//! +-------------------------------------------------------+
//! ```

use crate::{
    error::ProtocolError,
    metrics::RawStatsBlock,
};
use std::collections::BTreeMap;
use tokio::io::{
    AsyncRead,
    AsyncReadExt,
    AsyncWrite,
    AsyncWriteExt,
};

pub const HEADER_SIZE: usize = 24;
pub const REQUEST_MAGIC: u8 = 0x80;
pub const RESPONSE_MAGIC: u8 = 0x81;
pub const OPCODE_STAT: u8 = 0x10;
pub const STATUS_OK: u16 = 0x0000;

/// Upper bound for a single stat packet body.
pub const MAX_BODY_SIZE: u32 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub opcode: u8,
    pub key_len: u16,
    pub extras_len: u8,
    pub status: u16,
    pub body_len: u32,
    pub opaque: u32,
    pub cas: u64,
}

impl ResponseHeader {
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Result<Self, ProtocolError> {
        if buf[0] != RESPONSE_MAGIC {
            return Err(ProtocolError::BadMagic(buf[0]));
        }
        let header = Self {
            opcode: buf[1],
            key_len: u16::from_be_bytes([buf[2], buf[3]]),
            extras_len: buf[4],
            status: u16::from_be_bytes([buf[6], buf[7]]),
            body_len: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            opaque: u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
            cas: u64::from_be_bytes([
                buf[16], buf[17], buf[18], buf[19], buf[20], buf[21], buf[22], buf[23],
            ]),
        };

        if header.body_len > MAX_BODY_SIZE {
            return Err(ProtocolError::BodyTooLarge(header.body_len));
        }
        if u32::from(header.key_len) + u32::from(header.extras_len) > header.body_len {
            return Err(ProtocolError::MalformedBody {
                body_len: header.body_len,
                key_len: header.key_len,
                extras_len: header.extras_len,
            });
        }
        Ok(header)
    }

    /// Splits a body into `(key, value)`, skipping the extras.
    pub fn split_body<'a>(&self, body: &'a [u8]) -> (&'a [u8], &'a [u8]) {
        let key_start = usize::from(self.extras_len);
        let value_start = key_start + usize::from(self.key_len);
        (&body[key_start..value_start], &body[value_start..])
    }
}

pub fn encode_stat_request(opaque: u32) -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0] = REQUEST_MAGIC;
    buf[1] = OPCODE_STAT;
    buf[12..16].copy_from_slice(&opaque.to_be_bytes());
    buf
}

/// Encodes one stat packet as a server sends it. An empty `key` encodes the terminator.
pub fn encode_stat_response(key: &str, value: &str, opaque: u32) -> Vec<u8> {
    let body_len = key.len() + value.len();
    let mut buf = Vec::with_capacity(HEADER_SIZE + body_len);
    buf.push(RESPONSE_MAGIC);
    buf.push(OPCODE_STAT);
    buf.extend_from_slice(&(key.len() as u16).to_be_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(&STATUS_OK.to_be_bytes());
    buf.extend_from_slice(&(body_len as u32).to_be_bytes());
    buf.extend_from_slice(&opaque.to_be_bytes());
    buf.extend_from_slice(&0u64.to_be_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(value.as_bytes());
    buf
}

/// Sends one `STAT` request over `stream` and reads the full answer.
pub async fn request_stats<S>(stream: &mut S, opaque: u32) -> Result<RawStatsBlock, ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&encode_stat_request(opaque)).await?;
    stream.flush().await?;

    let mut stats = BTreeMap::new();
    let mut header_buf = [0u8; HEADER_SIZE];
    loop {
        stream.read_exact(&mut header_buf).await?;
        let header = ResponseHeader::decode(&header_buf)?;

        let mut body = vec![0u8; header.body_len as usize];
        stream.read_exact(&mut body).await?;

        if header.opcode != OPCODE_STAT {
            return Err(ProtocolError::UnexpectedOpcode(header.opcode));
        }
        if header.opaque != opaque {
            return Err(ProtocolError::OpaqueMismatch {
                expected: opaque,
                actual: header.opaque,
            });
        }
        if header.status != STATUS_OK {
            return Err(ProtocolError::Status(header.status));
        }

        let (key, value) = header.split_body(&body);
        if key.is_empty() {
            break;
        }
        let key = std::str::from_utf8(key)
            .map_err(|_| ProtocolError::InvalidUtf8(String::from_utf8_lossy(key).into_owned()))?;
        let value = std::str::from_utf8(value).map_err(|_| ProtocolError::InvalidUtf8(key.to_string()))?;
        stats.insert(key.to_string(), value.to_string());
    }

    trace!(stats = stats.len(), "Received stats");
    Ok(RawStatsBlock::new(stats))
}
