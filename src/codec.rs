//! Native messaging frame codec.
//!
//! Wire format, identical in both directions:
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────┐
//! │ Length (4B, native)  │ Payload (Length bytes)   │
//! │ u32, UTF-8 byte count│ UTF-8 text, usually JSON │
//! └──────────────────────┴──────────────────────────┘
//! ```
//!
//! A length of `0` is the disconnect sentinel. The codec reports it as a plain
//! `0`; deciding that it ends a session is the listen loop's job.

use std::io::{ErrorKind, Read};

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::blocking::{self, Blocking};
use crate::error::{NmError, Result};

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// The frame a peer sends to end the session.
pub const DISCONNECT_FRAME: [u8; PREFIX_LEN] = [0; PREFIX_LEN];

/// Encode a message into a frame: native-endian `u32` byte length + UTF-8 bytes.
///
/// No size policy is applied here. The only failure is a message whose byte
/// length does not fit in the `u32` prefix.
pub fn encode(message: &str) -> Result<Vec<u8>> {
    let payload = message.as_bytes();
    let len = u32::try_from(payload.len()).map_err(|_| NmError::MessageTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(&len.to_ne_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Fill `buf` from `reader`, stopping early only at EOF. Returns the bytes read.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(NmError::Io(err)),
        }
    }
    Ok(filled)
}

/// Read the 4-byte length prefix.
///
/// Returns `Err(NmError::StreamClosed)` if the stream is already at EOF and
/// `Err(NmError::TruncatedFrame)` if it ends inside the prefix. A returned `0`
/// is the disconnect sentinel.
pub async fn read_prefix<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32> {
    let mut prefix = [0u8; PREFIX_LEN];
    match read_full(reader, &mut prefix).await? {
        0 => Err(NmError::StreamClosed),
        PREFIX_LEN => Ok(u32::from_ne_bytes(prefix)),
        received => Err(NmError::TruncatedFrame {
            expected: PREFIX_LEN,
            received,
        }),
    }
}

/// Read exactly `len` payload bytes and decode them as UTF-8.
pub async fn read_payload<R: AsyncRead + Unpin>(reader: &mut R, len: u32) -> Result<String> {
    let expected = len as usize;
    // Grow with the data instead of trusting the prefix for one large allocation.
    let mut buf = Vec::new();
    let received = reader.take(u64::from(len)).read_to_end(&mut buf).await?;
    if received < expected {
        return Err(NmError::TruncatedFrame { expected, received });
    }
    Ok(String::from_utf8(buf)?)
}

/// Read one complete frame. A zero prefix yields an empty string.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let len = read_prefix(reader).await?;
    read_payload(reader, len).await
}

/// Blocking form of [`read_prefix`].
pub fn decode_prefix<R: Read>(reader: &mut R) -> Result<u32> {
    blocking::resolve(read_prefix(&mut Blocking(reader)))
}

/// Blocking form of [`read_payload`].
pub fn decode_payload<R: Read>(reader: &mut R, len: u32) -> Result<String> {
    blocking::resolve(read_payload(&mut Blocking(reader), len))
}

/// Decode a single framed message from a reader (useful in tests).
pub fn decode_message<R: Read>(reader: &mut R) -> Result<String> {
    blocking::resolve(read_message(&mut Blocking(reader)))
}
