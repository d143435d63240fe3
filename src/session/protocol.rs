//! Wire protocol between a [`RemoteSession`](super::RemoteSession) and
//! [`serve`](super::serve).
//!
//! Every frame is a 4-byte little-endian length followed by that many bytes
//! of JSON.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::{CtxFlags, Response};

/// Largest frame either side accepts.
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Request from a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Send { fragment: String, flags: CtxFlags },
    Recv,
}

/// Reply from the server, one per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reply {
    /// `ready` is true when the fragment completed a statement
    Sent { ready: bool },
    Value(Response),
    Error { code: i32, message: String },
}

/// Write a length-prefixed message.
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let len = u32::try_from(json.len())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "message too large"))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read a length-prefixed message.
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "message too large",
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    serde_json::from_slice(&buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
