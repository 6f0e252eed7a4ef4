//! Spooled payload bytes for received payload-bearing messages.
//!
//! The protocol serializes payload bytes in-band, immediately after the
//! textual header, so the receive loop cannot decode the next message until
//! the payload is fully drained. Draining into a spool decouples observers
//! from the socket: small payloads stay in memory, large ones go to a
//! temporary file so arbitrarily large transfers never require unbounded
//! buffering.

use crate::error::CodecError;
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Payloads up to this size are spooled in memory; larger ones go to disk.
pub const SPOOL_MEMORY_LIMIT: u64 = 256 * 1024;

/// The drained payload of a received message.
///
/// Cheap to share via `Arc`; every call to [`reader`](Payload::reader)
/// yields an independent reader over the same bytes.
#[derive(Debug)]
pub struct Payload {
    len: u64,
    spool: Spool,
}

#[derive(Debug)]
enum Spool {
    Memory(Arc<Vec<u8>>),
    File(NamedTempFile),
}

impl Payload {
    /// Drain exactly `len` bytes from `reader` into a new spool.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEof`] if the stream ends early (fatal: the
    /// payload boundary is lost), or an I/O error from the stream or the
    /// spool file.
    pub async fn spool<R>(reader: &mut R, len: u64) -> Result<Self, CodecError>
    where
        R: AsyncRead + Unpin,
    {
        if len <= SPOOL_MEMORY_LIMIT {
            let mut buf = vec![0u8; len as usize];
            reader
                .read_exact(&mut buf)
                .await
                .map_err(map_payload_eof)?;
            return Ok(Self {
                len,
                spool: Spool::Memory(Arc::new(buf)),
            });
        }

        let file = NamedTempFile::new()?;
        let mut out = tokio::fs::File::from_std(file.reopen()?);
        let mut chunk = vec![0u8; 64 * 1024];
        let mut remaining = len;
        while remaining > 0 {
            let want = chunk.len().min(remaining as usize);
            let n = reader
                .read(&mut chunk[..want])
                .await
                .map_err(CodecError::Io)?;
            if n == 0 {
                return Err(CodecError::UnexpectedEof);
            }
            out.write_all(&chunk[..n]).await?;
            remaining -= n as u64;
        }
        out.flush().await?;
        Ok(Self {
            len,
            spool: Spool::File(file),
        })
    }

    /// Build a payload directly from bytes. Used by tests and by callers
    /// that synthesize replies.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            len: data.len() as u64,
            spool: Spool::Memory(Arc::new(data)),
        }
    }

    /// The payload length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A fresh reader over the payload bytes.
    pub fn reader(&self) -> io::Result<Box<dyn Read + Send>> {
        match &self.spool {
            Spool::Memory(bytes) => Ok(Box::new(Cursor::new(SharedBytes(bytes.clone())))),
            Spool::File(file) => Ok(Box::new(file.reopen()?)),
        }
    }

    /// Read the whole payload into memory.
    pub fn bytes(&self) -> io::Result<Vec<u8>> {
        match &self.spool {
            Spool::Memory(bytes) => Ok(bytes.as_ref().clone()),
            Spool::File(file) => {
                let mut buf = Vec::with_capacity(self.len as usize);
                file.reopen()?.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

fn map_payload_eof(err: io::Error) -> CodecError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::UnexpectedEof
    } else {
        CodecError::Io(err)
    }
}

/// `Arc<Vec<u8>>` wrapper so a `Cursor` can read shared bytes without
/// copying them per reader.
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
