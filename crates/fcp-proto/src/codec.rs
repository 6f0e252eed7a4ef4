//! Text framing codec.
//!
//! Messages are encoded as a bare name line, `Key=Value` field lines, and a
//! terminator line: `EndMessage` for header-only messages, or `Data`
//! followed immediately by exactly `DataLength` raw bytes. The decoder
//! tolerates CRLF and LF line endings.

use crate::error::CodecError;
use crate::message::{FcpMessage, ReceivedMessage};
use crate::payload::Payload;
use crate::{DATA, DATA_LENGTH_FIELD, END_MESSAGE};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Serialize a message to its wire encoding.
///
/// When a payload is attached the terminator is `Data` and the payload bytes
/// follow verbatim. The producer guarantees `DataLength` matches the payload
/// length; this function does not verify it.
pub fn encode(message: &FcpMessage) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    out.extend_from_slice(message.name().as_bytes());
    out.push(b'\n');
    for (key, value) in message.fields() {
        out.extend_from_slice(key.as_bytes());
        out.push(b'=');
        out.extend_from_slice(value.as_bytes());
        out.push(b'\n');
    }
    match message.payload_bytes() {
        Some(payload) => {
            out.extend_from_slice(DATA.as_bytes());
            out.push(b'\n');
            out.extend_from_slice(payload);
        }
        None => {
            out.extend_from_slice(END_MESSAGE.as_bytes());
            out.push(b'\n');
        }
    }
    out
}

/// Decode one message from the stream, draining any payload into a spool.
///
/// Blank lines between messages are skipped. Returns
/// [`CodecError::Eof`] when the stream ends cleanly between messages,
/// [`CodecError::UnexpectedEof`] when it ends inside one. Either way the
/// connection is unusable afterwards; framing cannot resynchronize.
pub async fn read_message<R>(reader: &mut R) -> Result<ReceivedMessage, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    let name = loop {
        match read_wire_line(reader).await? {
            None => return Err(CodecError::Eof),
            Some(line) if line.is_empty() => continue,
            Some(line) => break line,
        }
    };

    let mut message = FcpMessage::new(name);
    loop {
        let line = read_wire_line(reader)
            .await?
            .ok_or(CodecError::UnexpectedEof)?;
        if line == END_MESSAGE {
            return Ok(ReceivedMessage {
                message,
                payload: None,
            });
        }
        if line == DATA {
            let length = message.data_length().ok_or_else(|| {
                CodecError::InvalidDataLength(
                    message.get(DATA_LENGTH_FIELD).unwrap_or("").to_string(),
                )
            })?;
            let payload = Payload::spool(reader, length).await?;
            return Ok(ReceivedMessage {
                message,
                payload: Some(Arc::new(payload)),
            });
        }
        match line.split_once('=') {
            Some((key, value)) => message.set(key, value),
            None => return Err(CodecError::MalformedLine(line)),
        }
    }
}

/// Longest accepted header line. Payload bytes are spooled separately, so
/// anything beyond this in the header is a framing failure, not data; the
/// cap keeps a misbehaving peer from growing one line without bound.
const MAX_LINE_LENGTH: usize = 16 * 1024;

/// Read one line, stripping the trailing LF or CRLF. `None` at end of
/// stream.
async fn read_wire_line<R>(reader: &mut R) -> Result<Option<String>, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line: Vec<u8> = Vec::new();
    let terminated = loop {
        let (consumed, newline) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                break false;
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    line.extend_from_slice(&available[..pos]);
                    (pos + 1, true)
                }
                None => {
                    line.extend_from_slice(available);
                    (available.len(), false)
                }
            }
        };
        reader.consume(consumed);
        if line.len() > MAX_LINE_LENGTH {
            return Err(CodecError::MalformedLine(format!(
                "header line exceeds {MAX_LINE_LENGTH} bytes"
            )));
        }
        if newline {
            break true;
        }
    };
    if line.is_empty() && !terminated {
        return Ok(None);
    }
    if line.ends_with(b"\r") {
        line.pop();
    }
    String::from_utf8(line)
        .map(Some)
        .map_err(|bad| CodecError::MalformedLine(String::from_utf8_lossy(bad.as_bytes()).into_owned()))
}
