//! The direct-disk-access handshake.
//!
//! Before a node accepts disk-based uploads from (or performs disk-based
//! downloads for) a client, it challenges the client to prove filesystem
//! access to the directory in question: the node names a file the client
//! must read the content of and/or a file the client must create with
//! node-chosen content, and then reports a per-direction verdict.
//!
//! [`DdaSession`] holds the client side of one such handshake. It is pure
//! request/reply bookkeeping plus best-effort local file I/O; sending the
//! produced messages is the caller's job, which keeps the session usable
//! from inside a synchronous dialog hook.

use fcp_proto::messages::{TestDdaComplete, TestDdaReply};
use fcp_proto::{requests, FcpMessage};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Content sent in place of a challenge file that could not be read.
///
/// Proving access is the node's job; a client-side read failure simply
/// produces a response the node will reject for that direction.
pub const FAILED_TO_READ: &str = "failed-to-read";

/// The node's verdict for one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdaVerdict {
    /// Whether the node granted read access to the directory.
    pub read_allowed: bool,
    /// Whether the node granted write access to the directory.
    pub write_allowed: bool,
}

/// One direct-disk-access handshake for one directory.
#[derive(Debug)]
pub struct DdaSession {
    directory: String,
    want_read: bool,
    want_write: bool,
    verdict: Option<DdaVerdict>,
}

impl DdaSession {
    /// Start a handshake for `directory`, requesting the given directions.
    pub fn new(directory: impl Into<String>, want_read: bool, want_write: bool) -> Self {
        Self {
            directory: directory.into(),
            want_read,
            want_write,
            verdict: None,
        }
    }

    /// The directory this handshake is about.
    #[must_use]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// The `TestDDARequest` that opens the handshake.
    #[must_use]
    pub fn request(&self) -> FcpMessage {
        requests::test_dda_request(&self.directory, self.want_read, self.want_write)
    }

    /// Answer a challenge, or ignore one aimed at a different directory.
    ///
    /// Returns the `TestDDAResponse` to send, or `None` when the challenge
    /// names another directory. Challenge file I/O is best effort: a file
    /// that cannot be read yields [`FAILED_TO_READ`], a write failure is
    /// logged and otherwise ignored.
    pub fn handle_reply(&self, reply: &TestDdaReply) -> Option<FcpMessage> {
        if reply.directory() != Some(self.directory.as_str()) {
            return None;
        }
        let read_content = reply
            .read_filename()
            .map(|filename| read_first_line(filename.as_ref()))
            .unwrap_or_default();
        if let (Some(filename), Some(content)) = (reply.write_filename(), reply.content_to_write())
        {
            write_content(filename.as_ref(), content);
        }
        Some(requests::test_dda_response(&self.directory, &read_content))
    }

    /// Record the verdict, or ignore one for a different directory.
    ///
    /// Returns whether the message concluded this handshake.
    pub fn handle_complete(&mut self, complete: &TestDdaComplete) -> bool {
        if complete.directory() != Some(self.directory.as_str()) {
            return false;
        }
        self.verdict = Some(DdaVerdict {
            read_allowed: complete.read_directory_allowed(),
            write_allowed: complete.write_directory_allowed(),
        });
        true
    }

    /// The recorded verdict, once the handshake has concluded.
    #[must_use]
    pub fn verdict(&self) -> Option<DdaVerdict> {
        self.verdict
    }
}

/// First line of the challenge file, without the line terminator.
fn read_first_line(path: &Path) -> String {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(open_error) => {
            tracing::debug!(path = %path.display(), error = %open_error, "challenge file not readable");
            return FAILED_TO_READ.to_string();
        }
    };
    let mut line = String::new();
    if let Err(read_error) = BufReader::new(file).read_line(&mut line) {
        tracing::debug!(path = %path.display(), error = %read_error, "challenge file not readable");
        return FAILED_TO_READ.to_string();
    }
    line.truncate(line.trim_end_matches(['\r', '\n']).len());
    line
}

fn write_content(path: &Path, content: &str) {
    if let Err(write_error) = fs::write(path, content) {
        tracing::debug!(path = %path.display(), error = %write_error, "challenge file not writable");
    }
}
