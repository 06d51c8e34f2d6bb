//! Error types for the NIS client.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while encoding or reading length-prefixed frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The command does not fit behind a 16-bit length prefix.
    #[error("command is {0} bytes, frames carry at most 65535")]
    CommandTooLong(usize),

    /// The stream ended part way through a length prefix.
    #[error("stream ended inside a length prefix before the response terminator")]
    TruncatedPrefix,

    /// The stream ended part way through a chunk body.
    #[error("stream ended inside a {expected} byte chunk after {received} bytes")]
    TruncatedChunk { expected: usize, received: usize },

    /// Reading or writing the underlying stream failed.
    #[error("frame I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Lifecycle state of a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unopened => "unopened",
            SessionState::Open => "open",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Errors produced by a transport session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The connection could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The connect, send or receive deadline expired.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// `send` or `receive` was called outside the open state.
    #[error("session is {0}, not open")]
    NotOpen(SessionState),

    /// Framing or I/O failure mid-exchange.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Errors produced while decoding a status report.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// A non-empty line has no `:` separator.
    #[error("line {line_number} does not contain separator character: {line:?}")]
    MissingSeparator { line_number: usize, line: String },

    /// A numeric field could not be parsed.
    #[error("invalid number for {key}: {value:?}")]
    InvalidNumber { key: String, value: String },

    /// `STATFLAG` is not hexadecimal.
    #[error("invalid hexadecimal status flags for {key}: {value:?}")]
    InvalidFlags { key: String, value: String },

    /// A date field matched none of the accepted formats.
    #[error("invalid date for {key}: {value:?}")]
    InvalidDate { key: String, value: String },
}

impl DecodeError {
    /// The status key whose value failed to decode, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            DecodeError::MissingSeparator { .. } => None,
            DecodeError::InvalidNumber { key, .. }
            | DecodeError::InvalidFlags { key, .. }
            | DecodeError::InvalidDate { key, .. } => Some(key),
        }
    }
}

/// The fetch stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Send,
    Receive,
    Decode,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Connect => "connect",
            Stage::Send => "send",
            Stage::Receive => "receive",
            Stage::Decode => "decode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed snapshot fetch, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connect failed: {0}")]
    Connect(#[source] SessionError),

    #[error("sending the status command failed: {0}")]
    Send(#[source] SessionError),

    #[error("receiving the status report failed: {0}")]
    Receive(#[source] SessionError),

    #[error("decoding the status report failed: {0}")]
    Decode(#[source] DecodeError),
}

impl FetchError {
    /// The stage this error originated from.
    pub fn stage(&self) -> Stage {
        match self {
            FetchError::Connect(_) => Stage::Connect,
            FetchError::Send(_) => Stage::Send,
            FetchError::Receive(_) => Stage::Receive,
            FetchError::Decode(_) => Stage::Decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_stage() {
        let err = FetchError::Send(SessionError::NotOpen(SessionState::Closed));
        assert_eq!(err.stage(), Stage::Send);
        assert_eq!(err.stage().to_string(), "send");

        let err = FetchError::Decode(DecodeError::InvalidNumber {
            key: "LINEV".to_string(),
            value: "1.2.3".to_string(),
        });
        assert_eq!(err.stage(), Stage::Decode);
    }

    #[test]
    fn test_decode_error_names_key() {
        let err = DecodeError::InvalidDate {
            key: "BATTDATE".to_string(),
            value: "soon".to_string(),
        };
        assert_eq!(err.key(), Some("BATTDATE"));
        assert!(err.to_string().contains("BATTDATE"));

        let err = DecodeError::MissingSeparator {
            line_number: 2,
            line: "garbage".to_string(),
        };
        assert_eq!(err.key(), None);
        assert!(err.to_string().contains("separator"));
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::NotOpen(SessionState::Unopened);
        assert_eq!(err.to_string(), "session is unopened, not open");
    }
}
