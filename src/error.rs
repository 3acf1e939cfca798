use std::fmt;
use std::io;
use std::string::FromUtf8Error;

/// Error type returned by message and disconnect handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which of the two stdio streams an operation was trying to acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Input,
    Output,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Input => f.write_str("input"),
            StreamKind::Output => f.write_str("output"),
        }
    }
}

/// Errors surfaced by framing, sending, and the listen loop.
///
/// Nothing here is retried internally: every variant reaches the caller of the
/// operation that hit it.
#[derive(Debug, thiserror::Error)]
pub enum NmError {
    /// The stream ended before a declared prefix or payload was fully read.
    #[error("truncated frame: stream ended after {received} of {expected} bytes")]
    TruncatedFrame { expected: usize, received: usize },

    /// The payload bytes are not valid UTF-8.
    #[error("frame payload is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] FromUtf8Error),

    /// The message handler returned an error. The disconnect handler is not invoked.
    #[error("message handler failed: {0}")]
    Handler(#[source] BoxError),

    /// The disconnect handler returned an error.
    #[error("disconnect handler failed: {0}")]
    DisconnectHandler(#[source] BoxError),

    /// The stream provider could not supply a stream.
    #[error("failed to acquire {kind} stream: {source}")]
    StreamAcquisition {
        kind: StreamKind,
        #[source]
        source: io::Error,
    },

    /// The input stream ended cleanly at a frame boundary.
    ///
    /// This is what the host sees when the browser closes stdin instead of
    /// sending a zero-length frame. Hosts usually treat it as a normal shutdown.
    #[error("input stream closed before a frame prefix was read")]
    StreamClosed,

    /// An empty message cannot be sent: its prefix would be the disconnect sentinel.
    #[error("refusing to send an empty message (a zero prefix is the disconnect sentinel)")]
    EmptyMessage,

    /// The message does not fit the frame prefix or a configured limit.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing a frame.
    #[error("frame I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NmError {
    pub(crate) fn acquisition(kind: StreamKind, source: io::Error) -> Self {
        NmError::StreamAcquisition { kind, source }
    }

    /// `true` for errors caused by bytes on the wire that do not form a valid frame.
    pub fn is_malformed_frame(&self) -> bool {
        matches!(
            self,
            NmError::TruncatedFrame { .. } | NmError::InvalidEncoding(_)
        )
    }

    /// `true` when a caller-supplied handler failed.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, NmError::Handler(_) | NmError::DisconnectHandler(_))
    }
}

pub type Result<T> = std::result::Result<T, NmError>;
