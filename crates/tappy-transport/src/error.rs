use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Failures raised by a communicator.
///
/// Sessions hand these to their error listener unchanged, wrapped as a
/// connection error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device-side socket could not be created.
    #[error("cannot listen on {path}: {source}")]
    Bind { path: PathBuf, source: io::Error },

    /// The device socket could not be reached.
    #[error("cannot reach device at {path}: {source}")]
    Connect { path: PathBuf, source: io::Error },

    #[error("accepting host connection failed: {0}")]
    Accept(#[source] io::Error),

    /// Read or write failure on an open link.
    #[error("device link I/O error: {0}")]
    Io(#[from] io::Error),

    /// `sun_path` cannot hold the socket path.
    #[error("socket path {path} is {len} bytes, limit is {max}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The operation needs an open link.
    #[error("communicator is not connected")]
    NotConnected,

    /// The device stopped draining the socket and a write hit the
    /// configured write timeout. Part of the frame may have been sent.
    #[error("device did not accept data within {0:?}")]
    WriteTimeout(Duration),

    /// The other end hung up.
    #[error("device link closed by peer")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
