//! Communicator abstraction for Tappy readers.
//!
//! The protocol layers never perform I/O themselves. They talk to a
//! [`Communicator`], which owns the connection lifecycle and moves raw
//! bytes, and optionally pull inbound chunks through a [`ChunkSource`].
//!
//! A Unix domain socket implementation is provided for serial bridges and
//! device emulators.

pub mod config;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use config::{CommunicatorConfig, DEFAULT_READ_CHUNK_SIZE};
pub use error::{Result, TransportError};
pub use traits::{ChunkSource, Communicator};

#[cfg(unix)]
pub use uds::{UnixSocketCommunicator, UnixSocketListener};
