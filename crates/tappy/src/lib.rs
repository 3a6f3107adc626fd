//! Host-side protocol stack for Tappy NFC readers.
//!
//! # Crate Structure
//!
//! - [`transport`]: communicator abstraction and the Unix socket transport
//! - [`frame`]: CRC16, HDLC-style escaping, TCMP packets and stream reassembly
//! - [`session`]: send/receive session with message and error listeners,
//!   plus the tag-type catalog

/// Re-export transport types.
pub mod transport {
    pub use tappy_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use tappy_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use tappy_session::*;
}

pub use tappy_frame::{Message, TcmpMessage};
pub use tappy_session::{ErrorEvent, ErrorType, Session, SessionBuilder};
