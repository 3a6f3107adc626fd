//! Session layer for Tappy NFC readers.
//!
//! A [`Session`] sits between a [`Communicator`](tappy_transport::Communicator)
//! and the caller: outgoing messages are composed, framed and handed to the
//! transport; inbound bytes are reassembled and reported to a message or an
//! error listener.

pub mod error;
pub mod event;
pub mod session;
pub mod tag;

pub use error::{Result, SessionError};
pub use event::{split_frame_event, ErrorEvent, ErrorType};
pub use session::{Session, SessionBuilder};
pub use tag::{resolve_tag_type, tag_types, TagType, TAG_TYPES};
