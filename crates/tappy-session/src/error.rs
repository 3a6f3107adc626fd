/// Errors returned to the caller of a session operation.
///
/// Conditions raised by the device or the link (disconnection, corrupted
/// frames) are not errors here; they go to the error listener as an
/// [`ErrorEvent`](crate::ErrorEvent).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The builder was finished without a communicator.
    #[error("a communicator is required to build a session")]
    MissingTransport,

    /// The outgoing message could not be encoded.
    #[error("frame error: {0}")]
    Frame(#[from] tappy_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
