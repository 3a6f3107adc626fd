use std::time::Duration;

/// Default size of a single inbound read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration for stream-backed communicators.
#[derive(Debug, Clone)]
pub struct CommunicatorConfig {
    /// How long `read_chunk` waits for data before reporting "nothing yet".
    /// `None` blocks until data or EOF.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking sends.
    pub write_timeout: Option<Duration>,
    /// Maximum number of bytes returned by one `read_chunk` call.
    pub read_chunk_size: usize,
}

impl Default for CommunicatorConfig {
    fn default() -> Self {
        Self {
            read_timeout: Some(Duration::from_millis(100)),
            write_timeout: Some(Duration::from_secs(5)),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
