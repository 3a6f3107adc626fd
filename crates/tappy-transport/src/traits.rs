use bytes::Bytes;

use crate::error::Result;

/// A channel to a Tappy device.
///
/// Implementations own the connection lifecycle and move raw byte buffers.
/// They never interpret the bytes; framing and packet validation happen in
/// the layers above.
pub trait Communicator {
    /// Open the underlying channel. Connecting an already-connected
    /// communicator is a no-op.
    fn connect(&mut self) -> Result<()>;

    /// Close the underlying channel. Disconnecting twice is a no-op.
    fn disconnect(&mut self) -> Result<()>;

    /// Whether the channel is currently open.
    fn is_connected(&self) -> bool;

    /// Hand a complete buffer to the channel for transmission.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flush anything the channel has buffered.
    fn flush(&mut self) -> Result<()>;
}

/// A communicator that can be polled for inbound data.
pub trait ChunkSource {
    /// Read the next chunk of inbound bytes.
    ///
    /// Returns `Ok(None)` when nothing arrived before the configured read
    /// timeout. Chunk boundaries carry no meaning.
    fn read_chunk(&mut self) -> Result<Option<Bytes>>;
}

impl<C: Communicator + ?Sized> Communicator for Box<C> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<C: ChunkSource + ?Sized> ChunkSource for Box<C> {
    fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        (**self).read_chunk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        connected: bool,
        sent: usize,
    }

    impl Communicator for Counting {
        fn connect(&mut self) -> Result<()> {
            self.connected = true;
            Ok(())
        }

        fn disconnect(&mut self) -> Result<()> {
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn send(&mut self, bytes: &[u8]) -> Result<()> {
            self.sent += bytes.len();
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn boxed_communicator_forwards_calls() {
        let mut boxed: Box<dyn Communicator> = Box::new(Counting::default());
        assert!(!boxed.is_connected());
        boxed.connect().unwrap();
        assert!(boxed.is_connected());
        boxed.send(&[1, 2, 3]).unwrap();
        boxed.flush().unwrap();
        boxed.disconnect().unwrap();
        assert!(!boxed.is_connected());
    }
}
