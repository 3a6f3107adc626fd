use tappy_frame::{compose_message, escape, Message, Reassembler, ReassemblerConfig, TcmpMessage};
use tappy_transport::{ChunkSource, Communicator, TransportError};
use tracing::{debug, trace};

use crate::error::{Result, SessionError};
use crate::event::{split_frame_event, ErrorEvent};

type MessageListener = Box<dyn FnMut(Message) + Send>;
type ErrorListener = Box<dyn FnMut(ErrorEvent) + Send>;

struct Listeners {
    on_message: MessageListener,
    on_error: ErrorListener,
}

impl Listeners {
    fn new(on_message: Option<MessageListener>, on_error: Option<ErrorListener>) -> Self {
        Self {
            on_message: on_message.unwrap_or_else(|| Box::new(|_| {})),
            on_error: on_error.unwrap_or_else(|| Box::new(|_| {})),
        }
    }

    fn message(&mut self, message: Message) {
        (self.on_message)(message);
    }

    fn error(&mut self, event: ErrorEvent) {
        debug!(kind = %event.kind(), "reporting session error");
        (self.on_error)(event);
    }
}

/// A conversation with one Tappy over a communicator.
///
/// Outgoing messages are framed and handed to the communicator. Inbound
/// bytes, pushed through [`on_data`](Session::on_data) or pulled with
/// [`poll`](Session::poll), are reassembled into frames and delivered to the
/// message listener, or to the error listener when a frame is corrupt.
///
/// Listeners run in-line on the calling thread. A panicking listener unwinds
/// through the session call that invoked it.
pub struct Session<C> {
    communicator: C,
    reassembler: Reassembler,
    listeners: Listeners,
}

impl<C: Communicator> Session<C> {
    /// Session with no-op listeners and the default reassembler settings.
    pub fn new(communicator: C) -> Self {
        Self {
            communicator,
            reassembler: Reassembler::new(),
            listeners: Listeners::new(None, None),
        }
    }

    pub fn builder() -> SessionBuilder<C> {
        SessionBuilder::new()
    }

    pub fn set_message_listener<F>(&mut self, listener: F)
    where
        F: FnMut(Message) + Send + 'static,
    {
        self.listeners.on_message = Box::new(listener);
    }

    pub fn set_error_listener<F>(&mut self, listener: F)
    where
        F: FnMut(ErrorEvent) + Send + 'static,
    {
        self.listeners.on_error = Box::new(listener);
    }

    /// Restore the no-op listeners.
    pub fn clear_listeners(&mut self) {
        self.listeners = Listeners::new(None, None);
    }

    /// Frame `message` and hand it to the communicator.
    ///
    /// A disconnected communicator is reported as
    /// [`ErrorEvent::NotConnected`] and is not touched; a failing send is
    /// reported as [`ErrorEvent::ConnectionError`]. Only a message that
    /// cannot be encoded at all is returned as an error.
    pub fn send<M: TcmpMessage + ?Sized>(&mut self, message: &M) -> Result<()> {
        let packet = compose_message(message)?;

        if !self.communicator.is_connected() {
            self.listeners.error(ErrorEvent::NotConnected);
            return Ok(());
        }

        let frame = escape(&packet);
        debug!(
            family = ?message.command_family(),
            code = message.command_code(),
            len = frame.len(),
            "sending frame"
        );
        if let Err(err) = self.communicator.send(&frame) {
            self.listeners.error(ErrorEvent::ConnectionError(err));
        }
        Ok(())
    }

    pub fn connect(&mut self) -> tappy_transport::Result<()> {
        debug!("connecting");
        self.communicator.connect()
    }

    pub fn disconnect(&mut self) -> tappy_transport::Result<()> {
        debug!("disconnecting");
        self.communicator.disconnect()
    }

    pub fn flush(&mut self) -> tappy_transport::Result<()> {
        self.communicator.flush()
    }

    pub fn is_connected(&self) -> bool {
        self.communicator.is_connected()
    }

    /// Feed a chunk of inbound bytes.
    pub fn on_data(&mut self, chunk: &[u8]) {
        trace!(len = chunk.len(), "inbound chunk");
        let listeners = &mut self.listeners;
        self.reassembler
            .feed(chunk, |event| match split_frame_event(event) {
                Ok(message) => listeners.message(message),
                Err(event) => listeners.error(event),
            });
    }

    /// Report a failure raised by the communicator outside of a session call.
    pub fn on_transport_error(&mut self, err: TransportError) {
        self.listeners.error(ErrorEvent::ConnectionError(err));
    }

    /// Bytes received but not yet closed by a delimiter.
    pub fn buffered(&self) -> usize {
        self.reassembler.buffered()
    }

    pub fn communicator(&self) -> &C {
        &self.communicator
    }

    pub fn communicator_mut(&mut self) -> &mut C {
        &mut self.communicator
    }

    pub fn into_communicator(self) -> C {
        self.communicator
    }
}

impl<C: Communicator + ChunkSource> Session<C> {
    /// Read one chunk from the communicator and feed it.
    ///
    /// Returns the number of bytes consumed; zero when the read timed out or
    /// failed. Read failures go to the error listener.
    pub fn poll(&mut self) -> usize {
        match self.communicator.read_chunk() {
            Ok(Some(chunk)) => {
                self.on_data(&chunk);
                chunk.len()
            }
            Ok(None) => 0,
            Err(err) => {
                self.on_transport_error(err);
                0
            }
        }
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder<C> {
    communicator: Option<C>,
    on_message: Option<MessageListener>,
    on_error: Option<ErrorListener>,
    reassembler: ReassemblerConfig,
}

impl<C: Communicator> SessionBuilder<C> {
    pub fn new() -> Self {
        Self {
            communicator: None,
            on_message: None,
            on_error: None,
            reassembler: ReassemblerConfig::default(),
        }
    }

    pub fn communicator(mut self, communicator: C) -> Self {
        self.communicator = Some(communicator);
        self
    }

    pub fn message_listener<F>(mut self, listener: F) -> Self
    where
        F: FnMut(Message) + Send + 'static,
    {
        self.on_message = Some(Box::new(listener));
        self
    }

    pub fn error_listener<F>(mut self, listener: F) -> Self
    where
        F: FnMut(ErrorEvent) + Send + 'static,
    {
        self.on_error = Some(Box::new(listener));
        self
    }

    pub fn reassembler_config(mut self, config: ReassemblerConfig) -> Self {
        self.reassembler = config;
        self
    }

    pub fn build(self) -> Result<Session<C>> {
        let communicator = self.communicator.ok_or(SessionError::MissingTransport)?;
        Ok(Session {
            communicator,
            reassembler: Reassembler::with_config(self.reassembler),
            listeners: Listeners::new(self.on_message, self.on_error),
        })
    }
}

impl<C: Communicator> Default for SessionBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
