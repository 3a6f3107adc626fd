use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use tappy_session::{ErrorEvent, Session};
use tappy_transport::{ChunkSource, Communicator, CommunicatorConfig, UnixSocketCommunicator};
use tracing::{debug, info};

use crate::cmd::{forward_events, parse_duration, SendArgs};
use crate::exit::{
    event_error, session_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS,
    TIMEOUT,
};
use crate::output::{print_event, Event, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let message = args.message.to_message()?;

    let communicator = UnixSocketCommunicator::new(&args.path, CommunicatorConfig::default());
    let mut session = Session::new(communicator);
    let (tx, rx) = mpsc::channel();
    forward_events(&mut session, tx);

    session
        .connect()
        .map_err(|err| transport_error("connect failed", err))?;
    session
        .send(&message)
        .map_err(|err| session_error("send failed", err))?;

    // A failed write is reported through the error listener, not returned.
    if let Ok(Event::Error(err)) = rx.try_recv() {
        return Err(event_error("send failed", err));
    }
    info!(
        path = %args.path.display(),
        family = ?message.family(),
        code = message.code(),
        "command sent"
    );

    if !args.wait {
        return Ok(SUCCESS);
    }

    let event = wait_for_event(&mut session, &rx, wait_timeout)?;
    print_event(&event, format);
    match event {
        Event::Message(_) => Ok(SUCCESS),
        Event::Error(ErrorEvent::ConnectionError(err)) => Err(transport_error("receive failed", err)),
        Event::Error(_) => Ok(DATA_INVALID),
    }
}

/// Poll `session` until it reports something or `timeout` elapses.
fn wait_for_event<C>(
    session: &mut Session<C>,
    rx: &Receiver<Event>,
    timeout: Duration,
) -> CliResult<Event>
where
    C: Communicator + ChunkSource,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(event) = rx.try_recv() {
            return Ok(event);
        }
        if Instant::now() >= deadline {
            return Err(CliError::new(TIMEOUT, format!("no response within {timeout:?}")));
        }
        let read = session.poll();
        debug!(bytes = read, buffered = session.buffered(), "polled device");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use bytes::Bytes;
    use tappy_transport::TransportError;

    use super::*;

    #[derive(Default)]
    struct ScriptedDevice {
        chunks: VecDeque<tappy_transport::Result<Option<Bytes>>>,
    }

    impl Communicator for ScriptedDevice {
        fn connect(&mut self) -> tappy_transport::Result<()> {
            Ok(())
        }

        fn disconnect(&mut self) -> tappy_transport::Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn send(&mut self, _bytes: &[u8]) -> tappy_transport::Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> tappy_transport::Result<()> {
            Ok(())
        }
    }

    impl ChunkSource for ScriptedDevice {
        fn read_chunk(&mut self) -> tappy_transport::Result<Option<Bytes>> {
            self.chunks.pop_front().unwrap_or(Ok(None))
        }
    }

    fn scripted_session(
        chunks: Vec<tappy_transport::Result<Option<Bytes>>>,
    ) -> (Session<ScriptedDevice>, Receiver<Event>) {
        let mut session = Session::new(ScriptedDevice {
            chunks: chunks.into(),
        });
        let (tx, rx) = mpsc::channel();
        forward_events(&mut session, tx);
        (session, rx)
    }

    #[test]
    fn waits_across_partial_chunks() {
        let (mut session, rx) = scripted_session(vec![
            Ok(Some(Bytes::from_static(&[0x7E, 0x00, 0x05, 0xFB]))),
            Ok(None),
            Ok(Some(Bytes::from_static(&[0x01, 0x00, 0x02, 0xDF, 0x17, 0x7E]))),
        ]);
        let event = wait_for_event(&mut session, &rx, Duration::from_secs(1)).unwrap();
        match event {
            Event::Message(msg) => {
                assert_eq!(msg.family(), [0x01, 0x00]);
                assert_eq!(msg.code(), 0x02);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn read_failure_ends_wait() {
        let (mut session, rx) = scripted_session(vec![Err(TransportError::ConnectionClosed)]);
        let event = wait_for_event(&mut session, &rx, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            event,
            Event::Error(ErrorEvent::ConnectionError(TransportError::ConnectionClosed))
        ));
    }

    #[test]
    fn silence_times_out() {
        let (mut session, rx) = scripted_session(Vec::new());
        let err = wait_for_event(&mut session, &rx, Duration::from_millis(20)).unwrap_err();
        assert_eq!(err.code, TIMEOUT);
    }
}
