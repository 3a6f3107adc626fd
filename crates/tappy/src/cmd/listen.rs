use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use tappy_session::{ErrorEvent, Session};
use tappy_transport::{CommunicatorConfig, TransportError, UnixSocketListener};
use tracing::{info, warn};

use crate::cmd::{forward_events, ListenArgs};
use crate::exit::{session_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, Event, OutputFormat};

// How often an idle listener rechecks the ctrl-c flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let listener =
        UnixSocketListener::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;
    info!(path = %listener.path().display(), "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let Some(communicator) = listener
            .try_accept_communicator(CommunicatorConfig::default())
            .map_err(|err| transport_error("accept failed", err))?
        else {
            std::thread::sleep(ACCEPT_POLL_INTERVAL);
            continue;
        };
        info!("peer connected");

        let mut session = Session::new(communicator);
        let (tx, rx) = mpsc::channel();
        forward_events(&mut session, tx);

        while running.load(Ordering::SeqCst) && session.is_connected() {
            session.poll();

            for event in rx.try_iter() {
                if is_hangup(&event) {
                    info!("peer disconnected");
                    continue;
                }

                print_event(&event, format);
                if let (true, Event::Message(message)) = (args.echo, &event) {
                    session
                        .send(message)
                        .map_err(|err| session_error("echo failed", err))?;
                }

                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    return Ok(SUCCESS);
                }
            }
        }
    }

    Ok(SUCCESS)
}

fn is_hangup(event: &Event) -> bool {
    match event {
        Event::Error(ErrorEvent::ConnectionError(TransportError::ConnectionClosed)) => true,
        Event::Error(ErrorEvent::NotConnected) => {
            warn!("echo skipped: peer already gone");
            true
        }
        _ => false,
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
