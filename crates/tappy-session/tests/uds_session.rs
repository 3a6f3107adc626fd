#![cfg(unix)]

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tappy_frame::{Message, Reassembler};
use tappy_session::{ErrorEvent, ErrorType, Session};
use tappy_transport::{
    ChunkSource, Communicator, CommunicatorConfig, UnixSocketCommunicator, UnixSocketListener,
};

fn temp_socket(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tappy-session-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join("device.sock")
}

fn fast_config() -> CommunicatorConfig {
    CommunicatorConfig {
        read_timeout: Some(Duration::from_millis(20)),
        ..CommunicatorConfig::default()
    }
}

/// Accepts one host, answers every command with its payload reversed.
fn spawn_echo_device(listener: UnixSocketListener) -> thread::JoinHandle<usize> {
    thread::spawn(move || {
        let mut device = listener.accept_communicator(fast_config()).unwrap();
        let mut reassembler = Reassembler::new();
        let mut answered = 0;
        let deadline = Instant::now() + Duration::from_secs(5);

        while answered < 2 && Instant::now() < deadline {
            let Some(chunk) = device.read_chunk().unwrap() else {
                continue;
            };
            for event in reassembler.push(&chunk) {
                if let tappy_frame::FrameEvent::Message(cmd) = event {
                    let mut payload = cmd.payload().to_vec();
                    payload.reverse();
                    let reply = Message::new(cmd.family(), cmd.code(), payload).unwrap();
                    device.send(&reply.to_frame()).unwrap();
                    answered += 1;
                }
            }
        }
        answered
    })
}

#[test]
fn session_talks_to_emulated_device() {
    let sock_path = temp_socket("echo");
    let listener = UnixSocketListener::bind(&sock_path).unwrap();
    let device = spawn_echo_device(listener);

    let (tx, rx) = mpsc::channel();
    let mut session = Session::builder()
        .communicator(UnixSocketCommunicator::new(&sock_path, fast_config()))
        .message_listener(move |msg| tx.send(msg).unwrap())
        .build()
        .unwrap();
    session.connect().unwrap();

    session
        .send(&Message::new([0x00, 0x01], 0x01, vec![0x7E, 0x01, 0x7D]).unwrap())
        .unwrap();
    session
        .send(&Message::new([0xFA, 0x03], 0xFE, vec![0x44; 450]).unwrap())
        .unwrap();

    let mut replies = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while replies.len() < 2 && Instant::now() < deadline {
        session.poll();
        replies.extend(rx.try_iter());
    }

    assert_eq!(device.join().unwrap(), 2);
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].payload(), &[0x7D, 0x01, 0x7E]);
    assert_eq!(replies[1].family(), [0xFA, 0x03]);
    assert_eq!(replies[1].payload().len(), 450);
}

#[test]
fn device_hangup_reported_as_connection_error() {
    let sock_path = temp_socket("hangup");
    let listener = UnixSocketListener::bind(&sock_path).unwrap();
    let device = thread::spawn(move || {
        let stream = listener.accept().unwrap();
        drop(stream);
    });

    let (tx, rx) = mpsc::channel::<ErrorEvent>();
    let mut session = Session::builder()
        .communicator(UnixSocketCommunicator::new(&sock_path, fast_config()))
        .error_listener(move |err| tx.send(err).unwrap())
        .build()
        .unwrap();
    session.connect().unwrap();
    device.join().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while session.is_connected() && Instant::now() < deadline {
        session.poll();
    }

    let errors: Vec<_> = rx.try_iter().collect();
    assert!(!session.is_connected());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorType::ConnectionError);

    let (tx, rx) = mpsc::channel::<ErrorEvent>();
    session.set_error_listener(move |err| tx.send(err).unwrap());
    session.send(&Message::empty([0x00, 0x01], 0x01)).unwrap();
    assert_eq!(rx.try_recv().unwrap().kind(), ErrorType::NotConnected);
}
