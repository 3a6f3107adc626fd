use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

use clap::{Args, Subcommand};
use tappy_frame::Message;
use tappy_session::Session;
use tappy_transport::Communicator;

use crate::exit::{frame_error, io_error, CliError, CliResult};
use crate::output::{Event, OutputFormat};

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod tag_type;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose and frame a TCMP command without sending it.
    Encode(EncodeArgs),
    /// Run captured bytes through the reassembler and print every frame.
    Decode(DecodeArgs),
    /// Look up tag technologies by id.
    TagType(TagTypeArgs),
    /// Send one command to a device socket.
    Send(SendArgs),
    /// Accept a connection and print received frames.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::TagType(args) => tag_type::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// A TCMP command given on the command line.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// Command family, two bytes in hex (e.g. 0001).
    #[arg(long)]
    pub family: String,
    /// Command code, one byte in hex.
    #[arg(long)]
    pub code: String,
    /// Payload in hex. Spaces, colons and a 0x prefix are ignored.
    #[arg(long, conflicts_with = "payload_file")]
    pub payload: Option<String>,
    /// Read the payload bytes from a file.
    #[arg(long, value_name = "FILE")]
    pub payload_file: Option<PathBuf>,
}

impl MessageArgs {
    pub fn to_message(&self) -> CliResult<Message> {
        let family = parse_hex_exact::<2>("--family", &self.family)?;
        let [code] = parse_hex_exact::<1>("--code", &self.code)?;
        let payload = match (&self.payload, &self.payload_file) {
            (Some(hex), _) => parse_hex("--payload", hex)?,
            (None, Some(path)) => std::fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
            (None, None) => Vec::new(),
        };
        Message::new(family, code, payload).map_err(|err| frame_error("invalid message", err))
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub message: MessageArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Captured bytes in hex; several arguments are concatenated.
    #[arg(conflicts_with = "file")]
    pub hex: Vec<String>,
    /// Read captured bytes from a binary file.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Feed the input in chunks of this many bytes.
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct TagTypeArgs {
    /// Tag type id. Lists every known type when omitted.
    pub id: Option<u8>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device socket path.
    #[arg(env = "TAPPY_SOCKET")]
    pub path: PathBuf,
    #[command(flatten)]
    pub message: MessageArgs,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for a response when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    #[arg(env = "TAPPY_SOCKET")]
    pub path: PathBuf,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Send every valid message back to the peer, emulating a device.
    #[arg(long)]
    pub echo: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Route both listeners of `session` into one channel.
pub fn forward_events<C: Communicator>(session: &mut Session<C>, tx: Sender<Event>) {
    let errors = tx.clone();
    session.set_message_listener(move |msg| {
        let _ = tx.send(Event::Message(msg));
    });
    session.set_error_listener(move |err| {
        let _ = errors.send(Event::Error(err));
    });
}

pub fn parse_hex(arg: &str, input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input
        .split_whitespace()
        .flat_map(|word| word.split(':'))
        .map(|part| {
            part.strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .unwrap_or(part)
        })
        .collect();
    hex::decode(&cleaned).map_err(|err| CliError::usage(format!("{arg} is not valid hex: {err}")))
}

fn parse_hex_exact<const N: usize>(arg: &str, input: &str) -> CliResult<[u8; N]> {
    let bytes = parse_hex(arg, input)?;
    let len = bytes.len();
    <[u8; N]>::try_from(bytes)
        .map_err(|_| CliError::usage(format!("{arg} must be {N} byte(s), got {len}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::USAGE;

    fn message_args(family: &str, code: &str, payload: Option<&str>) -> MessageArgs {
        MessageArgs {
            family: family.to_string(),
            code: code.to_string(),
            payload: payload.map(str::to_string),
            payload_file: None,
        }
    }

    #[test]
    fn parse_hex_accepts_separators() {
        assert_eq!(
            parse_hex("x", "7E 00:08 0xF8").unwrap(),
            vec![0x7E, 0x00, 0x08, 0xF8]
        );
        assert_eq!(parse_hex("x", "").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert_eq!(parse_hex("x", "7G").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("x", "7").unwrap_err().code, USAGE);
    }

    #[test]
    fn message_args_build_message() {
        let msg = message_args("FA03", "FE", Some("7D 7E 33"))
            .to_message()
            .unwrap();
        assert_eq!(msg.family(), [0xFA, 0x03]);
        assert_eq!(msg.code(), 0xFE);
        assert_eq!(msg.payload(), &[0x7D, 0x7E, 0x33]);
    }

    #[test]
    fn message_args_check_widths() {
        let err = message_args("01", "01", None).to_message().unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("--family"));
        let err = message_args("0001", "0102", None).to_message().unwrap_err();
        assert!(err.message.contains("--code"));
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration(" ").is_err());
    }
}
