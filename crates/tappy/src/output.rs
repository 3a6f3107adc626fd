use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tappy_frame::Message;
use tappy_session::{ErrorEvent, TagType};
use tracing::warn;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Something a session or reassembler produced.
#[derive(Debug)]
pub enum Event {
    Message(Message),
    Error(ErrorEvent),
}

impl Event {
    pub fn is_error(&self) -> bool {
        matches!(self, Event::Error(_))
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum EventOutput {
    Message {
        family: String,
        code: String,
        payload_size: usize,
        payload: String,
        timestamp: String,
    },
    Error {
        kind: &'static str,
        error_code: u8,
        detail: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        packet: Option<String>,
        timestamp: String,
    },
}

impl From<&Event> for EventOutput {
    fn from(event: &Event) -> Self {
        match event {
            Event::Message(msg) => EventOutput::Message {
                family: hex::encode_upper(msg.family()),
                code: format!("{:02X}", msg.code()),
                payload_size: msg.payload().len(),
                payload: hex::encode_upper(msg.payload()),
                timestamp: now_unix_seconds(),
            },
            Event::Error(err) => EventOutput::Error {
                kind: err.kind().as_str(),
                error_code: err.kind().code(),
                detail: err.to_string(),
                packet: err.packet().map(hex::encode_upper),
                timestamp: now_unix_seconds(),
            },
        }
    }
}

pub fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&EventOutput::from(event)),
        OutputFormat::Table => {
            let mut table = new_table(vec!["EVENT", "FAMILY", "CODE", "SIZE", "DETAIL"]);
            table.add_row(event_row(event));
            println!("{table}");
        }
        OutputFormat::Pretty => match event {
            Event::Message(msg) => println!(
                "message family={} code={:02X} size={} payload={}",
                hex::encode_upper(msg.family()),
                msg.code(),
                msg.payload().len(),
                spaced_hex(msg.payload())
            ),
            Event::Error(err) => println!("error kind={} detail={err}", err.kind()),
        },
        OutputFormat::Raw => match event {
            Event::Message(msg) => print_raw(msg.payload()),
            Event::Error(err) => warn!(kind = %err.kind(), "{err}"),
        },
    }
}

/// Print a batch of events as one table instead of one table per event.
pub fn print_events(events: &[Event], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = new_table(vec!["EVENT", "FAMILY", "CODE", "SIZE", "DETAIL"]);
            for event in events {
                table.add_row(event_row(event));
            }
            println!("{table}");
        }
        _ => events.iter().for_each(|event| print_event(event, format)),
    }
}

fn event_row(event: &Event) -> Vec<String> {
    match event {
        Event::Message(msg) => vec![
            "MESSAGE".to_string(),
            hex::encode_upper(msg.family()),
            format!("{:02X}", msg.code()),
            msg.payload().len().to_string(),
            payload_preview(msg.payload()),
        ],
        Event::Error(err) => vec![
            err.kind().to_string(),
            "-".to_string(),
            "-".to_string(),
            err.packet().map_or(0, |p| p.len()).to_string(),
            err.to_string(),
        ],
    }
}

#[derive(Serialize)]
struct EncodedOutput {
    family: String,
    code: String,
    payload_size: usize,
    packet: String,
    frame: String,
}

pub fn print_encoded(message: &Message, format: OutputFormat) {
    let packet = message.to_packet();
    let frame = message.to_frame();
    match format {
        OutputFormat::Json => print_json(&EncodedOutput {
            family: hex::encode_upper(message.family()),
            code: format!("{:02X}", message.code()),
            payload_size: message.payload().len(),
            packet: hex::encode_upper(&packet),
            frame: hex::encode_upper(&frame),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            table
                .add_row(vec!["family".to_string(), hex::encode_upper(message.family())])
                .add_row(vec!["code".to_string(), format!("{:02X}", message.code())])
                .add_row(vec!["packet".to_string(), spaced_hex(&packet)])
                .add_row(vec!["frame".to_string(), spaced_hex(&frame)]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", spaced_hex(&frame)),
        OutputFormat::Raw => print_raw(&frame),
    }
}

#[derive(Serialize)]
struct TagTypeOutput {
    id: u8,
    description: &'static str,
    forum_type: i8,
    safe_capacity: u32,
    max_capacity: u32,
}

impl From<&TagType> for TagTypeOutput {
    fn from(tag: &TagType) -> Self {
        Self {
            id: tag.id,
            description: tag.description,
            forum_type: tag.forum_type,
            safe_capacity: tag.safe_capacity,
            max_capacity: tag.max_capacity,
        }
    }
}

pub fn print_tag_types(tags: &[TagType], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<TagTypeOutput> = tags.iter().map(TagTypeOutput::from).collect();
            match out.as_slice() {
                [single] => print_json(single),
                _ => print_json(&out),
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["ID", "DESCRIPTION", "FORUM TYPE", "SAFE", "MAX"]);
            for tag in tags {
                table.add_row(vec![
                    tag.id.to_string(),
                    tag.description.to_string(),
                    forum_type_label(tag),
                    tag.safe_capacity.to_string(),
                    tag.max_capacity.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for tag in tags {
                println!(
                    "{:>2} {} (type {}, {}..{} bytes)",
                    tag.id,
                    tag.description,
                    forum_type_label(tag),
                    tag.safe_capacity,
                    tag.max_capacity
                );
            }
        }
        OutputFormat::Raw => {
            for tag in tags {
                println!("{}", tag.description);
            }
        }
    }
}

fn forum_type_label(tag: &TagType) -> String {
    if tag.is_proprietary() {
        "proprietary".to_string()
    } else if tag.is_unknown() {
        "unknown".to_string()
    } else {
        tag.forum_type.to_string()
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Uppercase hex with a space between bytes, as device traces are usually
/// written.
pub fn spaced_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn payload_preview(payload: &[u8]) -> String {
    const PREVIEW_BYTES: usize = 16;
    if payload.len() <= PREVIEW_BYTES {
        spaced_hex(payload)
    } else {
        format!("{} ... ({} bytes)", spaced_hex(&payload[..PREVIEW_BYTES]), payload.len())
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaced_hex_formats_bytes() {
        assert_eq!(spaced_hex(&[0x7E, 0x00, 0x0A]), "7E 00 0A");
        assert_eq!(spaced_hex(&[]), "");
    }

    #[test]
    fn long_payload_preview_is_truncated() {
        let preview = payload_preview(&[0x44; 450]);
        assert!(preview.ends_with("(450 bytes)"));
        assert!(preview.starts_with("44 44"));
    }

    #[test]
    fn message_event_serializes_hex_fields() {
        let msg = Message::new([0xFA, 0x03], 0xFE, vec![0x7D, 0x7E, 0x33]).unwrap();
        let json = serde_json::to_value(EventOutput::from(&Event::Message(msg))).unwrap();
        assert_eq!(json["event"], "message");
        assert_eq!(json["family"], "FA03");
        assert_eq!(json["code"], "FE");
        assert_eq!(json["payload"], "7D7E33");
    }

    #[test]
    fn error_event_serializes_kind() {
        let json =
            serde_json::to_value(EventOutput::from(&Event::Error(ErrorEvent::NotConnected)))
                .unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["kind"], "NOT_CONNECTED");
        assert_eq!(json["error_code"], 0);
        assert!(json.get("packet").is_none());
    }
}
