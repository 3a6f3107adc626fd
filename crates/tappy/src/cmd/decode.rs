use tappy_frame::Reassembler;
use tappy_session::split_frame_event;
use tracing::{debug, info};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_events, Event, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args)?;
    let chunk_size = match args.chunk_size {
        Some(0) => return Err(CliError::usage("--chunk-size must be greater than zero")),
        Some(size) => size,
        None => input.len().max(1),
    };

    let (events, leftover) = decode_chunks(&input, chunk_size);
    if leftover > 0 {
        info!(bytes = leftover, "input ends inside an unterminated frame");
    }
    print_events(&events, format);

    if events.iter().any(Event::is_error) {
        Ok(DATA_INVALID)
    } else {
        Ok(SUCCESS)
    }
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(path) = &args.file {
        return std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    if args.hex.is_empty() {
        return Err(CliError::usage("nothing to decode: pass hex bytes or --file"));
    }
    parse_hex("input", &args.hex.join(" "))
}

/// Returns the events in arrival order and the number of bytes still
/// waiting for a delimiter.
fn decode_chunks(input: &[u8], chunk_size: usize) -> (Vec<Event>, usize) {
    let mut reassembler = Reassembler::new();
    let mut events = Vec::new();
    for chunk in input.chunks(chunk_size) {
        debug!(len = chunk.len(), "feeding chunk");
        reassembler.feed(chunk, |event| {
            events.push(match split_frame_event(event) {
                Ok(message) => Event::Message(message),
                Err(err) => Event::Error(err),
            });
        });
    }
    (events, reassembler.buffered())
}
