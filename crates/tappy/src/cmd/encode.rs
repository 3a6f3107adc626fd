use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let message = args.message.to_message()?;
    debug!(
        family = ?message.family(),
        code = message.code(),
        payload_size = message.payload().len(),
        "encoding message"
    );
    print_encoded(&message, format);
    Ok(SUCCESS)
}
