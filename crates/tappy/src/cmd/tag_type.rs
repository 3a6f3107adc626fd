use tappy_session::{resolve_tag_type, tag_types};

use crate::cmd::TagTypeArgs;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_tag_types, OutputFormat};

pub fn run(args: TagTypeArgs, format: OutputFormat) -> CliResult<i32> {
    match args.id {
        Some(id) => {
            let tag = resolve_tag_type(id)
                .ok_or_else(|| CliError::new(DATA_INVALID, format!("unknown tag type id {id}")))?;
            print_tag_types(std::slice::from_ref(tag), format);
        }
        None => print_tag_types(tag_types(), format),
    }
    Ok(SUCCESS)
}
