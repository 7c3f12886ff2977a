use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_labels, OutputFormat};

pub fn run(format: OutputFormat) -> CliResult<i32> {
    print_labels(format);
    Ok(SUCCESS)
}
