use bytes::BytesMut;
use teleinfo_frame::{checksum, encode_group};

use crate::cmd::ChecksumArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_checksum, ChecksumOutput, OutputFormat};

pub fn run(args: ChecksumArgs, format: OutputFormat) -> CliResult<i32> {
    let out = checksum_for(&args.line)?;
    print_checksum(&out, format);
    Ok(SUCCESS)
}

fn checksum_for(line: &str) -> CliResult<ChecksumOutput<'_>> {
    let payload = line.trim_matches(['\r', '\n']);
    let (label, value) = payload
        .split_once(' ')
        .filter(|(label, _)| !label.is_empty())
        .ok_or_else(|| CliError::new(USAGE, "expected a group payload like \"IINST 023\""))?;

    let mut wire = BytesMut::new();
    encode_group(label, value, &mut wire);

    Ok(ChecksumOutput {
        payload,
        checksum: char::from(checksum::compute(payload.as_bytes())),
        frame: String::from_utf8_lossy(&wire).into_owned(),
    })
}
