use std::sync::atomic::Ordering;

use teleinfo_frame::{checksum, decode, CompletedFrame, FrameError, FrameReader};

use crate::cmd::input::{frame_config, install_ctrlc_handler, open_source};
use crate::cmd::FramesArgs;
use crate::exit::{frame_error, CliError, CliResult, NO_VALID_FRAMES, SUCCESS};
use crate::output::{print_frame_report, FrameReport, FrameStatus, OutputFormat};

pub fn run(args: FramesArgs, format: OutputFormat) -> CliResult<i32> {
    let config = frame_config(&args.input)?;
    let source = open_source(&args.input)?;
    let running = install_ctrlc_handler()?;

    let mut reader = FrameReader::with_config(source, config);
    let mut printed = 0usize;
    let mut valid = 0usize;

    while running.load(Ordering::SeqCst) {
        let frame = match reader
            .next_frame()
            .map_err(|err| frame_error("read failed", err))?
        {
            Some(frame) => frame,
            None if reader.is_closed() => break,
            None => continue,
        };

        let report = inspect(&frame);
        if report.status == FrameStatus::Ok {
            valid += 1;
        }
        print_frame_report(&report, format);
        printed += 1;

        if args.count.is_some_and(|count| printed >= count) {
            return Ok(SUCCESS);
        }
    }

    if reader.overflow_count() > 0 {
        tracing::warn!(
            overflows = reader.overflow_count(),
            "oversized frames were discarded"
        );
    }

    if printed > 0 && valid == 0 {
        return Err(CliError::new(
            NO_VALID_FRAMES,
            format!("none of {printed} frames passed validation"),
        ));
    }

    Ok(SUCCESS)
}

fn inspect(frame: &CompletedFrame) -> FrameReport {
    let group = match decode(frame) {
        Ok(group) => group,
        Err(_) => {
            return FrameReport {
                frame: frame.to_string(),
                label: None,
                value: None,
                received: None,
                computed: None,
                status: FrameStatus::Malformed,
            }
        }
    };

    let received = group.checksum;
    let (computed, status) = match checksum::verify(&group) {
        Ok(()) => (received, FrameStatus::Ok),
        Err(FrameError::ChecksumMismatch { computed, .. }) => {
            (computed, FrameStatus::ChecksumMismatch)
        }
        Err(_) => (received, FrameStatus::Malformed),
    };

    FrameReport {
        frame: frame.to_string(),
        label: Some(group.label),
        value: Some(group.value),
        received: Some(char::from(received)),
        computed: Some(char::from(computed)),
        status,
    }
}
