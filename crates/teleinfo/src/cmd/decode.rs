use std::sync::atomic::Ordering;
use std::time::Instant;

use teleinfo_meter::{Meter, MeterConfig};
use teleinfo_transport::ByteSource;

use crate::cmd::input::{frame_config, install_ctrlc_handler, open_source, parse_duration};
use crate::cmd::DecodeArgs;
use crate::exit::{meter_error, publish_error, CliError, CliResult, NO_VALID_FRAMES, SUCCESS};
use crate::output::{OutputFormat, ReadingSink};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = MeterConfig {
        frame: frame_config(&args.input)?,
        publish_interval: parse_duration(&args.interval)?,
        ..MeterConfig::default()
    };
    let mut source = open_source(&args.input)?;
    let running = install_ctrlc_handler()?;

    let mut meter = Meter::with_config(config);
    let mut publisher = meter.publisher();
    let mut sink = ReadingSink::new(std::io::stdout(), format).with_limit(args.count);

    while running.load(Ordering::SeqCst) && !sink.is_full() {
        meter
            .poll(&mut source)
            .map_err(|err| meter_error("read failed", err))?;

        let published = publisher
            .publish_due(Instant::now(), &mut sink)
            .map_err(|err| publish_error("publish failed", err))?;
        if published.is_some() {
            sink.flush()
                .map_err(|err| publish_error("publish failed", err))?;
        }

        if source.is_closed() {
            break;
        }
    }

    // Whatever changed since the last interval.
    if !sink.is_full() {
        publisher
            .publish(&mut sink)
            .map_err(|err| publish_error("publish failed", err))?;
        sink.flush()
            .map_err(|err| publish_error("publish failed", err))?;
    }

    let stats = meter.stats();
    tracing::info!(
        frames = stats.frames,
        changed = stats.changed,
        ignored = stats.ignored,
        parse_errors = stats.parse_errors,
        checksum_errors = stats.checksum_errors,
        overflows = stats.overflows,
        readings = sink.printed(),
        "decode finished"
    );

    let valid = stats.changed + stats.unchanged + stats.ignored;
    if stats.frames > 0 && valid == 0 {
        return Err(CliError::new(
            NO_VALID_FRAMES,
            format!("none of {} frames passed validation", stats.frames),
        ));
    }

    Ok(SUCCESS)
}
