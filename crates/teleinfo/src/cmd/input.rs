use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use teleinfo_frame::FrameConfig;
use teleinfo_transport::{ByteSource, StreamSource};

use crate::cmd::InputArgs;
use crate::exit::{io_error, CliError, CliResult, INTERNAL, USAGE};

pub type BoxedSource = Box<dyn ByteSource>;

/// Open the source selected on the command line.
pub fn open_source(args: &InputArgs) -> CliResult<BoxedSource> {
    if let Some(path) = &args.file {
        let file = File::open(path)
            .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
        tracing::info!(path = %path.display(), "replaying capture file");
        return Ok(Box::new(StreamSource::new(file)));
    }

    if let Some(path) = &args.serial {
        return open_serial(path, args.baud);
    }

    tracing::debug!("reading from standard input");
    Ok(Box::new(StreamSource::new(std::io::stdin())))
}

#[cfg(unix)]
fn open_serial(path: &std::path::Path, baud: u32) -> CliResult<BoxedSource> {
    use teleinfo_transport::{BaudRate, SerialConfig, SerialPort};

    let baud = BaudRate::try_from(baud).map_err(|bps| {
        CliError::new(
            USAGE,
            format!("unsupported baud rate {bps} (expected 1200 or 9600)"),
        )
    })?;
    let config = SerialConfig {
        baud,
        ..SerialConfig::default()
    };
    let port = SerialPort::open_with_config(path, config)
        .map_err(|err| crate::exit::transport_error("serial open failed", err))?;
    tracing::info!(
        path = %port.path().display(),
        transport = port.transport_name(),
        baud = baud.bits_per_second(),
        "serial port opened"
    );
    Ok(Box::new(port.into_source()))
}

#[cfg(not(unix))]
fn open_serial(_path: &std::path::Path, _baud: u32) -> CliResult<BoxedSource> {
    Err(CliError::new(
        USAGE,
        "serial ports are only supported on unix",
    ))
}

pub fn frame_config(args: &InputArgs) -> CliResult<FrameConfig> {
    if args.max_frame_len == 0 {
        return Err(CliError::new(USAGE, "--max-frame-len must be greater than zero"));
    }
    Ok(FrameConfig {
        max_frame_len: args.max_frame_len,
    })
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
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
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Flag cleared by Ctrl-C.
pub fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}
