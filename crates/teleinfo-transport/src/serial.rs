use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::StreamSource;

/// Line speed of the meter's TIC output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaudRate {
    /// Historic mode (Linky "historique", older electronic meters).
    #[default]
    B1200,
    /// Standard mode.
    B9600,
}

impl BaudRate {
    pub fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B1200 => 1200,
            BaudRate::B9600 => 9600,
        }
    }

    fn as_speed(self) -> libc::speed_t {
        match self {
            BaudRate::B1200 => libc::B1200,
            BaudRate::B9600 => libc::B9600,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            1200 => Ok(BaudRate::B1200),
            9600 => Ok(BaudRate::B9600),
            other => Err(other),
        }
    }
}

/// Serial line settings. Framing is always 7 data bits, even parity, 1 stop bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud: BaudRate,
    /// How long a read waits for the first byte before reporting an idle line.
    /// Rounded to tenths of a second, clamped to 0.1s..=25.5s.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: BaudRate::default(),
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// A tty connected to a meter's TIC output, configured raw 7E1.
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    /// Open with the default 1200 baud historic settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, SerialConfig::default())
    }

    /// Open and configure the device.
    pub fn open_with_config(path: impl AsRef<Path>, config: SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // O_NONBLOCK keeps open() from waiting on carrier detect; cleared below.
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        configure(&file, config).map_err(|source| TransportError::Configure {
            path: path.clone(),
            source,
        })?;

        info!(
            ?path,
            baud = config.baud.bits_per_second(),
            "opened serial port (7E1)"
        );

        Ok(Self { file, path })
    }

    /// The device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wrap the port as a polled byte source.
    pub fn into_source(self) -> StreamSource<Self> {
        StreamSource::new(self)
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "serial"
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.file.read(buf) {
            // VMIN=0: a timed-out read returns 0 bytes; the tty is still open.
            Ok(0) => Err(std::io::Error::from(std::io::ErrorKind::TimedOut)),
            other => other,
        }
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .finish()
    }
}

fn configure(file: &File, config: SerialConfig) -> std::io::Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: termios is a plain C struct; all-zero is a valid bit pattern and
    // it is fully overwritten by tcgetattr before use.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is an open descriptor owned by `file`; `tio` is a valid
    // writable termios.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `tio` was initialized by tcgetattr above.
    unsafe { libc::cfmakeraw(&mut tio) };
    tio.c_cflag &= !(libc::CSIZE | libc::CSTOPB | libc::PARODD);
    tio.c_cflag |= libc::CS7 | libc::PARENB | libc::CREAD | libc::CLOCAL;
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = timeout_deciseconds(config.read_timeout);

    let speed = config.baud.as_speed();
    // SAFETY: `tio` is a valid termios and `speed` is a libc speed constant.
    let rc = unsafe { libc::cfsetispeed(&mut tio, speed) | libc::cfsetospeed(&mut tio, speed) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `fd` is open and `tio` is fully initialized.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `fd` is open; flushing pending input has no memory effects.
    unsafe { libc::tcflush(fd, libc::TCIFLUSH) };

    // SAFETY: F_GETFL/F_SETFL only read and write descriptor flags of `fd`.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) < 0 {
            return Err(std::io::Error::last_os_error());
        }
    }

    debug!(fd, "serial line configured");
    Ok(())
}

fn timeout_deciseconds(timeout: Duration) -> libc::cc_t {
    let tenths = timeout.as_millis().div_ceil(100).clamp(1, 255);
    tenths as libc::cc_t
}
