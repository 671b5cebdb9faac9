//! Serial TTY endpoints.
//!
//! Opens a device node read/write, switches it to raw mode at the
//! requested baud rate, and answers readable-byte queries with FIONREAD.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use anyhow::{Context, Result};
use nix::sys::termios::{self, BaudRate, SetArg};

use serialtee_core::Endpoint;

pub struct TtyEndpoint {
    file: File,
}

impl TtyEndpoint {
    /// Open `path` in raw mode at `baud`.
    pub fn open(path: &str, baud: u32) -> Result<Self> {
        let speed = baud_rate(baud).with_context(|| format!("unsupported baud rate {baud}"))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .with_context(|| format!("failed to open {path}"))?;

        let mut tio = termios::tcgetattr(&file).with_context(|| format!("{path}: tcgetattr"))?;
        termios::cfmakeraw(&mut tio);
        termios::cfsetspeed(&mut tio, speed).with_context(|| format!("{path}: cfsetspeed"))?;
        termios::tcsetattr(&file, SetArg::TCSANOW, &tio)
            .with_context(|| format!("{path}: tcsetattr"))?;

        tracing::info!(path, baud, "serial port open");
        Ok(Self::from_file(file))
    }

    /// Wrap an already-configured descriptor.
    pub fn from_file(file: File) -> Self {
        Self { file }
    }
}

impl Endpoint for TtyEndpoint {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        let mut n: libc::c_int = 0;
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                libc::FIONREAD,
                &mut n as *mut libc::c_int,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n.max(0) as usize)
    }
}

impl io::Read for TtyEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl io::Write for TtyEndpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Map a numeric baud rate to the termios constant.
pub fn baud_rate(baud: u32) -> Option<BaudRate> {
    let rate = match baud {
        1200 => BaudRate::B1200,
        2400 => BaudRate::B2400,
        4800 => BaudRate::B4800,
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115200 => BaudRate::B115200,
        230400 => BaudRate::B230400,
        460800 => BaudRate::B460800,
        921600 => BaudRate::B921600,
        _ => return None,
    };
    Some(rate)
}
