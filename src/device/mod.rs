// src/device/mod.rs
//! Controller device channel abstraction.
//!
//! The actuator controller speaks a newline-terminated protocol over a
//! serial-like link. `DeviceChannel` is the seam the delivery protocol is
//! written against; production uses the termios-backed serial port in
//! [`serial`], tests use the in-memory mock.

pub mod serial;

use std::io;

#[derive(Debug)]
pub enum DeviceError {
    /// No serial port matching the configured patterns could be opened.
    NoDeviceAvailable,
    UnsupportedBaudRate(u32),
    Io(io::Error),
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDeviceAvailable => write!(f, "no controller device available"),
            Self::UnsupportedBaudRate(rate) => write!(f, "unsupported baud rate {}", rate),
            Self::Io(e) => write!(f, "device I/O error: {}", e),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DeviceError {
    fn from(e: io::Error) -> Self {
        DeviceError::Io(e)
    }
}

/// A byte-oriented, line-terminated, bidirectional controller link.
///
/// `try_clone` hands the acknowledgment listener its own read half while
/// the delivery worker keeps the write half; both refer to the same
/// underlying channel.
pub trait DeviceChannel: Send {
    /// Writes `line` followed by a single `\n`.
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Reads up to the next complete line, stripped of the terminator.
    ///
    /// Blocks at most the channel's read timeout; `Ok(None)` means the
    /// timeout elapsed without a complete line (partial input is kept for
    /// the next call).
    fn recv_line(&mut self) -> io::Result<Option<String>>;

    fn try_clone(&self) -> io::Result<Box<dyn DeviceChannel>>;
}
