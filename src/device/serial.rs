// src/device/serial.rs
//! Termios-backed serial channel to the actuator controller.
//!
//! Discovery scans /dev for entries whose names contain one of the
//! configured patterns (CDC-ACM and USB-serial by default) and opens the
//! first that accepts raw-mode configuration. The port runs raw at the
//! configured baud with VMIN=0/VTIME set from config, so reads return
//! within a bounded interval and the ack listener can observe its stop
//! flag during teardown.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use nix::sys::termios::{self, BaudRate, SetArg, SpecialCharacterIndices};

use crate::config::SerialConfig;

use super::{DeviceChannel, DeviceError};

pub struct SerialChannel {
    file: File,
    path: PathBuf,
    pending: Vec<u8>,
}

impl SerialChannel {
    /// Opens `path` and configures it raw at `cfg.baud_rate`.
    pub fn open(path: &Path, cfg: &SerialConfig) -> Result<Self, DeviceError> {
        let baud = baud_rate(cfg.baud_rate)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(nix::libc::O_NOCTTY)
            .open(path)?;

        let mut tio = termios::tcgetattr(&file).map_err(io::Error::from)?;
        termios::cfmakeraw(&mut tio);
        termios::cfsetispeed(&mut tio, baud).map_err(io::Error::from)?;
        termios::cfsetospeed(&mut tio, baud).map_err(io::Error::from)?;
        tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        tio.control_chars[SpecialCharacterIndices::VTIME as usize] =
            cfg.read_timeout_deciseconds;
        termios::tcsetattr(&file, SetArg::TCSANOW, &tio).map_err(io::Error::from)?;

        log::info!("Opened controller port {}", path.display());
        Ok(SerialChannel {
            file,
            path: path.to_path_buf(),
            pending: Vec::new(),
        })
    }

    /// Scans /dev and opens the first port matching the configured name
    /// patterns. Candidates are tried in lexical order so retries are
    /// deterministic on multi-adapter hosts.
    pub fn open_first_available(cfg: &SerialConfig) -> Result<Self, DeviceError> {
        let mut candidates: Vec<PathBuf> = std::fs::read_dir("/dev")?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                cfg.port_patterns.iter().any(|pat| name.contains(pat.as_str()))
            })
            .map(|entry| entry.path())
            .collect();
        candidates.sort();

        for path in &candidates {
            match Self::open(path, cfg) {
                Ok(channel) => return Ok(channel),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                }
            }
        }
        Err(DeviceError::NoDeviceAvailable)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn take_pending_line(&mut self) -> Option<String> {
        let nl = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=nl).collect();
        line.pop(); // the newline itself
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

fn baud_rate(rate: u32) -> Result<BaudRate, DeviceError> {
    match rate {
        9600 => Ok(BaudRate::B9600),
        19200 => Ok(BaudRate::B19200),
        38400 => Ok(BaudRate::B38400),
        57600 => Ok(BaudRate::B57600),
        115200 => Ok(BaudRate::B115200),
        other => Err(DeviceError::UnsupportedBaudRate(other)),
    }
}

impl DeviceChannel for SerialChannel {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()
    }

    fn recv_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.take_pending_line() {
            return Ok(Some(line));
        }
        let mut buf = [0u8; 256];
        // VMIN=0/VTIME: a zero-length read means the timeout elapsed
        let n = self.file.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.pending.extend_from_slice(&buf[..n]);
        Ok(self.take_pending_line())
    }

    fn try_clone(&self) -> io::Result<Box<dyn DeviceChannel>> {
        Ok(Box::new(SerialChannel {
            file: self.file.try_clone()?,
            path: self.path.clone(),
            pending: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_supported_baud_rates() {
        assert!(matches!(baud_rate(9600), Ok(BaudRate::B9600)));
        assert!(matches!(baud_rate(115200), Ok(BaudRate::B115200)));
    }

    #[test]
    fn rejects_unsupported_baud_rate() {
        assert!(matches!(
            baud_rate(31250),
            Err(DeviceError::UnsupportedBaudRate(31250))
        ));
    }
}
