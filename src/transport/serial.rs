// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serial port link.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, SerialPort};

use super::line_buffer::LineBuffer;
use super::{Link, SerialConfig};
use crate::error::{ConnectionError, TransportError};

/// Granularity of blocking reads while waiting for a line.
const READ_SLICE: Duration = Duration::from_millis(50);

/// A [`Link`] over a serial port.
///
/// On Windows a paired Bluetooth SPP device shows up as a `COMn` port; on
/// Linux as `/dev/rfcommN`. Either works here.
pub struct SerialLink {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    buffer: LineBuffer,
}

impl SerialLink {
    /// Opens the port described by `config`.
    ///
    /// DTR and RTS are asserted after opening. The settle delay is not
    /// applied here; the caller decides how to wait.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the port is absent, busy or not accessible.
    pub fn open(config: &SerialConfig) -> Result<Self, ConnectionError> {
        let name = config.port().trim();
        if name.is_empty() {
            return Err(ConnectionError::NoPort);
        }

        let mut port = serialport::new(name, config.baud_rate())
            .timeout(READ_SLICE)
            .open()
            .map_err(|err| ConnectionError::OpenFailed {
                port: name.to_string(),
                message: err.to_string(),
            })?;

        // Some bridges ignore modem lines; failure here is harmless
        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);

        tracing::info!(port = %name, baud = config.baud_rate(), "Serial port opened");

        Ok(Self {
            name: name.to_string(),
            port: Some(port),
            buffer: LineBuffer::new(),
        })
    }

    /// Lists serial ports known to the OS.
    ///
    /// Enumeration failures yield an empty list.
    #[must_use]
    pub fn available_ports() -> Vec<String> {
        serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Failed to enumerate serial ports");
                Vec::new()
            })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl Link for SerialLink {
    fn port(&self) -> &str {
        &self.name
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let frame = format!("{line}\n");
        let port = self.port_mut()?;
        port.write_all(frame.as_bytes())?;
        port.flush()?;
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        read_line_from(port, &mut self.buffer, timeout)
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        self.buffer.clear();
        self.port_mut()?
            .clear(ClearBuffer::Input)
            .map_err(io::Error::from)?;
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            self.buffer.clear();
            tracing::info!(port = %self.name, "Serial port closed");
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reads from `reader` in slices until `buffer` yields a line or `timeout`
/// elapses. An empty read counts as a timed-out slice.
fn read_line_from<R: Read + ?Sized>(
    reader: &mut R,
    buffer: &mut LineBuffer,
    timeout: Duration,
) -> Result<Option<String>, TransportError> {
    let deadline = Instant::now() + timeout;
    let mut chunk = [0u8; 64];

    loop {
        if let Some(line) = buffer.next_line() {
            return Ok(line);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        match reader.read(&mut chunk) {
            Ok(0) => std::thread::sleep(READ_SLICE.min(deadline - now)),
            Ok(n) => buffer.extend(&chunk[..n]),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {}
            Err(err) => return Err(err.into()),
        }
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.name)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_port_name_is_rejected() {
        let err = SerialLink::open(&SerialConfig::new("  ")).unwrap_err();
        assert!(matches!(err, ConnectionError::NoPort));
    }

    /// Always at end of stream.
    struct Eof {
        reads: usize,
    }

    impl Read for Eof {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            Ok(0)
        }
    }

    #[test]
    fn end_of_stream_waits_out_the_window() {
        let mut eof = Eof { reads: 0 };
        let mut buffer = LineBuffer::new();
        let started = Instant::now();

        let line = read_line_from(&mut eof, &mut buffer, Duration::from_millis(120)).unwrap();

        assert_eq!(line, None);
        assert!(started.elapsed() >= Duration::from_millis(120));
        assert!(eof.reads <= 4, "{} reads", eof.reads);
    }

    #[test]
    fn buffered_bytes_complete_a_line() {
        let mut reader: &[u8] = b"24.5\r\nrest";
        let mut buffer = LineBuffer::new();

        let line = read_line_from(&mut reader, &mut buffer, Duration::from_millis(100)).unwrap();
        assert_eq!(line.as_deref(), Some("24.5"));
    }

    #[test]
    fn missing_port_fails_to_open() {
        let err = SerialLink::open(&SerialConfig::new("/dev/relaylink-does-not-exist")).unwrap_err();
        assert!(matches!(err, ConnectionError::OpenFailed { .. }));
    }
}
