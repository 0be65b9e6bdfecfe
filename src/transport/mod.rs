// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line-oriented links to the controller board.
//!
//! The board speaks newline-terminated ASCII in both directions. A [`Link`]
//! owns one open connection and exposes exactly that: write a line, read a
//! line with a deadline, close.
//!
//! # Implementations
//!
//! - [`SerialLink`]: a serial port (USB or Bluetooth SPP bridge) via `serialport`
//! - [`MemoryLink`]: an in-memory board with scripted replies, for dry runs and tests

mod line_buffer;
mod memory;
#[cfg(feature = "serial")]
mod serial;

use std::time::Duration;

pub use memory::MemoryLink;
#[cfg(feature = "serial")]
pub use serial::SerialLink;

use crate::error::TransportError;

/// An open, exclusively owned connection to the board.
///
/// Links are blocking. Callers are expected to run them off the async
/// runtime (the command channel does this with `spawn_blocking`).
pub trait Link: Send {
    /// Returns the port identifier this link was opened on.
    fn port(&self) -> &str;

    /// Writes `line` followed by a `\n` terminator.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the bytes cannot be written or the link is
    /// closed.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Waits up to `timeout` for one complete line.
    ///
    /// Returns `Ok(None)` when nothing complete arrived in time or the line
    /// could not be decoded. The returned line is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on I/O failure.
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, TransportError>;

    /// Drops any input received but not yet read.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the underlying buffer cannot be cleared.
    fn discard_input(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Closes the link. Closing twice is a no-op.
    fn close(&mut self);

    /// Returns `true` until [`Link::close`] has been called.
    fn is_open(&self) -> bool;
}

/// Configuration for a serial link.
///
/// # Examples
///
/// ```
/// use relaylink::transport::SerialConfig;
/// use std::time::Duration;
///
/// let config = SerialConfig::new("COM5")
///     .with_baud_rate(9600)
///     .with_read_timeout(Duration::from_secs(2))
///     .with_settle_delay(Duration::ZERO);
///
/// assert_eq!(config.port(), "COM5");
/// assert_eq!(config.baud_rate(), 9600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    port: String,
    baud_rate: u32,
    read_timeout: Duration,
    settle_delay: Duration,
}

impl SerialConfig {
    /// Default baud rate of the board firmware.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
    /// Default window for a reply after a command.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);
    /// Default wait after opening, while the board resets.
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

    /// Creates a configuration for the given port with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
            settle_delay: Self::DEFAULT_SETTLE_DELAY,
        }
    }

    /// Sets the baud rate.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Sets the reply window used after reply-expecting commands.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the delay observed after opening the port.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Returns the port identifier.
    #[must_use]
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Returns the baud rate.
    #[must_use]
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Returns the reply window.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns the post-open settle delay.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_config_defaults() {
        let config = SerialConfig::new("/dev/rfcomm0");
        assert_eq!(config.baud_rate(), 9600);
        assert_eq!(config.read_timeout(), Duration::from_secs(2));
        assert_eq!(config.settle_delay(), Duration::from_secs(2));
    }

    #[test]
    fn serial_config_builder() {
        let config = SerialConfig::new("COM7")
            .with_baud_rate(115_200)
            .with_read_timeout(Duration::from_millis(500))
            .with_settle_delay(Duration::ZERO);
        assert_eq!(config.port(), "COM7");
        assert_eq!(config.baud_rate(), 115_200);
        assert_eq!(config.read_timeout(), Duration::from_millis(500));
        assert_eq!(config.settle_delay(), Duration::ZERO);
    }
}
