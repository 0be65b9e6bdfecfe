// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `relaylink` library.
//!
//! Each failure family has its own enum, wrapped by [`Error`]. Only
//! connection setup failures are meant to reach the user as hard errors;
//! the rest are logged, spoken, or swallowed by the component that sees them.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The serial link could not be opened.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Reading from or writing to an open link failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A device reply could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Speech could not be recognized.
    #[error("recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// Bluetooth discovery failed.
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A background task was cancelled or panicked.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Errors raised while opening a link.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The serial port could not be opened (absent, busy, permission denied).
    #[error("failed to open {port}: {message}")]
    OpenFailed {
        /// The port that was requested.
        port: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// No port name was given.
    #[error("no serial port configured")]
    NoPort,
}

/// Errors raised by an open link.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was used after being closed.
    #[error("link is closed")]
    Closed,
}

/// Errors related to parsing device replies.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The device answered with an error marker.
    #[error("device reported an error: {0}")]
    DeviceError(String),

    /// The reply was not a number.
    #[error("not a temperature: {0:?}")]
    NotANumber(String),

    /// No reply arrived.
    #[error("empty reply")]
    Empty,

    /// The name does not belong to the action vocabulary.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

/// Errors from the speech recognizer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// Audio was captured but no words could be made out.
    #[error("speech was not understood")]
    Unintelligible,

    /// Nothing was heard before the listen window closed.
    #[error("listening timed out")]
    TimedOut,

    /// The recognizer itself failed (microphone gone, input closed).
    #[error("recognizer failed: {0}")]
    Backend(String),
}

impl RecognitionError {
    /// Returns `true` for failures the activation listener simply skips.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unintelligible | Self::TimedOut)
    }
}

/// Errors from the text-to-speech engine.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Refused to speak blank text.
    #[error("cannot speak empty text")]
    EmptyText,

    /// The speech program could not be run.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that was invoked.
        program: String,
        /// The spawn failure.
        #[source]
        source: std::io::Error,
    },

    /// The speech program exited with a failure status.
    #[error("{program} exited with {status}")]
    Failed {
        /// The program that was invoked.
        program: String,
        /// Exit status as reported by the OS.
        status: String,
    },
}

/// Errors from Bluetooth discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No Bluetooth adapter is available.
    #[error("no bluetooth adapter found")]
    NoAdapter,

    /// The scanning backend failed.
    #[cfg(feature = "ble")]
    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),
}

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_display() {
        let err = ConnectionError::OpenFailed {
            port: "COM5".to_string(),
            message: "Access is denied".to_string(),
        };
        assert_eq!(err.to_string(), "failed to open COM5: Access is denied");
    }

    #[test]
    fn error_from_transport_error() {
        let err: Error = TransportError::Closed.into();
        assert!(matches!(err, Error::Transport(TransportError::Closed)));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::NotANumber("abc".to_string());
        assert_eq!(err.to_string(), "not a temperature: \"abc\"");
    }

    #[test]
    fn recognition_error_transience() {
        assert!(RecognitionError::Unintelligible.is_transient());
        assert!(RecognitionError::TimedOut.is_transient());
        assert!(!RecognitionError::Backend("mic unplugged".to_string()).is_transient());
    }
}
