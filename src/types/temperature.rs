// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature replies from the `GET_TEMP` command.

use std::fmt;

use crate::error::ParseError;

/// Marker the board puts in its reply when the sensor read failed.
const ERROR_MARKER: &str = "ERROR";

/// Outcome of a temperature request.
///
/// # Examples
///
/// ```
/// use relaylink::types::TemperatureReading;
///
/// let ok = TemperatureReading::from_reply(Some("23.5"));
/// assert_eq!(ok.celsius(), Some(23.5));
///
/// let failed = TemperatureReading::from_reply(Some("ERROR: no sensor"));
/// assert!(failed.is_unavailable());
///
/// let silent = TemperatureReading::from_reply(None);
/// assert!(silent.is_unavailable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperatureReading {
    /// A reading in degrees Celsius.
    Celsius(f32),
    /// No usable reading: timeout, error marker, or garbage.
    Unavailable,
}

impl TemperatureReading {
    /// Parses a raw reply line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Empty`] for a blank line,
    /// [`ParseError::DeviceError`] when the line carries the `ERROR` marker and
    /// [`ParseError::NotANumber`] for anything else that is not a number.
    /// Infinities are accepted; `NaN` is not.
    pub fn parse(reply: &str) -> Result<f32, ParseError> {
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ParseError::Empty);
        }
        if reply.contains(ERROR_MARKER) {
            return Err(ParseError::DeviceError(reply.to_string()));
        }
        match reply.parse::<f32>() {
            Ok(value) if !value.is_nan() => Ok(value),
            _ => Err(ParseError::NotANumber(reply.to_string())),
        }
    }

    /// Builds a reading from an optional reply, folding every failure into
    /// [`TemperatureReading::Unavailable`].
    #[must_use]
    pub fn from_reply(reply: Option<&str>) -> Self {
        match reply.map(Self::parse) {
            Some(Ok(value)) => Self::Celsius(value),
            Some(Err(err)) => {
                tracing::debug!(error = %err, "Ignoring temperature reply");
                Self::Unavailable
            }
            None => Self::Unavailable,
        }
    }

    /// Returns the value in degrees Celsius, if available.
    #[must_use]
    pub const fn celsius(&self) -> Option<f32> {
        match self {
            Self::Celsius(value) => Some(*value),
            Self::Unavailable => None,
        }
    }

    /// Returns `true` if no value could be read.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Returns `true` if the reading is strictly above `threshold`.
    #[must_use]
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.celsius().is_some_and(|value| value > threshold)
    }

    /// Returns the sentence spoken after a temperature request.
    #[must_use]
    pub fn announcement(&self) -> String {
        match self {
            Self::Celsius(value) => format!("The temperature is {value} degrees Celsius"),
            Self::Unavailable => "Could not read temperature".to_string(),
        }
    }
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius(value) => write!(f, "{value} °C"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_reply() {
        assert_eq!(TemperatureReading::parse("23.5"), Ok(23.5));
        assert_eq!(TemperatureReading::parse(" 31.0\r"), Ok(31.0));
    }

    #[test]
    fn error_marker_is_rejected() {
        assert_eq!(
            TemperatureReading::parse("ERROR: no sensor"),
            Err(ParseError::DeviceError("ERROR: no sensor".to_string()))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            TemperatureReading::parse("hot"),
            Err(ParseError::NotANumber(_))
        ));
        assert!(matches!(
            TemperatureReading::parse("NaN"),
            Err(ParseError::NotANumber(_))
        ));
        assert_eq!(TemperatureReading::parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn infinity_is_a_reading() {
        assert_eq!(TemperatureReading::parse("inf"), Ok(f32::INFINITY));
        assert_eq!(TemperatureReading::parse("-Infinity"), Ok(f32::NEG_INFINITY));
        assert!(TemperatureReading::from_reply(Some("inf")).exceeds(30.0));
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!TemperatureReading::Celsius(30.0).exceeds(30.0));
        assert!(TemperatureReading::Celsius(30.5).exceeds(30.0));
        assert!(!TemperatureReading::Unavailable.exceeds(30.0));
    }

    #[test]
    fn announcements() {
        assert_eq!(
            TemperatureReading::Celsius(23.5).announcement(),
            "The temperature is 23.5 degrees Celsius"
        );
        assert_eq!(
            TemperatureReading::Unavailable.announcement(),
            "Could not read temperature"
        );
    }
}
