// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The fixed action vocabulary understood by the controller board.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A named operation the user can request.
///
/// Every action except [`Action::AutomaticModeToggle`] maps to exactly one
/// newline-terminated ASCII command on the wire.
///
/// # Examples
///
/// ```
/// use relaylink::types::Action;
///
/// assert_eq!(Action::RedOn.wire_command(), Some("RED_ON"));
/// assert_eq!(Action::GamingMode.wire_command(), Some("gaming_mode"));
/// assert_eq!(Action::AutomaticModeToggle.wire_command(), None);
///
/// let action: Action = "all-off".parse().unwrap();
/// assert_eq!(action, Action::AllOff);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Red light on.
    RedOn,
    /// Red light off.
    RedOff,
    /// Green light on.
    GreenOn,
    /// Green light off.
    GreenOff,
    /// White light on.
    WhiteOn,
    /// White light off.
    WhiteOff,
    /// Every light on.
    AllOn,
    /// Every light off.
    AllOff,
    /// Power relay on.
    RelayOn,
    /// Power relay off.
    RelayOff,
    /// Ask the board for its temperature sensor reading.
    GetTemperature,
    /// Board-defined gaming lighting preset.
    GamingMode,
    /// Turn every component off for the night.
    SleepMode,
    /// Start or stop temperature monitoring. Never sent on the wire.
    AutomaticModeToggle,
    /// Safety cutoff sent when the temperature threshold is exceeded.
    Shutdown,
}

impl Action {
    /// Every action, in the order the controls are presented.
    pub const ALL: [Action; 15] = [
        Self::RedOn,
        Self::RedOff,
        Self::GreenOn,
        Self::GreenOff,
        Self::WhiteOn,
        Self::WhiteOff,
        Self::AllOn,
        Self::AllOff,
        Self::RelayOn,
        Self::RelayOff,
        Self::GetTemperature,
        Self::GamingMode,
        Self::SleepMode,
        Self::AutomaticModeToggle,
        Self::Shutdown,
    ];

    /// Returns the command written to the serial link, if any.
    #[must_use]
    pub const fn wire_command(&self) -> Option<&'static str> {
        match self {
            Self::RedOn => Some("RED_ON"),
            Self::RedOff => Some("RED_OFF"),
            Self::GreenOn => Some("GREEN_ON"),
            Self::GreenOff => Some("GREEN_OFF"),
            Self::WhiteOn => Some("WHITE_ON"),
            Self::WhiteOff => Some("WHITE_OFF"),
            Self::AllOn => Some("ALL_LIGHTS_ON"),
            Self::AllOff => Some("ALL_LIGHTS_OFF"),
            Self::RelayOn => Some("POWER_RELAY"),
            Self::RelayOff => Some("POWER_OFF_RELAY"),
            Self::GetTemperature => Some("GET_TEMP"),
            Self::GamingMode => Some("gaming_mode"),
            Self::SleepMode => Some("SLEEP_MODE"),
            Self::Shutdown => Some("kill"),
            Self::AutomaticModeToggle => None,
        }
    }

    /// Returns the phrase spoken after the command went out.
    ///
    /// [`Action::GetTemperature`] has no fixed phrase; its announcement
    /// depends on the reply (see [`crate::types::TemperatureReading::announcement`]).
    /// [`Action::Shutdown`] is silent; the alarm is spoken by automatic mode
    /// when it trips.
    #[must_use]
    pub const fn confirmation(&self) -> Option<&'static str> {
        match self {
            Self::RedOn => Some("Red light on"),
            Self::RedOff => Some("Red light off"),
            Self::GreenOn => Some("Green light on"),
            Self::GreenOff => Some("Green light off"),
            Self::WhiteOn => Some("White light on"),
            Self::WhiteOff => Some("White light off"),
            Self::AllOn => Some("All lights on"),
            Self::AllOff => Some("All lights off"),
            Self::RelayOn => Some("Relay powered"),
            Self::RelayOff => Some("Relay powered off"),
            Self::GamingMode => Some("Gaming mode activated"),
            Self::SleepMode => Some("All components turned off for sleep mode"),
            Self::GetTemperature | Self::Shutdown | Self::AutomaticModeToggle => None,
        }
    }

    /// Returns `true` if the board answers this command with a line.
    #[must_use]
    pub const fn expects_reply(&self) -> bool {
        matches!(self, Self::GetTemperature)
    }

    /// Returns the kebab-case name used on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RedOn => "red-on",
            Self::RedOff => "red-off",
            Self::GreenOn => "green-on",
            Self::GreenOff => "green-off",
            Self::WhiteOn => "white-on",
            Self::WhiteOff => "white-off",
            Self::AllOn => "all-on",
            Self::AllOff => "all-off",
            Self::RelayOn => "relay-on",
            Self::RelayOff => "relay-off",
            Self::GetTemperature => "temperature",
            Self::GamingMode => "gaming",
            Self::SleepMode => "sleep",
            Self::AutomaticModeToggle => "automatic",
            Self::Shutdown => "kill",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseError;

    /// Accepts the kebab-case name or the wire command, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|action| {
                action.as_str().eq_ignore_ascii_case(wanted)
                    || action
                        .wire_command()
                        .is_some_and(|wire| wire.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| ParseError::UnknownAction(wanted.to_string()))
    }
}
