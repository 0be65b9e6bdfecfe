// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assistant event types.

use crate::discovery::DiscoveredDevice;
use crate::monitor::MonitorOutcome;
use crate::types::{Action, TemperatureReading};

use super::SessionId;

/// Events a UI front-end can subscribe to.
///
/// # Examples
///
/// ```
/// use relaylink::event::AssistantEvent;
/// use relaylink::types::Action;
///
/// let spoke = AssistantEvent::Spoke { text: "Red light on".to_string() };
/// assert!(spoke.is_transcript());
///
/// let sent = AssistantEvent::CommandSent { action: Action::RedOn, reply: None };
/// assert!(!sent.is_transcript());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantEvent {
    /// The assistant said something.
    Spoke {
        /// What was said.
        text: String,
    },

    /// A command phrase was recognized.
    Heard {
        /// The recognized phrase, lowercased.
        text: String,
    },

    /// The serial link was opened or closed.
    ConnectionChanged {
        /// Port identifier of the link.
        port: String,
        /// Whether the link is now open.
        connected: bool,
        /// Why opening failed, if it did.
        error: Option<String>,
    },

    /// A command went out on the wire.
    CommandSent {
        /// The action that was sent.
        action: Action,
        /// The reply line, if one was awaited and arrived.
        reply: Option<String>,
    },

    /// A command could not be delivered.
    CommandFailed {
        /// The action that failed.
        action: Action,
        /// Description of the transport failure.
        error: String,
    },

    /// A temperature request completed.
    TemperatureRead {
        /// The parsed reading.
        reading: TemperatureReading,
    },

    /// Automatic mode started polling.
    MonitorStarted {
        /// The new session.
        session: SessionId,
    },

    /// Automatic mode stopped.
    MonitorFinished {
        /// The session that ended.
        session: SessionId,
        /// How it ended.
        outcome: MonitorOutcome,
    },

    /// A Bluetooth scan finished.
    DevicesDiscovered {
        /// Devices seen during the scan.
        devices: Vec<DiscoveredDevice>,
    },
}

impl AssistantEvent {
    /// Returns `true` for events that belong in the conversation transcript.
    #[must_use]
    pub fn is_transcript(&self) -> bool {
        matches!(self, Self::Spoke { .. } | Self::Heard { .. })
    }

    /// Returns `true` for monitor lifecycle events.
    #[must_use]
    pub fn is_monitor(&self) -> bool {
        matches!(
            self,
            Self::MonitorStarted { .. } | Self::MonitorFinished { .. }
        )
    }

    /// Creates a connected event.
    #[must_use]
    pub fn connected(port: impl Into<String>) -> Self {
        Self::ConnectionChanged {
            port: port.into(),
            connected: true,
            error: None,
        }
    }

    /// Creates a disconnected event.
    #[must_use]
    pub fn disconnected(port: impl Into<String>) -> Self {
        Self::ConnectionChanged {
            port: port.into(),
            connected: false,
            error: None,
        }
    }

    /// Creates an event for a failed connection attempt.
    #[must_use]
    pub fn connection_failed(port: impl Into<String>, error: impl Into<String>) -> Self {
        Self::ConnectionChanged {
            port: port.into(),
            connected: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_helpers() {
        assert_eq!(
            AssistantEvent::connected("COM5"),
            AssistantEvent::ConnectionChanged {
                port: "COM5".to_string(),
                connected: true,
                error: None,
            }
        );

        let failed = AssistantEvent::connection_failed("COM5", "busy");
        assert!(matches!(
            failed,
            AssistantEvent::ConnectionChanged { connected: false, error: Some(ref e), .. } if e == "busy"
        ));
    }

    #[test]
    fn classification() {
        let heard = AssistantEvent::Heard {
            text: "red off".to_string(),
        };
        assert!(heard.is_transcript());
        assert!(!heard.is_monitor());

        let started = AssistantEvent::MonitorStarted {
            session: SessionId::new(),
        };
        assert!(started.is_monitor());
        assert!(!started.is_transcript());
    }
}
