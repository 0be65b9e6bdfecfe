// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Application configuration loaded from JSON.
//!
//! Every field is optional; anything missing takes the same default as the
//! corresponding builder. Durations are written in milliseconds.
//!
//! ```json
//! {
//!   "serial": { "port": "/dev/rfcomm0", "baud_rate": 9600 },
//!   "monitor": { "threshold_celsius": 32.5 },
//!   "voice": { "activation_phrase": "hey assistant", "tts_program": "espeak" }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assistant::VoiceConfig;
use crate::channel::CommandChannel;
use crate::discovery::DiscoveryOptions;
use crate::error::ConfigError;
use crate::intent::ActivationGate;
use crate::monitor::MonitorConfig;
use crate::speech::SystemSpeaker;
use crate::transport::SerialConfig;

/// Environment variable that overrides the serial port.
pub const SERIAL_PORT_ENV: &str = "RELAYLINK_SERIAL_PORT";

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use relaylink::config::AssistantConfig;
///
/// let config = AssistantConfig::from_json(r#"{ "serial": { "port": "COM5" } }"#).unwrap();
/// assert_eq!(config.serial_config().unwrap().port(), "COM5");
/// assert_eq!(config.monitor_config().threshold(), 30.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Serial link settings.
    pub serial: SerialSection,
    /// Automatic mode settings.
    pub monitor: MonitorSection,
    /// Voice front-end settings.
    pub voice: VoiceSection,
    /// Bluetooth scan settings.
    pub discovery: DiscoverySection,
}

/// `serial` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSection {
    /// Port identifier (`COM5`, `/dev/rfcomm0`).
    pub port: Option<String>,
    /// Baud rate.
    pub baud_rate: u32,
    /// Reply window for interactive commands.
    pub read_timeout_ms: u64,
    /// Wait after opening the port.
    pub settle_delay_ms: u64,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: SerialConfig::DEFAULT_BAUD_RATE,
            read_timeout_ms: millis(SerialConfig::DEFAULT_READ_TIMEOUT),
            settle_delay_ms: millis(SerialConfig::DEFAULT_SETTLE_DELAY),
        }
    }
}

/// `monitor` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Trip threshold.
    pub threshold_celsius: f32,
    /// Time between polls.
    pub poll_interval_ms: u64,
    /// Reply window for each poll.
    pub reply_window_ms: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            threshold_celsius: MonitorConfig::DEFAULT_THRESHOLD,
            poll_interval_ms: millis(MonitorConfig::DEFAULT_POLL_INTERVAL),
            reply_window_ms: millis(MonitorConfig::DEFAULT_REPLY_WINDOW),
        }
    }
}

/// `voice` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSection {
    /// Wake phrase.
    pub activation_phrase: String,
    /// Per-listen timeout.
    pub listen_timeout_ms: u64,
    /// Speech synthesizer program; platform default when absent.
    pub tts_program: Option<String>,
    /// Speaking rate in words per minute.
    pub tts_rate: u32,
}

impl Default for VoiceSection {
    fn default() -> Self {
        Self {
            activation_phrase: ActivationGate::DEFAULT_PHRASE.to_string(),
            listen_timeout_ms: millis(VoiceConfig::DEFAULT_LISTEN_TIMEOUT),
            tts_program: None,
            tts_rate: SystemSpeaker::DEFAULT_RATE,
        }
    }
}

/// `discovery` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Scan duration.
    pub scan_timeout_ms: u64,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            scan_timeout_ms: millis(DiscoveryOptions::new().timeout()),
        }
    }
}

impl AssistantConfig {
    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the text is not valid configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Json`] if it is not valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads `path` if given, otherwise starts from defaults, then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be loaded.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies overrides looked up through `lookup`.
    ///
    /// Only [`SERIAL_PORT_ENV`] is consulted; a blank value is ignored.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(SERIAL_PORT_ENV).filter(|p| !p.trim().is_empty()) {
            tracing::debug!(port = %port, "Serial port taken from environment");
            self.serial.port = Some(port);
        }
        self
    }

    /// Replaces the serial port.
    #[must_use]
    pub fn with_port(mut self, port: Option<String>) -> Self {
        if port.is_some() {
            self.serial.port = port;
        }
        self
    }

    /// Returns the serial link configuration, if a port is set.
    #[must_use]
    pub fn serial_config(&self) -> Option<SerialConfig> {
        let port = self.serial.port.as_deref()?;
        Some(
            SerialConfig::new(port)
                .with_baud_rate(self.serial.baud_rate)
                .with_read_timeout(Duration::from_millis(self.serial.read_timeout_ms))
                .with_settle_delay(Duration::from_millis(self.serial.settle_delay_ms)),
        )
    }

    /// Returns the automatic mode configuration.
    #[must_use]
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::new()
            .with_threshold(self.monitor.threshold_celsius)
            .with_poll_interval(Duration::from_millis(self.monitor.poll_interval_ms))
            .with_reply_window(Duration::from_millis(self.monitor.reply_window_ms))
    }

    /// Returns the voice front-end configuration.
    #[must_use]
    pub fn voice_config(&self) -> VoiceConfig {
        VoiceConfig::new()
            .with_activation_phrase(self.voice.activation_phrase.clone())
            .with_listen_timeout(Duration::from_millis(self.voice.listen_timeout_ms))
            .with_tts_program(self.voice.tts_program.clone())
            .with_tts_rate(self.voice.tts_rate)
    }

    /// Returns the Bluetooth scan options.
    #[must_use]
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions::new().with_timeout(Duration::from_millis(self.discovery.scan_timeout_ms))
    }

    /// Returns the reply window for interactive commands.
    ///
    /// This is the serial read timeout; it falls back to
    /// [`CommandChannel::DEFAULT_REPLY_WINDOW`] when that is zero.
    #[must_use]
    pub fn reply_window(&self) -> Duration {
        match self.serial.read_timeout_ms {
            0 => CommandChannel::DEFAULT_REPLY_WINDOW,
            ms => Duration::from_millis(ms),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = AssistantConfig::from_json("{}").unwrap();
        assert_eq!(config, AssistantConfig::default());
        assert!(config.serial_config().is_none());
        assert_eq!(config.voice_config(), VoiceConfig::new());
        assert_eq!(config.monitor_config(), MonitorConfig::new());
        assert_eq!(config.discovery_options().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AssistantConfig::from_json(
            r#"{
                "serial": { "port": "/dev/rfcomm0", "settle_delay_ms": 0 },
                "monitor": { "threshold_celsius": 35.5 },
                "voice": { "activation_phrase": "hello board" }
            }"#,
        )
        .unwrap();

        let serial = config.serial_config().unwrap();
        assert_eq!(serial.port(), "/dev/rfcomm0");
        assert_eq!(serial.baud_rate(), 9600);
        assert_eq!(serial.settle_delay(), Duration::ZERO);
        assert_eq!(config.monitor_config().threshold(), 35.5);
        assert_eq!(config.monitor_config().poll_interval(), Duration::from_secs(1));
        assert_eq!(config.voice_config().activation_phrase(), "hello board");
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            AssistantConfig::from_json(r#"{ "serial": { "baud_rate": "fast" } }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            AssistantConfig::load("/nonexistent/relaylink.json"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn env_override_replaces_port() {
        let config = AssistantConfig::from_json(r#"{ "serial": { "port": "COM3" } }"#)
            .unwrap()
            .with_env_overrides(|key| (key == SERIAL_PORT_ENV).then(|| "COM9".to_string()));
        assert_eq!(config.serial.port.as_deref(), Some("COM9"));

        let untouched = AssistantConfig::default().with_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(untouched.serial.port, None);
    }

    #[test]
    fn explicit_port_wins_only_when_given() {
        let config = AssistantConfig::default().with_port(Some("COM5".to_string()));
        assert_eq!(config.clone().with_port(None).serial.port.as_deref(), Some("COM5"));
    }

    #[test]
    fn reply_window_falls_back_when_zero() {
        let mut config = AssistantConfig::default();
        assert_eq!(config.reply_window(), Duration::from_secs(2));
        config.serial.read_timeout_ms = 0;
        assert_eq!(config.reply_window(), CommandChannel::DEFAULT_REPLY_WINDOW);
    }
}
