// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bluetooth device discovery.
//!
//! The board is reached through a Bluetooth serial bridge. Before the bridge
//! is paired and shows up as a serial port, a scan lists nearby devices so
//! the user can pick the right one.
//!
//! Devices are presented as `Name (address)` strings; [`address_from_choice`]
//! recovers the address from such a string.
//!
//! # Examples
//!
//! ```no_run
//! use relaylink::discovery::{discover_devices, DiscoveryOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> relaylink::Result<()> {
//! let options = DiscoveryOptions::new().with_timeout(Duration::from_secs(5));
//! for device in discover_devices(&options).await? {
//!     println!("{device}");
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use crate::error::DiscoveryError;
use crate::event::{AssistantEvent, EventBus};

/// Default scan duration.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// A device seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Advertised name, if any.
    pub name: Option<String>,
    /// Hardware address.
    pub address: String,
}

impl DiscoveredDevice {
    /// Creates a device entry.
    #[must_use]
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.filter(|n| !n.trim().is_empty()),
            address: address.into(),
        }
    }

    /// Returns the advertised name or `"Unknown"`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.address)
    }
}

/// Extracts the address from a `Name (address)` choice string.
///
/// Takes the text between the last `(` and the `)` that follows it, so names
/// containing parentheses still work. Returns `None` if there is no
/// non-empty parenthesized part.
///
/// # Examples
///
/// ```
/// use relaylink::discovery::address_from_choice;
///
/// assert_eq!(address_from_choice("HC-05 (98:D3:31:F5:2A:1C)"), Some("98:D3:31:F5:2A:1C"));
/// assert_eq!(address_from_choice("HC-05"), None);
/// ```
#[must_use]
pub fn address_from_choice(choice: &str) -> Option<&str> {
    let open = choice.rfind('(')?;
    let rest = &choice[open + 1..];
    let close = rest.find(')')?;
    let address = rest[..close].trim();
    (!address.is_empty()).then_some(address)
}

/// Options for a Bluetooth scan.
///
/// # Examples
///
/// ```
/// use relaylink::discovery::DiscoveryOptions;
/// use std::time::Duration;
///
/// let options = DiscoveryOptions::new().with_timeout(Duration::from_secs(10));
/// assert_eq!(options.timeout(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    timeout: Option<Duration>,
}

impl DiscoveryOptions {
    /// Creates options with a 5 second scan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long to scan.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the scan duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_DISCOVERY_TIMEOUT)
    }
}

/// Scans for nearby Bluetooth LE devices using the first adapter.
///
/// # Errors
///
/// Returns [`DiscoveryError::NoAdapter`] if the host has no adapter and
/// [`DiscoveryError::Bluetooth`] if the scan itself fails.
#[cfg(feature = "ble")]
pub async fn discover_devices(
    options: &DiscoveryOptions,
) -> Result<Vec<DiscoveredDevice>, DiscoveryError> {
    use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
    use btleplug::platform::Manager;

    let manager = Manager::new().await?;
    let central = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or(DiscoveryError::NoAdapter)?;

    tracing::info!(timeout = ?options.timeout(), "Scanning for Bluetooth devices");
    central.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(options.timeout()).await;
    let peripherals = central.peripherals().await?;
    if let Err(err) = central.stop_scan().await {
        tracing::warn!(error = %err, "Failed to stop scan");
    }

    let mut devices: Vec<DiscoveredDevice> = Vec::with_capacity(peripherals.len());
    for peripheral in peripherals {
        let name = peripheral
            .properties()
            .await?
            .and_then(|props| props.local_name);
        let device = DiscoveredDevice::new(name, peripheral.address().to_string());
        if !devices.iter().any(|d| d.address == device.address) {
            devices.push(device);
        }
    }

    tracing::info!(count = devices.len(), "Bluetooth scan finished");
    Ok(devices)
}

/// Runs [`discover_devices`] on its own task and publishes the result.
///
/// On success a [`AssistantEvent::DevicesDiscovered`] is published on
/// `events`; the join handle carries the same list or the error.
#[cfg(feature = "ble")]
pub fn spawn_discovery(
    options: DiscoveryOptions,
    events: EventBus,
) -> tokio::task::JoinHandle<Result<Vec<DiscoveredDevice>, DiscoveryError>> {
    tokio::spawn(async move {
        let result = discover_devices(&options).await;
        report(&result, &events);
        result
    })
}

/// Publishes a finished scan. Failures are only logged.
#[cfg_attr(not(feature = "ble"), allow(dead_code))]
fn report(result: &Result<Vec<DiscoveredDevice>, DiscoveryError>, events: &EventBus) {
    match result {
        Ok(devices) => events.publish(AssistantEvent::DevicesDiscovered {
            devices: devices.clone(),
        }),
        Err(err) => tracing::error!(error = %err, "Bluetooth scan failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_unknown_for_missing_name() {
        let named = DiscoveredDevice::new(Some("HC-05".to_string()), "98:D3:31:F5:2A:1C");
        assert_eq!(named.to_string(), "HC-05 (98:D3:31:F5:2A:1C)");

        let anonymous = DiscoveredDevice::new(None, "AA:BB:CC:DD:EE:FF");
        assert_eq!(anonymous.to_string(), "Unknown (AA:BB:CC:DD:EE:FF)");

        let blank = DiscoveredDevice::new(Some("  ".to_string()), "AA:BB:CC:DD:EE:FF");
        assert_eq!(blank.name, None);
    }

    #[test]
    fn choice_round_trips_through_display() {
        let device = DiscoveredDevice::new(Some("Lamp (kitchen)".to_string()), "11:22:33:44:55:66");
        assert_eq!(address_from_choice(&device.to_string()), Some("11:22:33:44:55:66"));
    }

    #[test]
    fn malformed_choices() {
        assert_eq!(address_from_choice(""), None);
        assert_eq!(address_from_choice("HC-05 ()"), None);
        assert_eq!(address_from_choice("HC-05 (98:D3"), None);
        assert_eq!(address_from_choice("HC-05 ) ("), None);
    }

    #[test]
    fn finished_scan_is_published() {
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let devices = vec![DiscoveredDevice::new(Some("HC-05".to_string()), "98:D3:31:F5:2A:1C")];

        report(&Ok(devices.clone()), &events);
        assert_eq!(rx.try_recv().ok(), Some(AssistantEvent::DevicesDiscovered { devices }));
    }

    #[test]
    fn failed_scan_publishes_nothing() {
        let events = EventBus::new();
        let mut rx = events.subscribe();

        report(&Err(DiscoveryError::NoAdapter), &events);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn default_timeout() {
        assert_eq!(DiscoveryOptions::new().timeout(), Duration::from_secs(5));
    }
}
