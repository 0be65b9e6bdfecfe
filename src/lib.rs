// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `relaylink` - drive a serial light and relay controller by button or voice.
//!
//! The controller board sits behind a serial port, usually a Bluetooth SPP
//! bridge, and understands newline-terminated ASCII commands such as
//! `RED_ON`, `POWER_RELAY` or `GET_TEMP`. This library wraps that protocol in
//! async APIs and adds a small voice assistant on top.
//!
//! # Supported Features
//!
//! - **Light and relay control**: red, green and white channels, all lights,
//!   the power relay and two presets (gaming, sleep)
//! - **Temperature**: on-demand readings and an automatic mode that cuts
//!   everything off above a threshold
//! - **Voice**: wake phrase, command routing, spoken confirmations
//! - **Discovery**: Bluetooth LE scan to find the bridge (`ble` feature)
//!
//! # Quick Start
//!
//! ## Button-style control
//!
//! ```no_run
//! use relaylink::{Action, Controller, EventBus, SerialConfig, Voice};
//!
//! #[tokio::main]
//! async fn main() -> relaylink::Result<()> {
//!     let controller = Controller::new(Voice::new(EventBus::new()));
//!     controller.connect(&SerialConfig::new("/dev/rfcomm0")).await?;
//!
//!     controller.perform(Action::AllOn).await;
//!     controller.speak_temperature().await;
//!
//!     controller.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Automatic mode
//!
//! ```no_run
//! use relaylink::{Controller, EventBus, SerialConfig, Voice};
//! use relaylink::event::AssistantEvent;
//!
//! #[tokio::main]
//! async fn main() -> relaylink::Result<()> {
//!     let controller = Controller::new(Voice::new(EventBus::new()));
//!     let mut events = controller.events().subscribe();
//!     controller.connect(&SerialConfig::new("COM5")).await?;
//!
//!     controller.set_automatic(true).await;
//!     while let Ok(event) = events.recv().await {
//!         if let AssistantEvent::MonitorFinished { outcome, .. } = event {
//!             println!("Automatic mode ended: {outcome:?}");
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Voice assistant
//!
//! ```no_run
//! use std::sync::Arc;
//! use relaylink::{Controller, EventBus, Voice, VoiceAssistant, VoiceConfig};
//! use relaylink::speech::LineListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = VoiceConfig::new();
//!     let voice = Voice::new(EventBus::new()).with_engine(config.speaker());
//!     let controller = Arc::new(Controller::new(voice));
//!
//!     controller.greet().await;
//!     let assistant = VoiceAssistant::new(controller, LineListener::stdin(), &config);
//!     let _ = assistant.run().await;
//! }
//! ```

pub mod assistant;
pub mod channel;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod event;
pub mod intent;
pub mod monitor;
pub mod speech;
pub mod transport;
pub mod types;

pub use assistant::{VoiceAssistant, VoiceConfig};
pub use channel::CommandChannel;
pub use config::AssistantConfig;
pub use controller::Controller;
pub use discovery::{DiscoveredDevice, DiscoveryOptions};
pub use error::{
    ConfigError, ConnectionError, DiscoveryError, Error, ParseError, RecognitionError, Result,
    SpeechError, TransportError,
};
pub use event::{AssistantEvent, EventBus, SessionId};
pub use intent::{ActivationGate, IntentRouter};
pub use monitor::{MonitorConfig, MonitorHandle, MonitorOutcome, MonitorState, TemperatureMonitor};
pub use speech::{Listener, Speaker, Transcript, Voice};
pub use transport::{Link, MemoryLink, SerialConfig};
#[cfg(feature = "serial")]
pub use transport::SerialLink;
pub use types::{Action, TemperatureReading};
