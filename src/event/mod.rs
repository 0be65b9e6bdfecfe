// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for UI front-ends.
//!
//! Everything the assistant says, hears or does is published on an
//! [`EventBus`]. A front-end subscribes and renders what it needs (the
//! transcript, a connection indicator, the automatic-mode checkbox).
//!
//! # Examples
//!
//! ```
//! use relaylink::event::{AssistantEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(AssistantEvent::connected("COM5"));
//! ```

mod assistant_event;
mod event_bus;
mod session_id;

pub use assistant_event::AssistantEvent;
pub use event_bus::{EventBus, next_event};
pub use session_id::SessionId;
