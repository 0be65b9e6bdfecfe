// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The operations a front-end drives.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::channel::CommandChannel;
#[cfg(feature = "serial")]
use crate::error::ConnectionError;
use crate::event::EventBus;
use crate::monitor::{MonitorConfig, MonitorHandle, MonitorOutcome, MonitorState, TemperatureMonitor};
use crate::speech::Voice;
#[cfg(feature = "serial")]
use crate::transport::SerialConfig;
use crate::transport::Link;
use crate::types::Action;

/// Front-end facing controller.
///
/// Owns the [`CommandChannel`] and at most one automatic-mode session.
/// Buttons, voice commands and the CLI all end up here.
///
/// # Examples
///
/// ```
/// use relaylink::controller::Controller;
/// use relaylink::event::EventBus;
/// use relaylink::speech::Voice;
/// use relaylink::transport::MemoryLink;
/// use relaylink::types::Action;
///
/// # async fn example() {
/// let controller = Controller::new(Voice::new(EventBus::new()));
/// let board = MemoryLink::new("mem0");
/// controller.attach(board.clone()).await;
///
/// controller.perform(Action::GamingMode).await;
/// assert_eq!(board.written(), ["gaming_mode"]);
///
/// controller.shutdown().await;
/// assert_eq!(board.written(), ["gaming_mode", "ALL_LIGHTS_OFF"]);
/// # }
/// ```
#[derive(Debug)]
pub struct Controller {
    channel: Arc<CommandChannel>,
    monitor_config: MonitorConfig,
    session: Mutex<Option<MonitorHandle>>,
}

impl Controller {
    /// Greeting spoken at startup.
    pub const GREETING: &'static str = "Hi, I'm ready to help.";

    /// Creates a controller with no open link.
    #[must_use]
    pub fn new(voice: Voice) -> Self {
        Self::with_channel(CommandChannel::new(voice))
    }

    /// Creates a controller around an existing channel.
    #[must_use]
    pub fn with_channel(channel: CommandChannel) -> Self {
        Self {
            channel: Arc::new(channel),
            monitor_config: MonitorConfig::default(),
            session: Mutex::new(None),
        }
    }

    /// Sets the configuration for automatic-mode sessions started later.
    #[must_use]
    pub fn with_monitor_config(mut self, config: MonitorConfig) -> Self {
        self.monitor_config = config;
        self
    }

    /// Returns the command channel.
    #[must_use]
    pub fn channel(&self) -> &Arc<CommandChannel> {
        &self.channel
    }

    /// Returns the voice.
    #[must_use]
    pub fn voice(&self) -> &Voice {
        self.channel.voice()
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        self.channel.voice().events()
    }

    /// Speaks the startup greeting.
    pub async fn greet(&self) {
        self.voice().say(Self::GREETING).await;
    }

    /// Opens the serial port and announces the result.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the port cannot be opened. The failure is
    /// also spoken; the controller stays usable without a link.
    #[cfg(feature = "serial")]
    pub async fn connect(&self, config: &SerialConfig) -> Result<(), ConnectionError> {
        match self.channel.connect(config).await {
            Ok(()) => {
                self.voice().say("Bluetooth connected").await;
                Ok(())
            }
            Err(err) => {
                self.voice().say("Failed to connect to Bluetooth").await;
                Err(err)
            }
        }
    }

    /// Installs an already open link and announces it.
    pub async fn attach<L>(&self, link: L)
    where
        L: Link + 'static,
    {
        self.channel.attach(link).await;
        self.voice().say("Bluetooth connected").await;
    }

    /// Closes the link. Returns `false` if none was open.
    pub async fn disconnect(&self) -> bool {
        self.channel.disconnect().await
    }

    /// Returns `true` if a link is open.
    pub async fn is_connected(&self) -> bool {
        self.channel.is_connected().await
    }

    /// Performs an action from a button or a voice command.
    ///
    /// [`Action::AutomaticModeToggle`] toggles automatic mode instead of
    /// going to the wire.
    pub async fn perform(&self, action: Action) -> Option<String> {
        tracing::debug!(%action, "Performing action");
        if action == Action::AutomaticModeToggle {
            self.toggle_automatic().await;
            return None;
        }
        self.channel.execute(action).await
    }

    /// Asks the board for its temperature and speaks it.
    pub async fn speak_temperature(&self) -> Option<String> {
        self.channel.execute(Action::GetTemperature).await
    }

    /// Returns `true` while an automatic-mode session is polling.
    pub async fn is_automatic(&self) -> bool {
        is_polling(self.session.lock().await.as_ref())
    }

    /// Returns the state of the current or last session.
    pub async fn automatic_state(&self) -> MonitorState {
        self.session
            .lock()
            .await
            .as_ref()
            .map_or(MonitorState::Idle, MonitorHandle::state)
    }

    /// Switches automatic mode on or off.
    ///
    /// Turning it on while a session is polling does nothing; a finished
    /// session is replaced by a new one. Turning it off cancels the session
    /// and returns how it ended.
    pub async fn set_automatic(&self, enabled: bool) -> Option<MonitorOutcome> {
        let mut session = self.session.lock().await;
        self.switch_automatic(&mut session, enabled).await
    }

    /// Flips automatic mode. Returns `true` if it is now on.
    ///
    /// The check and the switch happen under one lock, so concurrent
    /// toggles alternate.
    pub async fn toggle_automatic(&self) -> bool {
        let mut session = self.session.lock().await;
        let enable = !is_polling(session.as_ref());
        self.switch_automatic(&mut session, enable).await;
        enable
    }

    async fn switch_automatic(
        &self,
        session: &mut Option<MonitorHandle>,
        enabled: bool,
    ) -> Option<MonitorOutcome> {
        if enabled {
            if !is_polling(session.as_ref()) {
                let monitor = TemperatureMonitor::new(Arc::clone(&self.channel), self.monitor_config);
                *session = Some(monitor.start());
            }
            return None;
        }

        let handle = session.take()?;
        match handle.stop().await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::error!(error = %err, "Automatic mode session failed");
                None
            }
        }
    }

    /// Exit sequence: stop automatic mode, turn all lights off, close the link.
    pub async fn shutdown(&self) {
        self.set_automatic(false).await;
        if self.channel.is_connected().await {
            self.channel.execute(Action::AllOff).await;
        }
        self.channel.disconnect().await;
        tracing::info!("Controller shut down");
    }
}

fn is_polling(session: Option<&MonitorHandle>) -> bool {
    session.is_some_and(|handle| !handle.is_finished() && !handle.state().is_terminal())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::transport::MemoryLink;

    fn controller() -> Controller {
        Controller::new(Voice::new(EventBus::new())).with_monitor_config(
            MonitorConfig::new()
                .with_poll_interval(Duration::from_millis(5))
                .with_reply_window(Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn automatic_toggle_starts_and_stops_session() {
        let controller = controller();
        controller.attach(MemoryLink::new("mem")).await;

        assert!(controller.toggle_automatic().await);
        assert!(controller.is_automatic().await);
        assert!(!controller.toggle_automatic().await);
        assert!(!controller.is_automatic().await);
        assert_eq!(controller.automatic_state().await, MonitorState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_toggles_alternate() {
        let controller = Arc::new(controller());
        controller.attach(MemoryLink::new("mem")).await;

        let toggles: Vec<_> = (0..2)
            .map(|_| {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move { controller.toggle_automatic().await })
            })
            .collect();
        let mut enabled = Vec::new();
        for toggle in toggles {
            enabled.push(toggle.await.unwrap());
        }

        assert_eq!(enabled.iter().filter(|on| **on).count(), 1);
        assert!(!controller.is_automatic().await);
    }

    #[tokio::test]
    async fn perform_routes_toggle_to_monitor() {
        let controller = controller();
        let board = MemoryLink::new("mem");
        controller.attach(board.clone()).await;

        assert_eq!(controller.perform(Action::AutomaticModeToggle).await, None);
        assert!(controller.is_automatic().await);
        assert_eq!(controller.set_automatic(false).await, Some(MonitorOutcome::Exited));
    }

    #[tokio::test]
    async fn enabling_twice_keeps_one_session() {
        let controller = controller();
        controller.set_automatic(true).await;
        let first = controller.session.lock().await.as_ref().map(MonitorHandle::session);
        controller.set_automatic(true).await;
        let second = controller.session.lock().await.as_ref().map(MonitorHandle::session);

        assert_eq!(first, second);
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn tripped_session_is_replaced_on_enable() {
        let controller = controller();
        let board = MemoryLink::new("mem");
        board.reply_to("GET_TEMP", ["40.0"]);
        controller.attach(board.clone()).await;

        controller.set_automatic(true).await;
        let mut state = controller.session.lock().await.as_ref().unwrap().watch_state();
        state.wait_for(|s| *s == MonitorState::TripShutdown).await.unwrap();
        assert!(!controller.is_automatic().await);

        controller.set_automatic(true).await;
        assert!(controller.is_automatic().await);
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_without_link_is_quiet() {
        let controller = controller();
        controller.shutdown().await;
        assert!(controller.voice().transcript().is_empty());
    }

    #[tokio::test]
    async fn shutdown_turns_lights_off_and_closes() {
        let controller = controller();
        let board = MemoryLink::new("mem");
        controller.attach(board.clone()).await;

        controller.shutdown().await;

        assert_eq!(board.written(), ["ALL_LIGHTS_OFF"]);
        assert_eq!(board.close_calls(), 1);
        assert!(!controller.is_connected().await);
    }
}
