// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Automatic mode: periodic temperature polling with an over-temperature trip.
//!
//! A session moves `Idle → Polling → (Exited | TripShutdown)`. Both end states
//! are terminal; resuming means starting a new session.
//!
//! Cancellation goes through a `watch` channel owned by the [`MonitorHandle`]
//! and is observed at tick boundaries, never in the middle of an exchange.
//! Dropping the handle cancels the session as well.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::channel::CommandChannel;
use crate::error::Error;
use crate::event::{AssistantEvent, SessionId};
use crate::types::{Action, TemperatureReading};

/// Timing and threshold for automatic mode.
///
/// # Examples
///
/// ```
/// use relaylink::monitor::MonitorConfig;
/// use std::time::Duration;
///
/// let config = MonitorConfig::new()
///     .with_threshold(35.0)
///     .with_poll_interval(Duration::from_millis(500));
/// assert_eq!(config.threshold(), 35.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    threshold: f32,
    poll_interval: Duration,
    reply_window: Duration,
}

impl MonitorConfig {
    /// Readings strictly above this many degrees Celsius trip the shutdown.
    pub const DEFAULT_THRESHOLD: f32 = 30.0;
    /// Time between polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
    /// Time to wait for each temperature reply.
    pub const DEFAULT_REPLY_WINDOW: Duration = CommandChannel::DEFAULT_REPLY_WINDOW;

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            reply_window: Self::DEFAULT_REPLY_WINDOW,
        }
    }

    /// Sets the trip threshold in degrees Celsius.
    #[must_use]
    pub fn with_threshold(mut self, celsius: f32) -> Self {
        self.threshold = celsius;
        self
    }

    /// Sets the polling interval. Zero is bumped to one millisecond.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Sets the reply window for each poll.
    #[must_use]
    pub fn with_reply_window(mut self, window: Duration) -> Self {
        self.reply_window = window;
        self
    }

    /// Returns the trip threshold.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the reply window.
    #[must_use]
    pub fn reply_window(&self) -> Duration {
        self.reply_window
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Created, not yet polling.
    Idle,
    /// Polling the board every interval.
    Polling,
    /// Cancelled from outside.
    Exited,
    /// Shut the board down after an over-temperature reading.
    TripShutdown,
}

impl MonitorState {
    /// Returns `true` for the two end states.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exited | Self::TripShutdown)
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonitorOutcome {
    /// Automatic mode was switched off.
    Exited,
    /// A reading above the threshold triggered `kill`.
    TripShutdown {
        /// The reading that tripped.
        celsius: f32,
    },
}

impl MonitorOutcome {
    /// Returns the end state this outcome corresponds to.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        match self {
            Self::Exited => MonitorState::Exited,
            Self::TripShutdown { .. } => MonitorState::TripShutdown,
        }
    }
}

/// A running automatic-mode session.
#[derive(Debug)]
pub struct MonitorHandle {
    session: SessionId,
    cancel: watch::Sender<bool>,
    state: watch::Receiver<MonitorState>,
    task: JoinHandle<MonitorOutcome>,
}

impl MonitorHandle {
    /// Returns the session identifier.
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Returns a receiver that follows state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<MonitorState> {
        self.state.clone()
    }

    /// Returns `true` once the polling task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Asks the session to stop at the next tick boundary.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Waits for the session to end on its own.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Task`] if the polling task panicked or was aborted.
    pub async fn wait(self) -> Result<MonitorOutcome, Error> {
        // Keep the sender alive so that waiting does not cancel.
        let Self { cancel, task, .. } = self;
        let outcome = task.await.map_err(|e| Error::Task(e.to_string()));
        drop(cancel);
        outcome
    }

    /// Cancels the session and waits for it to end.
    ///
    /// A session that already tripped keeps its `TripShutdown` outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Task`] if the polling task panicked or was aborted.
    pub async fn stop(self) -> Result<MonitorOutcome, Error> {
        self.cancel();
        self.wait().await
    }
}

/// Polls the board's temperature through a [`CommandChannel`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use relaylink::channel::CommandChannel;
/// use relaylink::event::EventBus;
/// use relaylink::monitor::{MonitorConfig, MonitorOutcome, TemperatureMonitor};
/// use relaylink::speech::Voice;
/// use relaylink::transport::MemoryLink;
/// use std::time::Duration;
///
/// # async fn example() {
/// let channel = Arc::new(CommandChannel::new(Voice::new(EventBus::new())));
/// let board = MemoryLink::new("mem0");
/// board.reply_to("GET_TEMP", ["31.0"]);
/// channel.attach(board.clone()).await;
///
/// let config = MonitorConfig::new().with_poll_interval(Duration::from_millis(10));
/// let handle = TemperatureMonitor::new(channel, config).start();
/// assert_eq!(
///     handle.wait().await.unwrap(),
///     MonitorOutcome::TripShutdown { celsius: 31.0 }
/// );
/// assert_eq!(board.written(), ["GET_TEMP", "kill"]);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TemperatureMonitor {
    channel: Arc<CommandChannel>,
    config: MonitorConfig,
}

impl TemperatureMonitor {
    /// Creates a monitor for `channel`.
    #[must_use]
    pub fn new(channel: Arc<CommandChannel>, config: MonitorConfig) -> Self {
        Self { channel, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Starts a new session on its own task.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(self) -> MonitorHandle {
        let session = SessionId::new();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(MonitorState::Idle);

        let task = tokio::spawn(self.run(session, cancel_rx, state_tx));

        MonitorHandle {
            session,
            cancel: cancel_tx,
            state: state_rx,
            task,
        }
    }

    async fn run(
        self,
        session: SessionId,
        mut cancel: watch::Receiver<bool>,
        state: watch::Sender<MonitorState>,
    ) -> MonitorOutcome {
        let voice = self.channel.voice().clone();
        let threshold = self.config.threshold;

        tracing::info!(%session, threshold, "Automatic mode started");
        state.send_replace(MonitorState::Polling);
        voice.events().publish(AssistantEvent::MonitorStarted { session });
        voice.say("Monitoring temperature").await;

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            tokio::select! {
                biased;
                () = cancelled(&mut cancel) => break MonitorOutcome::Exited,
                _ = ticker.tick() => {}
            }

            let reading = self.poll().await;
            if let Some(celsius) = reading.celsius().filter(|_| reading.exceeds(threshold)) {
                tracing::warn!(%session, celsius, threshold, "Temperature above threshold, shutting down");
                if let Err(err) = self.channel.request(Action::Shutdown, Duration::ZERO).await {
                    tracing::error!(%session, error = %err, "Failed to send shutdown");
                }
                break MonitorOutcome::TripShutdown { celsius };
            }
        };

        match outcome {
            MonitorOutcome::Exited => voice.say("Automatic mode exited").await,
            MonitorOutcome::TripShutdown { .. } => {
                voice.say("High temperature! Buzzer on").await;
            }
        }

        tracing::info!(%session, ?outcome, "Automatic mode finished");
        state.send_replace(outcome.state());
        voice
            .events()
            .publish(AssistantEvent::MonitorFinished { session, outcome });
        outcome
    }

    async fn poll(&self) -> TemperatureReading {
        let reply = match self
            .channel
            .request(Action::GetTemperature, self.config.reply_window)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(error = %err, "Temperature poll failed");
                None
            }
        };

        let reading = TemperatureReading::from_reply(reply.as_deref());
        tracing::debug!(%reading, "Temperature polled");
        self.channel
            .voice()
            .events()
            .publish(AssistantEvent::TemperatureRead { reading });
        reading
    }
}

/// Resolves once cancellation is requested or the handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::speech::Voice;
    use crate::transport::MemoryLink;

    const TICK: Duration = Duration::from_millis(5);

    async fn attached(replies: &[&str]) -> (Arc<CommandChannel>, MemoryLink) {
        let channel = Arc::new(CommandChannel::new(Voice::new(EventBus::new())));
        let board = MemoryLink::new("mem");
        board.reply_to("GET_TEMP", replies.iter().copied());
        channel.attach(board.clone()).await;
        (channel, board)
    }

    fn config() -> MonitorConfig {
        MonitorConfig::new()
            .with_poll_interval(TICK)
            .with_reply_window(Duration::ZERO)
    }

    #[test]
    fn config_defaults() {
        let config = MonitorConfig::new();
        assert_eq!(config.threshold(), 30.0);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.reply_window(), Duration::from_secs(2));
        assert_eq!(config.with_poll_interval(Duration::ZERO).poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn outcome_states_are_terminal() {
        assert!(MonitorOutcome::Exited.state().is_terminal());
        assert!(MonitorOutcome::TripShutdown { celsius: 31.0 }.state().is_terminal());
        assert!(!MonitorState::Polling.is_terminal());
    }

    #[tokio::test]
    async fn threshold_is_strict() {
        let (channel, board) = attached(&["30.0", "30.5"]).await;
        let outcome = TemperatureMonitor::new(channel, config()).start().wait().await.unwrap();

        assert_eq!(outcome, MonitorOutcome::TripShutdown { celsius: 30.5 });
        assert_eq!(board.written(), ["GET_TEMP", "GET_TEMP", "kill"]);
    }

    #[tokio::test]
    async fn unreadable_replies_keep_polling() {
        let (channel, board) = attached(&["ERROR: no sensor", "", "abc", "23.5", "31.0"]).await;
        let handle = TemperatureMonitor::new(channel.clone(), config()).start();

        assert_eq!(handle.wait().await.unwrap(), MonitorOutcome::TripShutdown { celsius: 31.0 });
        let kills = board.written().iter().filter(|l| *l == "kill").count();
        assert_eq!(kills, 1);
    }

    #[tokio::test]
    async fn infinite_reading_trips() {
        let (channel, board) = attached(&["24.0", "inf"]).await;
        let outcome = TemperatureMonitor::new(channel, config()).start().wait().await.unwrap();

        assert_eq!(outcome, MonitorOutcome::TripShutdown { celsius: f32::INFINITY });
        assert_eq!(board.written(), ["GET_TEMP", "GET_TEMP", "kill"]);
    }

    #[tokio::test]
    async fn stop_exits_and_announces() {
        let (channel, board) = attached(&[]).await;
        let handle = TemperatureMonitor::new(channel.clone(), config()).start();
        let mut state = handle.watch_state();
        state.wait_for(|s| *s == MonitorState::Polling).await.unwrap();

        assert_eq!(handle.stop().await.unwrap(), MonitorOutcome::Exited);
        assert!(!board.written().contains(&"kill".to_string()));

        let spoken: Vec<_> = channel.voice().transcript().entries().into_iter().map(|e| e.text).collect();
        assert_eq!(spoken.first().map(String::as_str), Some("Monitoring temperature"));
        assert_eq!(spoken.last().map(String::as_str), Some("Automatic mode exited"));
        assert_eq!(*state.borrow(), MonitorState::Exited);
    }

    #[tokio::test]
    async fn polls_without_link_until_cancelled() {
        let channel = Arc::new(CommandChannel::new(Voice::new(EventBus::new())));
        let handle = TemperatureMonitor::new(channel, config()).start();
        tokio::time::sleep(TICK * 4).await;

        assert!(!handle.is_finished());
        assert_eq!(handle.stop().await.unwrap(), MonitorOutcome::Exited);
    }

    #[tokio::test]
    async fn dropping_the_handle_cancels() {
        let (channel, _board) = attached(&[]).await;
        let mut events = channel.voice().events().subscribe();
        drop(TemperatureMonitor::new(channel.clone(), config()).start());

        loop {
            if let AssistantEvent::MonitorFinished { outcome, .. } = events.recv().await.unwrap() {
                assert_eq!(outcome, MonitorOutcome::Exited);
                break;
            }
        }
    }

    #[tokio::test]
    async fn transport_errors_count_as_missed_readings() {
        let (channel, board) = attached(&[]).await;
        board.fail_writes(true);
        let handle = TemperatureMonitor::new(channel, config()).start();
        tokio::time::sleep(TICK * 4).await;

        assert!(!handle.is_finished());
        assert_eq!(handle.stop().await.unwrap(), MonitorOutcome::Exited);
    }
}
