// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The command channel: one owned link, one exchange at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{Error, TransportError};
use crate::event::AssistantEvent;
use crate::speech::Voice;
use crate::transport::Link;
#[cfg(feature = "serial")]
use crate::transport::{SerialConfig, SerialLink};
#[cfg(feature = "serial")]
use crate::error::ConnectionError;
use crate::types::{Action, TemperatureReading};

/// Spoken when a command could not be delivered.
pub const TRANSPORT_FAILURE_NOTICE: &str = "Serial communication failed";

type SharedLink = Arc<Mutex<Option<Box<dyn Link>>>>;

/// Outcome of one exchange on the link.
enum Exchange {
    NotConnected,
    Sent(Option<String>),
}

/// Sends actions to the board and speaks the result.
///
/// The channel owns at most one open [`Link`]. Every exchange (discard stale
/// input, write, optionally read one reply) holds the link's async mutex for
/// its whole duration and runs on the blocking pool, so two callers never
/// interleave bytes on the wire and the runtime never blocks on serial I/O.
///
/// Without a link nothing is written and `None` is returned, but the
/// confirmation is still spoken.
///
/// # Examples
///
/// ```
/// use relaylink::channel::CommandChannel;
/// use relaylink::event::EventBus;
/// use relaylink::speech::Voice;
/// use relaylink::transport::MemoryLink;
/// use relaylink::types::Action;
///
/// # async fn example() {
/// let channel = CommandChannel::new(Voice::new(EventBus::new()));
/// assert_eq!(channel.execute(Action::RedOn).await, None);
///
/// let board = MemoryLink::new("mem0");
/// board.reply_to("GET_TEMP", ["23.5"]);
/// channel.attach(board.clone()).await;
///
/// assert_eq!(channel.execute(Action::GetTemperature).await.as_deref(), Some("23.5"));
/// assert_eq!(board.written(), ["GET_TEMP"]);
/// # }
/// ```
pub struct CommandChannel {
    link: SharedLink,
    voice: Voice,
    reply_window: Duration,
}

impl CommandChannel {
    /// How long to wait for a reply line after a reply-expecting command.
    pub const DEFAULT_REPLY_WINDOW: Duration = Duration::from_secs(2);

    /// Creates a channel with no open link.
    #[must_use]
    pub fn new(voice: Voice) -> Self {
        Self {
            link: Arc::new(Mutex::new(None)),
            voice,
            reply_window: Self::DEFAULT_REPLY_WINDOW,
        }
    }

    /// Sets the reply window used by [`CommandChannel::execute`].
    #[must_use]
    pub fn with_reply_window(mut self, window: Duration) -> Self {
        self.reply_window = window;
        self
    }

    /// Returns the reply window used by [`CommandChannel::execute`].
    #[must_use]
    pub fn reply_window(&self) -> Duration {
        self.reply_window
    }

    /// Returns the voice this channel speaks through.
    #[must_use]
    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    /// Installs an open link, closing the previous one if any.
    pub async fn attach<L>(&self, link: L)
    where
        L: Link + 'static,
    {
        let port = link.port().to_string();
        let previous = self.link.lock().await.replace(Box::new(link));

        if let Some(mut previous) = previous {
            let old_port = previous.port().to_string();
            previous.close();
            tracing::info!(port = %old_port, "Replaced serial link");
            self.voice
                .events()
                .publish(AssistantEvent::disconnected(old_port));
        }

        tracing::info!(port = %port, "Serial link attached");
        self.voice.events().publish(AssistantEvent::connected(port));
    }

    /// Opens a serial port and installs it.
    ///
    /// The port is opened on the blocking pool, then the configured settle
    /// delay is awaited before the link is used.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the port cannot be opened. The current
    /// link, if any, is left untouched in that case.
    #[cfg(feature = "serial")]
    pub async fn connect(&self, config: &SerialConfig) -> Result<(), ConnectionError> {
        if config.port().trim().is_empty() {
            return Err(ConnectionError::NoPort);
        }

        let owned = config.clone();
        let opened = tokio::task::spawn_blocking(move || SerialLink::open(&owned))
            .await
            .map_err(|e| ConnectionError::OpenFailed {
                port: config.port().to_string(),
                message: e.to_string(),
            })?;

        let link = match opened {
            Ok(link) => link,
            Err(err) => {
                tracing::error!(port = %config.port(), error = %err, "Failed to open serial port");
                self.voice
                    .events()
                    .publish(AssistantEvent::connection_failed(config.port(), err.to_string()));
                return Err(err);
            }
        };

        if !config.settle_delay().is_zero() {
            tracing::debug!(delay = ?config.settle_delay(), "Waiting for the board to settle");
            tokio::time::sleep(config.settle_delay()).await;
        }

        self.attach(link).await;
        Ok(())
    }

    /// Closes the current link.
    ///
    /// Waits for an in-flight exchange to finish first. Returns `false` if
    /// there was nothing to close.
    pub async fn disconnect(&self) -> bool {
        let Some(mut link) = self.link.lock().await.take() else {
            return false;
        };
        let port = link.port().to_string();
        link.close();
        tracing::info!(port = %port, "Serial link closed");
        self.voice.events().publish(AssistantEvent::disconnected(port));
        true
    }

    /// Returns `true` if an open link is installed.
    pub async fn is_connected(&self) -> bool {
        self.link
            .lock()
            .await
            .as_ref()
            .is_some_and(|link| link.is_open())
    }

    /// Returns the port of the installed link.
    pub async fn port(&self) -> Option<String> {
        self.link
            .lock()
            .await
            .as_ref()
            .map(|link| link.port().to_string())
    }

    /// Sends `action` and, if it expects one, waits up to `window` for a
    /// reply. Nothing is spoken.
    ///
    /// Returns `Ok(None)` when no link is open, the action has no wire
    /// command, the action expects no reply, or no non-empty reply arrived.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if writing or reading fails and
    /// [`Error::Task`] if the blocking exchange was aborted.
    pub async fn request(&self, action: Action, window: Duration) -> Result<Option<String>, Error> {
        let Some(command) = action.wire_command() else {
            return Ok(None);
        };

        let guard = Arc::clone(&self.link).lock_owned().await;
        let expects_reply = action.expects_reply();

        let exchanged = tokio::task::spawn_blocking(move || {
            let mut guard = guard;
            match guard.as_mut() {
                Some(link) if link.is_open() => {
                    exchange(link.as_mut(), command, expects_reply, window).map(Exchange::Sent)
                }
                _ => Ok(Exchange::NotConnected),
            }
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))?;

        match exchanged {
            Ok(Exchange::NotConnected) => {
                tracing::debug!(%action, "No open link, command dropped");
                Ok(None)
            }
            Ok(Exchange::Sent(reply)) => {
                tracing::debug!(command, reply = ?reply, "Command sent");
                self.voice.events().publish(AssistantEvent::CommandSent {
                    action,
                    reply: reply.clone(),
                });
                Ok(reply)
            }
            Err(err) => {
                self.voice.events().publish(AssistantEvent::CommandFailed {
                    action,
                    error: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Performs `action` and speaks the outcome.
    ///
    /// Returns the reply line for reply-expecting actions. Delivery failures
    /// are logged and announced, and yield `None` with no confirmation.
    pub async fn execute(&self, action: Action) -> Option<String> {
        let reply = match self.request(action, self.reply_window).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(%action, error = %err, "Command failed");
                self.voice.say(TRANSPORT_FAILURE_NOTICE).await;
                return None;
            }
        };

        if action == Action::GetTemperature {
            let reading = TemperatureReading::from_reply(reply.as_deref());
            self.voice
                .events()
                .publish(AssistantEvent::TemperatureRead { reading });
            self.voice.say(&reading.announcement()).await;
        } else if let Some(phrase) = action.confirmation() {
            self.voice.say(phrase).await;
        }

        reply
    }
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("reply_window", &self.reply_window)
            .finish_non_exhaustive()
    }
}

fn exchange(
    link: &mut dyn Link,
    command: &str,
    expects_reply: bool,
    window: Duration,
) -> Result<Option<String>, TransportError> {
    if expects_reply {
        link.discard_input()?;
    }
    link.write_line(command)?;
    if !expects_reply {
        return Ok(None);
    }
    Ok(link.read_line(window)?.filter(|line| !line.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::speech::Role;
    use crate::transport::MemoryLink;

    fn channel() -> CommandChannel {
        CommandChannel::new(Voice::new(EventBus::new())).with_reply_window(Duration::ZERO)
    }

    fn spoken(channel: &CommandChannel) -> Vec<String> {
        channel
            .voice()
            .transcript()
            .entries()
            .into_iter()
            .filter(|e| e.role == Role::Assistant)
            .map(|e| e.text)
            .collect()
    }

    #[tokio::test]
    async fn no_link_sends_nothing() {
        let channel = channel();
        for action in Action::ALL {
            assert_eq!(channel.execute(action).await, None);
            assert!(channel.request(action, Duration::ZERO).await.unwrap().is_none());
        }
        assert!(!channel.is_connected().await);
    }

    #[tokio::test]
    async fn confirmation_is_spoken_after_send() {
        let channel = channel();
        let board = MemoryLink::new("mem");
        channel.attach(board.clone()).await;

        assert_eq!(channel.execute(Action::RelayOn).await, None);
        assert_eq!(board.written(), ["POWER_RELAY"]);
        assert_eq!(spoken(&channel), ["Relay powered"]);
    }

    #[tokio::test]
    async fn manual_shutdown_is_silent() {
        let channel = channel();
        let board = MemoryLink::new("mem");
        channel.attach(board.clone()).await;

        assert_eq!(channel.execute(Action::Shutdown).await, None);
        assert_eq!(board.written(), ["kill"]);
        assert!(spoken(&channel).is_empty());
    }

    #[tokio::test]
    async fn temperature_reply_is_announced() {
        let channel = channel();
        let board = MemoryLink::new("mem");
        board.reply_to("GET_TEMP", ["23.5", "ERROR: no sensor"]);
        channel.attach(board.clone()).await;

        assert_eq!(channel.execute(Action::GetTemperature).await.as_deref(), Some("23.5"));
        assert_eq!(
            channel.execute(Action::GetTemperature).await.as_deref(),
            Some("ERROR: no sensor")
        );
        assert_eq!(channel.execute(Action::GetTemperature).await, None);
        assert_eq!(
            spoken(&channel),
            [
                "The temperature is 23.5 degrees Celsius",
                "Could not read temperature",
                "Could not read temperature",
            ]
        );
    }

    #[tokio::test]
    async fn stale_input_is_not_taken_as_reply() {
        let channel = channel();
        let board = MemoryLink::new("mem");
        board.push_incoming("Booting...");
        channel.attach(board.clone()).await;

        assert_eq!(channel.request(Action::GetTemperature, Duration::ZERO).await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_failure_aborts_without_confirmation() {
        let channel = channel();
        let mut events = channel.voice().events().subscribe();
        let board = MemoryLink::new("mem");
        channel.attach(board.clone()).await;
        board.fail_writes(true);

        assert_eq!(channel.execute(Action::AllOn).await, None);
        assert_eq!(spoken(&channel), [TRANSPORT_FAILURE_NOTICE]);

        // connected, then failure
        assert!(matches!(events.recv().await.unwrap(), AssistantEvent::ConnectionChanged { .. }));
        assert!(matches!(
            events.recv().await.unwrap(),
            AssistantEvent::CommandFailed { action: Action::AllOn, .. }
        ));
    }

    #[tokio::test]
    async fn request_surfaces_transport_errors() {
        let channel = channel();
        let board = MemoryLink::new("mem");
        channel.attach(board.clone()).await;
        board.fail_writes(true);

        let err = channel.request(Action::RedOn, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Io(_))));
        assert!(channel.voice().transcript().is_empty());
    }

    #[tokio::test]
    async fn automatic_toggle_never_touches_the_wire() {
        let channel = channel();
        let board = MemoryLink::new("mem");
        channel.attach(board.clone()).await;

        assert_eq!(channel.execute(Action::AutomaticModeToggle).await, None);
        assert!(board.written().is_empty());
        assert!(spoken(&channel).is_empty());
    }

    #[tokio::test]
    async fn attach_replaces_and_closes_previous_link() {
        let channel = channel();
        let first = MemoryLink::new("first");
        channel.attach(first.clone()).await;
        channel.attach(MemoryLink::new("second")).await;

        assert_eq!(first.close_calls(), 1);
        assert_eq!(channel.port().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let channel = channel();
        let board = MemoryLink::new("mem");
        channel.attach(board.clone()).await;

        assert!(channel.disconnect().await);
        assert!(!channel.disconnect().await);
        assert_eq!(board.close_calls(), 1);
        assert_eq!(channel.execute(Action::RedOff).await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_executes_do_not_interleave() {
        let channel = Arc::new(channel());
        let board = MemoryLink::new("mem");
        channel.attach(board.clone()).await;

        let mut tasks = Vec::new();
        for action in [Action::AllOn, Action::RelayOff, Action::GamingMode, Action::SleepMode] {
            for _ in 0..8 {
                let channel = Arc::clone(&channel);
                tasks.push(tokio::spawn(async move { channel.execute(action).await }));
            }
        }
        for task in tasks {
            task.await.unwrap();
        }

        let lines = board.written();
        assert_eq!(lines.len(), 32);
        for line in lines {
            assert!(
                ["ALL_LIGHTS_ON", "POWER_OFF_RELAY", "gaming_mode", "SLEEP_MODE"].contains(&line.as_str()),
                "interleaved line: {line:?}"
            );
        }
    }
}
