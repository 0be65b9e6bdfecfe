// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The voice loop: wait for the wake phrase, then take one command.
//!
//! Wake-phrase listening and command listening share one loop, so the
//! recognizer is never used by two listens at once.

use std::sync::Arc;
use std::time::Duration;

use crate::controller::Controller;
use crate::error::RecognitionError;
use crate::intent::{ActivationGate, IntentRouter};
use crate::speech::{Listener, SystemSpeaker};
use crate::types::Action;

/// Settings for the voice front-end.
///
/// # Examples
///
/// ```
/// use relaylink::assistant::VoiceConfig;
/// use std::time::Duration;
///
/// let config = VoiceConfig::new()
///     .with_activation_phrase("hello board")
///     .with_listen_timeout(Duration::from_secs(3));
/// assert_eq!(config.activation_phrase(), "hello board");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConfig {
    activation_phrase: String,
    listen_timeout: Duration,
    tts_program: Option<String>,
    tts_rate: u32,
}

impl VoiceConfig {
    /// How long each listen waits for speech to start.
    pub const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            activation_phrase: ActivationGate::DEFAULT_PHRASE.to_string(),
            listen_timeout: Self::DEFAULT_LISTEN_TIMEOUT,
            tts_program: None,
            tts_rate: SystemSpeaker::DEFAULT_RATE,
        }
    }

    /// Sets the wake phrase.
    #[must_use]
    pub fn with_activation_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.activation_phrase = phrase.into();
        self
    }

    /// Sets the per-listen timeout.
    #[must_use]
    pub fn with_listen_timeout(mut self, timeout: Duration) -> Self {
        self.listen_timeout = timeout;
        self
    }

    /// Sets the text-to-speech program. `None` picks the platform default.
    #[must_use]
    pub fn with_tts_program(mut self, program: Option<String>) -> Self {
        self.tts_program = program;
        self
    }

    /// Sets the speaking rate in words per minute.
    #[must_use]
    pub fn with_tts_rate(mut self, rate: u32) -> Self {
        self.tts_rate = rate;
        self
    }

    /// Returns the wake phrase.
    #[must_use]
    pub fn activation_phrase(&self) -> &str {
        &self.activation_phrase
    }

    /// Returns the per-listen timeout.
    #[must_use]
    pub fn listen_timeout(&self) -> Duration {
        self.listen_timeout
    }

    /// Builds the configured speech engine.
    #[must_use]
    pub fn speaker(&self) -> SystemSpeaker {
        let speaker = SystemSpeaker::new().with_rate(self.tts_rate);
        match &self.tts_program {
            Some(program) => speaker.with_program(program.clone()),
            None => speaker,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Listens for voice commands and hands them to a [`Controller`].
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use std::sync::Arc;
/// use relaylink::assistant::{VoiceAssistant, VoiceConfig};
/// use relaylink::controller::Controller;
/// use relaylink::event::EventBus;
/// use relaylink::speech::{LineListener, Voice};
///
/// # async fn example() {
/// let controller = Arc::new(Controller::new(Voice::new(EventBus::new())));
/// let listener = LineListener::spawn(Cursor::new("hey assistant\ngaming\n"));
/// let assistant = VoiceAssistant::new(controller.clone(), listener, &VoiceConfig::new());
///
/// // Runs until the input ends
/// assert!(assistant.run().await.is_err());
/// # }
/// ```
pub struct VoiceAssistant {
    controller: Arc<Controller>,
    listener: Arc<dyn Listener>,
    router: IntentRouter,
    gate: ActivationGate,
    listen_timeout: Duration,
}

impl VoiceAssistant {
    /// Creates an assistant with the default router.
    #[must_use]
    pub fn new(
        controller: Arc<Controller>,
        listener: impl Listener + 'static,
        config: &VoiceConfig,
    ) -> Self {
        Self {
            controller,
            listener: Arc::new(listener),
            router: IntentRouter::new(),
            gate: ActivationGate::with_phrase(config.activation_phrase()),
            listen_timeout: config.listen_timeout(),
        }
    }

    /// Replaces the intent router.
    #[must_use]
    pub fn with_router(mut self, router: IntentRouter) -> Self {
        self.router = router;
        self
    }

    /// Runs the activation loop until the recognizer fails.
    ///
    /// Unintelligible speech and silence are skipped while waiting for the
    /// wake phrase.
    ///
    /// # Errors
    ///
    /// Returns the [`RecognitionError::Backend`] that stopped the loop.
    pub async fn run(&self) -> Result<(), RecognitionError> {
        tracing::info!(phrase = %self.gate.phrase(), "Listening for activation phrase");
        loop {
            let utterance = match self.listen().await {
                Ok(utterance) => utterance,
                Err(err) if err.is_transient() => continue,
                Err(err) => {
                    tracing::error!(error = %err, "Activation listener stopped");
                    return Err(err);
                }
            };

            if !self.gate.is_activation(&utterance) {
                tracing::trace!(utterance = %utterance, "Not an activation phrase");
                continue;
            }

            tracing::debug!("Activation phrase detected");
            if let Err(err) = self.take_command().await {
                tracing::error!(error = %err, "Activation listener stopped");
                return Err(err);
            }
        }
    }

    /// Prompts for one command, then routes and performs it.
    ///
    /// Returns the action performed, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RecognitionError::Backend`] if the recognizer failed. The
    /// transient failures are answered aloud and yield `Ok(None)`.
    pub async fn take_command(&self) -> Result<Option<Action>, RecognitionError> {
        self.controller.voice().say("Yes?").await;
        match self.listen().await {
            Ok(phrase) => Ok(self.handle_phrase(&phrase).await),
            Err(RecognitionError::Unintelligible) => {
                self.controller
                    .voice()
                    .say("Sorry, I could not understand.")
                    .await;
                Ok(None)
            }
            Err(RecognitionError::TimedOut) => {
                self.controller.voice().say("Listening timed out.").await;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Records, routes and performs a recognized command phrase.
    pub async fn handle_phrase(&self, phrase: &str) -> Option<Action> {
        let phrase = phrase.to_lowercase();
        self.controller.voice().heard(&phrase);

        if let Some(action) = self.router.route(&phrase) {
            self.controller.perform(action).await;
            Some(action)
        } else {
            self.controller
                .voice()
                .say("Command not recognized")
                .await;
            None
        }
    }

    async fn listen(&self) -> Result<String, RecognitionError> {
        let listener = Arc::clone(&self.listener);
        let timeout = self.listen_timeout;
        tokio::task::spawn_blocking(move || listener.listen(timeout))
            .await
            .map_err(|e| RecognitionError::Backend(e.to_string()))?
    }
}

impl std::fmt::Debug for VoiceAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceAssistant")
            .field("gate", &self.gate)
            .field("listen_timeout", &self.listen_timeout)
            .finish_non_exhaustive()
    }
}
