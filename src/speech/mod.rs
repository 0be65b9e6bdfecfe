// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Speech input and output.
//!
//! Recognition and synthesis are external services. This module defines the
//! two seams ([`Speaker`] and [`Listener`]), a few plain implementations, and
//! [`Voice`], which is what the rest of the crate talks through.

mod lines;
mod system;
mod transcript;

use std::sync::Arc;
use std::time::Duration;

pub use lines::LineListener;
pub use system::SystemSpeaker;
pub use transcript::{Role, Transcript, TranscriptEntry};

use crate::error::{RecognitionError, SpeechError};
use crate::event::{AssistantEvent, EventBus};

/// A text-to-speech engine.
///
/// Implementations block until the utterance has been spoken.
pub trait Speaker: Send + Sync {
    /// Speaks `text` aloud.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if synthesis or playback fails.
    fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// A speech recognizer.
///
/// Implementations block for at most `timeout` waiting for speech to start.
pub trait Listener: Send + Sync {
    /// Captures one utterance and returns its text.
    ///
    /// # Errors
    ///
    /// Returns [`RecognitionError::TimedOut`] when nothing was said,
    /// [`RecognitionError::Unintelligible`] when nothing could be made out and
    /// [`RecognitionError::Backend`] when the recognizer itself is broken.
    fn listen(&self, timeout: Duration) -> Result<String, RecognitionError>;
}

/// The assistant's voice.
///
/// Every utterance is logged, added to the [`Transcript`] and published as an
/// [`AssistantEvent::Spoke`] before it is handed to the speech engine, if one
/// is attached. Engine failures are logged and otherwise ignored.
///
/// # Examples
///
/// ```
/// use relaylink::event::EventBus;
/// use relaylink::speech::Voice;
///
/// # async fn example() {
/// let voice = Voice::new(EventBus::new());
/// voice.say("Hi, I'm ready to help.").await;
/// assert_eq!(voice.transcript().len(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct Voice {
    engine: Option<Arc<dyn Speaker>>,
    transcript: Transcript,
    events: EventBus,
}

impl Voice {
    /// Creates a voice without a speech engine (transcript and events only).
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            engine: None,
            transcript: Transcript::new(),
            events,
        }
    }

    /// Attaches a speech engine.
    #[must_use]
    pub fn with_engine(mut self, engine: impl Speaker + 'static) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Uses an existing transcript instead of a fresh one.
    #[must_use]
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }

    /// Returns `true` if a speech engine is attached.
    #[must_use]
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Says `text`.
    ///
    /// The engine runs on the blocking pool; this resolves once it is done.
    pub async fn say(&self, text: &str) {
        tracing::info!(text, "Assistant");
        self.transcript.push(Role::Assistant, text);
        self.events.publish(AssistantEvent::Spoke {
            text: text.to_string(),
        });

        let Some(engine) = self.engine.clone() else {
            return;
        };
        let owned = text.to_string();
        match tokio::task::spawn_blocking(move || engine.speak(&owned)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "Speech engine failed"),
            Err(err) => tracing::warn!(error = %err, "Speech task aborted"),
        }
    }

    /// Records a recognized user phrase.
    pub fn heard(&self, text: &str) {
        tracing::info!(text, "User");
        self.transcript.push(Role::User, text);
        self.events.publish(AssistantEvent::Heard {
            text: text.to_string(),
        });
    }

    /// Returns the conversation transcript.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the event bus this voice publishes on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("engine", &self.has_engine())
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}
