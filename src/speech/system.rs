// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text-to-speech through an external program.

use std::process::Command;

use super::Speaker;
use crate::error::SpeechError;

/// Speaks by running a command-line synthesizer once per utterance.
///
/// Defaults to `say` on macOS and `espeak` elsewhere. The program is called
/// as `<program> [-r|-s <rate>] <text>` and waited for, so utterances never
/// overlap. `say` takes the rate as `-r`, everything else as `-s`.
///
/// # Examples
///
/// ```
/// use relaylink::speech::SystemSpeaker;
///
/// let speaker = SystemSpeaker::new().with_program("espeak").with_rate(150);
/// assert_eq!(speaker.program(), "espeak");
/// ```
#[derive(Debug, Clone)]
pub struct SystemSpeaker {
    program: String,
    rate: Option<u32>,
}

impl SystemSpeaker {
    /// Words per minute used when no rate is configured.
    pub const DEFAULT_RATE: u32 = 150;

    /// Creates a speaker for the platform's default synthesizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: Self::default_program().to_string(),
            rate: Some(Self::DEFAULT_RATE),
        }
    }

    /// Returns the platform's default synthesizer program.
    #[must_use]
    pub const fn default_program() -> &'static str {
        if cfg!(target_os = "macos") {
            "say"
        } else {
            "espeak"
        }
    }

    /// Uses a different synthesizer program.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the speaking rate in words per minute.
    #[must_use]
    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Returns the synthesizer program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn rate_flag(&self) -> &'static str {
        if self.program.ends_with("say") {
            "-r"
        } else {
            "-s"
        }
    }

    fn command(&self, text: &str) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(rate) = self.rate {
            command.arg(self.rate_flag()).arg(rate.to_string());
        }
        command.arg(text);
        command
    }
}

impl Default for SystemSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl Speaker for SystemSpeaker {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let output = self
            .command(text)
            .output()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SpeechError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_text() {
        let speaker = SystemSpeaker::new();
        assert!(matches!(speaker.speak("   "), Err(SpeechError::EmptyText)));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let speaker = SystemSpeaker::new().with_program("relaylink-no-such-tts");
        assert!(matches!(
            speaker.speak("hello"),
            Err(SpeechError::Spawn { .. })
        ));
    }

    #[test]
    fn builds_rate_argument() {
        let speaker = SystemSpeaker::new().with_program("espeak").with_rate(120);
        let command = speaker.command("Yes?");
        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-s", "120", "Yes?"]);

        let say = SystemSpeaker::new().with_program("say").with_rate(180);
        let args: Vec<_> = say
            .command("Hi")
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["-r", "180", "Hi"]);
    }
}
