// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wake phrase detection.

/// Decides whether an utterance wakes the assistant.
///
/// Matching is a case-insensitive substring test, so "ok hey assistant
/// please" wakes it as well.
///
/// # Examples
///
/// ```
/// use relaylink::intent::ActivationGate;
///
/// let gate = ActivationGate::new();
/// assert!(gate.is_activation("Hey Assistant"));
/// assert!(!gate.is_activation("hey there"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationGate {
    phrase: String,
}

impl ActivationGate {
    /// Wake phrase used when none is configured.
    pub const DEFAULT_PHRASE: &'static str = "hey assistant";

    /// Creates a gate for [`Self::DEFAULT_PHRASE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_phrase(Self::DEFAULT_PHRASE)
    }

    /// Creates a gate for a custom wake phrase.
    ///
    /// A blank phrase falls back to the default, since it would match
    /// everything.
    #[must_use]
    pub fn with_phrase(phrase: impl AsRef<str>) -> Self {
        let phrase = phrase.as_ref().trim().to_lowercase();
        if phrase.is_empty() {
            return Self::new();
        }
        Self { phrase }
    }

    /// Returns the (lowercased) wake phrase.
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Returns `true` if `utterance` contains the wake phrase.
    #[must_use]
    pub fn is_activation(&self, utterance: &str) -> bool {
        utterance.to_lowercase().contains(&self.phrase)
    }
}

impl Default for ActivationGate {
    fn default() -> Self {
        Self::new()
    }
}
