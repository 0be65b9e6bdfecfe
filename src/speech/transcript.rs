// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversation transcript.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A recognized voice command.
    User,
    /// Something the assistant said.
    Assistant,
}

impl Role {
    /// Returns the label shown in front of the line.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// When the line was recorded.
    pub at: DateTime<Local>,
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub text: String,
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role.label(), self.text)
    }
}

/// A bounded, shared log of the conversation.
///
/// Clones share the same log. Once full, the oldest lines are dropped.
///
/// # Examples
///
/// ```
/// use relaylink::speech::{Role, Transcript};
///
/// let transcript = Transcript::with_capacity(2);
/// transcript.push(Role::User, "red off");
/// transcript.push(Role::Assistant, "Red light off");
/// transcript.push(Role::User, "gaming");
///
/// let lines: Vec<String> = transcript.entries().iter().map(ToString::to_string).collect();
/// assert_eq!(lines, ["Assistant: Red light off", "You: gaming"]);
/// ```
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Arc<Mutex<VecDeque<TranscriptEntry>>>,
    capacity: usize,
}

impl Transcript {
    /// Default number of retained lines.
    pub const DEFAULT_CAPACITY: usize = 500;

    /// Creates an empty transcript with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty transcript keeping at most `capacity` lines.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity: capacity.max(1),
        }
    }

    /// Appends a line.
    pub fn push(&self, role: Role, text: impl Into<String>) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(TranscriptEntry {
            at: Local::now(),
            role,
            text: text.into(),
        });
    }

    /// Returns a snapshot of all retained lines, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Returns the most recent line.
    #[must_use]
    pub fn last(&self) -> Option<TranscriptEntry> {
        self.entries.lock().back().cloned()
    }

    /// Returns the number of retained lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
