// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory link that plays the board's side of the protocol.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::Link;
use crate::error::TransportError;

/// A scripted stand-in for the controller board.
///
/// Every written line is recorded. Replies queued with
/// [`MemoryLink::reply_to`] are released one per matching command, the way
/// the real board answers `GET_TEMP`. Clones share state, so a test can keep
/// one handle while the command channel owns another.
///
/// # Examples
///
/// ```
/// use relaylink::transport::{Link, MemoryLink};
/// use std::time::Duration;
///
/// let board = MemoryLink::new("mem0");
/// board.reply_to("GET_TEMP", ["24.5"]);
///
/// let mut link = board.clone();
/// link.write_line("GET_TEMP").unwrap();
/// assert_eq!(link.read_line(Duration::ZERO).unwrap(), Some("24.5".to_string()));
/// assert_eq!(board.written(), ["GET_TEMP"]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryLink {
    name: String,
    state: Arc<Mutex<BoardState>>,
}

#[derive(Debug, Default)]
struct BoardState {
    wire: Vec<u8>,
    scripted: HashMap<String, VecDeque<String>>,
    incoming: VecDeque<String>,
    fail_writes: bool,
    closed: bool,
    close_calls: usize,
}

impl MemoryLink {
    /// Creates an open link named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(BoardState::default())),
        }
    }

    /// Queues replies released one at a time whenever `command` is written.
    pub fn reply_to<I, S>(&self, command: &str, replies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .scripted
            .entry(command.to_string())
            .or_default()
            .extend(replies.into_iter().map(Into::into));
    }

    /// Queues an unsolicited line, as if the board printed it on its own.
    pub fn push_incoming(&self, line: impl Into<String>) {
        self.state.lock().incoming.push_back(line.into());
    }

    /// Makes every following write fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Returns every complete line written so far.
    #[must_use]
    pub fn written(&self) -> Vec<String> {
        let state = self.state.lock();
        String::from_utf8_lossy(&state.wire)
            .split_terminator('\n')
            .map(str::to_string)
            .collect()
    }

    /// Returns the raw bytes written so far.
    #[must_use]
    pub fn wire_bytes(&self) -> Vec<u8> {
        self.state.lock().wire.clone()
    }

    /// Returns how many times `close` was called.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }
}

impl Link for MemoryLink {
    fn port(&self) -> &str {
        &self.name
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        {
            let state = self.state.lock();
            if state.closed {
                return Err(TransportError::Closed);
            }
            if state.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped").into());
            }
        }

        // Byte by byte, releasing the lock in between, like a slow UART
        for byte in line.bytes().chain(std::iter::once(b'\n')) {
            self.state.lock().wire.push(byte);
            std::thread::yield_now();
        }

        let mut state = self.state.lock();
        let reply = state.scripted.get_mut(line).and_then(VecDeque::pop_front);
        if let Some(reply) = reply {
            state.incoming.push_back(reply);
        }
        Ok(())
    }

    fn read_line(&mut self, _timeout: Duration) -> Result<Option<String>, TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        Ok(state.incoming.pop_front().map(|line| line.trim().to_string()))
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        self.state.lock().incoming.clear();
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.close_calls += 1;
        state.closed = true;
    }

    fn is_open(&self) -> bool {
        !self.state.lock().closed
    }
}
