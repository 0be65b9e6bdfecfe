// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A recognizer that "hears" lines of text.

use std::io::{self, BufRead, BufReader};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::Listener;
use crate::error::RecognitionError;

/// Treats each line read from a text source as one recognized utterance.
///
/// A reader thread feeds a channel so that [`Listener::listen`] can honor its
/// timeout. A blank line counts as unintelligible speech; end of input is a
/// backend failure, which stops the activation loop.
///
/// # Examples
///
/// ```
/// use relaylink::speech::{LineListener, Listener};
/// use std::io::Cursor;
/// use std::time::Duration;
///
/// let listener = LineListener::spawn(Cursor::new("hey assistant\nred off\n"));
/// assert_eq!(listener.listen(Duration::from_secs(1)).unwrap(), "hey assistant");
/// assert_eq!(listener.listen(Duration::from_secs(1)).unwrap(), "red off");
/// ```
#[derive(Debug)]
pub struct LineListener {
    lines: Mutex<Receiver<String>>,
}

impl LineListener {
    /// Starts reading lines from `reader` on a background thread.
    #[must_use]
    pub fn spawn<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            lines: Mutex::new(rx),
        }
    }

    /// Reads utterances from standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::spawn(BufReader::new(io::stdin()))
    }
}

impl Listener for LineListener {
    fn listen(&self, timeout: Duration) -> Result<String, RecognitionError> {
        match self.lines.lock().recv_timeout(timeout) {
            Ok(line) if line.trim().is_empty() => Err(RecognitionError::Unintelligible),
            Ok(line) => Ok(line.trim().to_string()),
            Err(RecvTimeoutError::Timeout) => Err(RecognitionError::TimedOut),
            Err(RecvTimeoutError::Disconnected) => {
                Err(RecognitionError::Backend("input closed".to_string()))
            }
        }
    }
}
