// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accumulates raw bytes and splits them into newline-terminated lines.

/// Byte accumulator for line-oriented serial input.
///
/// Bytes that arrive after a newline stay buffered for the next call to
/// [`LineBuffer::next_line`].
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Removes the first complete line from the buffer.
    ///
    /// Returns `None` when no newline has arrived yet. A complete line that is
    /// not valid UTF-8 is consumed and reported as `Some(None)`, so the caller
    /// can treat it as "no data" without it blocking later lines.
    pub(crate) fn next_line(&mut self) -> Option<Option<String>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        Some(
            String::from_utf8(raw)
                .ok()
                .map(|line| line.trim().to_string()),
        )
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_line_is_held_back() {
        let mut buf = LineBuffer::new();
        buf.extend(b"23.");
        assert_eq!(buf.next_line(), None);
        buf.extend(b"5\r\n");
        assert_eq!(buf.next_line(), Some(Some("23.5".to_string())));
        assert!(buf.is_empty());
    }

    #[test]
    fn keeps_remainder_for_next_line() {
        let mut buf = LineBuffer::new();
        buf.extend(b"OK\n24.0\nERR");
        assert_eq!(buf.next_line(), Some(Some("OK".to_string())));
        assert_eq!(buf.next_line(), Some(Some("24.0".to_string())));
        assert_eq!(buf.next_line(), None);
        assert!(!buf.is_empty());
    }

    #[test]
    fn invalid_utf8_line_is_consumed_as_no_data() {
        let mut buf = LineBuffer::new();
        buf.extend(&[0xff, 0xfe, b'\n', b'2', b'5', b'\n']);
        assert_eq!(buf.next_line(), Some(None));
        assert_eq!(buf.next_line(), Some(Some("25".to_string())));
    }

    #[test]
    fn clear_drops_everything() {
        let mut buf = LineBuffer::new();
        buf.extend(b"stale\n");
        buf.clear();
        assert_eq!(buf.next_line(), None);
    }
}
