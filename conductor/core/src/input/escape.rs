//! Incremental escape-sequence decoder.
//!
//! Bytes arrive in arbitrary chunks, so a sequence such as `ESC [ A` may be
//! split across reads. The parser keeps the partial match and a flush deadline;
//! if the rest does not show up before the deadline the held bytes are emitted
//! as [`InputEvent::Unknown`].
//!
//! ```text
//! Ground ──ESC──► Escape ──'['──► Csi ──final byte──► ArrowX / Unknown
//!    │               └────'O'──► Ss3 ──any byte───► ArrowX / Unknown
//!    └──UTF-8 lead──► Utf8 ──continuations──► Char / Unknown
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::InputEvent;

/// How long a partial sequence is held before it is flushed
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(20);

/// Longest CSI sequence kept before giving up on it
const MAX_SEQUENCE_LEN: usize = 16;

const ESC: u8 = 0x1b;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Partial {
    /// Saw `ESC`
    Escape,
    /// Saw `ESC [`, collecting parameters
    Csi,
    /// Saw `ESC O`
    Ss3,
    /// Inside a multi-byte UTF-8 character of `len` bytes
    Utf8 { len: usize },
}

/// Byte-at-a-time decoder for terminal input
#[derive(Debug)]
pub struct EscapeParser {
    held: Vec<u8>,
    partial: Option<Partial>,
    flush_deadline: Option<Instant>,
    timeout: Duration,
}

impl EscapeParser {
    /// Create a parser that holds partial sequences for `timeout`
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Vec::with_capacity(MAX_SEQUENCE_LEN),
            partial: None,
            flush_deadline: None,
            timeout,
        }
    }

    /// Hold timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether bytes are being held for a possible sequence
    #[must_use]
    pub fn has_partial(&self) -> bool {
        self.partial.is_some()
    }

    /// Bytes currently held
    #[must_use]
    pub fn held(&self) -> &[u8] {
        &self.held
    }

    /// Feed one byte received at `now`; completed events are pushed to `out`
    pub fn feed(&mut self, byte: u8, now: Instant, out: &mut VecDeque<InputEvent>) {
        match self.partial {
            None => self.ground(byte, now, out),
            Some(Partial::Escape) => match byte {
                b'[' => self.hold(byte, Partial::Csi),
                b'O' => self.hold(byte, Partial::Ss3),
                _ => {
                    self.flush(out);
                    self.ground(byte, now, out);
                }
            },
            Some(Partial::Csi) => match byte {
                0x40..=0x7e => {
                    self.held.push(byte);
                    let event = match self.held.as_slice() {
                        [ESC, b'[', final_byte] => arrow(*final_byte),
                        _ => None,
                    };
                    self.finish(event, out);
                }
                0x20..=0x3f if self.held.len() < MAX_SEQUENCE_LEN => self.held.push(byte),
                _ => {
                    self.flush(out);
                    self.ground(byte, now, out);
                }
            },
            Some(Partial::Ss3) => {
                self.held.push(byte);
                self.finish(arrow(byte), out);
            }
            Some(Partial::Utf8 { len }) => {
                if byte & 0xc0 == 0x80 {
                    self.held.push(byte);
                    if self.held.len() == len {
                        let event = std::str::from_utf8(&self.held)
                            .ok()
                            .and_then(|s| s.chars().next())
                            .map(InputEvent::Char);
                        self.finish(event, out);
                    }
                } else {
                    self.flush(out);
                    self.ground(byte, now, out);
                }
            }
        }
    }

    /// Emit held bytes as `Unknown` if their deadline has passed
    pub fn flush_expired(&mut self, now: Instant, out: &mut VecDeque<InputEvent>) {
        if let Some(deadline) = self.flush_deadline {
            if now >= deadline {
                tracing::trace!(bytes = ?self.held, "partial sequence timed out");
                self.flush(out);
            }
        }
    }

    /// Emit held bytes as `Unknown` right away
    pub fn flush(&mut self, out: &mut VecDeque<InputEvent>) {
        self.partial = None;
        self.flush_deadline = None;
        if !self.held.is_empty() {
            out.push_back(InputEvent::Unknown(std::mem::take(&mut self.held)));
        }
    }

    fn ground(&mut self, byte: u8, now: Instant, out: &mut VecDeque<InputEvent>) {
        let event = match byte {
            0x03 => InputEvent::CtrlC,
            0x04 => InputEvent::CtrlD,
            b'\r' | b'\n' => InputEvent::Enter,
            0x7f | 0x08 => InputEvent::Backspace,
            ESC => {
                self.held.push(byte);
                self.partial = Some(Partial::Escape);
                self.flush_deadline = Some(now + self.timeout);
                return;
            }
            0x20..=0x7e => InputEvent::Char(char::from(byte)),
            0xc2..=0xf4 => {
                let len = match byte {
                    0xc2..=0xdf => 2,
                    0xe0..=0xef => 3,
                    _ => 4,
                };
                self.held.push(byte);
                self.partial = Some(Partial::Utf8 { len });
                self.flush_deadline = Some(now + self.timeout);
                return;
            }
            _ => InputEvent::Unknown(vec![byte]),
        };
        out.push_back(event);
    }

    fn hold(&mut self, byte: u8, next: Partial) {
        self.held.push(byte);
        self.partial = Some(next);
    }

    fn finish(&mut self, event: Option<InputEvent>, out: &mut VecDeque<InputEvent>) {
        match event {
            Some(event) => {
                self.held.clear();
                self.partial = None;
                self.flush_deadline = None;
                out.push_back(event);
            }
            None => self.flush(out),
        }
    }
}

impl Default for EscapeParser {
    fn default() -> Self {
        Self::new(DEFAULT_ESCAPE_TIMEOUT)
    }
}

fn arrow(final_byte: u8) -> Option<InputEvent> {
    match final_byte {
        b'A' => Some(InputEvent::ArrowUp),
        b'B' => Some(InputEvent::ArrowDown),
        b'C' => Some(InputEvent::ArrowRight),
        b'D' => Some(InputEvent::ArrowLeft),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(parser: &mut EscapeParser, bytes: &[u8], now: Instant) -> Vec<InputEvent> {
        let mut out = VecDeque::new();
        for &b in bytes {
            parser.feed(b, now, &mut out);
        }
        out.into_iter().collect()
    }

    #[test]
    fn test_plain_keys() {
        let mut p = EscapeParser::default();
        let now = Instant::now();
        assert_eq!(
            decode(&mut p, b"hi\r\x7f\x03\x04", now),
            vec![
                InputEvent::Char('h'),
                InputEvent::Char('i'),
                InputEvent::Enter,
                InputEvent::Backspace,
                InputEvent::CtrlC,
                InputEvent::CtrlD,
            ]
        );
    }

    #[test]
    fn test_arrow_sequences() {
        let mut p = EscapeParser::default();
        let now = Instant::now();
        assert_eq!(
            decode(&mut p, b"\x1b[A\x1b[B\x1b[C\x1b[D\x1bOA", now),
            vec![
                InputEvent::ArrowUp,
                InputEvent::ArrowDown,
                InputEvent::ArrowRight,
                InputEvent::ArrowLeft,
                InputEvent::ArrowUp,
            ]
        );
        assert!(!p.has_partial());
    }

    #[test]
    fn test_sequence_split_across_feeds() {
        let mut p = EscapeParser::default();
        let now = Instant::now();
        assert!(decode(&mut p, b"\x1b", now).is_empty());
        assert!(p.has_partial());
        assert!(decode(&mut p, b"[", now).is_empty());
        assert_eq!(decode(&mut p, b"A", now), vec![InputEvent::ArrowUp]);
    }

    #[test]
    fn test_prefix_times_out_as_unknown() {
        let mut p = EscapeParser::new(Duration::from_millis(20));
        let t0 = Instant::now();
        assert!(decode(&mut p, b"\x1b[", t0).is_empty());

        let mut out = VecDeque::new();
        p.flush_expired(t0 + Duration::from_millis(5), &mut out);
        assert!(out.is_empty());

        p.flush_expired(t0 + Duration::from_millis(20), &mut out);
        assert_eq!(out.pop_front(), Some(InputEvent::Unknown(vec![0x1b, b'['])));
        assert!(!p.has_partial());
    }

    #[test]
    fn test_unsupported_csi_is_unknown() {
        let mut p = EscapeParser::default();
        let now = Instant::now();
        assert_eq!(
            decode(&mut p, b"\x1b[1;5Ax", now),
            vec![
                InputEvent::Unknown(b"\x1b[1;5A".to_vec()),
                InputEvent::Char('x'),
            ]
        );
    }

    #[test]
    fn test_alt_key_flushes_escape_then_decodes() {
        let mut p = EscapeParser::default();
        let now = Instant::now();
        assert_eq!(
            decode(&mut p, b"\x1bx", now),
            vec![InputEvent::Unknown(vec![0x1b]), InputEvent::Char('x')]
        );
    }

    #[test]
    fn test_overlong_csi_is_cut_off() {
        let mut p = EscapeParser::default();
        let now = Instant::now();
        let mut bytes = b"\x1b[".to_vec();
        // 14 parameter bytes fill the hold buffer, the 15th no longer fits
        bytes.extend(std::iter::repeat(b'1').take(MAX_SEQUENCE_LEN - 1));
        let events = decode(&mut p, &bytes, now);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], InputEvent::Unknown(ref b) if b.len() == MAX_SEQUENCE_LEN));
        assert_eq!(events[1], InputEvent::Char('1'));
    }

    #[test]
    fn test_utf8_characters() {
        let mut p = EscapeParser::default();
        let now = Instant::now();
        assert_eq!(
            decode(&mut p, "åé✓".as_bytes(), now),
            vec![
                InputEvent::Char('å'),
                InputEvent::Char('é'),
                InputEvent::Char('✓'),
            ]
        );
    }

    #[test]
    fn test_broken_utf8_is_unknown() {
        let mut p = EscapeParser::default();
        let now = Instant::now();
        assert_eq!(
            decode(&mut p, &[0xc3, b'a', 0xff], now),
            vec![
                InputEvent::Unknown(vec![0xc3]),
                InputEvent::Char('a'),
                InputEvent::Unknown(vec![0xff]),
            ]
        );
    }
}
