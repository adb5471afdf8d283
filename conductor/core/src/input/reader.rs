//! Non-blocking keystroke reader.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use super::{EscapeParser, InputEvent};

/// Bytes pulled from the source per poll
const READ_CHUNK: usize = 64;

/// Non-blocking supplier of raw terminal bytes
///
/// Implementations must return immediately: `Ok(0)` when nothing is pending,
/// `Err` with [`io::ErrorKind::UnexpectedEof`] once the stream has closed.
pub trait ByteSource {
    /// Copy whatever bytes are available into `buf`
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_available(buf)
    }
}

/// Turns a [`ByteSource`] into a stream of [`InputEvent`]s without waiting
pub struct InputReader<S> {
    source: S,
    parser: EscapeParser,
    queue: VecDeque<InputEvent>,
    ctrl_c_streak: u8,
    closed: bool,
}

impl<S: ByteSource> InputReader<S> {
    /// Wrap `source`, holding partial escape sequences for `escape_timeout`
    pub fn new(source: S, escape_timeout: Duration) -> Self {
        Self {
            source,
            parser: EscapeParser::new(escape_timeout),
            queue: VecDeque::new(),
            ctrl_c_streak: 0,
            closed: false,
        }
    }

    /// Next keystroke, if one is ready
    pub fn poll(&mut self) -> Option<InputEvent> {
        self.poll_at(Instant::now())
    }

    /// Next keystroke as of `now`.
    ///
    /// New bytes are decoded before stale partial sequences are flushed, so a
    /// sequence split across two polls still resolves.
    pub fn poll_at(&mut self, now: Instant) -> Option<InputEvent> {
        if self.queue.is_empty() {
            self.fill(now);
            self.parser.flush_expired(now, &mut self.queue);
        }
        let event = self.queue.pop_front()?;
        self.track_interrupts(&event);
        Some(event)
    }

    /// True once two `CtrlC` arrived with nothing in between
    #[must_use]
    pub fn shutdown_requested(&self) -> bool {
        self.ctrl_c_streak >= 2
    }

    /// Whether the byte source reported end of input
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Borrow the underlying source
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn fill(&mut self, now: Instant) {
        if self.closed {
            return;
        }
        let mut buf = [0u8; READ_CHUNK];
        match self.source.read_available(&mut buf) {
            Ok(n) => {
                for &byte in &buf[..n] {
                    self.parser.feed(byte, now, &mut self.queue);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::info!("input stream closed");
                self.closed = true;
                self.parser.flush(&mut self.queue);
                self.queue.push_back(InputEvent::CtrlD);
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {}
            Err(e) => {
                tracing::error!(error = %e, "reading terminal input failed");
                self.closed = true;
                self.queue.push_back(InputEvent::CtrlD);
            }
        }
    }

    fn track_interrupts(&mut self, event: &InputEvent) {
        if *event == InputEvent::CtrlC {
            self.ctrl_c_streak = self.ctrl_c_streak.saturating_add(1);
        } else {
            self.ctrl_c_streak = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Hands out one scripted chunk per read.
    struct Chunks(VecDeque<Vec<u8>>);

    impl ByteSource for Chunks {
        fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(chunk) = self.0.pop_front() else {
                return Ok(0);
            };
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    fn reader(chunks: &[&[u8]]) -> InputReader<Chunks> {
        let chunks = chunks.iter().map(|c| c.to_vec()).collect();
        InputReader::new(Chunks(chunks), Duration::from_millis(20))
    }

    #[test]
    fn test_empty_source_never_yields() {
        let mut r = reader(&[]);
        let start = Instant::now();
        for _ in 0..10_000 {
            assert_eq!(r.poll(), None);
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_arrow_up_bytes() {
        let mut r = reader(&[b"\x1b[A"]);
        assert_eq!(r.poll(), Some(InputEvent::ArrowUp));
        assert_eq!(r.poll(), None);
    }

    #[test]
    fn test_split_sequence_resolves_across_polls() {
        let mut r = reader(&[b"\x1b", b"[A"]);
        let t0 = Instant::now();
        assert_eq!(r.poll_at(t0), None);
        // A full tick later the rest arrives; it is decoded before the flush.
        assert_eq!(
            r.poll_at(t0 + Duration::from_millis(50)),
            Some(InputEvent::ArrowUp)
        );
    }

    #[test]
    fn test_prefix_then_silence_is_unknown() {
        let mut r = reader(&[b"\x1b["]);
        let t0 = Instant::now();
        assert_eq!(r.poll_at(t0), None);
        assert_eq!(r.poll_at(t0 + Duration::from_millis(10)), None);
        assert_eq!(
            r.poll_at(t0 + Duration::from_millis(25)),
            Some(InputEvent::Unknown(vec![0x1b, b'[']))
        );
    }

    #[test]
    fn test_double_ctrl_c_requests_shutdown() {
        let mut r = reader(&[b"\x03", b"\x03"]);
        assert_eq!(r.poll(), Some(InputEvent::CtrlC));
        assert!(!r.shutdown_requested());
        assert_eq!(r.poll(), Some(InputEvent::CtrlC));
        assert!(r.shutdown_requested());
    }

    #[test]
    fn test_other_key_resets_ctrl_c_streak() {
        let mut r = reader(&[b"\x03x\x03"]);
        assert_eq!(r.poll(), Some(InputEvent::CtrlC));
        assert_eq!(r.poll(), Some(InputEvent::Char('x')));
        assert_eq!(r.poll(), Some(InputEvent::CtrlC));
        assert!(!r.shutdown_requested());
    }

    struct Closed;

    impl ByteSource for Closed {
        fn read_available(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::UnexpectedEof.into())
        }
    }

    #[test]
    fn test_eof_becomes_ctrl_d_once() {
        let mut r = InputReader::new(Closed, Duration::from_millis(20));
        assert_eq!(r.poll(), Some(InputEvent::CtrlD));
        assert!(r.is_closed());
        assert_eq!(r.poll(), None);
    }
}
