//! Incremental line framing for child process output
//!
//! Download tools redraw their progress with bare carriage returns, so `\r`,
//! `\n` and `\r\n` all end a line here.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Longest line kept in memory before it is handed out in pieces
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Nothing,
    /// Last terminator was `\r`; a `\n` right after it belongs to it
    Lf,
    /// A capped piece was just handed out; a terminator right after it ends that piece
    Terminator,
}

/// Reads lines one at a time without buffering the whole stream
pub struct LineReader<R> {
    inner: R,
    // Bytes of the current line; may start with a partial UTF-8 sequence
    // carried over from the previous capped piece
    buf: Vec<u8>,
    pending: Pending,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            pending: Pending::Nothing,
        }
    }

    /// Next line without its terminator, or `None` at end of stream.
    /// Invalid UTF-8 is replaced rather than reported. Lines longer than
    /// [`MAX_LINE_BYTES`] come out in pieces of at most that size.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                self.pending = Pending::Nothing;
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take(self.buf.len())));
            }

            match (self.pending, available[0]) {
                (Pending::Lf | Pending::Terminator, b'\n') => {
                    self.pending = Pending::Nothing;
                    self.inner.consume(1);
                    continue;
                }
                (Pending::Terminator, b'\r') => {
                    self.pending = Pending::Lf;
                    self.inner.consume(1);
                    continue;
                }
                _ => self.pending = Pending::Nothing,
            }

            let room = MAX_LINE_BYTES - self.buf.len();
            let window = &available[..available.len().min(room)];

            match window.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(end) => {
                    self.buf.extend_from_slice(&window[..end]);
                    if window[end] == b'\r' {
                        self.pending = Pending::Lf;
                    }
                    self.inner.consume(end + 1);
                    return Ok(Some(self.take(self.buf.len())));
                }
                None => {
                    let used = window.len();
                    self.buf.extend_from_slice(window);
                    self.inner.consume(used);

                    if self.buf.len() >= MAX_LINE_BYTES {
                        let split = char_boundary(&self.buf);
                        if split == self.buf.len() {
                            self.pending = Pending::Terminator;
                        }
                        return Ok(Some(self.take(split)));
                    }
                }
            }
        }
    }

    /// Decode and remove the first `len` bytes of the line buffer
    fn take(&mut self, len: usize) -> String {
        let line = String::from_utf8_lossy(&self.buf[..len]).into_owned();
        self.buf.drain(..len);
        line
    }
}

/// Length of `bytes` without a trailing, incomplete UTF-8 sequence
fn char_boundary(bytes: &[u8]) -> usize {
    let tail = bytes.len().saturating_sub(3);
    for i in (tail..bytes.len()).rev() {
        // Skip continuation bytes back to the start of the last character
        if bytes[i] & 0xC0 != 0x80 {
            return match std::str::from_utf8(&bytes[i..]) {
                Err(e) if e.error_len().is_none() => i,
                _ => bytes.len(),
            };
        }
    }
    bytes.len()
}
