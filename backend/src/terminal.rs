//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

//! Terminal attached to a pair of byte streams: a key reader on the input stream and a drawing
//! surface on the output stream.

use bytes::{Buf, BytesMut};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Attribute, SetAttribute};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use lightcycles_core::put_command;

use crate::error::{Error, Result};

const ESC: u8 = 27;

/// How long to wait for the rest of an escape sequence before taking ESC as the escape key
pub const ESC_DELAY: Duration = Duration::from_millis(50);

/// Longest escape sequence we bother parsing. Anything longer is dropped.
const MAX_SEQ: usize = 16;

/// A key code, in the spirit of curses' getch(): ASCII keys are their byte value and special
/// keys use the curses numbers. Zero means no key could be read.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const NONE: KeyCode = KeyCode(0);
    pub const CTRL_C: KeyCode = KeyCode(3);
    pub const ESCAPE: KeyCode = KeyCode(ESC as u32);
    pub const DOWN: KeyCode = KeyCode(258);
    pub const UP: KeyCode = KeyCode(259);
    pub const LEFT: KeyCode = KeyCode(260);
    pub const RIGHT: KeyCode = KeyCode(261);

    pub fn is_none(self) -> bool {
        self == KeyCode::NONE
    }
}

pub struct Terminal<R, W> {
    pub keys: KeyReader<R>,
    pub screen: Screen<W>,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Terminal {
            keys: KeyReader::new(input),
            screen: Screen::new(output),
        }
    }
}

/// What the start of the buffer holds, when it starts with ESC
enum Escape {
    /// more bytes are needed to tell
    Partial,
    /// a complete sequence of the given length
    Key(usize, KeyCode),
}

fn final_byte_key(b: u8) -> KeyCode {
    match b {
        b'A' => KeyCode::UP,
        b'B' => KeyCode::DOWN,
        b'C' => KeyCode::RIGHT,
        b'D' => KeyCode::LEFT,
        _ => KeyCode::NONE,
    }
}

// CSI sequences are ESC [, then parameter (0x30-0x3f) and intermediate (0x20-0x2f) bytes, then a
// final byte (0x40-0x7e). SS3 sequences are ESC O and a single final byte. Modifiers are carried
// in the parameters, so only the final byte picks the key.
fn scan_escape(buf: &[u8]) -> Escape {
    match buf.get(1) {
        None => Escape::Partial,
        Some(b'O') => match buf.get(2) {
            None => Escape::Partial,
            Some(&b) => Escape::Key(3, final_byte_key(b)),
        },
        Some(b'[') => {
            for (i, &b) in buf.iter().enumerate().skip(2) {
                match b {
                    0x40..=0x7e => return Escape::Key(i + 1, final_byte_key(b)),
                    0x20..=0x3f if i + 1 < MAX_SEQ => (),
                    // too long, or a byte that cannot be in a sequence
                    _ => return Escape::Key(i, KeyCode::NONE),
                }
            }
            Escape::Partial
        }
        // ESC and then something else: the escape key, followed by that
        Some(_) => Escape::Key(1, KeyCode::ESCAPE),
    }
}

pub struct KeyReader<R> {
    inner: R,
    buf: BytesMut,
    esc_delay: Duration,
}

impl<R: AsyncRead + Unpin> KeyReader<R> {
    pub fn new(inner: R) -> Self {
        KeyReader {
            inner,
            buf: BytesMut::with_capacity(64),
            esc_delay: ESC_DELAY,
        }
    }

    pub fn set_esc_delay(&mut self, delay: Duration) {
        self.esc_delay = delay;
    }

    fn pending_escape(&self) -> bool {
        self.buf.first() == Some(&ESC) && matches!(scan_escape(&self.buf), Escape::Partial)
    }

    /// Wait for the next key.
    ///
    /// Returns `KeyCode::NONE` for input that is not a key (NUL, non-ASCII, unknown escape
    /// sequences) and `Error::ConnectionClosed` once the input stream is closed.
    ///
    /// An escape sequence may arrive split over several reads. If the input stops in the middle
    /// of one for longer than the escape delay, a lone ESC is the escape key and a longer prefix
    /// is dropped.
    ///
    /// Cancel safe: dropping the future before it completes loses no input.
    pub async fn read_key(&mut self) -> Result<KeyCode> {
        if self.buf.is_empty() {
            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
        }

        while self.pending_escape() {
            match tokio::time::timeout(self.esc_delay, self.inner.read_buf(&mut self.buf)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(_)) => (),
                Ok(Err(e)) => return Err(e.into()),
            }
        }
        Ok(self.decode())
    }

    /// Decode one key from the (non-empty) buffer
    fn decode(&mut self) -> KeyCode {
        let b = self.buf[0];
        if b == ESC {
            let (len, key) = match scan_escape(&self.buf) {
                Escape::Key(len, key) => (len, key),
                Escape::Partial if self.buf.len() == 1 => (1, KeyCode::ESCAPE),
                Escape::Partial => (self.buf.len(), KeyCode::NONE),
            };
            self.buf.advance(len);
            return key;
        }

        self.buf.advance(1);
        if b == 0 {
            return KeyCode::NONE;
        }
        if b >= 0x80 {
            // skip the rest of a multi-byte character
            while !self.buf.is_empty() && (self.buf[0] & 0xc0) == 0x80 {
                self.buf.advance(1);
            }
            return KeyCode::NONE;
        }
        KeyCode(b as u32)
    }
}

/// Drawing surface spanning the whole terminal, anchored at the top-left corner
pub struct Screen<W> {
    out: W,
}

impl<W: AsyncWrite + Unpin> Screen<W> {
    pub fn new(out: W) -> Self {
        Screen { out }
    }

    /// Prepare the terminal: alternate screen, hidden cursor, cleared
    pub async fn open(&mut self) -> Result<()> {
        let mut seq = String::new();
        put_command(&mut seq, EnterAlternateScreen);
        put_command(&mut seq, Hide);
        put_command(&mut seq, Clear(ClearType::All));
        put_command(&mut seq, MoveTo(0, 0));
        self.draw(seq.as_bytes()).await
    }

    pub async fn draw(&mut self, frame: &[u8]) -> Result<()> {
        self.out.write_all(frame).await?;
        self.out.flush().await?;
        Ok(())
    }

    /// Restore the terminal
    pub async fn close(&mut self) -> Result<()> {
        let mut seq = String::new();
        put_command(&mut seq, SetAttribute(Attribute::Reset));
        put_command(&mut seq, Show);
        put_command(&mut seq, LeaveAlternateScreen);
        self.draw(seq.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn keys_of(input: &[u8]) -> Vec<KeyCode> {
        let (mut tx, rx) = tokio::io::duplex(64);
        tx.write_all(input).await.unwrap();
        drop(tx);

        let mut reader = KeyReader::new(rx);
        let mut ret = vec![];
        while let Ok(k) = reader.read_key().await {
            ret.push(k);
        }
        ret
    }

    #[tokio::test]
    async fn plain_keys() {
        let keys = keys_of(b"wK,\x03").await;
        assert_eq!(keys, vec![KeyCode(119), KeyCode(75), KeyCode(44), KeyCode::CTRL_C]);
    }

    #[tokio::test]
    async fn arrows_and_escape() {
        let keys = keys_of(b"\x1b[A\x1bOD\x1b").await;
        assert_eq!(keys, vec![KeyCode::UP, KeyCode::LEFT, KeyCode::ESCAPE]);
    }

    #[tokio::test]
    async fn junk_is_none() {
        let keys = keys_of("\0é\x1b[Zq".as_bytes()).await;
        assert_eq!(keys, vec![KeyCode::NONE, KeyCode::NONE, KeyCode::NONE, KeyCode(b'q' as u32)]);
    }

    #[tokio::test]
    async fn modified_keys_map_final_byte() {
        // shift+left, ctrl+up, F5, then a plain key
        let keys = keys_of(b"\x1b[1;2D\x1b[1;5A\x1b[15~q").await;
        assert_eq!(keys, vec![KeyCode::LEFT, KeyCode::UP, KeyCode::NONE, KeyCode(b'q' as u32)]);
    }

    #[tokio::test]
    async fn overlong_sequence_is_dropped() {
        let mut input = b"\x1b[".to_vec();
        input.extend(std::iter::repeat(b'1').take(40));
        input.extend_from_slice(b"Aw");
        let keys = keys_of(&input).await;
        assert_eq!(keys.last(), Some(&KeyCode(b'w' as u32)));
        assert!(!keys.contains(&KeyCode::ESCAPE));
        assert!(!keys.contains(&KeyCode::UP));
    }

    #[tokio::test]
    async fn split_arrow_is_one_key() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = KeyReader::new(rx);
        reader.set_esc_delay(Duration::from_secs(5));

        tx.write_all(b"\x1b").await.unwrap();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.write_all(b"[").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.write_all(b"Aw").await.unwrap();
            tx
        });

        assert_eq!(reader.read_key().await.unwrap(), KeyCode::UP);
        assert_eq!(reader.read_key().await.unwrap(), KeyCode(b'w' as u32));
        drop(writer.await.unwrap());
        assert!(matches!(reader.read_key().await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn lone_escape_after_delay() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = KeyReader::new(rx);
        reader.set_esc_delay(Duration::from_millis(10));

        // the input stays open: the escape key is reported once the delay passes
        tx.write_all(b"\x1b").await.unwrap();
        assert_eq!(reader.read_key().await.unwrap(), KeyCode::ESCAPE);

        tx.write_all(b"\x1b[").await.unwrap();
        assert_eq!(reader.read_key().await.unwrap(), KeyCode::NONE);
        tx.write_all(b"A").await.unwrap();
        assert_eq!(reader.read_key().await.unwrap(), KeyCode(b'A' as u32));
    }

    #[tokio::test]
    async fn closed_input() {
        let (tx, rx) = tokio::io::duplex(64);
        drop(tx);
        let mut reader = KeyReader::new(rx);
        assert!(matches!(reader.read_key().await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn screen_open_close() {
        let (tx, mut rx) = tokio::io::duplex(256);
        let mut screen = Screen::new(tx);
        screen.open().await.unwrap();
        screen.draw(b"frame").await.unwrap();
        screen.close().await.unwrap();
        drop(screen);

        let mut out = vec![];
        rx.read_to_end(&mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        let (mut enter, mut leave) = (String::new(), String::new());
        put_command(&mut enter, EnterAlternateScreen);
        put_command(&mut leave, LeaveAlternateScreen);
        assert!(out.starts_with(&enter));
        assert!(out.contains("frame"));
        assert!(out.ends_with(&leave));
    }
}
