use std::{collections::HashSet, io::ErrorKind, str::from_utf8};
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

use crate::types::{error::AppError, traits::object_store::AsyncReadSeek};

/// Char level cursor over a seekable byte stream.
pub struct StreamReader {
    buf: Box<dyn AsyncReadSeek + Send + Unpin>,
}

fn is_eof(err: &AppError) -> bool {
    matches!(err, AppError::IOError(e) if e.kind() == ErrorKind::UnexpectedEof)
}

impl StreamReader {
    pub fn new(buf: Box<dyn AsyncReadSeek + Send + Unpin>) -> Self {
        Self { buf }
    }

    /// Next char of the stream. Bytes that are not valid UTF-8 read as
    /// U+FFFD, one per byte, and the stream carries on after them.
    pub async fn read_char(&mut self) -> Result<char, AppError> {
        let mut buf = [0u8; 4];
        let mut len = 0usize;

        loop {
            let mut b = [0u8; 1];
            match self.buf.read_exact(&mut b).await {
                Ok(_) => {}
                // Truncated sequence at the end of the stream
                Err(e) if e.kind() == ErrorKind::UnexpectedEof && len > 0 => {
                    return self.replace_invalid(len).await;
                }
                Err(e) => return Err(e.into()),
            }
            buf[len] = b[0];
            len += 1;

            match from_utf8(&buf[..len]) {
                Ok(s) => return s.chars().next().ok_or(AppError::InvalidUtf8),
                Err(e) if e.error_len().is_none() && len < 4 => continue,
                Err(_) => return self.replace_invalid(len).await,
            }
        }
    }

    // Steps back to just after the first byte of a bad sequence of `len` bytes.
    async fn replace_invalid(&mut self, len: usize) -> Result<char, AppError> {
        if len > 1 {
            self.buf.seek(SeekFrom::Current(1 - len as i64)).await?;
        }

        Ok(char::REPLACEMENT_CHARACTER)
    }

    pub async fn position(&mut self) -> Result<u64, AppError> {
        Ok(self.buf.stream_position().await?)
    }

    pub async fn set_position(&mut self, pos: u64) -> Result<(), AppError> {
        self.buf.seek(SeekFrom::Start(pos)).await?;
        Ok(())
    }

    pub async fn match_next(&mut self, pattern: &[char], rewind: bool) -> Result<bool, AppError> {
        let position = self.position().await?;

        for &c in pattern {
            let next = self.read_char().await?;
            if next != c {
                if rewind {
                    self.set_position(position).await?;
                }
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub async fn match_next_or(
        &mut self,
        chars: &HashSet<char>,
        rewind: bool,
    ) -> Result<Option<char>, AppError> {
        let position = self.position().await?;
        let next = self.read_char().await?;

        if chars.contains(&next) {
            Ok(Some(next))
        } else {
            if rewind {
                self.set_position(position).await?;
            }
            Ok(None)
        }
    }

    pub async fn get_until_mismatch(
        &mut self,
        legal_chars: &HashSet<char>,
    ) -> Result<String, AppError> {
        let mut result = String::new();

        loop {
            let next = match self.read_char().await {
                Ok(n) => n,
                Err(e) if is_eof(&e) => break,
                Err(e) => return Err(e),
            };

            if legal_chars.contains(&next) {
                result.push(next);
            } else {
                break;
            }
        }

        Ok(result)
    }

    /// Reads up to and including `term_char`, returning what came before it
    /// and whether the terminator was found before the end of the stream. At
    /// most `limit` chars are kept.
    pub async fn read_until(
        &mut self,
        term_char: char,
        limit: usize,
    ) -> Result<(String, bool), AppError> {
        let mut result = String::new();
        let mut kept = 0;

        loop {
            let next = match self.read_char().await {
                Ok(n) => n,
                Err(e) if is_eof(&e) => return Ok((result, false)),
                Err(e) => return Err(e),
            };

            if next == term_char {
                return Ok((result, true));
            }

            if kept < limit {
                result.push(next);
                kept += 1;
            }
        }
    }

    /// Consumes the stream through the next `term_char`, false when the stream
    /// ended first.
    pub async fn skip_until(&mut self, term_char: char) -> Result<bool, AppError> {
        loop {
            match self.read_char().await {
                Ok(n) if n == term_char => return Ok(true),
                Ok(_) => continue,
                Err(e) if is_eof(&e) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn read_until_match(
        &mut self,
        pattern: &[char],
        term_char: char,
        rewind: bool,
    ) -> Result<bool, AppError> {
        let mut index = 0;
        let position = self.position().await?;

        loop {
            let next = self.read_char().await?;

            if next == term_char {
                if rewind {
                    self.set_position(position).await?;
                }
                return Ok(false);
            }

            if next == pattern[index] {
                index += 1;
                if index == pattern.len() {
                    return Ok(true);
                }
            } else if next == pattern[0] {
                index = 1;
            } else {
                index = 0;
            }
        }
    }
}
