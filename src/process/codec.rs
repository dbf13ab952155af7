//! Chunk codec for tool output streams.
//!
//! Tool output is not line-framed: `st-flash` prints progress without
//! newlines and the debugger prompt never ends in one. [`OutputCodec`]
//! therefore yields whatever text is available, holding back only a
//! multi-byte UTF-8 sequence split across reads.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tokio_util::codec::FramedRead;
//! use board_loader::process::codec::OutputCodec;
//!
//! let reader = FramedRead::new(child_stdout, OutputCodec::new());
//! ```

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::{AppError, Result};

/// Decoder turning raw process output into UTF-8 text chunks.
///
/// Invalid UTF-8 is replaced with `U+FFFD` rather than rejected.
#[derive(Debug, Default)]
pub struct OutputCodec;

impl OutputCodec {
    /// Create a new `OutputCodec`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for OutputCodec {
    type Item = String;
    type Error = AppError;

    /// Decode every complete character currently buffered in `src`.
    ///
    /// Returns `Ok(None)` when `src` is empty or holds only the start of a
    /// multi-byte character.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        let complete = match std::str::from_utf8(src) {
            Ok(text) => text.len(),
            // A truncated sequence at the end: keep it for the next read.
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            // Genuinely invalid bytes: emit everything lossily.
            Err(_) => src.len(),
        };

        if complete == 0 {
            return Ok(None);
        }

        let chunk = src.split_to(complete);
        Ok(Some(String::from_utf8_lossy(&chunk).into_owned()))
    }

    /// Flush whatever remains when the stream reaches EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(chunk) = self.decode(src)? {
            return Ok(Some(chunk));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split_to(src.len());
        Ok(Some(String::from_utf8_lossy(&rest).into_owned()))
    }
}
