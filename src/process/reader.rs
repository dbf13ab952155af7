//! Output reader task.
//!
//! Drives a [`FramedRead`] over one of a tool's output pipes, mirrors every
//! chunk to the operator console, and appends it to the session's
//! [`OutputSink`] for pattern and prompt waits.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

use crate::console::ConsoleSink;
use crate::process::codec::OutputCodec;
use crate::process::output::OutputSink;

/// Read `stream` until EOF.
///
/// I/O errors end the task; the session then sees the stream as closed once
/// every reader has stopped.
pub async fn run_reader<R>(task: String, stream: R, sink: OutputSink, console: Arc<dyn ConsoleSink>)
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stream, OutputCodec::new());

    while let Some(item) = framed.next().await {
        match item {
            Ok(chunk) => {
                debug!(task, output = chunk.trim_end(), "tool output");
                console.write(&chunk);
                sink.append(&chunk);
            }
            Err(err) => {
                warn!(task, %err, "output stream error, stopping reader");
                break;
            }
        }
    }

    debug!(task, "output stream closed");
}
