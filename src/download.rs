//! Streaming file download with progress reporting and cancellation.
//!
//! The body is written chunk-by-chunk through a buffered writer; memory use
//! stays bounded by the chunk size regardless of artifact size. Cancellation
//! is observed between chunks, leaving a partial file at the destination for
//! the caller to discard.

use crate::error::{AgentError, Result};
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

/// Capacity of the buffered sequential writes to disk.
const WRITE_BUFFER_BYTES: usize = 128 * 1024;

/// Stream `url` into `destination`, reporting percentage progress.
///
/// When the response declares a content length, `on_progress` is invoked at
/// least once per chunk with a non-decreasing value capped at 99; exactly one
/// terminal call at 100 follows successful completion. Without a content
/// length only the terminal 100 is emitted.
///
/// # Errors
///
/// `Network` on a bad status or connection loss, `Io` on disk failure,
/// `Cancelled` when the token fires (checked between chunks).
pub async fn download(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
    on_progress: &(dyn Fn(u8) + Send + Sync),
    cancel: &CancellationToken,
) -> Result<()> {
    let response = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(AgentError::Cancelled),
        r = client.get(url).send() => {
            r.map_err(|e| AgentError::Network(format!("download request failed: {e}")))?
        }
    };
    let response = response
        .error_for_status()
        .map_err(|e| AgentError::Network(format!("download rejected: {e}")))?;

    let total = response.content_length().filter(|len| *len > 0);
    let file = tokio::fs::File::create(destination).await?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);
    let mut stream = response.bytes_stream();

    let mut read_total: u64 = 0;
    let mut last_pct: u8 = 0;

    loop {
        let chunk: Bytes = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                // Keep the partial file well-formed on disk; discarding it
                // is the caller's call.
                let _ = writer.flush().await;
                return Err(AgentError::Cancelled);
            }
            next = stream.next() => match next {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    return Err(AgentError::Network(format!("download interrupted: {e}")));
                }
                None => break,
            },
        };

        writer.write_all(&chunk).await?;
        read_total += chunk.len() as u64;

        if let Some(total) = total {
            // 100 is reserved for the single terminal call below.
            let pct = (read_total * 100 / total).min(99) as u8;
            last_pct = last_pct.max(pct);
            on_progress(last_pct);
        }
    }

    writer.flush().await?;
    on_progress(100);
    Ok(())
}
