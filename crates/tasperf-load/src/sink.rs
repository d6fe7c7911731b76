//! Identifier output file.
//!
//! Signing VUs hand published identifiers to a single writer task over a
//! bounded channel; the writer appends one identifier per line. The result
//! is directly loadable by the `verify` scenario.

use std::path::{Path, PathBuf};

use tasperf_core::{EntryUuid, HarnessError, PoolError};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 1024;

/// Sending half of the identifier sink. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EntrySink {
    tx: mpsc::Sender<EntryUuid>,
}

/// Handle to the writer task; resolves to the number of lines written.
#[derive(Debug)]
pub struct SinkWriter {
    path: PathBuf,
    handle: JoinHandle<Result<u64, PoolError>>,
}

impl EntrySink {
    /// Open `path` for appending and spawn the writer task.
    pub async fn open(path: &Path) -> Result<(Self, SinkWriter), HarnessError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| io_error(path, e))?;
        let (tx, mut rx) = mpsc::channel::<EntryUuid>(CHANNEL_CAPACITY);
        let owned = path.to_path_buf();

        let handle = tokio::spawn(async move {
            let mut out = BufWriter::new(file);
            let mut written = 0u64;
            while let Some(id) = rx.recv().await {
                out.write_all(id.as_str().as_bytes())
                    .await
                    .map_err(|e| io_error(&owned, e))?;
                out.write_all(b"\n").await.map_err(|e| io_error(&owned, e))?;
                written += 1;
            }
            out.flush().await.map_err(|e| io_error(&owned, e))?;
            Ok(written)
        });

        tracing::info!(path = %path.display(), "writing published identifiers");
        Ok((
            Self { tx },
            SinkWriter {
                path: path.to_path_buf(),
                handle,
            },
        ))
    }

    /// Queue one identifier. Waits if the writer is behind.
    pub async fn publish(&self, id: EntryUuid) {
        if self.tx.send(id).await.is_err() {
            tracing::error!("identifier writer stopped; identifier dropped");
        }
    }
}

impl SinkWriter {
    /// Wait for the writer to drain. Every [`EntrySink`] clone must have
    /// been dropped first, or this never returns.
    pub async fn finish(self) -> Result<u64, HarnessError> {
        let written = self
            .handle
            .await
            .map_err(|e| io_error(&self.path, std::io::Error::other(e)))??;
        tracing::info!(path = %self.path.display(), written, "identifier file closed");
        Ok(written)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PoolError {
    PoolError::Io {
        path: path.display().to_string(),
        source,
    }
}
