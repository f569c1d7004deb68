//! Streaming archive download with live throughput and ETA.
//!
//! The body is written to a freshly truncated destination file that is held
//! under an exclusive OS lock for the whole transfer. Every network chunk is
//! written in slices of at most [`DOWNLOAD_BUFFER_SIZE`] bytes and a
//! [`TransferProgress`] snapshot is reported after each slice.
//!
//! No checksum or signature is verified once the stream ends.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, Instant};

use fs4::fs_std::FileExt;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::constants::{DOWNLOAD_BUFFER_SIZE, MIN_ELAPSED};
use crate::core::UpdateError;

/// Snapshot of an in-flight transfer. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_done: u64,
    /// From `Content-Length`, when the server sent one.
    pub bytes_total: Option<u64>,
    /// Wall-clock time since the transfer started.
    pub elapsed: Duration,
}

impl TransferProgress {
    /// Completion in whole percent, only when the total size is known.
    pub fn percent(&self) -> Option<u8> {
        let total = self.bytes_total?;
        if total == 0 {
            return Some(100);
        }
        let done = self.bytes_done.min(total);
        Some(u8::try_from(done * 100 / total).unwrap_or(100))
    }

    /// Average bytes per second since the start of the transfer.
    pub fn throughput(&self) -> f64 {
        let elapsed = self.elapsed.max(MIN_ELAPSED).as_secs_f64();
        self.bytes_done as f64 / elapsed
    }

    /// Estimated time remaining; `None` when it cannot be estimated.
    pub fn eta(&self) -> Option<Duration> {
        let total = self.bytes_total?;
        let throughput = self.throughput();
        if throughput <= 0.0 {
            return None;
        }
        let remaining = total.saturating_sub(self.bytes_done) as f64;
        Some(Duration::from_secs_f64(remaining / throughput))
    }
}

impl fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mib = self.bytes_done as f64 / 1024.0 / 1024.0;
        match self.percent() {
            Some(percent) => write!(f, "{mib:.1} MiB ({percent}%)"),
            None => write!(f, "{mib:.1} MiB"),
        }
    }
}

/// Streams remote archives to disk.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    buffer_size: usize,
    stall_timeout: Option<Duration>,
}

impl Downloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            buffer_size: DOWNLOAD_BUFFER_SIZE,
            stall_timeout: None,
        }
    }

    /// Abort when no data arrives for `timeout`. `None` waits forever.
    pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stall_timeout = timeout;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Download `url` into `destination`, returning the number of bytes written.
    ///
    /// `on_progress` runs on whichever task drives this future; forwarding to
    /// a UI is its own business.
    pub async fn download<F>(
        &self,
        url: &str,
        destination: &Path,
        on_progress: F,
    ) -> Result<u64, UpdateError>
    where
        F: FnMut(&TransferProgress),
    {
        info!(%url, destination = %destination.display(), "Starting download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::from_reqwest("download archive", url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        debug!(?total, "Response headers received");

        self.write_stream(url, response.bytes_stream(), total, destination, on_progress).await
    }

    /// Drain `stream` into `destination`, reporting progress per written slice.
    ///
    /// `source` only labels errors.
    pub async fn write_stream<S, B, E, F>(
        &self,
        source: &str,
        stream: S,
        total: Option<u64>,
        destination: &Path,
        mut on_progress: F,
    ) -> Result<u64, UpdateError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: fmt::Display,
        F: FnMut(&TransferProgress),
    {
        let mut stream = std::pin::pin!(stream);
        let mut file = tokio::fs::File::from_std(open_exclusive(destination)?);
        let write_error = |e: std::io::Error| UpdateError::file_system("write archive", destination, &e);

        let started = Instant::now();
        let mut bytes_done: u64 = 0;

        loop {
            let next = match self.stall_timeout {
                Some(limit) => tokio::time::timeout(limit, stream.next()).await.map_err(|_| {
                    UpdateError::TransferStalled {
                        url: source.to_string(),
                        seconds: limit.as_secs(),
                    }
                })?,
                None => stream.next().await,
            };

            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(|e| UpdateError::Network {
                operation: format!("read {source}"),
                reason: e.to_string(),
            })?;

            for slice in chunk.as_ref().chunks(self.buffer_size) {
                file.write_all(slice).await.map_err(write_error)?;
                bytes_done += slice.len() as u64;
                on_progress(&TransferProgress {
                    bytes_done,
                    bytes_total: total,
                    elapsed: started.elapsed(),
                });
            }
        }

        file.flush().await.map_err(write_error)?;
        file.sync_all().await.map_err(write_error)?;

        info!(
            bytes = bytes_done,
            elapsed_ms = started.elapsed().as_millis(),
            "Download complete"
        );
        Ok(bytes_done)
    }
}

/// Open `path` for writing under an exclusive lock, then truncate it.
fn open_exclusive(path: &Path) -> Result<std::fs::File, UpdateError> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| UpdateError::file_system("create archive file", path, &e))?;

    match FileExt::try_lock_exclusive(&file) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return Err(UpdateError::ArchiveLocked {
                path: path.display().to_string(),
            });
        }
    }

    file.set_len(0).map_err(|e| UpdateError::file_system("truncate archive file", path, &e))?;
    Ok(file)
}
