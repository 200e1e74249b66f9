//! Client-side upload queue.
//!
//! An [`UploadCoordinator`] owns one [`UploadBatch`] per widget mount and walks
//! it through Idle → Staged → Uploading → Idle. Each call to
//! [`UploadCoordinator::upload`] resolves to exactly one [`UploadOutcome`].

pub mod restrictions;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::future::join_all;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ProgressSink, UploadApi};
use crate::config::UploadLimits;
use crate::error::{RestrictionError, Result, WidgetError};
use crate::events::WidgetEvents;
use crate::types::UploadedFile;

/// A file picked by the user, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl LocalFile {
    /// Wrap file contents, guessing the mime type from the name.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            mime_type,
            data: data.into(),
        }
    }

    /// Read a file from disk. The name is the path's final component.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(Self::new(name, data))
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Where a batch is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Staged,
    Uploading,
}

/// Files waiting to be uploaded together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadBatch {
    pub files: Vec<LocalFile>,
    pub is_uploading: bool,
    /// Aggregate progress across the batch, 0 to 100.
    pub progress: f64,
    /// Last rejection or failure, for display.
    pub error: Option<String>,
}

impl UploadBatch {
    pub fn phase(&self) -> UploadPhase {
        if self.is_uploading {
            UploadPhase::Uploading
        } else if self.files.is_empty() {
            UploadPhase::Idle
        } else {
            UploadPhase::Staged
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(LocalFile::size).sum()
    }
}

/// What happened to the files passed to [`UploadCoordinator::add_files`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddFilesReport {
    pub accepted: usize,
    pub rejected: Vec<RestrictionError>,
}

/// The single resolution of one [`UploadCoordinator::upload`] call.
#[derive(Debug)]
pub enum UploadOutcome {
    /// Nothing was staged.
    Empty,
    Completed(Vec<UploadedFile>),
    /// At least one file failed. The batch is discarded as a whole; `uploaded`
    /// lists the files that reached the server anyway.
    Failed {
        error: WidgetError,
        uploaded: Vec<UploadedFile>,
    },
    /// The batch was cleared while transferring.
    Cancelled,
}

impl UploadOutcome {
    /// Attachment ids to reference when sending, empty unless completed.
    pub fn attachment_ids(&self) -> Vec<String> {
        match self {
            UploadOutcome::Completed(files) => files.iter().map(|f| f.id.clone()).collect(),
            _ => Vec::new(),
        }
    }
}

struct UploadInner {
    api: Arc<dyn UploadApi>,
    limits: UploadLimits,
    events: Arc<dyn WidgetEvents>,
    state: watch::Sender<UploadBatch>,
    cancel: Mutex<BatchGuard>,
}

/// Cancellation handle for the current batch. `generation` moves on every
/// `clear()`, so a transfer can tell whether its batch still exists.
#[derive(Default)]
struct BatchGuard {
    generation: u64,
    token: CancellationToken,
}

/// Staging, validation and transfer of one widget's upload batch.
#[derive(Clone)]
pub struct UploadCoordinator {
    inner: Arc<UploadInner>,
}

impl UploadCoordinator {
    pub fn new(
        api: Arc<dyn UploadApi>,
        limits: UploadLimits,
        events: Arc<dyn WidgetEvents>,
    ) -> Self {
        let (state, _) = watch::channel(UploadBatch::default());
        Self {
            inner: Arc::new(UploadInner {
                api,
                limits,
                events,
                state,
                cancel: Mutex::new(BatchGuard::default()),
            }),
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.inner.limits
    }

    pub fn snapshot(&self) -> UploadBatch {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadBatch> {
        self.inner.state.subscribe()
    }

    /// Whether both handles drive the same batch.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stage files, dropping any that break the restrictions.
    ///
    /// Each rejection is reported to `on_error`, and the last one is kept as
    /// the batch error. A fully accepted call clears any previous error.
    pub fn add_files(&self, files: impl IntoIterator<Item = LocalFile>) -> Result<AddFilesReport> {
        let limits = &self.inner.limits;
        let mut report = AddFilesReport::default();
        let mut busy = false;

        self.inner.state.send_if_modified(|batch| {
            if batch.is_uploading {
                busy = true;
                return false;
            }
            for file in files {
                match restrictions::check(&file, limits, batch.files.len()) {
                    Ok(()) => {
                        report.accepted += 1;
                        batch.files.push(file);
                    }
                    Err(rejection) => report.rejected.push(rejection),
                }
            }
            batch.error = report.rejected.last().map(ToString::to_string);
            true
        });

        if busy {
            return Err(WidgetError::UploadInProgress);
        }

        for rejection in &report.rejected {
            warn!(reason = %rejection, "File rejected");
            self.inner
                .events
                .on_error(&WidgetError::Restriction(rejection.clone()));
        }
        debug!(
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "Files staged"
        );
        Ok(report)
    }

    /// Unstage the file at `index`. Only valid while Staged.
    pub fn remove_file(&self, index: usize) -> Result<LocalFile> {
        let mut outcome = Err(WidgetError::UploadInProgress);
        self.inner.state.send_if_modified(|batch| {
            if batch.is_uploading {
                return false;
            }
            if index >= batch.files.len() {
                outcome = Err(WidgetError::InvalidFileIndex {
                    index,
                    len: batch.files.len(),
                });
                return false;
            }
            outcome = Ok(batch.files.remove(index));
            true
        });
        outcome
    }

    /// Dismiss the displayed rejection or failure.
    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|batch| batch.error.take().is_some());
    }

    /// Drop every staged file, cancelling a transfer in flight.
    pub fn clear(&self) {
        let mut guard = self.lock_guard();
        if self.inner.state.borrow().is_uploading {
            info!("Cancelling upload in progress");
        }
        guard.token.cancel();
        guard.token = CancellationToken::new();
        guard.generation += 1;
        self.inner.state.send_modify(|batch| *batch = UploadBatch::default());
    }

    /// Transfer the staged batch concurrently.
    ///
    /// Progress is published as uploaded bytes over total bytes for the whole
    /// batch. Whatever the result, the coordinator ends Idle.
    pub async fn upload(&self) -> Result<UploadOutcome> {
        let (files, token, generation) = {
            let guard = self.lock_guard();
            let mut busy = false;
            let mut files = Vec::new();
            self.inner.state.send_if_modified(|batch| {
                if batch.is_uploading {
                    busy = true;
                    return false;
                }
                if batch.files.is_empty() {
                    return false;
                }
                batch.is_uploading = true;
                batch.progress = 0.0;
                batch.error = None;
                files = batch.files.clone();
                true
            });
            if busy {
                return Err(WidgetError::UploadInProgress);
            }
            if files.is_empty() {
                return Ok(UploadOutcome::Empty);
            }
            (files, guard.token.clone(), guard.generation)
        };

        let total: u64 = files.iter().map(LocalFile::size).sum();
        info!(files = files.len(), bytes = total, "Uploading batch");

        let sent: Arc<Vec<AtomicU64>> = Arc::new(files.iter().map(|_| AtomicU64::new(0)).collect());
        let transfers = files.iter().enumerate().map(|(slot, file)| {
            let sink = self.progress_sink(slot, Arc::clone(&sent), total, token.clone());
            self.inner.api.upload_file(file, sink)
        });

        let results = tokio::select! {
            _ = token.cancelled() => {
                info!("Upload cancelled");
                return Ok(UploadOutcome::Cancelled);
            }
            results = join_all(transfers) => results,
        };

        let mut uploaded = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(file) => uploaded.push(file),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => warn!(error = %e, "Additional upload failure"),
            }
        }

        {
            // A clear() that raced the last transfer already reset the batch.
            let guard = self.lock_guard();
            if guard.generation != generation {
                return Ok(UploadOutcome::Cancelled);
            }
            let error = first_error.as_ref().map(ToString::to_string);
            self.inner.state.send_modify(|batch| {
                *batch = UploadBatch {
                    error,
                    ..UploadBatch::default()
                }
            });
        }

        match first_error {
            None => {
                info!(files = uploaded.len(), "Upload completed");
                Ok(UploadOutcome::Completed(uploaded))
            }
            Some(error) => {
                warn!(error = %error, uploaded = uploaded.len(), "Upload failed");
                self.inner.events.on_error(&error);
                Ok(UploadOutcome::Failed { error, uploaded })
            }
        }
    }

    fn progress_sink(
        &self,
        slot: usize,
        sent: Arc<Vec<AtomicU64>>,
        total: u64,
        token: CancellationToken,
    ) -> ProgressSink {
        let inner = Arc::clone(&self.inner);
        Arc::new(move |bytes| {
            if token.is_cancelled() {
                return;
            }
            sent[slot].store(bytes, Ordering::Relaxed);
            let done: u64 = sent.iter().map(|s| s.load(Ordering::Relaxed)).sum();
            let progress = percent(done, total);
            inner.state.send_if_modified(|batch| {
                if !batch.is_uploading || batch.progress == progress {
                    return false;
                }
                batch.progress = progress;
                true
            });
        })
    }

    fn lock_guard(&self) -> MutexGuard<'_, BatchGuard> {
        self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    ((done as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
}
