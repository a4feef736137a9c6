//! The batch upload state machine.
//!
//! `idle -> files-selected -> uploading -> {success, error}`. Files are sent together as one
//! request, so every file shares the outcome of that request. There is no retry: after a failure
//! the queue has to be reset and the files added again.

use crate::model::UploadResponse;
use serde::Serialize;
use tracing::debug;

pub const PDF_MIME: &str = "application/pdf";

/// Shown when an upload fails without a message of its own.
pub const UPLOAD_FALLBACK_ERROR: &str = "Failed to process files. Please try again.";

/// A file chosen by the user, before it is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime == PDF_MIME
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

serde_plain::derive_display_from_serialize!(FileStatus);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedFile {
    pub name: String,
    pub size: usize,
    pub status: FileStatus,
    pub error: Option<String>,
    #[serde(skip)]
    file: PdfFile,
}

impl QueuedFile {
    pub fn file(&self) -> &PdfFile {
        &self.file
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum UploadPhase {
    #[default]
    Idle,
    FilesSelected,
    Uploading,
    Success {
        result: UploadResponse,
    },
    Error {
        message: String,
    },
}

/// The upload panel's state. Transitions consume the queue and return the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadQueue {
    files: Vec<QueuedFile>,
    phase: UploadPhase,
}

impl UploadQueue {
    pub fn files(&self) -> &[QueuedFile] {
        &self.files
    }

    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    pub fn result(&self) -> Option<&UploadResponse> {
        match &self.phase {
            UploadPhase::Success { result } => Some(result),
            _ => None,
        }
    }

    /// Queues the PDF files among `files` as pending. Anything else is dropped without comment.
    /// A previous result is cleared. Ignored while a batch is in flight.
    pub fn add_files(mut self, files: impl IntoIterator<Item = PdfFile>) -> Self {
        if self.phase == UploadPhase::Uploading {
            debug!("Ignoring added files while an upload is in progress");
            return self;
        }
        for file in files {
            if !file.is_pdf() {
                debug!("Skipping '{}' with type '{}'", file.name, file.mime);
                continue;
            }
            self.files.push(QueuedFile {
                name: file.name.clone(),
                size: file.bytes.len(),
                status: FileStatus::Pending,
                error: None,
                file,
            });
        }
        self.phase = if self.files.is_empty() {
            UploadPhase::Idle
        } else {
            UploadPhase::FilesSelected
        };
        self
    }

    /// Removes the file at `index` if it is still pending.
    pub fn remove(mut self, index: usize) -> Self {
        let removable = self
            .files
            .get(index)
            .is_some_and(|f| f.status == FileStatus::Pending);
        if removable {
            self.files.remove(index);
            if self.files.is_empty() {
                self.phase = UploadPhase::Idle;
            }
        }
        self
    }

    /// Moves every pending file to `uploading` and returns the batch to send. Returns `None` when
    /// there is nothing pending, which includes a queue whose last batch failed.
    pub fn begin(mut self) -> (Self, Option<Vec<PdfFile>>) {
        if self.phase != UploadPhase::FilesSelected {
            return (self, None);
        }
        let mut batch = Vec::new();
        for f in self
            .files
            .iter_mut()
            .filter(|f| f.status == FileStatus::Pending)
        {
            f.status = FileStatus::Uploading;
            batch.push(f.file.clone());
        }
        if batch.is_empty() {
            return (self, None);
        }
        self.phase = UploadPhase::Uploading;
        (self, Some(batch))
    }

    /// Applies the outcome of the batch request to every file in flight.
    pub fn complete(mut self, outcome: std::result::Result<UploadResponse, String>) -> Self {
        if self.phase != UploadPhase::Uploading {
            return self;
        }
        let in_flight = self
            .files
            .iter_mut()
            .filter(|f| f.status == FileStatus::Uploading);
        match outcome {
            Ok(result) => {
                for f in in_flight {
                    f.status = FileStatus::Success;
                }
                self.phase = UploadPhase::Success { result };
            }
            Err(message) => {
                let message = if message.trim().is_empty() {
                    UPLOAD_FALLBACK_ERROR.to_string()
                } else {
                    message
                };
                for f in in_flight {
                    f.status = FileStatus::Error;
                    f.error = Some(message.clone());
                }
                self.phase = UploadPhase::Error { message };
            }
        }
        self
    }

    pub fn reset(self) -> Self {
        Self::default()
    }

    /// The alert text for the current phase, if there is one.
    pub fn message(&self) -> Option<String> {
        match &self.phase {
            UploadPhase::Success { result } => {
                let n = self.files.len();
                Some(format!(
                    "Successfully processed {} file{} and extracted {} transactions",
                    n,
                    if n == 1 { "" } else { "s" },
                    result.parsed_count
                ))
            }
            UploadPhase::Error { message } => Some(message.clone()),
            _ => None,
        }
    }
}
