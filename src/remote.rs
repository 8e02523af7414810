//! The remote-collaborator contract for timing submissions.
//!
//! Submission results are explicit values (`Result<RemoteAck, _>`) so a
//! caller can choose to ignore a failure, but tests never have to guess
//! whether one happened.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::books;
use crate::error::{Result, TimingError};
use crate::ranges::VerseRange;

/// Destination of a submission: which chapter of which book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    pub book_folder: String,
    pub book_order: u8,
    pub chapter: u32,
}

impl ChapterRef {
    /// Resolve a chapter reference from a book name.
    pub fn new(book: &str, chapter: u32) -> Result<Self> {
        if chapter < 1 {
            return Err(TimingError::InvalidChapter(chapter));
        }
        let order = books::book_order(book)?;
        Ok(Self {
            book_folder: books::folder_for_order(order as u32)?.to_string(),
            book_order: order,
            chapter,
        })
    }
}

/// Wire payload for timing submissions. Field names match the original
/// API (camelCase with snake_case aliases accepted on input).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTimingPayload {
    #[serde(rename = "bookFolder", alias = "book_folder", default)]
    pub book_folder: Option<String>,
    #[serde(rename = "bookOrder", alias = "book_order")]
    pub book_order: u32,
    pub chapter: u32,
    #[serde(rename = "verseCount", alias = "verse_count", default)]
    pub verse_count: Option<usize>,
    #[serde(rename = "audioDuration", alias = "audio_duration", default)]
    pub audio_duration: Option<f64>,
    pub times: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranges: Option<Vec<VerseRange>>,
}

/// Positive acknowledgement from the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAck {
    pub saved: bool,
}

/// Port for submitting and fetching chapter timings.
pub trait RemoteSink {
    /// Persist a submission. Validation failures and transport failures
    /// both come back as errors; success implies the payload is stored.
    fn submit(&mut self, payload: &RemoteTimingPayload) -> Result<RemoteAck>;

    /// Best-effort fetch of previously submitted times. `Ok(None)` when
    /// nothing is stored for the chapter.
    fn fetch(&self, book_order: u32, chapter: u32) -> Result<Option<Vec<f64>>>;
}

/// Validate a submitted times list: non-empty, every element finite and
/// `>= 0`. Accepted values are rounded to millisecond precision, the
/// same normalization the original endpoint applies.
pub fn sanitize_times(times: &[f64]) -> Result<Vec<f64>> {
    if times.is_empty() {
        return Err(TimingError::Rejected(
            "times must be a non-empty array".to_string(),
        ));
    }
    let mut out = Vec::with_capacity(times.len());
    for (index, &value) in times.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(TimingError::InvalidTime { index, value });
        }
        out.push(round_ms(value));
    }
    Ok(out)
}

/// Round to millisecond precision (3 decimals).
pub fn round_ms(t: f64) -> f64 {
    (t * 1000.0).round() / 1000.0
}

/// Filesystem-backed sink writing the same `.timings/NN/CCC.json` logs
/// the HTTP endpoint produces. The server and the CLI share this path.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn log_path(&self, book_order: u32, chapter: u32) -> PathBuf {
        books::timing_log_path(&self.root, book_order, chapter)
    }
}

impl RemoteSink for DirectorySink {
    fn submit(&mut self, payload: &RemoteTimingPayload) -> Result<RemoteAck> {
        books::folder_for_order(payload.book_order)?;
        if payload.chapter < 1 {
            return Err(TimingError::InvalidChapter(payload.chapter));
        }
        let times = sanitize_times(&payload.times)?;

        let stored = RemoteTimingPayload {
            verse_count: Some(payload.verse_count.unwrap_or(times.len())),
            times,
            ..payload.clone()
        };

        let path = self.log_path(payload.book_order, payload.chapter);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&stored)?)?;
        Ok(RemoteAck { saved: true })
    }

    fn fetch(&self, book_order: u32, chapter: u32) -> Result<Option<Vec<f64>>> {
        let path = self.log_path(book_order, chapter);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let payload: RemoteTimingPayload = serde_json::from_str(&raw)?;
        Ok(Some(payload.times))
    }
}

/// Read and validate a submission log from disk.
pub fn load_submission(path: &Path) -> Result<RemoteTimingPayload> {
    if !path.exists() {
        return Err(TimingError::SubmissionNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let mut payload: RemoteTimingPayload =
        serde_json::from_str(&raw).map_err(|e| TimingError::SubmissionInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    payload.times = sanitize_times(&payload.times).map_err(|e| TimingError::SubmissionInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(payload)
}
