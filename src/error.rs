use std::path::PathBuf;

use thiserror::Error;

/// All errors produced by the verse-timing library.
#[derive(Debug, Error)]
pub enum TimingError {
    /// A timestamp failed the "finite, >= 0" predicate.
    #[error("invalid time at index {index}: {value}")]
    InvalidTime { index: usize, value: f64 },

    /// The captured list cannot be finalized: it is neither `expected`
    /// nor `expected - 1` entries long.
    #[error("capture incomplete: {got} of {expected} verses marked")]
    IncompleteCapture { got: usize, expected: usize },

    /// Book name not present in the canonical catalog.
    #[error("unknown book: {0}")]
    UnknownBook(String),

    /// Book order outside 1..=66.
    #[error("book order out of range: {0}")]
    BookOrderOutOfRange(u32),

    /// Chapter numbers start at 1.
    #[error("invalid chapter number: {0}")]
    InvalidChapter(u32),

    /// No timing submission log at the expected path.
    #[error("timing submission not found: {0}")]
    SubmissionNotFound(PathBuf),

    /// Submission log exists but its `times` payload is unusable.
    #[error("submission log {path}: {reason}")]
    SubmissionInvalid { path: PathBuf, reason: String },

    /// Chapter page missing from the content root.
    #[error("chapter page not found: {0}")]
    ChapterNotFound(PathBuf),

    /// Chapter page has no highlight-times block and no insertion anchor.
    #[error("no highlight-times block or insertion anchor in {0}")]
    NoTimesBlock(PathBuf),

    /// The remote collaborator refused the submission.
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TimingError>;
