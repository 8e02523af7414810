//! Derived per-verse time ranges.
//!
//! Ranges are computed on demand from the start-time list and never
//! persisted on their own; the start times stay the source of truth.

use serde::{Deserialize, Serialize};

/// One verse's slice of the narration audio. `index` is 1-based for
/// human-readable output; `end`/`duration` are `None` when the range is
/// open (last verse with unknown audio duration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRange {
    pub index: usize,
    pub start: f64,
    pub end: Option<f64>,
    pub duration: Option<f64>,
}

/// Convert verse start times into `{start, end, duration}` ranges.
///
/// Each verse ends where the next one starts; the last verse ends at
/// `audio_duration` when that is known and positive. Negative or
/// non-finite starts are coerced to 0, and an end is clamped to never
/// precede its own start, so durations are never negative.
pub fn derive_ranges(starts: &[f64], audio_duration: Option<f64>) -> Vec<VerseRange> {
    let clamped: Vec<f64> = starts.iter().map(|&s| sanitize_start(s)).collect();
    let total = audio_duration.filter(|d| d.is_finite() && *d > 0.0);

    clamped
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = if i + 1 < clamped.len() {
                Some(clamped[i + 1].max(start))
            } else {
                total.map(|d| d.max(start))
            };
            VerseRange {
                index: i + 1,
                start,
                end,
                duration: end.map(|e| e - start),
            }
        })
        .collect()
}

fn sanitize_start(s: f64) -> f64 {
    if s.is_finite() && s >= 0.0 {
        s
    } else {
        0.0
    }
}

/// Format seconds as `m:ss` for range listings.
pub fn format_time(secs: f64) -> String {
    let m = (secs / 60.0) as u32;
    let s = (secs % 60.0) as u32;
    format!("{m}:{s:02}")
}
