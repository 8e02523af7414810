//! The operator's timing-capture workflow.
//!
//! While narration plays, the operator marks the moment each verse
//! begins. The session owns that in-memory list and the rules for
//! turning it into a persistable highlight-times array.

use crate::error::{Result, TimingError};
use crate::ranges::derive_ranges;
use crate::remote::{round_ms, ChapterRef, RemoteAck, RemoteSink, RemoteTimingPayload};
use crate::store::{KeyValueStore, TimingStore};

/// Where the session is in its lifecycle. `Complete` still counts as
/// "timing mode on" until the operator explicitly exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Complete,
}

/// Stateful recorder for per-verse start marks.
#[derive(Debug)]
pub struct CaptureSession {
    verse_count: usize,
    state: SessionState,
    captured: Vec<f64>,
}

impl CaptureSession {
    pub fn new(verse_count: usize) -> Self {
        Self {
            verse_count,
            state: SessionState::Idle,
            captured: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn verse_count(&self) -> usize {
        self.verse_count
    }

    pub fn captured(&self) -> &[f64] {
        &self.captured
    }

    /// Turn timing mode on. `reset` restarts the capture list from
    /// empty; `reset = false` re-enters without losing marks (used when
    /// the UI re-syncs after a reload).
    pub fn enter_timing_mode(&mut self, reset: bool) {
        if reset {
            self.captured.clear();
        }
        self.state = if self.captured.len() >= self.verse_count && self.verse_count > 0 {
            SessionState::Complete
        } else {
            SessionState::Recording
        };
    }

    /// Turn timing mode off. Captured marks stay in memory so a save
    /// can still happen afterwards.
    pub fn exit_timing_mode(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Record the current playback position as the next verse's start,
    /// rounded to millisecond precision. Fills to `verse_count` and
    /// then auto-transitions to `Complete`, returning the finished list
    /// so the caller can surface it for manual copy. No-op outside
    /// `Recording`.
    pub fn capture(&mut self, playback_time: f64) -> Option<&[f64]> {
        if self.state != SessionState::Recording {
            return None;
        }
        self.captured.push(round_ms(playback_time.max(0.0)));
        if self.captured.len() >= self.verse_count {
            self.state = SessionState::Complete;
            return Some(&self.captured);
        }
        None
    }

    /// Drop the most recent mark. Leaving `Complete` resumes
    /// `Recording`. No-op when nothing is captured or timing mode is off.
    pub fn undo(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }
        if self.captured.pop().is_some() && self.state == SessionState::Complete {
            self.state = SessionState::Recording;
        }
    }

    /// The persistence precondition, including the lead-in heuristic.
    ///
    /// Exactly `verse_count` marks pass through unchanged. Exactly
    /// `verse_count - 1` marks are treated as verses 2..N (single-verse
    /// display makes operators mark the boundary *into* verse 2 rather
    /// than verse 1's own start) and a verse-1 time of
    /// `min(1.0, first) - 0.05` (floored at 0) is synthesized. The
    /// constants are observed tuning values, kept as-is. Any other
    /// length fails.
    pub fn finalized_times(&self) -> Result<Vec<f64>> {
        let n = self.captured.len();
        if n == self.verse_count {
            return Ok(self.captured.clone());
        }
        if self.verse_count > 0 && n == self.verse_count - 1 && n > 0 {
            let lead_in = round_ms((self.captured[0].min(1.0) - 0.05).max(0.0));
            let mut times = Vec::with_capacity(self.verse_count);
            times.push(lead_in);
            times.extend_from_slice(&self.captured);
            return Ok(times);
        }
        Err(TimingError::IncompleteCapture {
            got: n,
            expected: self.verse_count,
        })
    }

    /// Validate and persist the captured times locally. Returns the
    /// array that is now current for playback.
    pub fn save<S: KeyValueStore>(
        &self,
        store: &mut TimingStore<S>,
        key: &str,
    ) -> Result<Vec<f64>> {
        let times = self.finalized_times()?;
        store.save(key, &times)?;
        Ok(times)
    }

    /// Submit to the remote collaborator, and on success mirror the
    /// result into the local store so both stay consistent. The error
    /// is a value for the caller to surface; nothing here panics.
    pub fn submit<S: KeyValueStore, R: RemoteSink>(
        &self,
        store: &mut TimingStore<S>,
        sink: &mut R,
        dest: &ChapterRef,
        key: &str,
        audio_duration: Option<f64>,
    ) -> Result<RemoteAck> {
        let times = self.finalized_times()?;
        let payload = RemoteTimingPayload {
            book_folder: Some(dest.book_folder.clone()),
            book_order: dest.book_order as u32,
            chapter: dest.chapter,
            verse_count: Some(self.verse_count),
            audio_duration,
            times: times.clone(),
            ranges: Some(derive_ranges(&times, audio_duration)),
        };
        let ack = sink.submit(&payload)?;
        store.save(key, &times)?;
        Ok(ack)
    }

    /// Captured marks as a JSON array, for the export command.
    pub fn export_json(&self) -> String {
        serde_json::to_string(&self.captured).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn session_with(times: &[f64], total: usize) -> CaptureSession {
        let mut s = CaptureSession::new(total);
        s.enter_timing_mode(true);
        for &t in times {
            s.capture(t);
        }
        s
    }

    #[test]
    fn enter_resets_and_records() {
        let mut s = CaptureSession::new(3);
        assert_eq!(s.state(), SessionState::Idle);
        s.enter_timing_mode(true);
        assert_eq!(s.state(), SessionState::Recording);
        assert!(s.captured().is_empty());
    }

    #[test]
    fn reenter_without_reset_preserves_marks() {
        let mut s = session_with(&[1.0, 2.0], 3);
        s.exit_timing_mode();
        s.enter_timing_mode(false);
        assert_eq!(s.captured(), &[1.0, 2.0]);
        assert_eq!(s.state(), SessionState::Recording);
    }

    #[test]
    fn capture_rounds_to_milliseconds() {
        let mut s = CaptureSession::new(2);
        s.enter_timing_mode(true);
        s.capture(1.23456);
        assert_eq!(s.captured(), &[1.235]);
    }

    #[test]
    fn filling_the_list_completes_and_exports() {
        let mut s = CaptureSession::new(2);
        s.enter_timing_mode(true);
        assert!(s.capture(1.0).is_none());
        let exported = s.capture(2.0).expect("final capture surfaces the list");
        assert_eq!(exported, &[1.0, 2.0]);
        assert_eq!(s.state(), SessionState::Complete);

        // Further captures are no-ops once complete.
        assert!(s.capture(3.0).is_none());
        assert_eq!(s.captured().len(), 2);
    }

    #[test]
    fn undo_from_complete_resumes_recording() {
        let mut s = session_with(&[1.0, 2.0, 3.0], 3);
        assert_eq!(s.state(), SessionState::Complete);
        s.undo();
        assert_eq!(s.state(), SessionState::Recording);
        assert_eq!(s.captured(), &[1.0, 2.0]);
    }

    #[test]
    fn undo_on_empty_is_a_noop() {
        let mut s = CaptureSession::new(3);
        s.enter_timing_mode(true);
        s.undo();
        assert_eq!(s.state(), SessionState::Recording);
        assert!(s.captured().is_empty());
    }

    #[test]
    fn full_capture_passes_through() {
        let s = session_with(&[0.0, 4.0, 9.0], 3);
        assert_eq!(s.finalized_times().unwrap(), vec![0.0, 4.0, 9.0]);
    }

    #[test]
    fn lead_in_synthesized_for_n_minus_one() {
        let s = session_with(&[5.2, 9.1], 3);
        assert_eq!(s.finalized_times().unwrap(), vec![0.95, 5.2, 9.1]);
    }

    #[test]
    fn lead_in_floors_at_zero() {
        let s = session_with(&[0.02, 4.0], 3);
        let times = s.finalized_times().unwrap();
        assert_eq!(times[0], 0.0);
        assert_eq!(&times[1..], &[0.02, 4.0]);
    }

    #[test]
    fn lead_in_never_exceeds_point_ninety_five() {
        // min(1.0, first) caps the synthesized mark regardless of how
        // late the first real capture lands.
        let s = session_with(&[120.0, 130.0], 3);
        assert_eq!(s.finalized_times().unwrap()[0], 0.95);
    }

    #[test]
    fn other_lengths_fail_the_precondition() {
        let s = session_with(&[1.0], 3);
        assert!(matches!(
            s.finalized_times(),
            Err(TimingError::IncompleteCapture { got: 1, expected: 3 })
        ));
    }

    #[test]
    fn save_writes_the_finalized_array() {
        let s = session_with(&[5.2, 9.1], 3);
        let mut store = TimingStore::new(MemoryStore::new());
        let times = s.save(&mut store, "k").unwrap();
        assert_eq!(times, vec![0.95, 5.2, 9.1]);
        assert_eq!(store.load("k", 3), Some(vec![0.95, 5.2, 9.1]));
    }

    #[test]
    fn save_with_bad_length_leaves_store_untouched() {
        let s = session_with(&[1.0], 3);
        let mut store = TimingStore::new(MemoryStore::new());
        assert!(s.save(&mut store, "k").is_err());
        assert_eq!(store.load("k", 3), None);
    }

    #[test]
    fn submit_mirrors_into_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = crate::remote::DirectorySink::new(dir.path());
        let mut store = TimingStore::new(MemoryStore::new());
        let dest = ChapterRef::new("Mark", 4).unwrap();

        let s = session_with(&[0.0, 12.5, 30.0], 3);
        let ack = s
            .submit(&mut store, &mut sink, &dest, "k", Some(40.0))
            .unwrap();
        assert!(ack.saved);
        assert_eq!(store.load("k", 3), Some(vec![0.0, 12.5, 30.0]));

        // The stored log carries the derived ranges.
        let log = crate::remote::load_submission(&sink.log_path(41, 4)).unwrap();
        let ranges = log.ranges.expect("ranges persisted");
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2].end, Some(40.0));
    }

    #[test]
    fn failed_submit_does_not_touch_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = crate::remote::DirectorySink::new(dir.path());
        let mut store = TimingStore::new(MemoryStore::new());
        let dest = ChapterRef {
            book_folder: "Mark".to_string(),
            book_order: 0, // out of range: the sink refuses it
            chapter: 4,
        };

        let s = session_with(&[0.0, 1.0, 2.0], 3);
        assert!(s
            .submit(&mut store, &mut sink, &dest, "k", None)
            .is_err());
        assert_eq!(store.load("k", 3), None);
    }
}
