//! Shell orchestration: intro gating, keyboard commands, chapter
//! chaining, and the player object that ties store, session and
//! presenter together. No process-wide state; everything the player
//! needs lives on the [`ChapterPlayer`] it owns.

use crate::config::PlayerConfig;
use crate::presenter::{Presenter, VerseSurface};
use crate::remote::{ChapterRef, RemoteAck, RemoteSink};
use crate::session::CaptureSession;
use crate::store::{storage_key, KeyValueStore, TimingStore};

// ── Intro gate ────────────────────────────────────────────────────────

/// Browsers refuse to start audio without a user gesture, so playback
/// is gated behind one: `Gated` until the first gesture, `Unlocked`
/// once audio may start, `Running` once the operator begins playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroGate {
    Gated,
    Unlocked,
    Running,
}

impl IntroGate {
    pub fn new() -> Self {
        Self::Gated
    }

    /// First user gesture. Returns true on the Gated → Unlocked edge.
    pub fn unlock(&mut self) -> bool {
        if *self == Self::Gated {
            *self = Self::Unlocked;
            true
        } else {
            false
        }
    }

    /// Start playback. Only possible once unlocked.
    pub fn begin(&mut self) -> bool {
        if *self == Self::Unlocked {
            *self = Self::Running;
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        *self == Self::Running
    }
}

impl Default for IntroGate {
    fn default() -> Self {
        Self::new()
    }
}

// ── Keyboard surface ──────────────────────────────────────────────────

/// Single-letter operator commands, live while the player is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleTiming,
    Capture,
    Undo,
    Save,
    Export,
    ClearStored,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            't' => Some(Self::ToggleTiming),
            'c' => Some(Self::Capture),
            'u' => Some(Self::Undo),
            's' => Some(Self::Save),
            'e' => Some(Self::Export),
            'x' => Some(Self::ClearStored),
            _ => None,
        }
    }
}

// ── Query flags and chapter chaining ──────────────────────────────────

/// True when `name` appears in the query string as a truthy flag
/// (`?autoplay`, `?autoplay=1`, `?autoplay=true`).
pub fn query_flag(query: &str, name: &str) -> bool {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .any(|pair| {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, ""),
            };
            key == name && matches!(value, "" | "1" | "true" | "yes")
        })
}

/// The chapter to auto-advance to, or `None` at the end of the book.
pub fn next_chapter(chapter: u32, chapter_count: u32) -> Option<u32> {
    if chapter >= 1 && chapter < chapter_count {
        Some(chapter + 1)
    } else {
        None
    }
}

// ── Chapter player ────────────────────────────────────────────────────

/// One chapter's playback/capture controller. Owns the validated
/// store, the capture session and the presenter; routes commands and
/// playback ticks; reports through the surface's status line.
pub struct ChapterPlayer<S: KeyValueStore> {
    config: PlayerConfig,
    dest: ChapterRef,
    key: String,
    default_times: Vec<f64>,
    store: TimingStore<S>,
    session: CaptureSession,
    presenter: Presenter,
    gate: IntroGate,
    audio_duration: Option<f64>,
}

impl<S: KeyValueStore> ChapterPlayer<S> {
    /// Attach a player. `default_times` is the page-embedded fallback;
    /// a valid stored record for this chapter overrides it.
    pub fn new(
        config: PlayerConfig,
        dest: ChapterRef,
        default_times: Vec<f64>,
        store: S,
    ) -> Self {
        let key = storage_key(&config.namespace, &dest.book_folder, dest.chapter);
        let store = TimingStore::new(store);
        let verse_count = default_times.len();
        let times = store.load(&key, verse_count).unwrap_or_else(|| default_times.clone());
        let presenter = Presenter::new(times, config.fit);
        Self {
            session: CaptureSession::new(verse_count),
            gate: IntroGate::new(),
            audio_duration: None,
            config,
            dest,
            key,
            default_times,
            store,
            presenter,
        }
    }

    pub fn gate(&mut self) -> &mut IntroGate {
        &mut self.gate
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// True when the page's query string carries the configured
    /// auto-advance flag.
    pub fn autoplay_enabled(&self, query: &str) -> bool {
        query_flag(query, &self.config.autoplay_param)
    }

    /// Known total audio length, once the host has it (used for the
    /// final verse's range on submission).
    pub fn set_audio_duration(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.audio_duration = Some(secs);
        }
    }

    /// Playback position tick. Capture mode takes precedence over
    /// time-resolved display.
    pub fn tick<V: VerseSurface>(&mut self, t: f64, surface: &mut V) {
        if self.session.is_active() {
            self.presenter
                .sync_capture(self.session.captured().len(), surface);
        } else {
            self.presenter.sync_playback(t, surface);
        }
    }

    /// Route a keyboard command. All outcomes surface as status text;
    /// nothing escapes as a panic or an unreported error.
    pub fn handle_command<V: VerseSurface>(
        &mut self,
        cmd: Command,
        playback_time: f64,
        surface: &mut V,
    ) {
        match cmd {
            Command::ToggleTiming => {
                if self.session.is_active() {
                    self.session.exit_timing_mode();
                    surface.set_status("timing mode off");
                } else {
                    self.session.enter_timing_mode(true);
                    surface.set_status("timing mode on: mark each verse as it begins");
                }
            }
            Command::Capture => {
                if !self.session.is_active() {
                    return;
                }
                if let Some(all) = self.session.capture(playback_time) {
                    let json = serde_json::to_string(all).unwrap_or_else(|_| "[]".to_string());
                    surface.set_status(&format!("all verses marked: {json}"));
                }
            }
            Command::Undo => {
                self.session.undo();
            }
            Command::Save => match self.session.save(&mut self.store, &self.key) {
                Ok(times) => {
                    surface.set_status(&format!("saved {} verse times", times.len()));
                    self.presenter.set_times(times);
                }
                Err(e) => surface.set_status(&format!("save failed: {e}")),
            },
            Command::Export => {
                surface.set_status(&self.session.export_json());
            }
            Command::ClearStored => {
                match self.store.clear(&self.key) {
                    Ok(()) => surface.set_status("stored timings cleared"),
                    Err(e) => surface.set_status(&format!("clear failed: {e}")),
                }
                self.presenter.set_times(self.default_times.clone());
            }
        }
        self.tick(playback_time, surface);
    }

    /// Submit the capture to the remote collaborator, mirroring into
    /// the local store on success. The ack (or failure) is surfaced and
    /// returned; a failure never tears the session down.
    pub fn submit<V: VerseSurface, R: RemoteSink>(
        &mut self,
        sink: &mut R,
        surface: &mut V,
    ) -> Option<RemoteAck> {
        if self.config.save_url.is_none() {
            surface.set_status("no save endpoint configured");
            return None;
        }
        match self.session.submit(
            &mut self.store,
            sink,
            &self.dest,
            &self.key,
            self.audio_duration,
        ) {
            Ok(ack) => {
                surface.set_status("submitted");
                self.presenter
                    .set_times(self.session.finalized_times().unwrap_or_default());
                Some(ack)
            }
            Err(e) => {
                surface.set_status(&format!("submit failed: {e}"));
                None
            }
        }
    }
}
