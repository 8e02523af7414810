//! Verse-timing synchronization for a scripture reading site.
//!
//! Each chapter page plays one narration audio file and shows one verse
//! at a time. This crate owns the timing model behind that: resolving
//! the visible verse from the playback clock ([`resolve`]), deriving
//! per-verse ranges ([`ranges`]), persisting and validating stored
//! timing arrays ([`store`]), the operator's capture workflow
//! ([`session`]), display sync ([`presenter`]) and the page shell that
//! ties them together ([`shell`]). Around the core sit the submission
//! contract ([`remote`]), the local site server with its timing API
//! ([`server`]) and the tool that bakes submissions into chapter pages
//! ([`apply`]).

pub mod apply;
pub mod books;
pub mod config;
pub mod error;
pub mod presenter;
pub mod ranges;
pub mod remote;
pub mod resolve;
pub mod server;
pub mod session;
pub mod shell;
pub mod store;

pub use error::{Result, TimingError};

/// Resolve the chapter reference for a book name and attach a player
/// backed by the given store.
pub fn attach_player<S: store::KeyValueStore>(
    config: config::PlayerConfig,
    book: &str,
    chapter: u32,
    default_times: Vec<f64>,
    store: S,
) -> Result<shell::ChapterPlayer<S>> {
    let dest = remote::ChapterRef::new(book, chapter)?;
    Ok(shell::ChapterPlayer::new(config, dest, default_times, store))
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::presenter::mock::MockSurface;
    use crate::shell::Command;
    use crate::store::JsonFileStore;

    #[test]
    fn end_to_end_capture_save_and_replay() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("store.json");
        let defaults = vec![0.0, 10.0, 20.0];

        // Session 1: operator re-times the chapter and saves.
        {
            let store = JsonFileStore::open(&store_path);
            let mut player =
                attach_player(PlayerConfig::default(), "Mark", 4, defaults.clone(), store)
                    .expect("known book");
            let mut surface = MockSurface::new(3);

            assert!(player.gate().unlock());
            assert!(player.gate().begin());

            // Defaults drive playback until a capture replaces them.
            player.tick(15.0, &mut surface);
            assert_eq!(surface.visible, Some(1));

            player.handle_command(Command::ToggleTiming, 0.0, &mut surface);
            for t in [0.0, 12.5, 30.0] {
                player.handle_command(Command::Capture, t, &mut surface);
            }
            player.handle_command(Command::Save, 30.0, &mut surface);
            player.handle_command(Command::ToggleTiming, 30.0, &mut surface);
        }

        // Session 2: a fresh player on the same store replays the
        // captured times instead of the page defaults.
        let store = JsonFileStore::open(&store_path);
        let mut player =
            attach_player(PlayerConfig::default(), "Mark", 4, defaults, store).expect("known book");
        let mut surface = MockSurface::new(3);

        assert_eq!(player.presenter().times(), &[0.0, 12.5, 30.0]);
        player.tick(15.0, &mut surface);
        assert_eq!(surface.visible, Some(1));
        player.tick(31.0, &mut surface);
        assert_eq!(surface.visible, Some(2));
    }

    #[test]
    fn end_to_end_submit_and_apply_to_page() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        // A chapter page awaiting real timings.
        let page = root.join("Mark").join("Mark4.html");
        std::fs::create_dir_all(page.parent().unwrap()).unwrap();
        std::fs::write(
            &page,
            "<html>\n<body>\n    <script id=\"highlight-times\" type=\"application/json\">[]</script>\n\n    <script src=\"../chapter-template.js\"></script>\n</body>\n</html>\n",
        )
        .unwrap();

        // Operator captures and submits through the player.
        let cfg = PlayerConfig::from_attrs([("save-url", "/api/timing")]);
        let mut player = attach_player(cfg, "Mark", 4, vec![0.0, 10.0, 20.0], store::MemoryStore::new())
            .expect("known book");
        let mut surface = MockSurface::new(3);
        let mut sink = remote::DirectorySink::new(root);

        player.set_audio_duration(40.0);
        player.handle_command(Command::ToggleTiming, 0.0, &mut surface);
        for t in [0.0, 12.5, 30.0] {
            player.handle_command(Command::Capture, t, &mut surface);
        }
        let ack = player.submit(&mut sink, &mut surface).expect("submit ok");
        assert!(ack.saved);

        // The timing API sees the submission.
        let (status, body) = server::api::get_timing(root, "bookOrder=41&chapter=4");
        assert_eq!(status, 200);
        assert_eq!(body["times"], serde_json::json!([0.0, 12.5, 30.0]));

        // Applying bakes it into the page.
        let applied = apply::apply_submission(root, 41, 4, None, true).unwrap();
        assert_eq!(applied.times_applied, 3);
        let html = std::fs::read_to_string(&page).unwrap();
        assert!(html.contains("[0.0,12.5,30.0]"));
    }
}
