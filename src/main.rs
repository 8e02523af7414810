use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use notify::{Event, RecursiveMode, Watcher};

use verse_timing::apply::{self, AppliedTiming};
use verse_timing::ranges::{derive_ranges, format_time};
use verse_timing::remote::{DirectorySink, RemoteSink};
use verse_timing::{books, server};

#[derive(Parser)]
#[command(name = "versetime", version)]
#[command(about = "Verse timing tools — serve the reading site, apply submissions, inspect ranges")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the reading site with clean routes and the timing API
    Serve {
        /// Content root (the site directory)
        #[arg(default_value = ".")]
        root: PathBuf,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,
    },

    /// Apply a submitted timing log into its chapter page
    Apply {
        /// Book name (e.g. Mark, 1Samuel)
        #[arg(long, conflicts_with = "book_order")]
        book: Option<String>,

        /// Book order number (1-66)
        #[arg(long)]
        book_order: Option<u32>,

        /// Chapter number
        #[arg(long)]
        chapter: Option<u32>,

        /// Apply the most recently submitted log
        #[arg(long, conflicts_with_all = ["book", "book_order", "chapter"])]
        latest: bool,

        /// Book folder name override (e.g. Genesis, 1Samuel)
        #[arg(long)]
        book_folder: Option<String>,

        /// Delete the timing log after a successful apply
        #[arg(long)]
        clear_log: bool,

        /// Keep running and apply new submissions as they arrive
        #[arg(long)]
        watch: bool,

        /// Content root (the site directory)
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Print the derived verse ranges for a submitted timing log
    Ranges {
        /// Book name (e.g. Mark, 1Samuel)
        #[arg(long)]
        book: String,

        /// Chapter number
        #[arg(long)]
        chapter: u32,

        /// Total audio duration in seconds (closes the last range)
        #[arg(long)]
        duration: Option<f64>,

        /// Content root (the site directory)
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { root, host, port } => {
            if let Err(e) = server::run_server(root, &host, port) {
                eprintln!("error: server failed: {e}");
                process::exit(1);
            }
        }

        Commands::Apply {
            book,
            book_order,
            chapter,
            latest,
            book_folder,
            clear_log,
            watch,
            root,
        } => {
            let result = if watch {
                run_watch(&root, book_folder.as_deref(), clear_log)
            } else {
                run_apply(&root, book, book_order, chapter, latest, book_folder, clear_log)
            };
            if let Err(e) = result {
                eprintln!("error: {e:#}");
                process::exit(1);
            }
        }

        Commands::Ranges {
            book,
            chapter,
            duration,
            root,
        } => {
            if let Err(e) = run_ranges(&root, &book, chapter, duration) {
                eprintln!("error: {e:#}");
                process::exit(1);
            }
        }
    }
}

// ── Apply ─────────────────────────────────────────────────────────────

fn run_apply(
    root: &PathBuf,
    book: Option<String>,
    book_order: Option<u32>,
    chapter: Option<u32>,
    latest: bool,
    book_folder: Option<String>,
    clear_log: bool,
) -> anyhow::Result<()> {
    let (order, chapter) = if latest {
        apply::latest_submission(root)
            .context("scanning .timings")?
            .map(|(order, chapter, _)| (order, chapter))
            .context("no submissions found under .timings")?
    } else {
        let order = match (book_order, &book) {
            (Some(order), _) => order,
            (None, Some(name)) => books::book_order(name)? as u32,
            (None, None) => bail!("pass --book or --book-order (or --latest)"),
        };
        let chapter = chapter.context("pass --chapter")?;
        (order, chapter)
    };

    let applied = apply::apply_submission(root, order, chapter, book_folder.as_deref(), clear_log)?;
    report(&applied);
    Ok(())
}

/// Watch `.timings/` and apply each submission as it lands. An apply
/// failure is reported and watching continues; only watcher setup
/// failures are fatal.
fn run_watch(root: &PathBuf, book_folder: Option<&str>, clear_log: bool) -> anyhow::Result<()> {
    let timings = root.join(".timings");
    std::fs::create_dir_all(&timings).context("creating .timings")?;

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        let _ = tx.send(res);
    })
    .context("starting file watcher")?;
    watcher
        .watch(&timings, RecursiveMode::Recursive)
        .context("watching .timings")?;

    eprintln!("watching {} for submissions...", timings.display());

    for res in rx {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                eprintln!("  watch error: {e}");
                continue;
            }
        };
        if !event.kind.is_create() && !event.kind.is_modify() {
            continue;
        }
        for path in &event.paths {
            let Some((order, chapter)) = log_coordinates(path) else {
                continue;
            };
            if !path.exists() {
                continue;
            }
            match apply::apply_submission(root, order, chapter, book_folder, clear_log) {
                Ok(applied) => report(&applied),
                Err(e) => eprintln!("  {}: {e}", path.display()),
            }
        }
    }
    Ok(())
}

/// `(book_order, chapter)` from a `.timings/NN/CCC.json` path.
fn log_coordinates(path: &std::path::Path) -> Option<(u32, u32)> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    let chapter = path.file_stem()?.to_str()?.parse().ok()?;
    let order = path.parent()?.file_name()?.to_str()?.parse().ok()?;
    Some((order, chapter))
}

fn report(applied: &AppliedTiming) {
    eprintln!(
        "applied {} timings -> {}",
        applied.times_applied,
        applied.chapter_file.display()
    );
    if applied.block_inserted {
        eprintln!("  inserted highlight-times block");
    }
    if applied.recorder_removed {
        eprintln!("  removed timing recorder script");
    }
    if applied.log_deleted {
        eprintln!("  deleted timing log");
    }
}

// ── Ranges ────────────────────────────────────────────────────────────

fn run_ranges(root: &PathBuf, book: &str, chapter: u32, duration: Option<f64>) -> anyhow::Result<()> {
    let order = books::book_order(book)? as u32;
    let times = DirectorySink::new(root)
        .fetch(order, chapter)?
        .with_context(|| format!("no submission for {book} {chapter} under .timings"))?;

    let ranges = derive_ranges(&times, duration);
    println!(
        "{} {} ({} verses)",
        books::display_name(books::folder_for_order(order)?),
        chapter,
        ranges.len()
    );
    println!("{:>5}  {:>7}  {:>7}  {:>9}", "verse", "start", "end", "duration");
    for r in &ranges {
        let end = r.end.map(format_time).unwrap_or_else(|| "-".to_string());
        let dur = r
            .duration
            .map(|d| format!("{d:.3}s"))
            .unwrap_or_else(|| "-".to_string());
        println!("{:>5}  {:>7}  {:>7}  {:>9}", r.index, format_time(r.start), end, dur);
    }
    Ok(())
}
