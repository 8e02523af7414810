//! Apply a submitted timing log into its chapter page.
//!
//! The page carries its highlight times inline, in a
//! `<script id="highlight-times" type="application/json">` block. This
//! module rewrites that block from a `.timings` submission log, falling
//! back to inserting one when the page predates the scheme, and strips
//! the capture-mode recorder script once real timings exist.

use std::path::{Path, PathBuf};

use crate::books;
use crate::error::{Result, TimingError};
use crate::remote;

/// What an apply run did, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTiming {
    pub chapter_file: PathBuf,
    pub times_applied: usize,
    pub block_inserted: bool,
    pub recorder_removed: bool,
    pub log_deleted: bool,
}

/// Apply the submission log for `(book_order, chapter)` under `root`.
///
/// The book folder comes from `folder_override`, then the log's own
/// `bookFolder` field, then the canonical catalog. `clear_log` deletes
/// the submission file after a successful write.
pub fn apply_submission(
    root: &Path,
    book_order: u32,
    chapter: u32,
    folder_override: Option<&str>,
    clear_log: bool,
) -> Result<AppliedTiming> {
    let log_path = books::timing_log_path(root, book_order, chapter);
    let payload = remote::load_submission(&log_path)?;

    let folder = match folder_override {
        Some(f) => f.to_string(),
        None => match payload.book_folder {
            Some(ref f) if !f.trim().is_empty() => f.clone(),
            _ => books::folder_for_order(book_order)?.to_string(),
        },
    };

    let chapter_file = root.join(books::chapter_page_rel(&folder, chapter));
    if !chapter_file.exists() {
        return Err(TimingError::ChapterNotFound(chapter_file));
    }

    let html = std::fs::read_to_string(&chapter_file)?;
    let serialized = serde_json::to_string(&payload.times)?;

    let (updated, block_inserted) = match replace_times_block(&html, &serialized) {
        Some(replaced) => (replaced, false),
        None => match insert_times_block(&html, &serialized) {
            Some(inserted) => (inserted, true),
            None => return Err(TimingError::NoTimesBlock(chapter_file)),
        },
    };

    let (updated, recorder_removed) = remove_recorder_blocks(&updated);
    std::fs::write(&chapter_file, updated)?;

    let mut log_deleted = false;
    if clear_log {
        match std::fs::remove_file(&log_path) {
            Ok(()) => log_deleted = true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(AppliedTiming {
        chapter_file,
        times_applied: payload.times.len(),
        block_inserted,
        recorder_removed,
        log_deleted,
    })
}

/// The most recently modified submission log under `root/.timings`,
/// as `(book_order, chapter, path)`. `None` when no logs exist.
pub fn latest_submission(root: &Path) -> Result<Option<(u32, u32, PathBuf)>> {
    let timings = root.join(".timings");
    if !timings.is_dir() {
        return Ok(None);
    }

    let mut newest: Option<(std::time::SystemTime, u32, u32, PathBuf)> = None;
    for book_dir in std::fs::read_dir(&timings)? {
        let book_dir = book_dir?;
        let order: u32 = match book_dir.file_name().to_string_lossy().parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        if !book_dir.path().is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(book_dir.path())? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let chapter: u32 = match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
            {
                Some(n) => n,
                None => continue,
            };
            let modified = entry.metadata()?.modified()?;
            if newest.as_ref().map_or(true, |(t, ..)| modified > *t) {
                newest = Some((modified, order, chapter, path));
            }
        }
    }

    Ok(newest.map(|(_, order, chapter, path)| (order, chapter, path)))
}

// ── HTML surgery ──────────────────────────────────────────────────────

const RECORDER_SRC: &str = "verse-timing-recorder.js";
const RECORDER_MARKER: &str = "timing mode + auto-init";

/// Case-insensitive ASCII substring search.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
        .map(|i| from + i)
}

/// Replace the inner JSON of the existing highlight-times block.
/// `None` when the page has no such block.
fn replace_times_block(html: &str, serialized: &str) -> Option<String> {
    let mut from = 0;
    while let Some(id_pos) = find_ci(html, "id=\"highlight-times\"", from) {
        let tag_start = html[..id_pos].rfind('<')?;
        let tag_end = id_pos + html[id_pos..].find('>')?;
        let open_tag = &html[tag_start..=tag_end];

        let lower = open_tag.to_ascii_lowercase();
        if lower.starts_with("<script") && lower.contains("type=\"application/json\"") {
            let close = find_ci(html, "</script>", tag_end)?;
            let mut out = String::with_capacity(html.len() + serialized.len());
            out.push_str(&html[..=tag_end]);
            out.push_str(serialized);
            out.push_str(&html[close..]);
            return Some(out);
        }
        from = id_pos + 1;
    }
    None
}

/// Insert a fresh highlight-times block before the chapter-template
/// script, or failing that before `</body>`. `None` when neither
/// anchor exists.
fn insert_times_block(html: &str, serialized: &str) -> Option<String> {
    let block = format!(
        "\n    <script id=\"highlight-times\" type=\"application/json\">{serialized}</script>\n\n"
    );
    let anchors = [
        "\n    <script src=\"../chapter-template.js\"></script>",
        "\n</body>",
    ];
    for anchor in anchors {
        if let Some(idx) = html.find(anchor) {
            let mut out = String::with_capacity(html.len() + block.len());
            out.push_str(&html[..idx]);
            out.push_str(&block);
            out.push_str(&html[idx..]);
            return Some(out);
        }
    }
    None
}

/// Strip every `<script src=".../verse-timing-recorder.js">` block,
/// along with its "Timing mode + auto-init" marker comment when one
/// sits directly above.
fn remove_recorder_blocks(html: &str) -> (String, bool) {
    let mut out = html.to_string();
    let mut removed = false;

    loop {
        let lower = out.to_ascii_lowercase();
        let Some(src_pos) = lower.find(RECORDER_SRC) else {
            break;
        };
        let Some(tag_start) = lower[..src_pos].rfind("<script") else {
            break;
        };
        let Some(close_rel) = lower[src_pos..].find("</script>") else {
            break;
        };
        let mut end = src_pos + close_rel + "</script>".len();

        // Widen over indentation, then an adjacent marker comment.
        let mut start = trim_indent(&out, tag_start);
        let before = out[..start].trim_end();
        if before.ends_with("-->") {
            if let Some(comment_start) = before.rfind("<!--") {
                if before[comment_start..]
                    .to_ascii_lowercase()
                    .contains(RECORDER_MARKER)
                {
                    start = trim_indent(&out, comment_start);
                }
            }
        }
        if start > 0 && out.as_bytes()[start - 1] == b'\n' {
            start -= 1;
        }
        while end < out.len() && matches!(out.as_bytes()[end], b' ' | b'\t') {
            end += 1;
        }
        if end < out.len() && out.as_bytes()[end] == b'\n' {
            end += 1;
        }

        out.replace_range(start..end, "\n");
        removed = true;
    }

    (out, removed)
}

fn trim_indent(text: &str, mut pos: usize) -> usize {
    while pos > 0 && matches!(text.as_bytes()[pos - 1], b' ' | b'\t') {
        pos -= 1;
    }
    pos
}
