//! The `/api/timing` endpoint logic, kept free of any HTTP types so the
//! status/body contract is directly testable.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::books;
use crate::error::TimingError;
use crate::ranges::VerseRange;
use crate::remote::{DirectorySink, RemoteSink, RemoteTimingPayload};

use super::rewrite;

/// `GET /api/timing?bookOrder=41&chapter=4`.
///
/// A missing log is not an error: the client treats `times: null` as
/// "nothing submitted yet". An unreadable or malformed log is a 500.
pub fn get_timing(root: &Path, query: &str) -> (u16, Value) {
    let order = int_param(query, &["bookOrder", "book_order"]);
    let chapter = int_param(query, &["chapter"]);
    let (Some(order), Some(chapter)) = (order, chapter) else {
        return (400, json!({"error": "bookOrder and chapter are required"}));
    };
    if !(1..=66).contains(&order) || chapter < 1 {
        return (400, json!({"error": "invalid bookOrder/chapter"}));
    }

    let path = books::timing_log_path(root, order as u32, chapter as u32);
    if !path.exists() {
        return (200, json!({"ok": true, "times": null}));
    }
    let parsed = std::fs::read_to_string(&path)
        .ok()
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
    match parsed {
        Some(Value::Object(mut data)) => {
            data.insert("ok".to_string(), Value::Bool(true));
            (200, Value::Object(data))
        }
        Some(_) => (500, json!({"error": "timing file invalid"})),
        None => (500, json!({"error": "timing file unreadable"})),
    }
}

/// `POST /api/timing` with a JSON submission body. Validates, persists
/// the `.timings` log, and acknowledges with `{"ok": true, "saved": true}`.
pub fn post_timing(root: &Path, body: &str) -> (u16, Value) {
    let Ok(Value::Object(data)) = serde_json::from_str::<Value>(body) else {
        return (400, json!({"error": "invalid json"}));
    };

    let order = int_field(&data, &["bookOrder", "book_order"]).unwrap_or(0);
    let chapter = int_field(&data, &["chapter"]).unwrap_or(0);

    let times = match data.get("times") {
        Some(Value::Array(raw)) if !raw.is_empty() => raw,
        _ => return (400, json!({"error": "times must be a non-empty array"})),
    };
    let mut cleaned = Vec::with_capacity(times.len());
    for value in times {
        let Some(t) = value.as_f64() else {
            return (400, json!({"error": "times must be numbers"}));
        };
        if !t.is_finite() || t < 0.0 {
            return (400, json!({"error": "times must be >= 0"}));
        }
        cleaned.push(t);
    }

    if !(1..=66).contains(&order) || chapter < 1 {
        return (400, json!({"error": "invalid bookOrder/chapter"}));
    }

    let payload = RemoteTimingPayload {
        book_folder: data
            .get("bookFolder")
            .and_then(Value::as_str)
            .map(str::to_string),
        book_order: order as u32,
        chapter: chapter as u32,
        verse_count: data
            .get("verseCount")
            .or_else(|| data.get("verse_count"))
            .and_then(Value::as_u64)
            .map(|n| n as usize),
        audio_duration: data.get("audioDuration").and_then(Value::as_f64),
        times: cleaned,
        // Client-derived ranges are kept when they parse, dropped otherwise.
        ranges: data
            .get("ranges")
            .and_then(|v| serde_json::from_value::<Vec<VerseRange>>(v.clone()).ok()),
    };

    match DirectorySink::new(root).submit(&payload) {
        Ok(_) => (200, json!({"ok": true, "saved": true})),
        Err(TimingError::Io(e)) => (500, json!({"error": e.to_string()})),
        Err(e) => (400, json!({"error": e.to_string()})),
    }
}

fn int_param(query: &str, names: &[&str]) -> Option<i64> {
    names
        .iter()
        .find_map(|name| rewrite::query_param(query, name))
        .and_then(|raw| raw.parse().ok())
}

fn int_field(data: &Map<String, Value>, names: &[&str]) -> Option<i64> {
    names.iter().find_map(|name| data.get(*name)?.as_i64())
}
