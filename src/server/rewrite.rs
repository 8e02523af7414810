//! URL rewriting and filesystem resolution for the reading site.
//!
//! Clean routes map onto the on-disk layout:
//! - `/Book/<n>`  -> `/Book/Book<n>.html`
//! - `/Book/`     -> `/Book/index.html`
//! - `/Book`      -> `/Book/index.html` (no extension, no slash)

use std::path::{Component, Path, PathBuf};

/// Apply the clean-route rewrites. Paths that match no rule pass
/// through untouched.
pub fn rewrite_path(path: &str) -> String {
    if let Some((book, chapter)) = parse_book_chapter(path) {
        return format!("/{book}/{book}{chapter}.html");
    }

    if path != "/" && path.matches('/').count() <= 2 {
        if path.ends_with('/') {
            return format!("{path}index.html");
        }
        let last = path.rsplit('/').next().unwrap_or("");
        if !last.contains('.') {
            return format!("{path}/index.html");
        }
    }

    path.to_string()
}

/// `/Mark/4` or `/Mark/4/` -> `("Mark", 4)`.
fn parse_book_chapter(path: &str) -> Option<(&str, u32)> {
    let trimmed = path.strip_prefix('/')?;
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let (book, chapter) = trimmed.split_once('/')?;
    if book.is_empty() || !book.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    if chapter.is_empty() || !chapter.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((book, chapter.parse().ok()?))
}

/// Resolve a URL path to a file under `root`. Percent-decodes, then
/// rejects anything that would escape the root. `None` means 404.
pub fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode(url_path)?;
    let mut resolved = root.to_path_buf();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

fn percent_decode(s: &str) -> Option<String> {
    let mut out = Vec::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// First value of a query parameter, `?a=1&b=2` style.
pub fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
