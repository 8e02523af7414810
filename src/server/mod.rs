//! Local reading-site server: static pages with clean book/chapter
//! routes plus the `/api/timing` submission endpoint.

pub mod api;
pub mod rewrite;

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tiny_http::{Header, Method, Request, Response, Server};

type Reply = Response<Cursor<Vec<u8>>>;

/// Run the server until the process is interrupted.
pub fn run_server(
    root: PathBuf,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = Server::http((host, port))?;

    eprintln!("verse timing server");
    eprintln!("  root:   {}", root.display());
    eprintln!("  listen: http://{host}:{port}/");
    eprintln!("  pages:  /Mark/1  /Matthew/21  /Mark/");
    eprintln!("  api:    /api/timing (GET/POST)");

    for mut request in server.incoming_requests() {
        eprintln!("  {} {}", request.method(), request.url());
        let reply = route(&root, &mut request);
        if let Err(e) = request.respond(reply) {
            eprintln!("  response error: {e}");
        }
    }
    Ok(())
}

// ── Dispatch ──────────────────────────────────────────────────────────

fn route(root: &Path, request: &mut Request) -> Reply {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

    if path == "/api/timing" {
        return timing_api(root, request, query);
    }
    match request.method() {
        Method::Get | Method::Head => serve_static(root, path),
        _ => status_json(405, &serde_json::json!({"error": "method not allowed"})),
    }
}

fn timing_api(root: &Path, request: &mut Request, query: &str) -> Reply {
    let (status, body) = match request.method() {
        Method::Get => api::get_timing(root, query),
        Method::Post => {
            let mut raw = String::new();
            match request.as_reader().read_to_string(&mut raw) {
                Ok(_) => api::post_timing(root, &raw),
                Err(_) => (400, serde_json::json!({"error": "invalid json"})),
            }
        }
        Method::Options => {
            let reply = Response::from_string(String::new()).with_status_code(204);
            let reply = with_header(reply, "Access-Control-Allow-Methods", "GET, POST, OPTIONS");
            let reply = with_header(reply, "Access-Control-Allow-Headers", "Content-Type");
            return cors(reply);
        }
        _ => (405, serde_json::json!({"error": "method not allowed"})),
    };
    status_json(status, &body)
}

// ── Static files ──────────────────────────────────────────────────────

fn serve_static(root: &Path, raw_path: &str) -> Reply {
    let rewritten = rewrite::rewrite_path(raw_path);
    let Some(mut path) = rewrite::resolve(root, &rewritten) else {
        return not_found();
    };
    if path.is_dir() {
        path.push("index.html");
    }
    match std::fs::read(&path) {
        Ok(bytes) => {
            let reply = Response::from_data(bytes).with_status_code(200);
            with_header(reply, "Content-Type", rewrite::content_type(&path))
        }
        Err(_) => not_found(),
    }
}

fn not_found() -> Reply {
    let reply = Response::from_string("404 not found").with_status_code(404);
    with_header(reply, "Content-Type", "text/plain; charset=utf-8")
}

// ── Response helpers ──────────────────────────────────────────────────

fn status_json(status: u16, body: &serde_json::Value) -> Reply {
    let reply = Response::from_string(body.to_string()).with_status_code(status);
    cors(with_header(reply, "Content-Type", "application/json; charset=utf-8"))
}

fn cors(reply: Reply) -> Reply {
    with_header(reply, "Access-Control-Allow-Origin", "*")
}

fn with_header(mut reply: Reply, name: &str, value: &str) -> Reply {
    if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        reply.add_header(header);
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_server_surfaces_bind_errors() {
        let dir = tempfile::tempdir().unwrap();
        // Unresolvable host: the bind failure must come back as an
        // error value rather than aborting.
        let result = run_server(dir.path().to_path_buf(), "256.256.256.256", 0);
        assert!(result.is_err());
    }
}
