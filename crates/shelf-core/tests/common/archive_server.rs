//! Minimal HTTP/1.1 server standing in for the remote library service.
//!
//! Every request must carry `Authorization: Bearer <credential>` or it gets
//! 401. Paths map to a fixed body or a fixed status; anything else is 404.
//! Request counts per path are recorded for assertions.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub enum Reply {
    Body(Vec<u8>),
    Status(u16),
}

pub struct ArchiveServer {
    base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl ArchiveServer {
    /// Absolute URL for `path` (leading slash optional).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    /// Number of requests (authorized or not) seen for `path`.
    pub fn hits(&self, path: &str) -> usize {
        let key = format!("/{}", path.trim_start_matches('/'));
        self.hits.lock().unwrap().get(&key).copied().unwrap_or(0)
    }
}

/// Starts a server in a background thread. `routes` receives the base URL
/// (e.g. "http://127.0.0.1:12345/") so catalog bodies can link to assets on
/// the same server. The server runs until the process exits.
pub fn start(
    credential: &str,
    routes: impl FnOnce(&str) -> Vec<(&'static str, Reply)>,
) -> ArchiveServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{}/", port);
    let table: HashMap<String, Reply> = routes(&base)
        .into_iter()
        .map(|(p, r)| (format!("/{}", p.trim_start_matches('/')), r))
        .collect();
    let table = Arc::new(table);
    let expected = Arc::new(format!("Bearer {}", credential));
    let hits = Arc::new(Mutex::new(HashMap::new()));
    {
        let hits = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let table = Arc::clone(&table);
                let expected = Arc::clone(&expected);
                let hits = Arc::clone(&hits);
                thread::spawn(move || handle(stream, &table, &expected, &hits));
            }
        });
    }
    ArchiveServer { base, hits }
}

fn handle(
    mut stream: std::net::TcpStream,
    table: &HashMap<String, Reply>,
    expected_auth: &str,
    hits: &Mutex<HashMap<String, usize>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, auth) = parse_request(request);
    *hits.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;

    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", b"");
        return;
    }
    if auth != Some(expected_auth) {
        respond(&mut stream, "401 Unauthorized", b"");
        return;
    }
    match table.get(path) {
        Some(Reply::Body(body)) => respond(&mut stream, "200 OK", body),
        Some(Reply::Status(code)) => respond(&mut stream, &format!("{} Error", code), b""),
        None => respond(&mut stream, "404 Not Found", b""),
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Returns (method, path, Authorization header value).
fn parse_request(request: &str) -> (&str, &str, Option<&str>) {
    let mut method = "";
    let mut path = "";
    let mut auth = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("authorization") {
                auth = Some(value.trim());
            }
        }
    }
    (method, path, auth)
}
