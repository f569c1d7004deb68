//! Shared fixtures for chromup integration tests.
//!
//! [`SnapshotServer`] is a minimal HTTP/1.1 server on a loopback port that
//! serves a fixed set of paths, enough to stand in for the snapshot bucket.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use zip::write::SimpleFileOptions;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// Send `Content-Length`; otherwise the body is terminated by closing.
    pub with_length: bool,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            with_length: true,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            with_length: true,
        }
    }

    pub fn without_length(mut self) -> Self {
        self.with_length = false;
        self
    }
}

#[derive(Clone)]
pub struct SnapshotServer {
    base_url: String,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    hits: Arc<Mutex<Vec<String>>>,
}

impl SnapshotServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let server = Self {
            base_url,
            routes: Arc::new(Mutex::new(HashMap::new())),
            hits: Arc::new(Mutex::new(Vec::new())),
        };

        let routes = Arc::clone(&server.routes);
        let hits = Arc::clone(&server.hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&hits);
                thread::spawn(move || handle(stream, &routes, &hits));
            }
        });
        server
    }

    /// Serve `LAST_CHANGE` and the archive for `revision` under `platform_segment`.
    pub fn publish(&self, platform_segment: &str, revision: &str, archive_name: &str, archive: Vec<u8>) {
        self.route(&format!("/{platform_segment}/LAST_CHANGE"), Route::ok(format!("{revision}\n")));
        self.route(&format!("/{platform_segment}/{revision}/{archive_name}"), Route::ok(archive));
    }

    pub fn route(&self, path: &str, route: Route) {
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

fn handle(mut stream: TcpStream, routes: &Mutex<HashMap<String, Route>>, hits: &Mutex<Vec<String>>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let text = String::from_utf8_lossy(&request);
    let path = text.split_whitespace().nth(1).unwrap_or("/").to_string();
    hits.lock().unwrap().push(path.clone());

    let route = routes.lock().unwrap().get(&path).cloned().unwrap_or_else(|| Route::status(404));
    let mut head = format!("HTTP/1.1 {} X\r\nConnection: close\r\n", route.status);
    if route.with_length {
        head.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    head.push_str("\r\n");

    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
    let _ = stream.flush();
}

/// Build a zip in memory. `None` content marks a directory entry.
pub fn zip_archive(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        match content {
            None => zip.add_directory(*name, options).unwrap(),
            Some(bytes) => {
                zip.start_file(*name, options).unwrap();
                zip.write_all(bytes).unwrap();
            }
        }
    }
    zip.finish().unwrap().into_inner()
}

/// A small but realistic `chrome-win.zip`.
pub fn chrome_win_archive(marker: &str) -> Vec<u8> {
    let exe = format!("chrome {marker}");
    zip_archive(&[
        ("chrome-win/", None),
        ("chrome-win/chrome.exe", Some(exe.as_bytes())),
        ("chrome-win/chrome.dll", Some(&[0x4d, 0x5a, 0x90, 0x00])),
        ("chrome-win/locales/", None),
        ("chrome-win/locales/en-US.pak", Some(b"en-US")),
        ("chrome-win/locales/de.pak", Some(b"de")),
        ("chrome-win/MEIPreload/manifest.json", Some(b"{}")),
    ])
}

/// Every file under `root`, relative path to contents.
pub fn tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let content = std::fs::read(e.path()).unwrap();
            (e.path().strip_prefix(root).unwrap().to_path_buf(), content)
        })
        .collect();
    files.sort();
    files
}
