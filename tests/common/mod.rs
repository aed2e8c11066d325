#![allow(dead_code)]

//! Minimal threaded HTTP/1.1 server standing in for the ShareIO backend.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use shareio::config::Config;
use shareio::progress::ProgressSink;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path including any query string.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Overrides the Content-Length header to simulate truncated bodies.
    pub declared_length: Option<usize>,
    /// Leave out Content-Length and end the body by closing the connection.
    pub unsized_body: bool,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn status(status: u16) -> Self {
        MockResponse {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            declared_length: None,
            unsized_body: false,
            delay: None,
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::status(status)
            .header("Content-Type", "application/json")
            .body(body.as_bytes())
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    pub fn declared_length(mut self, len: usize) -> Self {
        self.declared_length = Some(len);
        self
    }

    pub fn unsized_body(mut self) -> Self {
        self.unsized_body = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Handler = dyn Fn(&Recorded) -> MockResponse + Send + Sync;

pub struct MockServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    /// Bind to an ephemeral port and serve every connection with `handler`.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Recorded) -> MockResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let recorded = recorded.clone();
                let handler = handler.clone();
                thread::spawn(move || serve(stream, &*handler, &recorded));
            }
        });

        MockServer { port, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, route: &str) -> usize {
        self.requests().iter().filter(|r| r.route() == route).count()
    }

    pub fn config(&self) -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: self.port,
            request_timeout: Duration::from_secs(5),
            download_timeout: Duration::from_secs(5),
            chunk_size: 8,
            ..Config::default()
        }
    }
}

fn serve(stream: TcpStream, handler: &Handler, recorded: &Mutex<Vec<Recorded>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let Some(request) = read_request(&mut reader) else {
        return;
    };
    recorded.lock().unwrap().push(request.clone());

    let response = handler(&request);
    if let Some(delay) = response.delay {
        thread::sleep(delay);
    }
    let mut stream = stream;
    let length = response.declared_length.unwrap_or(response.body.len());
    let mut head = format!("HTTP/1.1 {} Mock\r\n", response.status);
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    if !response.unsized_body {
        head.push_str(&format!("Content-Length: {length}\r\n"));
    }
    head.push_str("Connection: close\r\n\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&response.body);
    let _ = stream.flush();
    let _ = stream.shutdown(std::net::Shutdown::Both);
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<Recorded> {
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _): &&(String, String)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    };

    let body = if let Some(len) = header("content-length").and_then(|v| v.parse::<usize>().ok()) {
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).ok()?;
        body
    } else if header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
        read_chunked(reader)?
    } else {
        Vec::new()
    };

    Some(Recorded {
        method,
        path,
        headers,
        body,
    })
}

fn read_chunked(reader: &mut BufReader<TcpStream>) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).ok()?;
        let size = usize::from_str_radix(size_line.trim(), 16).ok()?;
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).ok()?;
        if size == 0 {
            return Some(body);
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

/// Pull a field out of a multipart/form-data body. Returns the part's file
/// name (if any) and its raw bytes.
pub fn multipart_field(request: &Recorded, field: &str) -> Option<(Option<String>, Vec<u8>)> {
    let content_type = request.header("content-type")?;
    let boundary = content_type.split("boundary=").nth(1)?.trim_matches('"');
    let delimiter = format!("--{boundary}");
    let body = &request.body;

    let mut offset = 0;
    while let Some(start) = find(&body[offset..], delimiter.as_bytes()) {
        let part_start = offset + start + delimiter.len();
        let Some(next) = find(&body[part_start..], delimiter.as_bytes()) else {
            break;
        };
        let part = &body[part_start..part_start + next];
        offset = part_start;

        let Some(split) = find(part, b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&part[..split]);
        let mut data = &part[split + 4..];
        if data.ends_with(b"\r\n") {
            data = &data[..data.len() - 2];
        }
        if head.contains(&format!("name=\"{field}\"")) {
            let filename = head
                .split("filename=\"")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .map(str::to_string);
            return Some((filename, data.to_vec()));
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Sink recording every callback, for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub started: Mutex<Option<Option<u64>>>,
    pub progress: Mutex<Vec<u64>>,
    pub completed: Mutex<bool>,
    pub failure: Mutex<Option<String>>,
}

impl ProgressSink for RecordingSink {
    fn on_start(&self, total: Option<u64>) {
        *self.started.lock().unwrap() = Some(total);
    }

    fn on_progress(&self, transferred: u64) {
        self.progress.lock().unwrap().push(transferred);
    }

    fn on_complete(&self) {
        *self.completed.lock().unwrap() = true;
    }

    fn on_failure(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }
}
