//! A canned HTTP server for exercising the adapters end to end.
//!
//! Each accepted connection gets the same response and is closed. Request
//! heads and bodies are recorded so tests can assert on what was sent.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request line, e.g. `POST /v2/directions/foot-walking/geojson HTTP/1.1`.
    pub line: String,
    /// Lower-cased header lines.
    pub headers: Vec<String>,
    /// Request body.
    pub body: String,
}

/// Server answering every request with one status and body.
pub struct CannedServer {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl CannedServer {
    /// Bind to an ephemeral local port and start serving.
    pub fn start(status: u16, body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
        let url = format!(
            "http://{}",
            listener.local_addr().expect("listener address")
        );
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let body = body.into();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                serve(stream, status, &body, &recorded);
            }
        });
        Self { url, requests }
    }

    /// Base URL of the server.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

/// Record one request, then answer it. Recording first means a client that
/// has seen the response also sees its request in the log.
fn serve(
    stream: TcpStream,
    status: u16,
    body: &str,
    log: &Mutex<Vec<RecordedRequest>>,
) -> Option<()> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end().to_ascii_lowercase();
        if header.is_empty() {
            break;
        }
        headers.push(header);
    }
    let length = headers
        .iter()
        .find_map(|header| header.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut payload = vec![0; length];
    reader.read_exact(&mut payload).ok()?;
    log.lock().expect("request log").push(RecordedRequest {
        line: line.trim_end().to_owned(),
        headers,
        body: String::from_utf8_lossy(&payload).into_owned(),
    });

    let response = format!(
        "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()
}

/// A GeoJSON directions response with `points` positions along a loop.
pub fn ors_loop_body(distance_m: f64, points: usize) -> String {
    let coordinates: Vec<String> = (0..points)
        .map(|i| {
            let offset = i as f64 * 0.001;
            format!("[{}, {}, {}]", 18.07 + offset, 59.33 + offset, 10.0 + i as f64)
        })
        .collect();
    format!(
        r#"{{"type": "FeatureCollection", "features": [{{"type": "Feature",
            "properties": {{"ascent": 14.0, "descent": 14.0, "summary": {{"distance": {distance_m}, "duration": 3600.0}}}},
            "geometry": {{"type": "LineString", "coordinates": [{}]}}}}]}}"#,
        coordinates.join(", ")
    )
}
