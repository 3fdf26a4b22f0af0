//! Test doubles: an in-memory site, a local HTTP server and a log capture

use super::client::{ListItem, SiteAccess};
use super::error::{Result, SharePointError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
pub struct MockSite {
    pub site_path: String,
    pub title: String,
    pub files: HashMap<String, Vec<u8>>,
    pub lists: HashMap<String, Vec<ListItem>>,
    /// Every remote call, in order
    pub calls: Mutex<Vec<String>>,
}

impl MockSite {
    pub fn new(site_path: &str) -> Self {
        MockSite {
            site_path: site_path.to_string(),
            title: "Data Analytics".to_string(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), bytes.into());
        self
    }

    pub fn with_list(mut self, title: &str, items: Value) -> Self {
        let items = match items {
            Value::Array(values) => values
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        self.lists.insert(title.to_string(), items);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SiteAccess for MockSite {
    fn site_path(&self) -> &str {
        &self.site_path
    }

    async fn web_title(&self) -> Result<String> {
        self.record("web_title".to_string());
        Ok(self.title.clone())
    }

    async fn open_binary(&self, server_relative_url: &str) -> Result<Vec<u8>> {
        self.record(format!("open_binary {}", server_relative_url));
        self.files
            .get(server_relative_url)
            .cloned()
            .ok_or_else(|| SharePointError::Remote {
                status: 404,
                message: format!("File Not Found: {}", server_relative_url),
            })
    }

    async fn list_items(&self, list_title: &str) -> Result<Vec<ListItem>> {
        self.record(format!("list_items {}", list_title));
        self.lists
            .get(list_title)
            .cloned()
            .ok_or_else(|| SharePointError::Remote {
                status: 404,
                message: format!("List '{}' does not exist", list_title),
            })
    }
}

/// A request as seen by [`FakeServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query exactly as sent
    pub target: String,
    /// Lower-cased names
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Canned reply for [`FakeServer`]
#[derive(Debug, Clone)]
pub struct CannedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl CannedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        CannedResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::new(status, body).with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} Canned\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.body.len()
        ));
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// HTTP/1.1 server on a loopback port, one request per connection
///
/// Every request is recorded, then answered by the routing closure.
pub struct FakeServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeServer {
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&RecordedRequest) -> CannedResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let route = Arc::new(route);
        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let route = Arc::clone(&route);
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let _ = serve(stream, route.as_ref(), &log).await;
                });
            }
        });

        FakeServer { addr, requests }
    }

    /// Absolute URL for a path on this server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// First recorded request to `path` (query ignored)
    pub fn request_to(&self, path: &str) -> Option<RecordedRequest> {
        self.requests().into_iter().find(|r| r.path() == path)
    }
}

async fn serve<F>(
    mut stream: TcpStream,
    route: &F,
    log: &Mutex<Vec<RecordedRequest>>,
) -> io::Result<()>
where
    F: Fn(&RecordedRequest) -> CannedResponse,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_lowercase(), value.trim().to_string()))
        .collect();

    let length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(head_end + length);
    let body = String::from_utf8_lossy(&buf[head_end..body_end]).into_owned();

    let request = RecordedRequest {
        method,
        target,
        headers,
        body,
    };
    let response = route(&request);
    log.lock().unwrap().push(request);

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await
}

/// Log output captured from the current thread
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route `tracing` events on this thread into a buffer until the guard drops
///
/// Use with the single-threaded `#[tokio::test]` runtime so every await
/// stays on the capturing thread.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}
