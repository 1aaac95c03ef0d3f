//! One-shot HTTP server for exercising the dashboard exchange offline.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

pub const DASHBOARD_PATH: &str = "/Dashboard_serverState/serverstate.aspx";

/// Minimal bootstrap page carrying both session-state tokens.
pub fn bootstrap_page() -> String {
    format!(
        r#"<input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="{}" />
<input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="CA0B0334" />"#,
        "A".repeat(76)
    )
}

pub struct MockResponse {
    status: u16,
    reason: &'static str,
    body: String,
    set_cookie: Option<String>,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK",
            body: body.into(),
            set_cookie: None,
        }
    }

    pub fn status(status: u16, reason: &'static str) -> Self {
        Self {
            status,
            reason,
            body: String::new(),
            set_cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.set_cookie = Some(cookie.to_string());
        self
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            concat!(
                "HTTP/1.1 {} {}\r\n",
                "Content-Type: text/html; charset=utf-8\r\n",
                "Content-Length: {}\r\nConnection: close\r\n",
            ),
            self.status,
            self.reason,
            self.body.len()
        );
        if let Some(cookie) = &self.set_cookie {
            head.push_str(&format!("Set-Cookie: {}\r\n", cookie));
        }
        head.push_str("\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}

/// Serves `responses` to successive connections, recording each raw request.
pub struct MockDashboard {
    port: u16,
    handle: JoinHandle<Vec<String>>,
}

impl MockDashboard {
    pub fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let port = listener.local_addr().expect("local addr").port();
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().expect("accept");
                requests.push(read_request(&mut stream));
                stream.write_all(&response.to_bytes()).expect("write response");
                stream.flush().expect("flush response");
            }
            requests
        });
        Self { port, handle }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, DASHBOARD_PATH)
    }

    /// Wait for every response to be served and return the recorded requests.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().expect("mock server thread")
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let body_len = content_length(&text[..end]);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// URL on a local port with nothing listening.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, DASHBOARD_PATH)
}
