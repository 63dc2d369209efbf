//! Fetching the JSON payload over HTTP.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Header carrying the static API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Issues a single GET per call. No retries; timeouts and redirects are the
/// client's defaults.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Fetcher { client })
    }

    pub fn with_client(client: Client) -> Self {
        Fetcher { client }
    }

    /// GET `url` with the API key header and parse the body as JSON.
    pub fn fetch(&self, url: &str, api_key: &str) -> Result<Value> {
        info!(url, "fetching payload");

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes()?;
        debug!(bytes = body.len(), status = status.as_u16(), "received response body");
        parse_json(&body)
    }
}

/// Fetch with a fresh client
pub fn fetch(url: &str, api_key: &str) -> Result<Value> {
    Fetcher::new()?.fetch(url, api_key)
}

/// Parse a JSON document, trying the SIMD parser first.
///
/// simd-json rewrites its input buffer, so it parses a scratch copy and the
/// serde_json fallback (which supplies the reported error) sees the original.
pub fn parse_json(bytes: &[u8]) -> Result<Value> {
    let mut scratch = bytes.to_vec();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_json::from_slice(bytes)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one canned response and hand back the raw request text.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}/lots", addr), handle)
    }

    #[test]
    fn test_fetch_sends_api_key_and_parses_body() {
        let (url, server) = serve_once("200 OK", r#"[{"id": 1, "tags": ["a"]}]"#);

        let value = fetch(&url, "secret").unwrap();
        let request = server.join().unwrap().to_ascii_lowercase();

        assert_eq!(value, json!([{"id": 1, "tags": ["a"]}]));
        assert!(request.starts_with("get /lots"));
        assert!(request.contains("x-api-key: secret"));
    }

    #[test]
    fn test_fetch_with_configured_client() {
        let (url, server) = serve_once("200 OK", r#"{"id": 9}"#);
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();

        let value = Fetcher::with_client(client).fetch(&url, "other-key").unwrap();
        let request = server.join().unwrap().to_ascii_lowercase();

        assert_eq!(value, json!({"id": 9}));
        assert!(request.contains("x-api-key: other-key"));
    }

    #[test]
    fn test_non_success_status_is_http_error() {
        let (url, server) = serve_once("404 Not Found", r#"{"message": "missing"}"#);

        let err = fetch(&url, "secret").unwrap_err();
        server.join().unwrap();

        match err {
            Error::Http { status, reason } => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Not Found");
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_body_is_parse_error() {
        let (url, server) = serve_once("200 OK", "<html>not json</html>");

        let err = fetch(&url, "secret").unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let err = fetch(&format!("http://127.0.0.1:{}/", port), "secret").unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_parse_json_scalars_and_escapes() {
        assert_eq!(parse_json(b"42").unwrap(), json!(42));
        assert_eq!(parse_json(br#"{"a": "x\"y"}"#).unwrap(), json!({"a": "x\"y"}));
        assert!(parse_json(b"").is_err());
    }
}
