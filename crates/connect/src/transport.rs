//! reqwest-backed implementation of the core HTTP transport port.

use std::time::Duration;

use async_trait::async_trait;
use homebase_core::net::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError, TransportErrorKind,
};
use log::debug;

use crate::error::Result;

/// Applied when a request carries no timeout of its own.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

fn classify(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::CannotConnect
    } else if err.is_request() || err.is_body() {
        TransportErrorKind::ConnectionLost
    } else {
        TransportErrorKind::Other
    }
}

fn to_transport_error(err: reqwest::Error) -> TransportError {
    TransportError::new(classify(&err), err.to_string())
}

fn to_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client (custom TLS roots, proxies).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn log_response(method: HttpMethod, url: &str, status: u16, body: &str) {
        if (200..300).contains(&status) {
            debug!("[Connect] {} {} -> {}", method.as_str(), url, status);
            return;
        }
        let preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        debug!(
            "[Connect] {} {} -> {}: {}",
            method.as_str(),
            url,
            status,
            preview
        );
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;

        let mut builder = self.client.request(to_method(method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(to_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(to_transport_error)?;
        Self::log_response(method, &url, status, &body);

        Ok(HttpResponse::new(status, body))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Debug, Clone)]
    pub(crate) struct CapturedRequest {
        pub request_line: String,
        pub headers: HashMap<String, String>,
        pub body: String,
    }

    #[derive(Debug, Clone)]
    pub(crate) enum MockOutcome {
        DropConnection,
        Respond {
            status: u16,
            body: String,
            delay_ms: u64,
        },
    }

    impl MockOutcome {
        pub(crate) fn ok(status: u16, body: &str) -> Self {
            Self::Respond {
                status,
                body: body.to_string(),
                delay_ms: 0,
            }
        }
    }

    /// Parse one request off the socket: request line, headers, then exactly
    /// `Content-Length` bytes of body.
    async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await.ok()? == 0 {
            return None;
        }

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.ok()? == 0 {
                return None;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':')?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        let length = headers
            .get("content-length")
            .map_or(Some(0), |v| v.parse::<usize>().ok())?;
        let mut body = vec![0_u8; length];
        reader.read_exact(&mut body).await.ok()?;

        Some(CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(body).ok()?,
        })
    }

    async fn write_http_response(
        stream: &mut tokio::net::TcpStream,
        status: u16,
        body: &str,
    ) -> std::io::Result<()> {
        let response = format!(
            "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.flush().await
    }

    pub(crate) async fn start_mock_server(
        outcomes: Vec<MockOutcome>,
    ) -> (
        String,
        Arc<TokioMutex<Vec<CapturedRequest>>>,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(TokioMutex::new(Vec::<CapturedRequest>::new()));
        let scripted = Arc::new(TokioMutex::new(VecDeque::from(outcomes)));
        let captured_clone = Arc::clone(&captured);

        let handle = tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(value) => value,
                    Err(_) => break,
                };
                let captured_inner = Arc::clone(&captured_clone);
                let scripted_inner = Arc::clone(&scripted);
                tokio::spawn(async move {
                    let Some(request) = read_http_request(&mut stream).await else {
                        return;
                    };
                    captured_inner.lock().await.push(request);

                    let outcome = scripted_inner
                        .lock()
                        .await
                        .pop_front()
                        .unwrap_or(MockOutcome::ok(500, r#"{"message":"unexpected request"}"#));

                    match outcome {
                        MockOutcome::DropConnection => {}
                        MockOutcome::Respond {
                            status,
                            body,
                            delay_ms,
                        } => {
                            if delay_ms > 0 {
                                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                            }
                            let _ = write_http_response(&mut stream, status, &body).await;
                        }
                    }
                });
            }
        });

        (format!("http://{}", addr), captured, handle)
    }

    #[tokio::test]
    async fn forwards_method_headers_and_body() {
        let (base_url, captured, server) =
            start_mock_server(vec![MockOutcome::ok(201, r#"{"ok":true}"#)]).await;
        let transport = ReqwestTransport::new().expect("client");

        let request = HttpRequest::post(format!("{}/api/auth/login", base_url))
            .json(&serde_json::json!({ "phone": "+1", "password": "pw" }))
            .expect("json")
            .bearer("tok");
        let response = transport.execute(request).await.expect("response");

        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"{"ok":true}"#);
        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].request_line.starts_with("POST /api/auth/login"));
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer tok")
        );
        assert_eq!(requests[0].body, r#"{"password":"pw","phone":"+1"}"#);
        server.abort();
    }

    #[tokio::test]
    async fn error_statuses_are_returned_as_responses() {
        let (base_url, _captured, server) =
            start_mock_server(vec![MockOutcome::ok(503, "down")]).await;
        let transport = ReqwestTransport::new().expect("client");

        let response = transport
            .execute(HttpRequest::get(format!("{}/api/auth/me", base_url)))
            .await
            .expect("response");

        assert_eq!(response.status, 503);
        assert!(!response.is_success());
        server.abort();
    }

    #[tokio::test]
    async fn slow_server_maps_to_timeout() {
        let (base_url, _captured, server) = start_mock_server(vec![MockOutcome::Respond {
            status: 200,
            body: "{}".to_string(),
            delay_ms: 2_000,
        }])
        .await;
        let transport = ReqwestTransport::new().expect("client");

        let err = transport
            .execute(
                HttpRequest::get(format!("{}/slow", base_url)).timeout(Duration::from_millis(100)),
            )
            .await
            .expect_err("timeout");

        assert_eq!(err.kind, TransportErrorKind::Timeout);
        server.abort();
    }

    #[tokio::test]
    async fn dropped_connection_is_transient() {
        let (base_url, _captured, server) =
            start_mock_server(vec![MockOutcome::DropConnection]).await;
        let transport = ReqwestTransport::new().expect("client");

        let err = transport
            .execute(HttpRequest::get(format!("{}/drop", base_url)))
            .await
            .expect_err("connection dropped");

        let network: homebase_core::errors::NetworkError = err.into();
        assert!(network.is_transient(), "got {:?}", network);
        server.abort();
    }

    #[tokio::test]
    async fn refused_connection_maps_to_cannot_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let transport = ReqwestTransport::new().expect("client");

        let err = transport
            .execute(HttpRequest::get(format!("http://{}/", addr)))
            .await
            .expect_err("refused");

        assert_eq!(err.kind, TransportErrorKind::CannotConnect);
    }
}
