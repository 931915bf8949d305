use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use crate::api::Request;
use crate::error::TransportError;

/// Sends one request and hands back the decoded JSON payload.
///
/// Implementations must not retry: one `send` is one outbound request.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: Request) -> Result<Value, TransportError>;
}

#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl From<reqwest::Client> for HttpTransport {
    fn from(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        response_body(status, body)
    }
}

pub fn response_body(status: StatusCode, body: String) -> Result<Value, TransportError> {
    if !status.is_success() {
        return Err(TransportError::Status { status, body });
    }

    match serde_json::from_str(body.as_str()) {
        Ok(value) => Ok(value),
        Err(source) => Err(TransportError::Json { source, body }),
    }
}

#[cfg(test)]
mod tests {
    use super::{response_body, HttpTransport, Transport};
    use crate::api::{build_request, Endpoint, Params};
    use crate::error::TransportError;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use url::Url;

    fn transport() -> HttpTransport {
        reqwest::Client::builder().no_proxy().build().unwrap().into()
    }

    fn header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    /// Answers a single connection with `status` and `body`, returning the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = header_end(&buf) {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .map(|v| v.trim().parse::<usize>().unwrap())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8(buf).unwrap()
        });

        (Url::parse(&format!("http://{}/", addr)).unwrap(), handle)
    }

    #[tokio::test]
    async fn post_over_http() {
        let (base, server) = serve_once("200 OK", r#"{"deposit":"d1"}"#).await;
        let params = Params::new().with("withdrawTo", "X").with("pair", "btc_ltc");
        let request = build_request(&base, Endpoint::Shift, &params).unwrap();

        let value = transport().send(request).await.unwrap();
        assert_eq!(value, json!({ "deposit": "d1" }));

        let raw = server.await.unwrap();
        let end = header_end(raw.as_bytes()).unwrap();
        let head = raw[..end].to_lowercase();
        assert!(head.starts_with("post /shift http/1.1"));
        assert!(head.contains("user-agent: shapeshift-rs"));
        assert!(head.contains("content-type: application/json"));

        let body: Value = serde_json::from_str(&raw[end + 4..]).unwrap();
        assert_eq!(
            body,
            json!({
                "withdrawTo": "X",
                "pair": "btc_ltc",
                "returnAddress": "",
                "apiKey": "",
            })
        );
    }

    #[tokio::test]
    async fn get_over_http() {
        let (base, server) = serve_once("200 OK", r#"{"pair":"btc_eth","rate":"32.1"}"#).await;
        let request =
            build_request(&base, Endpoint::Rate, &Params::new().with("pair", "btc_eth")).unwrap();

        let value = transport().send(request).await.unwrap();
        assert_eq!(value, json!({ "pair": "btc_eth", "rate": "32.1" }));

        let raw = server.await.unwrap().to_lowercase();
        assert!(raw.starts_with("get /rate/btc_eth http/1.1"));
        assert!(raw.contains("user-agent: shapeshift-rs"));
    }

    #[tokio::test]
    async fn error_status_over_http() {
        let (base, server) = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#).await;
        let request = build_request(&base, Endpoint::CoinInfo, &Params::new()).unwrap();

        let err = transport().send(request).await.unwrap_err();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, r#"{"error":"busy"}"#);
            }
            e => panic!("unexpected {:?}", e),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused() {
        let base = Url::parse("http://127.0.0.1:1/").unwrap();
        let request = build_request(&base, Endpoint::CoinInfo, &Params::new()).unwrap();

        let err = transport().send(request).await.unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }

    #[test]
    fn ok_body_passes_through() {
        let value = response_body(
            StatusCode::OK,
            r#"{"pair":"btc_eth","rate":"32.1","extra":[1,2]}"#.to_string(),
        )
        .unwrap();

        assert_eq!(
            value,
            json!({ "pair": "btc_eth", "rate": "32.1", "extra": [1, 2] })
        );
    }

    #[test]
    fn other_success_codes_accepted() {
        let value = response_body(StatusCode::CREATED, "[]".to_string()).unwrap();
        assert_eq!(value, json!([]));
    }

    #[test]
    fn error_status() {
        let err = response_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"down"}"#.to_string(),
        )
        .unwrap_err();

        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, r#"{"error":"down"}"#);
            }
            e => panic!("unexpected {:?}", e),
        }
    }

    #[test]
    fn malformed_json() {
        let err = response_body(StatusCode::OK, "<html>".to_string()).unwrap_err();

        match err {
            TransportError::Json { body, .. } => assert_eq!(body, "<html>"),
            e => panic!("unexpected {:?}", e),
        }
    }

    #[test]
    fn empty_body_is_a_failure() {
        let err = response_body(StatusCode::OK, String::new()).unwrap_err();
        assert!(matches!(err, TransportError::Json { .. }));
    }
}
