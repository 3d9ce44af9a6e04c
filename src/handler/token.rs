use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::error::{ConfigError, HandlerError};
use crate::types::EnvironmentTarget;

/// Something that can hand out a key-claim token for an environment.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn claim_token(&self, target: &EnvironmentTarget<'_>) -> Result<String, HandlerError>;
}

/// Claims tokens over HTTP. Built once per process and reused.
pub struct TokenClient {
    client: Client,
}

impl TokenClient {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TokenSource for TokenClient {
    /// POST with an empty body; one attempt, no retry.
    async fn claim_token(&self, target: &EnvironmentTarget<'_>) -> Result<String, HandlerError> {
        debug!(environment = %target.environment, "claiming token");

        let response = self
            .client
            .post(target.claim_url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", target.bearer.expose_secret()),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HandlerError::UpstreamUnavailable(format!(
                "{} claim endpoint returned {status}",
                target.environment
            )));
        }

        let body = response.text().await?;
        Ok(trim_token(&body).to_string())
    }
}

/// Drop a single trailing newline, if any.
pub fn trim_token(body: &str) -> &str {
    body.strip_suffix('\n').unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Environment;
    use secrecy::SecretString;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve one canned response; the handle yields the raw request head.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/new-key-claim", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    fn client() -> TokenClient {
        TokenClient::new(Duration::from_secs(5)).unwrap()
    }

    fn target<'a>(url: &'a str, bearer: &'a SecretString) -> EnvironmentTarget<'a> {
        EnvironmentTarget {
            environment: Environment::Demo,
            claim_url: url,
            bearer,
        }
    }

    #[test]
    fn trims_exactly_one_trailing_newline() {
        assert_eq!(trim_token("abc123\n"), "abc123");
        assert_eq!(trim_token("abc123\n\n"), "abc123\n");
        assert_eq!(trim_token("abc123"), "abc123");
        assert_eq!(trim_token("abc 123 "), "abc 123 ");
        assert_eq!(trim_token(""), "");
        assert_eq!(trim_token(trim_token("xyz")), "xyz");
    }

    #[tokio::test]
    async fn posts_bearer_and_returns_trimmed_body() {
        let (url, server) = serve_once(http_response("200 OK", "abc123\n")).await;
        let bearer = SecretString::from("demo-secret".to_string());

        let token = client().claim_token(&target(&url, &bearer)).await.unwrap();
        assert_eq!(token, "abc123");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /new-key-claim HTTP/1.1\r\n"), "{request}");
        assert!(
            request
                .to_ascii_lowercase()
                .contains("authorization: bearer demo-secret\r\n"),
            "{request}"
        );
    }

    #[tokio::test]
    async fn body_without_newline_is_returned_as_is() {
        let (url, server) = serve_once(http_response("200 OK", "xyz")).await;
        let bearer = SecretString::from("s".to_string());

        let token = client().claim_token(&target(&url, &bearer)).await.unwrap();
        assert_eq!(token, "xyz");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_failure() {
        let (url, server) = serve_once(http_response("500 Internal Server Error", "boom")).await;
        let bearer = SecretString::from("s".to_string());

        let err = client().claim_token(&target(&url, &bearer)).await.unwrap_err();
        assert!(matches!(err, HandlerError::UpstreamUnavailable(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unauthorized_upstream_is_upstream_failure() {
        let (url, server) = serve_once(http_response("401 Unauthorized", "")).await;
        let bearer = SecretString::from("wrong".to_string());

        let err = client().claim_token(&target(&url, &bearer)).await.unwrap_err();
        assert!(matches!(err, HandlerError::UpstreamUnavailable(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused_is_upstream_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/new-key-claim", listener.local_addr().unwrap());
        drop(listener);
        let bearer = SecretString::from("s".to_string());

        let err = client().claim_token(&target(&url, &bearer)).await.unwrap_err();
        assert!(matches!(err, HandlerError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn silent_upstream_times_out() {
        // Accepted by the kernel backlog but never answered.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/new-key-claim", listener.local_addr().unwrap());
        let bearer = SecretString::from("s".to_string());
        let client = TokenClient::new(Duration::from_millis(200)).unwrap();

        let err = client.claim_token(&target(&url, &bearer)).await.unwrap_err();
        match err {
            HandlerError::UpstreamUnavailable(detail) => {
                assert!(detail.contains("timed out"), "{detail}")
            }
            other => panic!("expected upstream failure, got {other:?}"),
        }
        drop(listener);
    }
}
