use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

/// Where the docs backend listens. The UI mentions this port in its
/// fallback notice, so keep the two in sync.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Clone)]
pub struct DocsClient {
    client: Client,
    base_url: String,
}

impl DocsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Send one question and return the answer text exactly as the
    /// backend produced it. Connection failures, non-2xx statuses and
    /// bodies that are not `{"answer": ...}` all come back as `Err`;
    /// the caller collapses them into a single user-facing notice.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { question })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}",
                response.status()
            ));
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response.answer)
    }
}

#[cfg(test)]
pub mod test_support {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on an ephemeral port and
    /// return the base URL to reach it.
    pub async fn serve_once(status_line: &'static str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let reply = format!(
                    "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = socket.write_all(reply.as_bytes()).await;
            }
        });

        format!("http://{}", addr)
    }

    /// A URL nothing listens on: bind an ephemeral port, then drop it.
    pub fn unreachable_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{serve_once, unreachable_url};
    use super::*;

    #[tokio::test]
    async fn test_ask_returns_answer_verbatim() {
        let base = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"answer":"It is a routing paradigm."}"#,
        )
        .await;

        let client = DocsClient::new(&base);
        let answer = client.ask("What is App Router?").await.unwrap();
        assert_eq!(answer, "It is a routing paradigm.");
    }

    #[tokio::test]
    async fn test_ask_keeps_extra_fields_out_of_the_answer() {
        let body = serde_json::json!({"answer": "plain", "sources": ["a.md"]}).to_string();
        let base = serve_once("HTTP/1.1 200 OK", &body).await;

        let client = DocsClient::new(&base);
        assert_eq!(client.ask("q").await.unwrap(), "plain");
    }

    #[tokio::test]
    async fn test_ask_rejects_malformed_body() {
        let base = serve_once("HTTP/1.1 200 OK", r#"{"reply":"nope"}"#).await;

        let client = DocsClient::new(&base);
        assert!(client.ask("test").await.is_err());
    }

    #[tokio::test]
    async fn test_ask_rejects_error_status() {
        let base = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;

        let client = DocsClient::new(&base);
        assert!(client.ask("test").await.is_err());
    }

    #[tokio::test]
    async fn test_ask_fails_when_nothing_listens() {
        let client = DocsClient::new(&unreachable_url());
        assert!(client.ask("test").await.is_err());
    }
}
