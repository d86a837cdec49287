use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use subledger_core::WhatsAppSettings;
use subledger_db::Channel;

use crate::error::{NotifyError, Result};
use crate::template::RenderedMessage;
use crate::Notifier;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts reminders to an HTTP WhatsApp gateway as
/// `{"phone": ..., "message": ...}` with a bearer token. Only a 200 response
/// counts as delivered.
pub struct WhatsAppNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl WhatsAppNotifier {
    pub fn new(settings: &WhatsAppSettings) -> Result<Self> {
        if settings.api_url.trim().is_empty() {
            return Err(NotifyError::NotConfigured("whatsapp"));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim().to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    pub async fn send_test(&self, phone: &str) -> Result<()> {
        let message = RenderedMessage {
            subject: None,
            body: "✅ WhatsApp reminders are configured correctly.".to_string(),
        };
        self.send(phone, &message).await
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    async fn send(&self, recipient: &str, message: &RenderedMessage) -> Result<()> {
        let payload = serde_json::json!({
            "phone": recipient,
            "message": message.body,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = recipient, "WhatsApp message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, answer with `status` and hand back the raw
    /// request text.
    async fn one_shot_server(status: &'static str, reply: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/send", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reply.len(),
                reply
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= split + 4 + length
    }

    fn notifier(url: String) -> WhatsAppNotifier {
        WhatsAppNotifier::new(&WhatsAppSettings {
            api_url: url,
            api_key: "token-123".into(),
            enabled: true,
        })
        .unwrap()
    }

    fn message() -> RenderedMessage {
        RenderedMessage {
            subject: None,
            body: "Your plan ends tomorrow".into(),
        }
    }

    #[tokio::test]
    async fn posts_bearer_token_and_json_body() {
        let (url, server) = one_shot_server("200 OK", "{\"ok\":true}").await;

        notifier(url).send("+919876543210", &message()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /send"));
        assert!(request.to_lowercase().contains("authorization: bearer token-123"));
        assert!(request.to_lowercase().contains("content-type: application/json"));

        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["phone"], "+919876543210");
        assert_eq!(json["message"], "Your plan ends tomorrow");
    }

    #[tokio::test]
    async fn non_200_is_a_failure_with_body() {
        let (url, server) = one_shot_server("500 Internal Server Error", "gateway down").await;

        let err = notifier(url).send("+91", &message()).await.unwrap_err();
        server.await.unwrap();

        match err {
            NotifyError::HttpStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "gateway down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_success_codes_are_failures_too() {
        let (url, server) = one_shot_server("201 Created", "").await;

        let err = notifier(url).send("+91", &message()).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, NotifyError::HttpStatus { status: 201, .. }));
    }

    #[test]
    fn blank_url_is_not_configured() {
        assert!(matches!(
            WhatsAppNotifier::new(&WhatsAppSettings::default()),
            Err(NotifyError::NotConfigured("whatsapp"))
        ));
    }
}
