//! Telegram Bot API channel: a direct HTTP destination for fan-out lines.
//!
//! One `sendMessage` request per line, text carried percent-encoded in the
//! query string. No retries; the caller logs failures and moves on.

use hermod_types::config::TelegramConfig;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

/// Upper bound for a single `sendMessage` request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub type TelegramError = Box<dyn std::error::Error + Send + Sync>;

/// Telegram Bot API channel.
pub struct TelegramChannel {
    /// SECURITY: Bot token is zeroized on drop to prevent memory disclosure.
    token: Zeroizing<String>,
    chat_id: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: String, chat_id: String, api_base: String) -> Self {
        Self {
            token: Zeroizing::new(token),
            chat_id,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the channel if both token and chat id are configured.
    pub fn from_config(config: &TelegramConfig) -> Option<Self> {
        if config.token.is_empty() || config.chat_id.is_empty() {
            return None;
        }
        Some(Self::new(
            config.token.clone(),
            config.chat_id.clone(),
            config.api_base.clone(),
        ))
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Call `sendMessage` on the Telegram API.
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token.as_str());
        let resp = self
            .client
            .get(&url)
            .query(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            // The URL carries the bot token.
            .map_err(|e| e.without_url())?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Telegram sendMessage failed ({status}): {body}").into());
        }
        debug!(chat_id = %self.chat_id, "Telegram sendMessage ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn serve(status: axum::http::StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/bottest-token/sendMessage",
                get(
                    move |State(captured): State<Captured>,
                          Query(params): Query<HashMap<String, String>>| async move {
                        captured.lock().unwrap().push(params);
                        status
                    },
                ),
            )
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    #[test]
    fn test_from_config_requires_token_and_chat() {
        let mut config = TelegramConfig {
            token: "abc".to_string(),
            ..TelegramConfig::default()
        };
        assert!(TelegramChannel::from_config(&config).is_none());
        config.chat_id = "-100".to_string();
        let channel = TelegramChannel::from_config(&config).unwrap();
        assert_eq!(channel.chat_id(), "-100");
    }

    #[tokio::test]
    async fn test_send_message_encodes_text() {
        let (base, captured) = serve(axum::http::StatusCode::OK).await;
        let channel = TelegramChannel::new("test-token".into(), "-100".into(), base);

        channel
            .send_message("[WA] Al: 50% off & free?")
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].get("chat_id").map(String::as_str), Some("-100"));
        assert_eq!(
            captured[0].get("text").map(String::as_str),
            Some("[WA] Al: 50% off & free?")
        );
    }

    #[tokio::test]
    async fn test_send_message_reports_http_failure() {
        let (base, _) = serve(axum::http::StatusCode::BAD_REQUEST).await;
        let channel = TelegramChannel::new("test-token".into(), "-100".into(), base);
        assert!(channel.send_message("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let channel =
            TelegramChannel::new("secret-token".into(), "-100".into(), format!("http://{addr}"));

        let err = channel.send_message("hello").await.unwrap_err();
        assert!(!format!("{err} {err:?}").contains("secret-token"));
    }
}
