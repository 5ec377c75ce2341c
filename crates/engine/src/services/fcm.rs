//! Firebase Cloud Messaging push sender.
//!
//! Implements the PushSender trait over the FCM HTTP v1 API. Alerts go out
//! with a visible notification block plus string data for the client app.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use domain::services::{PushOutcome, PushSender};

use crate::config::FcmConfig;
use crate::services::google_auth::{GoogleAuthError, GoogleTokenProvider, ServiceAccountCredentials};

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

pub struct FcmPushSender {
    client: Client,
    config: FcmConfig,
    tokens: GoogleTokenProvider,
}

/// FCM v1 API message structure.
#[derive(Debug, Serialize)]
struct FcmMessage {
    message: MessagePayload,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    token: String,
    notification: NotificationBlock,
    data: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    android: Option<AndroidConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apns: Option<ApnsConfig>,
}

#[derive(Debug, Serialize)]
struct NotificationBlock {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct AndroidConfig {
    priority: String,
}

#[derive(Debug, Serialize)]
struct ApnsConfig {
    headers: ApnsHeaders,
}

#[derive(Debug, Serialize)]
struct ApnsHeaders {
    #[serde(rename = "apns-priority")]
    priority: String,
}

/// FCM API error response.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct FcmErrorResponse {
    error: FcmErrorDetails,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct FcmErrorDetails {
    message: String,
    status: String,
}

/// Error type for FCM operations.
#[derive(Debug, thiserror::Error)]
pub enum FcmError {
    #[error("Auth error: {0}")]
    Auth(#[from] GoogleAuthError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FCM API error: {0}")]
    Api(String),

    #[error("Invalid FCM token")]
    InvalidToken,

    #[error("FCM is not enabled")]
    NotEnabled,
}

impl FcmPushSender {
    /// Create a new FCM push sender.
    ///
    /// # Errors
    /// Returns an error if FCM is disabled or credentials cannot be parsed.
    pub fn new(config: FcmConfig) -> Result<Self, FcmError> {
        if !config.enabled {
            return Err(FcmError::NotEnabled);
        }

        let credentials = ServiceAccountCredentials::load(&config.credentials)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            tokens: GoogleTokenProvider::new(credentials, FCM_SCOPE),
        })
    }

    async fn send_message(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<(), FcmError> {
        let access_token = self.tokens.access_token(&self.client).await?;

        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.config.project_id
        );

        let message = FcmMessage {
            message: MessagePayload {
                token: device_token.to_string(),
                notification: NotificationBlock {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                data: data.clone(),
                android: if self.config.high_priority {
                    Some(AndroidConfig {
                        priority: "high".to_string(),
                    })
                } else {
                    None
                },
                apns: if self.config.high_priority {
                    Some(ApnsConfig {
                        headers: ApnsHeaders {
                            priority: "10".to_string(),
                        },
                    })
                } else {
                    None
                },
            },
        };

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 100ms, 200ms, 400ms, ...
                tokio::time::sleep(Duration::from_millis(100 * (1 << (attempt - 1)))).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&access_token)
                .json(&message)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    if resp.status().is_success() {
                        tracing::debug!(
                            device_token = %device_token,
                            attempt = %attempt,
                            "FCM message sent"
                        );
                        return Ok(());
                    }

                    let status = resp.status();
                    if status.as_u16() == 404 || status.as_u16() == 400 {
                        // Stale or malformed token, no point retrying
                        let error_text = resp.text().await.unwrap_or_default();
                        if error_text.contains("UNREGISTERED")
                            || error_text.contains("INVALID_ARGUMENT")
                        {
                            return Err(FcmError::InvalidToken);
                        }
                        return Err(FcmError::Api(error_text));
                    }

                    if status.is_server_error() {
                        let error_text = resp.text().await.unwrap_or_default();
                        last_error = Some(FcmError::Api(error_text));
                        continue;
                    }

                    let error_text = resp.text().await.unwrap_or_default();
                    return Err(FcmError::Api(error_text));
                }
                Err(e) => {
                    last_error = Some(FcmError::Http(e));
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FcmError::Api("Unknown error".to_string())))
    }
}

#[async_trait::async_trait]
impl PushSender for FcmPushSender {
    async fn send_alert(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> PushOutcome {
        match self.send_message(device_token, title, body, data).await {
            Ok(()) => PushOutcome::Sent,
            Err(FcmError::InvalidToken) => {
                tracing::warn!(
                    device_token = %device_token,
                    "Invalid FCM token, device should re-register"
                );
                PushOutcome::InvalidToken
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    device_token = %device_token,
                    "Failed to send proximity alert"
                );
                PushOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcm_not_enabled_error() {
        let config = FcmConfig {
            enabled: false,
            ..Default::default()
        };
        let result = FcmPushSender::new(config);
        assert!(matches!(result, Err(FcmError::NotEnabled)));
    }

    #[test]
    fn test_fcm_bad_credentials_error() {
        let config = FcmConfig {
            enabled: true,
            project_id: "demo".to_string(),
            credentials: "{broken".to_string(),
            ..Default::default()
        };
        let result = FcmPushSender::new(config);
        assert!(matches!(result, Err(FcmError::Auth(_))));
    }

    #[test]
    fn test_fcm_message_serialization() {
        let mut data = HashMap::new();
        data.insert("vendorId".to_string(), "abc".to_string());

        let message = FcmMessage {
            message: MessagePayload {
                token: "test_token".to_string(),
                notification: NotificationBlock {
                    title: "Vendor nearby".to_string(),
                    body: "Taco Cart is 1.2 km away".to_string(),
                },
                data,
                android: Some(AndroidConfig {
                    priority: "high".to_string(),
                }),
                apns: Some(ApnsConfig {
                    headers: ApnsHeaders {
                        priority: "10".to_string(),
                    },
                }),
            },
        };

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("test_token"));
        assert!(json.contains("Vendor nearby"));
        assert!(json.contains("apns-priority"));
    }
}
