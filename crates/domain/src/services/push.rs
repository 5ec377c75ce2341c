//! Push gateway abstraction.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Outcome of a single push delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Delivered to the gateway.
    Sent,
    /// The gateway rejected the token; the device should re-register.
    InvalidToken,
    /// Delivery failed for another reason.
    Failed(String),
}

impl PushOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, PushOutcome::Sent)
    }
}

/// Push sender: one device token, one message. Never returns an error type;
/// every outcome is data so callers can tolerate partial failure per token.
#[async_trait::async_trait]
pub trait PushSender: Send + Sync {
    async fn send_alert(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> PushOutcome;
}

/// A push recorded by [`MockPushSender`].
#[derive(Debug, Clone)]
pub struct SentPush {
    pub device_token: String,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

/// Mock push sender for development and testing.
///
/// Records every attempt; tokens registered via [`fail_token`] report a
/// simulated failure instead of success.
///
/// [`fail_token`]: MockPushSender::fail_token
#[derive(Debug, Default)]
pub struct MockPushSender {
    sent: Mutex<Vec<SentPush>>,
    failing: Mutex<HashSet<String>>,
}

impl MockPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future attempt against this token fail.
    pub fn fail_token(&self, token: &str) {
        self.failing.lock().unwrap().insert(token.to_string());
    }

    /// All attempts recorded so far, including failed ones.
    pub fn attempts(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PushSender for MockPushSender {
    async fn send_alert(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> PushOutcome {
        self.sent.lock().unwrap().push(SentPush {
            device_token: device_token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data: data.clone(),
        });

        if self.failing.lock().unwrap().contains(device_token) {
            tracing::warn!(device_token, "mock push sender simulating failure");
            return PushOutcome::Failed("simulated failure".to_string());
        }

        tracing::debug!(device_token, title, "mock push sender: would deliver");
        PushOutcome::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_attempts() {
        let sender = MockPushSender::new();
        let data = HashMap::from([("vendorId".to_string(), "v1".to_string())]);

        let outcome = sender.send_alert("tok-1", "title", "body", &data).await;
        assert!(outcome.is_sent());
        assert_eq!(sender.attempt_count(), 1);
        assert_eq!(sender.attempts()[0].device_token, "tok-1");
        assert_eq!(sender.attempts()[0].data["vendorId"], "v1");
    }

    #[tokio::test]
    async fn test_mock_failing_token_still_recorded() {
        let sender = MockPushSender::new();
        sender.fail_token("bad");

        let outcome = sender
            .send_alert("bad", "title", "body", &HashMap::new())
            .await;
        assert!(matches!(outcome, PushOutcome::Failed(_)));
        assert_eq!(sender.attempt_count(), 1);
    }
}
