//! Firebase Realtime Database live-location source.
//!
//! Reads vendor and user positions over the RTDB REST API. Clients write
//! these nodes in a few historical shapes, so parsing is lenient: `lat`/`lng`,
//! `latitude`/`longitude`, nested `location`/`coords` objects, or an
//! `l: [lat, lng]` array all work. Entries that fail to parse are dropped.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

use domain::models::{Position, VendorLivePosition};
use domain::services::LiveLocationSource;

use crate::config::RtdbConfig;
use crate::services::google_auth::{GoogleAuthError, GoogleTokenProvider, ServiceAccountCredentials};

const RTDB_SCOPES: &str = "https://www.googleapis.com/auth/firebase.database https://www.googleapis.com/auth/userinfo.email";

pub struct FirebaseRtdbSource {
    client: Client,
    config: RtdbConfig,
    tokens: GoogleTokenProvider,
}

impl FirebaseRtdbSource {
    pub fn new(config: RtdbConfig) -> Result<Self, GoogleAuthError> {
        let credentials = ServiceAccountCredentials::load(&config.credentials)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            tokens: GoogleTokenProvider::new(credentials, RTDB_SCOPES),
        })
    }

    /// GET a node as JSON. Returns Null when the node is absent.
    async fn read_node(&self, path: &str) -> Result<Value, GoogleAuthError> {
        let access_token = self.tokens.access_token(&self.client).await?;

        let url = format!(
            "{}/{}.json",
            self.config.database_url.trim_end_matches('/'),
            path
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::Token(format!(
                "RTDB read failed: {}",
                error_text
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl LiveLocationSource for FirebaseRtdbSource {
    async fn current_vendor_positions(&self) -> Vec<VendorLivePosition> {
        let node = match self.read_node(&self.config.vendor_location_path).await {
            Ok(v) => v,
            Err(e) => {
                // Live reads are best-effort; a failed poll cycle just
                // re-reads on the next tick.
                tracing::warn!(error = %e, "Failed to read vendor live positions");
                return Vec::new();
            }
        };

        let Value::Object(entries) = node else {
            return Vec::new();
        };

        entries
            .into_iter()
            .filter_map(|(key, value)| {
                let Ok(vendor_id) = Uuid::parse_str(&key) else {
                    tracing::debug!(key = %key, "Discarding vendor entry with non-UUID key");
                    return None;
                };
                let Some(position) = normalize_position(&value) else {
                    tracing::debug!(vendor_id = %vendor_id, "Discarding vendor entry with unusable coordinates");
                    return None;
                };
                Some(VendorLivePosition {
                    vendor_id,
                    position,
                })
            })
            .collect()
    }

    async fn current_user_position(&self, user_id: Uuid) -> Option<Position> {
        let path = format!("{}/{}", self.config.user_location_path, user_id);
        match self.read_node(&path).await {
            Ok(node) => normalize_position(&node),
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Failed to read user live position");
                None
            }
        }
    }
}

/// Extract a valid position from the assorted node shapes clients write.
fn normalize_position(value: &Value) -> Option<Position> {
    let obj = value.as_object()?;

    // l: [lat, lng]
    if let Some(Value::Array(pair)) = obj.get("l") {
        if pair.len() == 2 {
            if let Some(p) = Position::from_parts(as_f64(&pair[0]), as_f64(&pair[1])) {
                return Some(p);
            }
        }
    }

    let lat = obj
        .get("lat")
        .or_else(|| obj.get("latitude"))
        .and_then(as_f64);
    let lng = obj
        .get("lng")
        .or_else(|| obj.get("lon"))
        .or_else(|| obj.get("longitude"))
        .and_then(as_f64);

    if let Some(p) = Position::from_parts(lat, lng) {
        return Some(p);
    }

    // Nested location / coords object
    for nested_key in ["location", "coords"] {
        if let Some(nested) = obj.get(nested_key) {
            if let Some(p) = normalize_position(nested) {
                return Some(p);
            }
        }
    }

    None
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
