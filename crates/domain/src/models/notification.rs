//! Notification models.
//!
//! The engine only writes notifications; reading them back (and the read
//! flag) belongs to the notification-inbox API, so no read model lives here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::AlertKind;

/// A notification about to be persisted and pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub kind: AlertKind,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    /// Structured payload, also carried (stringified) in the push message.
    pub data: serde_json::Value,
}

/// Payload for a manual favorite-vendor broadcast. Validated before fan-out
/// since title and body come from vendor input.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,

    #[validate(length(min = 1, max = 500))]
    pub body: String,

    #[validate(url)]
    pub image: Option<String>,

    #[serde(default)]
    pub data: serde_json::Value,
}

impl NewNotification {
    /// Push-transport form of `data`: every value stringified, nulls become
    /// empty strings, non-object payloads yield an empty map.
    pub fn stringified_data(&self) -> std::collections::HashMap<String, String> {
        let mut out = std::collections::HashMap::new();
        if let serde_json::Value::Object(map) = &self.data {
            for (k, v) in map {
                let s = match v {
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.insert(k.clone(), s);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(data: serde_json::Value) -> NewNotification {
        NewNotification {
            user_id: Uuid::new_v4(),
            vendor_id: Some(Uuid::new_v4()),
            kind: AlertKind::DistanceBased,
            title: "t".into(),
            body: "b".into(),
            image: None,
            data,
        }
    }

    #[test]
    fn test_stringified_data_values() {
        let n = sample(json!({
            "vendorId": "abc",
            "distanceKm": 3.3,
            "count": 2,
            "missing": null
        }));
        let data = n.stringified_data();
        assert_eq!(data["vendorId"], "abc");
        assert_eq!(data["distanceKm"], "3.3");
        assert_eq!(data["count"], "2");
        assert_eq!(data["missing"], "");
    }

    #[test]
    fn test_stringified_data_non_object() {
        let n = sample(json!(["not", "an", "object"]));
        assert!(n.stringified_data().is_empty());
    }

    #[test]
    fn test_broadcast_request_validation() {
        let ok = BroadcastRequest {
            title: "Fresh batch at noon".into(),
            body: "Come by the north entrance".into(),
            image: None,
            data: json!({}),
        };
        assert!(ok.validate().is_ok());

        let empty_title = BroadcastRequest {
            title: String::new(),
            body: "b".into(),
            image: None,
            data: json!({}),
        };
        assert!(empty_title.validate().is_err());

        let bad_image = BroadcastRequest {
            title: "t".into(),
            body: "b".into(),
            image: Some("not a url".into()),
            data: json!({}),
        };
        assert!(bad_image.validate().is_err());
    }
}
