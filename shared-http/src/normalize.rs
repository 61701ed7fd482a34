//! Pure conversions from the shapes the backend actually sends into the
//! canonical page and error shapes.

use chrono::Utc;
use serde_json::{Map, Value, json};

use crate::api::{FailureKind, NormalizedError, reason_phrase, user_message};

/// True for objects carrying a row array under `content` or `items`.
pub fn looks_paginated(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            matches!(map.get("content"), Some(Value::Array(_)))
                || matches!(map.get("items"), Some(Value::Array(_)))
        }
        _ => false,
    }
}

/// Give every list payload both `content` and `items`.
///
/// Current envelopes (`content`) gain an `items` alias, legacy envelopes
/// (`items`) gain a `content` alias, and bare arrays are wrapped as a single
/// complete page. Anything else is returned untouched. Applying this to its
/// own output changes nothing.
pub fn normalize_page(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(content) = map.get("content").cloned() {
                map.insert("items".to_string(), content);
            } else if let Some(items) = map.get("items").cloned() {
                map.insert("content".to_string(), items);
            }
            Value::Object(map)
        }
        Value::Array(rows) => {
            let len = rows.len();
            json!({
                "content": rows.clone(),
                "items": rows,
                "page": 0,
                "size": len,
                "totalElements": len,
                "totalPages": 1,
                "first": true,
                "last": true,
                "empty": len == 0,
                "numberOfElements": len,
            })
        }
        other => other,
    }
}

/// Build the canonical error for a failed request to `path`.
///
/// `message` always comes from the fixed table for the failure class; the
/// backend's own text is kept out of it. `error` and `details` are lifted
/// from the error body when one was sent.
pub fn normalize_error(kind: &FailureKind, path: &str) -> NormalizedError {
    let body = kind.body().and_then(Value::as_object);

    let status = kind
        .status()
        .or_else(|| {
            body.and_then(|b| b.get("status"))
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok())
        })
        .unwrap_or(0);

    let error = body
        .and_then(|b| b.get("error"))
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match kind {
            FailureKind::Http { status, .. } => reason_phrase(*status).to_string(),
            other => other.label().to_string(),
        });

    NormalizedError {
        message: user_message(kind).to_string(),
        status,
        error,
        details: body.map(extract_details).unwrap_or_default(),
        timestamp: Utc::now(),
        path: path.to_string(),
    }
}

/// The backend's free-text message, for diagnostics only.
pub fn backend_message(kind: &FailureKind) -> Option<&str> {
    kind.body()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
}

fn extract_details(body: &Map<String, Value>) -> Vec<Value> {
    if let Some(details) = body.get("details") {
        return as_detail_list(details);
    }
    match body.get("fieldErrors") {
        // {"name": "must not be blank"} -> [{"field": "name", "message": ...}]
        Some(Value::Object(fields)) => fields
            .iter()
            .map(|(field, message)| {
                let message = message
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| message.to_string());
                json!({ "field": field, "message": message })
            })
            .collect(),
        Some(other) => as_detail_list(other),
        None => Vec::new(),
    }
}

fn as_detail_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::status_message;

    #[test]
    fn test_normalize_page_current_shape() {
        let normalized = normalize_page(json!({"content": [1, 2], "totalElements": 2}));
        assert_eq!(normalized["content"], json!([1, 2]));
        assert_eq!(normalized["items"], json!([1, 2]));
        assert_eq!(normalized["totalElements"], json!(2));
    }

    #[test]
    fn test_normalize_page_legacy_shape() {
        let normalized = normalize_page(json!({"items": [1, 2]}));
        assert_eq!(normalized["content"], json!([1, 2]));
        assert_eq!(normalized["items"], json!([1, 2]));
    }

    #[test]
    fn test_normalize_page_bare_array() {
        let normalized = normalize_page(json!([1, 2]));
        assert_eq!(
            normalized,
            json!({
                "content": [1, 2],
                "items": [1, 2],
                "page": 0,
                "size": 2,
                "totalElements": 2,
                "totalPages": 1,
                "first": true,
                "last": true,
                "empty": false,
                "numberOfElements": 2
            })
        );
        assert_eq!(normalize_page(json!([]))["empty"], json!(true));
    }

    #[test]
    fn test_normalize_page_is_idempotent() {
        for input in [
            json!({"content": [1, 2]}),
            json!({"items": [1, 2]}),
            json!([1, 2]),
            json!({"id": 7}),
            json!("plain"),
        ] {
            let once = normalize_page(input);
            assert_eq!(normalize_page(once.clone()), once);
        }
    }

    #[test]
    fn test_normalize_page_leaves_other_shapes() {
        assert_eq!(normalize_page(json!({"id": 7})), json!({"id": 7}));
        assert_eq!(normalize_page(json!(null)), json!(null));
        assert!(!looks_paginated(&json!({"id": 7})));
        assert!(looks_paginated(&json!({"items": []})));
        assert!(!looks_paginated(&json!({"content": "text"})));
    }

    #[test]
    fn test_normalize_error_with_body() {
        let kind = FailureKind::Http {
            status: 422,
            body: Some(json!({
                "message": "ConstraintViolationException: name",
                "error": "Validation Failed",
                "fieldErrors": {"name": "must not be blank"}
            })),
        };
        let error = normalize_error(&kind, "/api/heritage-sites");
        assert_eq!(error.status, 422);
        assert_eq!(error.message, status_message(422));
        assert!(!error.message.contains("ConstraintViolation"));
        assert_eq!(error.error, "Validation Failed");
        assert_eq!(error.path, "/api/heritage-sites");
        assert_eq!(
            error.details,
            vec![json!({"field": "name", "message": "must not be blank"})]
        );
        assert_eq!(backend_message(&kind), Some("ConstraintViolationException: name"));
    }

    #[test]
    fn test_normalize_error_without_body() {
        let error = normalize_error(&FailureKind::Http { status: 404, body: None }, "/api/x");
        assert_eq!(error.status, 404);
        assert_eq!(error.error, "Not Found");
        assert!(error.details.is_empty());
    }

    #[test]
    fn test_normalize_error_is_total() {
        let kinds = [
            FailureKind::NetworkUnreachable("connection refused".into()),
            FailureKind::Timeout,
            FailureKind::Cancelled,
            FailureKind::Decode("expected value at line 1".into()),
            FailureKind::Unknown("boom".into()),
            FailureKind::Http { status: 500, body: Some(json!("not an object")) },
            FailureKind::Http { status: 400, body: Some(json!({"details": "one"})) },
            FailureKind::Http { status: 0, body: Some(json!({"status": "bad"})) },
        ];
        for kind in kinds {
            let error = normalize_error(&kind, "/api/statistics");
            assert!(!error.message.is_empty());
            assert!(!error.error.is_empty());
            assert_eq!(error.path, "/api/statistics");
        }
        let network = normalize_error(&FailureKind::Timeout, "/p");
        assert_eq!(network.status, 0);
        assert_eq!(network.error, "TIMEOUT");
    }
}
