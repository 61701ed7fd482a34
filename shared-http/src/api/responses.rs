use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::normalize_page;

/// Canonical page envelope. `content` and `items` always carry the same rows
/// so both the current and the legacy consumers can read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPage<T> {
    pub content: Vec<T>,
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
    pub number_of_elements: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageEnvelope<T> {
    content: Vec<T>,
    #[serde(default, alias = "number")]
    page: Option<u64>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    total_elements: Option<u64>,
    #[serde(default)]
    total_pages: Option<u64>,
    #[serde(default)]
    first: Option<bool>,
    #[serde(default)]
    last: Option<bool>,
    #[serde(default)]
    empty: Option<bool>,
    #[serde(default)]
    number_of_elements: Option<u64>,
}

impl<T: Clone> NormalizedPage<T> {
    /// Single page holding every row.
    pub fn from_items(items: Vec<T>) -> Self {
        let len = items.len() as u64;
        Self {
            content: items.clone(),
            items,
            page: 0,
            size: len,
            total_elements: len,
            total_pages: 1,
            first: true,
            last: true,
            empty: len == 0,
            number_of_elements: len,
        }
    }
}

impl<T: DeserializeOwned + Clone> NormalizedPage<T> {
    /// Normalize any supported page shape and decode it. Counters missing
    /// from the envelope are derived from the rows.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let envelope: PageEnvelope<T> = serde_json::from_value(normalize_page(value))?;
        let len = envelope.content.len() as u64;
        let page = envelope.page.unwrap_or(0);
        let size = envelope.size.unwrap_or(len);
        let total_elements = envelope.total_elements.unwrap_or(len);
        let total_pages = envelope.total_pages.unwrap_or_else(|| {
            if size == 0 {
                1
            } else {
                total_elements.div_ceil(size).max(1)
            }
        });

        Ok(Self {
            items: envelope.content.clone(),
            content: envelope.content,
            page,
            size,
            total_elements,
            total_pages,
            first: envelope.first.unwrap_or(page == 0),
            last: envelope.last.unwrap_or(page.saturating_add(1) >= total_pages),
            empty: envelope.empty.unwrap_or(len == 0),
            number_of_elements: envelope.number_of_elements.unwrap_or(len),
        })
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error shape every failed call resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedError {
    /// Fixed, user-presentable text for the failure class.
    pub message: String,
    /// HTTP status, or 0 when no response was received.
    pub status: u16,
    pub error: String,
    pub details: Vec<Value>,
    pub timestamp: DateTime<Utc>,
    pub path: String,
}

impl NormalizedError {
    /// Field errors found in `details`, for forms that highlight inputs.
    pub fn field_errors(&self) -> Vec<FieldError> {
        self.details
            .iter()
            .filter_map(|detail| serde_json::from_value(detail.clone()).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_current_shape() {
        let page: NormalizedPage<u32> = NormalizedPage::from_value(json!({
            "content": [1, 2, 3],
            "number": 1,
            "size": 3,
            "totalElements": 9,
            "totalPages": 3
        }))
        .unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.page, 1);
        assert!(!page.first);
        assert!(!page.last);
        assert_eq!(page.number_of_elements, 3);
    }

    #[test]
    fn test_from_value_legacy_shape_derives_counters() {
        let page: NormalizedPage<String> =
            NormalizedPage::from_value(json!({"items": ["a", "b"], "totalElements": 5, "size": 2}))
                .unwrap();
        assert_eq!(page.content, vec!["a", "b"]);
        assert_eq!(page.total_pages, 3);
        assert!(page.first);
        assert!(!page.last);
    }

    #[test]
    fn test_from_value_page_number_at_limit() {
        let page: NormalizedPage<u32> = NormalizedPage::from_value(json!({
            "content": [1],
            "number": u64::MAX,
            "size": 1,
            "totalElements": 1
        }))
        .unwrap();
        assert_eq!(page.page, u64::MAX);
        assert!(!page.first);
        assert!(page.last);
    }

    #[test]
    fn test_from_value_bare_array() {
        let page: NormalizedPage<u32> = NormalizedPage::from_value(json!([])).unwrap();
        assert!(page.empty);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page, NormalizedPage::from_items(vec![]));
    }

    #[test]
    fn test_from_value_rejects_non_page() {
        let result: Result<NormalizedPage<u32>, _> =
            NormalizedPage::from_value(json!({"total": 4}));
        assert!(result.is_err());
    }

    #[test]
    fn test_field_errors() {
        let error = NormalizedError {
            message: "x".into(),
            status: 422,
            error: "Unprocessable Entity".into(),
            details: vec![json!({"field": "name", "message": "required"}), json!("loose note")],
            timestamp: Utc::now(),
            path: "/api/heritage-sites".into(),
        };
        assert_eq!(
            error.field_errors(),
            vec![FieldError {
                field: "name".into(),
                message: "required".into()
            }]
        );
    }
}
