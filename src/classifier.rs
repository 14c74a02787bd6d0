//! # Error Classifier
//!
//! Total mapping from a raw [`CallOutcome`] to a [`ClassifiedError`]:
//!
//! | Outcome | Classification |
//! |---|---|
//! | transport failure | `TransientUnavailable` |
//! | 401 | `Unauthorized` |
//! | 400 with a JSON validation body | `InvalidInput(detail)` |
//! | 404 | `NotFound` |
//! | 409 | `Conflict(detail)` |
//! | 5xx | `ServerFault` |
//! | 429 | `TransientUnavailable` |
//! | anything else | `Unknown(detail)` |

use serde_json::Value;

use crate::error::ClassifiedError;
use crate::transport::CallOutcome;

/// Longest body excerpt carried in an error detail
const MAX_DETAIL_LEN: usize = 512;

/// Classify a failed outcome; `None` means the call succeeded
pub fn classify(outcome: &CallOutcome) -> Option<ClassifiedError> {
    match outcome {
        CallOutcome::Success(_) => None,
        CallOutcome::TransportFailure(_) => Some(ClassifiedError::TransientUnavailable),
        CallOutcome::StatusFailure { status, body } => Some(classify_status(*status, body)),
    }
}

/// Classify a non-success HTTP status and its body
pub fn classify_status(status: u16, body: &str) -> ClassifiedError {
    match status {
        401 => ClassifiedError::Unauthorized,
        400 => match serde_json::from_str::<Value>(body) {
            Ok(value @ Value::Object(_)) => ClassifiedError::InvalidInput(validation_detail(&value)),
            _ => ClassifiedError::Unknown(format!("HTTP 400: {}", excerpt(body))),
        },
        404 => ClassifiedError::NotFound,
        409 => ClassifiedError::Conflict(body_detail(body)),
        429 => ClassifiedError::TransientUnavailable,
        500..=599 => ClassifiedError::ServerFault,
        _ => ClassifiedError::Unknown(format!("HTTP {status}: {}", excerpt(body))),
    }
}

/// Whether the outcome is worth retrying unchanged (transport, 5xx, 429)
pub fn is_transient(outcome: &CallOutcome) -> bool {
    classify(outcome).is_some_and(|e| e.is_transient())
}

/// Whether the attempt failed before any response was received
pub fn is_transport_failure(outcome: &CallOutcome) -> bool {
    matches!(outcome, CallOutcome::TransportFailure(_))
}

/// Render a validation body as `field: message; field: message`
///
/// Understands the common `{"errors": {"Field": ["message"]}}` shape, then
/// falls back to `detail`, `message` or `title`, then to the raw JSON.
fn validation_detail(value: &Value) -> String {
    if let Some(Value::Object(errors)) = value.get("errors") {
        let mut parts = Vec::new();
        for (field, messages) in errors {
            match messages {
                Value::Array(items) => {
                    for item in items {
                        parts.push(format!("{field}: {}", text_of(item)));
                    }
                }
                other => parts.push(format!("{field}: {}", text_of(other))),
            }
        }
        if !parts.is_empty() {
            return parts.join("; ");
        }
    }

    message_field(value).unwrap_or_else(|| excerpt(&value.to_string()))
}

fn body_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => message_field(&value).unwrap_or_else(|| excerpt(body)),
        Err(_) => excerpt(body),
    }
}

fn message_field(value: &Value) -> Option<String> {
    ["detail", "message", "title"]
        .iter()
        .find_map(|name| value.get(*name).and_then(Value::as_str))
        .map(str::to_string)
}

fn text_of(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_DETAIL_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_DETAIL_LEN).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    #[test]
    fn test_success_is_not_an_error() {
        assert_eq!(classify(&CallOutcome::Success("{}".into())), None);
    }

    #[test]
    fn test_transport_failures_are_transient_unavailable() {
        for error in [
            TransportError::Connect("refused".into()),
            TransportError::Timeout,
            TransportError::CircuitOpen {
                endpoint: "customers".into(),
            },
            TransportError::Other("dns".into()),
        ] {
            let outcome = CallOutcome::TransportFailure(error);
            assert_eq!(classify(&outcome), Some(ClassifiedError::TransientUnavailable));
            assert!(is_transient(&outcome));
            assert!(is_transport_failure(&outcome));
        }
    }

    #[test]
    fn test_status_table() {
        assert_eq!(classify_status(401, ""), ClassifiedError::Unauthorized);
        assert_eq!(classify_status(404, "missing"), ClassifiedError::NotFound);
        assert_eq!(classify_status(429, ""), ClassifiedError::TransientUnavailable);
        assert_eq!(classify_status(500, ""), ClassifiedError::ServerFault);
        assert_eq!(classify_status(503, ""), ClassifiedError::ServerFault);
        assert_eq!(
            classify_status(403, "forbidden"),
            ClassifiedError::Unknown("HTTP 403: forbidden".into())
        );
    }

    #[test]
    fn test_structured_validation_body() {
        let body = r#"{"title":"One or more validation errors occurred.","errors":{"Email":["is required","must be valid"],"Name":["is too long"]}}"#;
        assert_eq!(
            classify_status(400, body),
            ClassifiedError::InvalidInput(
                "Email: is required; Email: must be valid; Name: is too long".into()
            )
        );
    }

    #[test]
    fn test_validation_body_falls_back_to_message() {
        let body = r#"{"message":"page_size must be positive"}"#;
        assert_eq!(
            classify_status(400, body),
            ClassifiedError::InvalidInput("page_size must be positive".into())
        );
    }

    #[test]
    fn test_unstructured_400_is_unknown() {
        assert_eq!(
            classify_status(400, "Bad Request"),
            ClassifiedError::Unknown("HTTP 400: Bad Request".into())
        );
    }

    #[test]
    fn test_conflict_detail() {
        assert_eq!(
            classify_status(409, r#"{"detail":"email already registered"}"#),
            ClassifiedError::Conflict("email already registered".into())
        );
        assert_eq!(
            classify_status(409, "version mismatch"),
            ClassifiedError::Conflict("version mismatch".into())
        );
    }

    #[test]
    fn test_non_transient_statuses() {
        assert!(!is_transient(&CallOutcome::status(400, "{}")));
        assert!(!is_transient(&CallOutcome::status(401, "")));
        assert!(!is_transient(&CallOutcome::status(404, "")));
        assert!(!is_transient(&CallOutcome::status(409, "")));
        assert!(is_transient(&CallOutcome::status(502, "")));
        assert!(!is_transport_failure(&CallOutcome::status(502, "")));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(MAX_DETAIL_LEN + 100);
        match classify_status(418, &body) {
            ClassifiedError::Unknown(detail) => assert!(detail.ends_with("...")),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
