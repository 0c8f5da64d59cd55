use std::convert::Infallible;

use agora_errors::{Problem, ValidationViolation};
use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use user_preferences_sdk::{DroppedKey, MergeError};

use crate::domain::error::DomainError;
use crate::errors::ErrorCode;

/// Headers that carry a caller or gateway supplied correlation id, in
/// order of preference.
const TRACE_HEADERS: [&str; 3] = ["x-trace-id", "x-request-id", "traceparent"];

/// Request details stamped on every problem a handler returns.
///
/// `instance` is the request path as received, before any nesting strips a
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemScope {
    instance: String,
    trace_id: Option<String>,
}

impl ProblemScope {
    #[must_use]
    pub fn new(instance: impl Into<String>, trace_id: Option<String>) -> Self {
        Self {
            instance: instance.into(),
            trace_id,
        }
    }

    #[must_use]
    pub fn domain(&self, e: &DomainError) -> Problem {
        domain_error_to_problem(e, &self.instance, self.trace_id.clone())
    }

    #[must_use]
    pub fn invalid_request(&self, detail: impl Into<String>) -> Problem {
        invalid_request_problem(detail, &self.instance, self.trace_id.clone())
    }

    #[must_use]
    pub fn unknown_capability(&self, name: &str) -> Problem {
        unknown_capability_problem(name, &self.instance, self.trace_id.clone())
    }
}

impl<S> FromRequestParts<S> for ProblemScope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);
        Ok(Self::new(uri.path(), trace_id_from_headers(&parts.headers)))
    }
}

/// Correlation id from the first non-empty trace header, if any.
#[must_use]
pub fn trace_id_from_headers(headers: &HeaderMap) -> Option<String> {
    TRACE_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// Map domain error to RFC9457 Problem using the error catalog
pub fn domain_error_to_problem(e: &DomainError, instance: &str, trace_id: Option<String>) -> Problem {
    match e {
        DomainError::NotFound => {
            ErrorCode::user_preferences_not_found_v1().with_context("Identity not found", instance, trace_id)
        }
        DomainError::Merge(err) => merge_error_to_problem(err, instance, trace_id),
        DomainError::Validation { field, message } => ErrorCode::user_preferences_validation_v1()
            .with_context(
                format!("Validation error on '{field}': {message}"),
                instance,
                trace_id,
            )
            .with_errors(vec![ValidationViolation::new(field, message)]),
        DomainError::Forbidden(err) => {
            tracing::warn!(required = %err.required(), "capability check failed");
            ErrorCode::user_preferences_forbidden_v1().with_context(err.to_string(), instance, trace_id)
        }
        DomainError::Conflict(msg) => {
            ErrorCode::user_preferences_conflict_v1().with_context(msg.clone(), instance, trace_id)
        }
        DomainError::Storage(err) => {
            tracing::error!(error = ?err, "Storage error occurred");
            ErrorCode::user_preferences_internal_v1().with_context(
                "An internal error occurred",
                instance,
                trace_id,
            )
        }
    }
}

fn merge_error_to_problem(err: &MergeError, instance: &str, trace_id: Option<String>) -> Problem {
    let def = match err {
        MergeError::TooLarge { .. } => ErrorCode::user_preferences_document_too_large_v1(),
        MergeError::TooDeep { .. } => ErrorCode::user_preferences_document_too_deep_v1(),
        MergeError::TooWide { .. } => ErrorCode::user_preferences_document_too_wide_v1(),
        MergeError::MalformedDocument { .. } => ErrorCode::user_preferences_malformed_document_v1(),
        MergeError::KeyRejected { .. } => ErrorCode::user_preferences_keys_rejected_v1(),
    };
    let problem = def.with_context(err.to_string(), instance, trace_id);
    match err {
        MergeError::KeyRejected { keys } => problem.with_errors(keys.iter().map(violation).collect()),
        _ => problem,
    }
}

fn violation(key: &DroppedKey) -> ValidationViolation {
    ValidationViolation::new(&key.path, "key was not applied").with_code(key.reason.as_str())
}

/// Problem for a capability name that is not part of the fixed vocabulary.
pub fn unknown_capability_problem(name: &str, instance: &str, trace_id: Option<String>) -> Problem {
    ErrorCode::user_preferences_unknown_capability_v1().with_context(
        format!("unknown capability '{name}'"),
        instance,
        trace_id,
    )
}

/// Problem for a request body or path parameter that cannot be decoded.
pub fn invalid_request_problem(
    detail: impl Into<String>,
    instance: &str,
    trace_id: Option<String>,
) -> Problem {
    ErrorCode::user_preferences_invalid_request_v1().with_context(detail, instance, trace_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_security::{Capability, CapabilityError};
    use axum::http::{HeaderValue, StatusCode};
    use user_preferences_sdk::DropReason;

    #[test]
    fn test_merge_errors_map_to_statuses() {
        let cases = [
            (MergeError::TooLarge { size: 2, max: 1 }, StatusCode::PAYLOAD_TOO_LARGE),
            (MergeError::TooDeep { max_depth: 8 }, StatusCode::UNPROCESSABLE_ENTITY),
            (
                MergeError::TooWide {
                    path: "$".to_owned(),
                    max_keys: 256,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (MergeError::malformed("$", "bad"), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            let problem = domain_error_to_problem(&DomainError::Merge(err), "/settings", None);
            assert_eq!(problem.status, status);
            assert_eq!(problem.instance, "/settings");
        }
    }

    #[test]
    fn test_rejected_keys_become_violations() {
        let err = DomainError::Merge(MergeError::KeyRejected {
            keys: vec![DroppedKey {
                path: "privacy.__x".to_owned(),
                reason: DropReason::Reserved,
            }],
        });
        let problem = domain_error_to_problem(&err, "/", None);
        assert_eq!(problem.status, StatusCode::UNPROCESSABLE_ENTITY);
        let errors = problem.errors.unwrap();
        assert_eq!(errors[0].field, "privacy.__x");
        assert_eq!(errors[0].code.as_deref(), Some("reserved"));
    }

    #[test]
    fn test_forbidden_names_only_the_capability() {
        let err = DomainError::Forbidden(CapabilityError::Denied {
            required: Capability::Administer,
        });
        let problem = domain_error_to_problem(&err, "/", None);
        assert_eq!(problem.status, StatusCode::FORBIDDEN);
        assert!(problem.detail.contains("administer"));
        assert!(!problem.detail.contains("user"));
    }

    #[test]
    fn test_storage_error_is_opaque() {
        let problem =
            domain_error_to_problem(&DomainError::Storage(anyhow::anyhow!("pool closed")), "/", None);
        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!problem.detail.contains("pool"));
    }

    #[test]
    fn test_unknown_capability_is_bad_request() {
        let problem = unknown_capability_problem("superpower", "/capabilities/superpower", None);
        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
        assert!(problem.detail.contains("superpower"));
    }

    #[test]
    fn test_trace_id_prefers_explicit_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(trace_id_from_headers(&headers), None);

        headers.insert("x-request-id", HeaderValue::from_static("req-1"));
        assert_eq!(trace_id_from_headers(&headers).as_deref(), Some("req-1"));

        headers.insert("x-trace-id", HeaderValue::from_static("trace-9"));
        assert_eq!(trace_id_from_headers(&headers).as_deref(), Some("trace-9"));

        headers.insert("x-trace-id", HeaderValue::from_static(""));
        assert_eq!(trace_id_from_headers(&headers).as_deref(), Some("req-1"));
    }

    #[test]
    fn test_scope_stamps_instance_and_trace_id() {
        let scope = ProblemScope::new("/user-preferences/v1/settings", Some("req-7".to_owned()));
        let problem = scope.domain(&DomainError::NotFound);
        assert_eq!(problem.status, StatusCode::NOT_FOUND);
        assert_eq!(problem.instance, "/user-preferences/v1/settings");
        assert_eq!(problem.trace_id.as_deref(), Some("req-7"));

        let problem = scope.invalid_request("bad body");
        assert_eq!(problem.instance, "/user-preferences/v1/settings");
        assert_eq!(problem.trace_id.as_deref(), Some("req-7"));
    }
}
