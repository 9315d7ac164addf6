use crate::api::rest::problem::ProblemResponse;
use crate::domain::error::DomainError;

fn current_trace_id() -> Option<String> {
    tracing::Span::current()
        .id()
        .map(|id| id.into_u64().to_string())
}

/// Map domain error to RFC 9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    let detail = match e {
        DomainError::InsertionFailed { .. } | DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Storage error occurred");
            "An internal storage error occurred".to_string()
        }
        _ => e.to_string(),
    };
    e.code().to_response(detail, instance, current_trace_id())
}
