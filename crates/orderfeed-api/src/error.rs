//! Maps HTTP failures to `AppError`.

use reqwest::StatusCode;

use orderfeed_core::error::AppError;
use orderfeed_core::types::ApiErrorBody;

/// Map a transport-level failure (connect, timeout, body read).
pub(crate) fn transport_error(err: reqwest::Error) -> AppError {
    let message = if err.is_timeout() {
        "Request timed out".to_string()
    } else if err.is_connect() {
        "Backend unreachable".to_string()
    } else {
        format!("Request failed: {err}")
    };
    AppError::with_source(orderfeed_core::error::ErrorKind::Network, message, err)
}

/// Map a non-success status, surfacing the backend's `message` when present.
pub(crate) fn status_error(status: StatusCode, body: &[u8]) -> AppError {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected status")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED => AppError::authentication(message),
        StatusCode::FORBIDDEN => AppError::authorization(message),
        StatusCode::NOT_FOUND => AppError::not_found(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::validation(message)
        }
        s if s.is_server_error() => AppError::network(format!("{}: {message}", s.as_u16())),
        s => AppError::internal(format!("Unexpected status {}: {message}", s.as_u16())),
    }
}

/// Map a response body that does not match the expected shape.
pub(crate) fn decode_error(path: &str, err: serde_json::Error) -> AppError {
    AppError::with_source(
        orderfeed_core::error::ErrorKind::MalformedPayload,
        format!("Unexpected response body from {path}: {err}"),
        err,
    )
}
