//! Shared error taxonomy across confab crates.
//!
//! Every failure the engine can produce collapses into one
//! [`GatewayError`]. WebSocket call sites map it to a close code via
//! [`GatewayError::client_code`]; HTTP call sites map it to a coarse JSON
//! body and an HTTP status (done in `confab-gateway`, which is the only
//! crate that knows about Axum).

use thiserror::Error;

/// Client-facing error codes (stable across WS close frames and HTTP bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Missing/invalid URL route (WS close 4001).
    NoUrlRoute,
    /// Missing/invalid session token (WS close 4002).
    NoSession,
    /// Auth failed (WS close 4003).
    AuthFailed,
    /// Meeting/question/session not found (WS close 4004).
    NotFound,
    /// Access code missing or invalid (WS close 4005).
    NoAccessCode,
    /// Late join onto a locked meeting (WS close 4401).
    Locked,
    /// Input failed validation (length/emptiness/range).
    Validation,
    /// Access-code or other uniqueness conflict.
    Conflict,
    /// Transient I/O failure (LLM timeout, persistence blip).
    TransientIo,
    /// Internal invariant violated; session must be aborted.
    Fatal,
    /// A subscriber's outbound queue overflowed (WS close 1013).
    Backpressure,
}

impl ClientCode {
    /// String form used in WS close reasons and HTTP error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::NoUrlRoute => "NO_URL_ROUTE",
            ClientCode::NoSession => "NO_SESSION",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::NoAccessCode => "NO_ACCESS_CODE",
            ClientCode::Locked => "MEETING_LOCKED",
            ClientCode::Validation => "VALIDATION",
            ClientCode::Conflict => "CONFLICT",
            ClientCode::TransientIo => "TRANSIENT_IO",
            ClientCode::Fatal => "FATAL",
            ClientCode::Backpressure => "BACKPRESSURE",
        }
    }

    /// The WebSocket close code spec.md §6 assigns this error kind, if any.
    /// `TransientIo`/`Fatal` have no WS close code of their own: they surface
    /// as a typed message to the peer instead (`submit_error`, coarse HTTP
    /// `error`), per spec.md §7's propagation policy.
    pub fn ws_close_code(self) -> Option<u16> {
        match self {
            ClientCode::NoUrlRoute => Some(4001),
            ClientCode::NoSession => Some(4002),
            ClientCode::AuthFailed => Some(4003),
            ClientCode::NotFound => Some(4004),
            ClientCode::NoAccessCode => Some(4005),
            ClientCode::Locked => Some(4401),
            ClientCode::Backpressure => Some(1013),
            ClientCode::Validation | ClientCode::Conflict | ClientCode::TransientIo | ClientCode::Fatal => None,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Unified error type used across the engine.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing or invalid url route")]
    NoUrlRoute,
    #[error("missing or invalid session token")]
    NoSession,
    #[error("authentication failed")]
    AuthFailed,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("missing or invalid access code")]
    NoAccessCode,
    #[error("meeting is locked")]
    Locked,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("transient io error: {0}")]
    TransientIo(String),
    #[error("fatal: {0}")]
    Fatal(String),
    #[error("outbound queue overflowed: {0}")]
    Backpressure(String),
}

impl GatewayError {
    /// Map to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GatewayError::NoUrlRoute => ClientCode::NoUrlRoute,
            GatewayError::NoSession => ClientCode::NoSession,
            GatewayError::AuthFailed => ClientCode::AuthFailed,
            GatewayError::NotFound(_) => ClientCode::NotFound,
            GatewayError::NoAccessCode => ClientCode::NoAccessCode,
            GatewayError::Locked => ClientCode::Locked,
            GatewayError::Validation(_) => ClientCode::Validation,
            GatewayError::Conflict(_) => ClientCode::Conflict,
            GatewayError::TransientIo(_) => ClientCode::TransientIo,
            GatewayError::Fatal(_) => ClientCode::Fatal,
            GatewayError::Backpressure(_) => ClientCode::Backpressure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backpressure_maps_to_close_code_1013() {
        let err = GatewayError::Backpressure("outbound queue overflow".into());
        assert_eq!(err.client_code(), ClientCode::Backpressure);
        assert_eq!(err.client_code().ws_close_code(), Some(1013));
    }

    #[test]
    fn transient_io_has_no_dedicated_close_code() {
        assert_eq!(ClientCode::TransientIo.ws_close_code(), None);
    }
}
