use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use coffeebot_core::errors::InterfaceError;

/// A failed command, rendered as the plain-text reply Slack shows the caller.
///
/// Input problems surface their own message; anything else falls back to the
/// route's generic text so internals never reach the channel.
#[derive(Debug)]
pub struct RouteError {
    pub error: InterfaceError,
    pub fallback: &'static str,
}

impl RouteError {
    pub fn new(error: InterfaceError, fallback: &'static str) -> Self {
        Self { error, fallback }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        warn!(
            event_name = "http.request.failed",
            correlation_id = self.error.correlation_id(),
            status = status.as_u16(),
            error = %self.error,
            "command failed"
        );

        (status, self.error.user_message(self.fallback).to_owned()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};

    use coffeebot_core::errors::InterfaceError;

    use super::RouteError;

    #[tokio::test]
    async fn bad_request_shows_its_own_message() {
        let response = RouteError::new(
            InterfaceError::BadRequest {
                message: "Please name a coffee shop.".to_owned(),
                correlation_id: "req-1".to_owned(),
            },
            "INVALID INPUT",
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"Please name a coffee shop.");
    }

    #[tokio::test]
    async fn internal_failures_use_the_fallback() {
        let response = RouteError::new(
            InterfaceError::Unprocessable {
                message: "database is locked".to_owned(),
                correlation_id: "req-2".to_owned(),
            },
            "Error in /display-orders route.",
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"Error in /display-orders route.");
    }
}
