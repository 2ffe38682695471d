use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tessera_core::AuthError;

#[derive(Debug)]
pub enum AppError {
    Auth(String),
    Forbidden(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::AuthenticationFailed
            | AuthError::AccountDisabled
            | AuthError::AccountLocked
            | AuthError::AccountExpired
            | AuthError::CredentialsExpired => AppError::Auth("Invalid credentials".to_string()),
            AuthError::TicketNotFound | AuthError::TicketExpired => {
                AppError::Auth("Invalid or expired ticket".to_string())
            }
            AuthError::NoCurrentUser => AppError::Auth("Not authenticated".to_string()),
            AuthError::GuestNotSupported => AppError::Auth(e.to_string()),
            AuthError::AuthenticationDisallowed(_) => {
                AppError::Forbidden("Login not allowed".to_string())
            }
            AuthError::MaxUsersExceeded { .. } => AppError::Unavailable(e.to_string()),
            AuthError::UserNotFound(_) => AppError::NotFound(e.to_string()),
            AuthError::ReservedUserName(_) => AppError::Forbidden(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", e);
        AppError::Internal("Internal server error".to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(e: AuthError) -> StatusCode {
        AppError::from(e).into_response().status()
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        assert_eq!(status(AuthError::AuthenticationFailed), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::AccountLocked), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::TicketExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::GuestNotSupported), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(AuthError::AuthenticationDisallowed("bob".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(AuthError::MaxUsersExceeded { max: 2 }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(AuthError::UserNotFound("bob".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AuthError::ReservedUserName("System".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(AuthError::TicketCollision), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn disallowed_does_not_echo_user() {
        match AppError::from(AuthError::AuthenticationDisallowed("bob".to_string())) {
            AppError::Forbidden(msg) => assert!(!msg.contains("bob")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
