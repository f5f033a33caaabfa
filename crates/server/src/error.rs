//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors become JSON bodies of
//! the form `{"detail": "..."}`; server-side failures are captured to Sentry
//! and their details withheld from the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use schoolmall_core::{InvalidTransition, PlacementError};

use crate::db::RepositoryError;
use crate::db::categories::CategoryError;
use crate::models::PageError;
use crate::services::AuthError;
use crate::services::OrderError;
use crate::services::uploads::UploadError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order placement or status change failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Category write rejected.
    #[error("Category error: {0}")]
    Category(#[from] CategoryError),

    /// Upload rejected or not stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Duplicate or otherwise conflicting write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::NotAdmin => StatusCode::FORBIDDEN,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Order(err) => match err {
                OrderError::Invalid(_) | OrderError::NothingToChange => StatusCode::BAD_REQUEST,
                OrderError::Placement(placement) => match placement {
                    PlacementError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                    PlacementError::EmptyCart
                    | PlacementError::InvalidQuantity { .. }
                    | PlacementError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
                },
                OrderError::StopNotFound(_) | OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::InvalidTransition(_) => StatusCode::CONFLICT,
                OrderError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Category(err) => match err {
                CategoryError::DuplicateName => StatusCode::CONFLICT,
                CategoryError::ParentNotFound => StatusCode::NOT_FOUND,
                CategoryError::Cycle => StatusCode::BAD_REQUEST,
                CategoryError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                CategoryError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                CategoryError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Upload(err) => match err {
                UploadError::NotAnImage | UploadError::Empty => StatusCode::BAD_REQUEST,
                UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    fn detail(&self) -> String {
        if self.status().is_server_error() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid email or password".to_string()
                }
                AuthError::NotAdmin => "Admin access required".to_string(),
                other => other.to_string(),
            },
            Self::Order(OrderError::InvalidTransition(err)) => invalid_transition_detail(err),
            Self::Order(err) => err.to_string(),
            Self::Category(CategoryError::Repository(RepositoryError::NotFound)) => {
                "Category not found".to_string()
            }
            Self::Category(err) => err.to_string(),
            Self::Upload(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

fn invalid_transition_detail(err: &InvalidTransition) -> String {
    let allowed: Vec<&str> = err.allowed.iter().map(|s| s.as_str()).collect();
    let allowed = if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed.join(", ")
    };
    format!(
        "Invalid status transition from {} to {}. Allowed: {allowed}",
        err.from, err.to
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut body = json!({ "detail": self.detail() });
        if let Self::Order(OrderError::InvalidTransition(err)) = &self {
            body["current_status"] = json!(err.from);
            body["requested_status"] = json!(err.to);
            body["allowed"] = json!(err.allowed);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after login.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use schoolmall_core::{OrderStatus, ProductId};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("Slug already exists".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth(AuthError::NotAdmin).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Order(OrderError::NothingToChange).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Order(
                PlacementError::InsufficientStock {
                    product_id: ProductId::new(1),
                    name: "Pen".into(),
                    available: 1,
                    requested: 2,
                }
                .into()
            )
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Order(PlacementError::ProductNotFound(ProductId::new(4)).into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Category(CategoryError::Cycle).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_invalid_transition_body() {
        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Pending)
            .unwrap_err();
        let (status, body) = body_json(AppError::Order(err.into())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["current_status"], "delivered");
        assert_eq!(body["requested_status"], "pending");
        assert_eq!(body["allowed"], serde_json::json!([]));
        assert_eq!(
            body["detail"],
            "Invalid status transition from delivered to pending. Allowed: none"
        );
    }

    #[tokio::test]
    async fn test_stock_error_reports_available() {
        let err = PlacementError::InsufficientStock {
            product_id: ProductId::new(1),
            name: "School Bag".into(),
            available: 3,
            requested: 5,
        };
        let (status, body) = body_json(AppError::Order(err.into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Insufficient stock for School Bag. Available: 3");
    }

    #[tokio::test]
    async fn test_server_errors_are_hidden() {
        let (status, body) =
            body_json(AppError::Database(RepositoryError::DataCorruption("bad".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error");
    }
}
