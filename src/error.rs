use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::accounting::LeaveProposal;
use crate::store::StoreError;

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Invalid username or password")]
    InvalidCredentials,
    #[display(fmt = "Username already taken")]
    UsernameTaken,
    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),
    #[display(fmt = "Leave record belongs to another user")]
    NotOwner,
    /// Hard block: nothing was written.
    #[display(
        fmt = "Insufficient leave balance: requested {} hours, {} available",
        requested,
        available
    )]
    InsufficientBalance { requested: f64, available: f64 },
    /// Soft block: the proposal is held until the user confirms or cancels it.
    #[display(fmt = "Requested leave overlaps an existing leave record")]
    OverlapDetected(LeaveProposal),
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "Store unavailable")]
    StoreUnavailable(StoreError),
    #[display(fmt = "Internal Server Error")]
    Internal(String),
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::Duplicate => AppError::Internal(e.to_string()),
            StoreError::Unavailable(_) => AppError::StoreUnavailable(e),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::UsernameTaken => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotOwner => StatusCode::FORBIDDEN,
            AppError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::OverlapDetected(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::InsufficientBalance {
                requested,
                available,
            } => json!({
                "message": self.to_string(),
                "requested": requested,
                "available": available,
            }),
            AppError::OverlapDetected(proposal) => json!({
                "message": self.to_string(),
                "flow": "overlap",
                "proposal": proposal,
            }),
            AppError::StoreUnavailable(e) => {
                tracing::error!(error = %e, "Store unavailable");
                json!({ "message": self.to_string() })
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                json!({ "message": self.to_string() })
            }
            _ => json!({ "message": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
