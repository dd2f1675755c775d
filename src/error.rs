use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    db::StoreError,
    game::{GameError, JoinRejection, MoveRejection},
};

/// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Move(MoveRejection),
    #[error(transparent)]
    Join(JoinRejection),
    /// Store or configuration failure. Details are logged, never returned.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Move(rejection) => match rejection {
                MoveRejection::NotFound => StatusCode::NOT_FOUND,
                MoveRejection::NotAPlayer | MoveRejection::WrongTurn => StatusCode::FORBIDDEN,
                MoveRejection::NotInProgress
                | MoveRejection::OutOfRange
                | MoveRejection::Occupied => StatusCode::BAD_REQUEST,
            },
            AppError::Join(rejection) => match rejection {
                JoinRejection::NotFound => StatusCode::NOT_FOUND,
                JoinRejection::OwnGame => StatusCode::FORBIDDEN,
                JoinRejection::NotAvailable => StatusCode::BAD_REQUEST,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AppError::Move(rejection) => Some(rejection.code()),
            AppError::Join(rejection) => Some(rejection.code()),
            AppError::Conflict(_) => Some("conflict"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(ref e) = self {
            tracing::error!("Internal error: {:#}", e);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            reason: self.reason(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection);
        AppError::Validation(rejection.body_text())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => AppError::Conflict("Username already exists".into()),
            err => AppError::Internal(err.into()),
        }
    }
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Move(rejection) => AppError::Move(rejection),
            GameError::Join(rejection) => AppError::Join(rejection),
            GameError::NotFound => AppError::NotFound("Game not found".into()),
            GameError::NotAPlayer => {
                AppError::Forbidden("You are not a player in this game".into())
            }
            GameError::Conflict => AppError::Conflict(
                "Game was updated by another request, refresh and try again".into(),
            ),
            GameError::Store(e) => e.into(),
        }
    }
}
