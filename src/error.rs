use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Friend code not found")]
    FriendCodeNotFound,

    #[error("Cannot send a friend request to yourself")]
    SelfFriendRequest,

    #[error("Users are already friends")]
    AlreadyFriends,

    #[error("A friend request from this user is already pending")]
    DuplicateFriendRequest,

    #[error("Illegal challenge transition: {0}")]
    IllegalTransition(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Storage(ref e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                e.to_string(),
            ),
            AppError::Serialization(ref e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            AppError::NotFound(ref msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::BadRequest(ref msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
            ),
            AppError::FriendCodeNotFound => (
                StatusCode::NOT_FOUND,
                "FRIEND_CODE_NOT_FOUND",
                "No user with that friend code".to_string(),
            ),
            AppError::SelfFriendRequest => (
                StatusCode::BAD_REQUEST,
                "SELF_FRIEND_REQUEST",
                "Cannot send a friend request to yourself".to_string(),
            ),
            AppError::AlreadyFriends => (
                StatusCode::CONFLICT,
                "ALREADY_FRIENDS",
                "Users are already friends".to_string(),
            ),
            AppError::DuplicateFriendRequest => (
                StatusCode::CONFLICT,
                "REQUEST_ALREADY_PENDING",
                "A friend request from this user is already pending".to_string(),
            ),
            AppError::IllegalTransition(ref msg) => (
                StatusCode::CONFLICT,
                "ILLEGAL_TRANSITION",
                msg.clone(),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
