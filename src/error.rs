use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use sea_orm::DbErr;
use thiserror::Error;

use crate::response::{login_redirect, response_from_error};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("page not found")]
    NotFound,
    #[error("login required")]
    LoginRequired { next: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("system_exception")]
    System,
}

impl AppError {
    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn need_login(next: impl Into<String>) -> Self {
        Self::LoginRequired { next: next.into() }
    }

    pub fn param_error(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn system_exception() -> Self {
        Self::System
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        error!("database error: {}", err);
        Self::System
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::LoginRequired { .. } => StatusCode::FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::System => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::LoginRequired { next } => login_redirect(next),
            _ => response_from_error(self),
        }
    }
}
