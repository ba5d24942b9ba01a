pub mod auth;
pub mod last_seen;
pub mod post;
pub mod user;

use actix_web::{web, HttpResponse};

use crate::error::AppError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth::config)
        .configure(user::config)
        .configure(post::config);
}

pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::not_found())
}
