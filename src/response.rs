use actix_web::{
    error::UrlencodedError,
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::form_urlencoded;

use crate::error::AppError;
use crate::templates::errors;

pub fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `/{route}/{username}` with the username encoded as a single path segment.
pub fn user_path(route: &str, username: &str) -> String {
    format!("/{}/{}", route, utf8_percent_encode(username, PATH_SEGMENT))
}

pub fn login_redirect(next: &str) -> HttpResponse {
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    redirect(&format!("/login?next={}", encoded))
}

pub fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    debug!("rejected form body: {}", err);
    AppError::param_error("the submitted form could not be read").into()
}

pub fn response_from_error(err: &AppError) -> HttpResponse {
    let (status, body) = match err {
        AppError::NotFound => (StatusCode::NOT_FOUND, errors::not_found_page()),
        AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, errors::bad_request_page(msg)),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            errors::internal_error_page(),
        ),
    };
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}
