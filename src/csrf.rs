use actix_session::Session;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use log::warn;
use rand::RngCore;

const CSRF_KEY: &str = "csrf_token";

/// Token embedded in every rendered form; created on first use.
pub fn token(session: &Session) -> String {
    if let Ok(Some(existing)) = session.get::<String>(CSRF_KEY) {
        return existing;
    }
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let fresh = URL_SAFE_NO_PAD.encode(bytes);
    if let Err(e) = session.insert(CSRF_KEY, &fresh) {
        warn!("failed to store csrf token: {}", e);
    }
    fresh
}

pub fn verify(session: &Session, submitted: &str) -> bool {
    match session.get::<String>(CSRF_KEY) {
        Ok(Some(expected)) => !submitted.is_empty() && constant_time_eq(&expected, submitted),
        _ => false,
    }
}

/// Examines every byte regardless of where a mismatch occurs, so response
/// timing does not reveal how much of a guessed token was right.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
