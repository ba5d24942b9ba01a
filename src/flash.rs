//! One-shot notifications carried in the session until the next rendered
//! page drains them.

use actix_session::Session;
use log::warn;

const FLASHES_KEY: &str = "_flashes";

pub fn flash(session: &Session, msg: impl Into<String>) {
    let mut pending = peek(session);
    pending.push(msg.into());
    if let Err(e) = session.insert(FLASHES_KEY, pending) {
        warn!("failed to store flash message: {}", e);
    }
}

pub fn take(session: &Session) -> Vec<String> {
    let pending = peek(session);
    if !pending.is_empty() {
        session.remove(FLASHES_KEY);
    }
    pending
}

fn peek(session: &Session) -> Vec<String> {
    session
        .get::<Vec<String>>(FLASHES_KEY)
        .ok()
        .flatten()
        .unwrap_or_default()
}
