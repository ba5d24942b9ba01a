use std::env;

use actix_web::cookie::Key;
use log::warn;

#[derive(Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub sqlite_path: String,
    pub database_url: Option<String>,
    pub secret_key: String,
    pub posts_per_page: u64,
    pub reset_token_ttl_secs: i64,
    pub session_lifetime_minutes: i64,
    pub remember_cookie_days: i64,
    pub cookie_secure: bool,
    pub csrf_enabled: bool,
    pub mail_sender: String,
    pub mail_relay_url: Option<String>,
    pub mail_relay_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let server_port = parse_var("SERVER_PORT").unwrap_or(5000);

        let sqlite_path =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "./microblog.sqlite".to_string());
        let database_url = non_empty_var("DATABASE_URL");

        let secret_key =
            non_empty_var("SECRET_KEY").unwrap_or_else(|| "you-will-never-guess".to_string());

        let posts_per_page = parse_var::<u64>("POSTS_PER_PAGE")
            .filter(|v| *v > 0)
            .unwrap_or(25);

        Self {
            server_port,
            sqlite_path,
            database_url,
            secret_key,
            posts_per_page,
            reset_token_ttl_secs: parse_var("RESET_TOKEN_TTL_SECS").unwrap_or(600),
            session_lifetime_minutes: parse_var("SESSION_LIFETIME_MINUTES").unwrap_or(120),
            remember_cookie_days: parse_var("REMEMBER_COOKIE_DAYS").unwrap_or(365),
            cookie_secure: parse_flag("COOKIE_SECURE", false),
            csrf_enabled: parse_flag("CSRF_ENABLED", true),
            mail_sender: env::var("MAIL_SENDER")
                .unwrap_or_else(|_| "no-reply@microblog.local".to_string()),
            mail_relay_url: non_empty_var("MAIL_RELAY_URL"),
            mail_relay_token: non_empty_var("MAIL_RELAY_TOKEN"),
        }
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }

        let path = self.sqlite_path.trim();
        if path.starts_with("sqlite:") || path.starts_with("file:") {
            return path.to_string();
        }
        format!("sqlite://{}", path)
    }

    /// Cookie signing key. Secrets shorter than 32 bytes cannot be expanded,
    /// so a random key is used and sessions do not survive a restart.
    pub fn session_key(&self) -> Key {
        if self.secret_key.len() >= 32 {
            Key::derive_from(self.secret_key.as_bytes())
        } else {
            warn!("SECRET_KEY is shorter than 32 bytes, using a random session key");
            Key::generate()
        }
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            server_port: 0,
            sqlite_path: String::new(),
            database_url: Some("sqlite::memory:".to_string()),
            secret_key: "test-secret-key-that-is-long-enough-to-derive".to_string(),
            posts_per_page: 3,
            reset_token_ttl_secs: 600,
            session_lifetime_minutes: 120,
            remember_cookie_days: 365,
            cookie_secure: false,
            csrf_enabled: false,
            mail_sender: "no-reply@microblog.test".to_string(),
            mail_relay_url: None,
            mail_relay_token: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn parse_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
