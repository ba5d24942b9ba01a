use actix_session::{Session, SessionExt};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, warn};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::flash;

pub(crate) const USER_ID_KEY: &str = "user_id";
const EXPIRES_AT_KEY: &str = "login_expires_at";
const HASH_COST: u32 = 10;

/// Signed-in user, resolved from the session. Anonymous requests are sent
/// to the login page with `next` pointing back at the original path.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

/// Signed-in user if any; never rejects.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<user::Model>);

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = req.app_data::<web::Data<DatabaseConnection>>().cloned();
        let session = req.get_session();
        let next = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());

        Box::pin(async move {
            let db = db.ok_or_else(AppError::system_exception)?;
            match load_user(db.get_ref(), &session).await? {
                Some(user) => Ok(CurrentUser(user)),
                None => {
                    flash::flash(&session, "Please log in to access this page.");
                    Err(AppError::need_login(next).into())
                }
            }
        })
    }
}

impl FromRequest for MaybeUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = req.app_data::<web::Data<DatabaseConnection>>().cloned();
        let session = req.get_session();

        Box::pin(async move {
            let db = match db {
                Some(db) => db,
                None => return Ok(MaybeUser(None)),
            };
            let user = load_user(db.get_ref(), &session).await?;
            Ok(MaybeUser(user))
        })
    }
}

async fn load_user(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<Option<user::Model>, AppError> {
    let user_id = match session_user_id(session) {
        Some(id) => id,
        None => return Ok(None),
    };
    let user = user::Entity::find_by_id(user_id).one(db).await?;
    if user.is_none() {
        warn!("session refers to missing user id={}", user_id);
        clear_login(session);
    }
    Ok(user)
}

/// User id stored in the session, dropping logins past their expiry.
pub fn session_user_id(session: &Session) -> Option<i32> {
    let user_id = session.get::<i32>(USER_ID_KEY).ok().flatten()?;
    if let Ok(Some(expires_at)) = session.get::<i64>(EXPIRES_AT_KEY) {
        if Utc::now().timestamp() >= expires_at {
            debug!("login expired for user id={}", user_id);
            clear_login(session);
            return None;
        }
    }
    Some(user_id)
}

/// Non-remembered logins expire after the configured session lifetime;
/// remembered ones last as long as the persistent cookie.
pub fn login_user(
    session: &Session,
    config: &AppConfig,
    user_id: i32,
    remember: bool,
) -> Result<(), AppError> {
    session.renew();
    session
        .insert(USER_ID_KEY, user_id)
        .map_err(|_| AppError::system_exception())?;
    if remember {
        session.remove(EXPIRES_AT_KEY);
    } else {
        let expires_at = Utc::now() + Duration::minutes(config.session_lifetime_minutes);
        session
            .insert(EXPIRES_AT_KEY, expires_at.timestamp())
            .map_err(|_| AppError::system_exception())?;
    }
    Ok(())
}

pub fn logout_user(session: &Session) {
    clear_login(session);
}

fn clear_login(session: &Session) {
    session.remove(USER_ID_KEY);
    session.remove(EXPIRES_AT_KEY);
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, HASH_COST).map_err(|e| {
        error!("password hash failed: {}", e);
        AppError::system_exception()
    })
}

pub fn check_password(user: &user::Model, password: &str) -> bool {
    verify(password, &user.password_hash).unwrap_or(false)
}

#[derive(Serialize, Deserialize)]
struct ResetClaims {
    reset_password: i32,
    exp: usize,
}

pub fn reset_password_token(config: &AppConfig, user_id: i32) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::seconds(config.reset_token_ttl_secs)).timestamp() as usize;
    encode_reset_claims(config, user_id, exp)
}

fn encode_reset_claims(config: &AppConfig, user_id: i32, exp: usize) -> Result<String, AppError> {
    let claims = ResetClaims {
        reset_password: user_id,
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
    .map_err(|_| AppError::system_exception())
}

/// User id carried by a valid, unexpired reset token.
pub fn verify_reset_password_token(config: &AppConfig, token: &str) -> Option<i32> {
    let key = DecodingKey::from_secret(config.secret_key.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    match decode::<ResetClaims>(token, &key, &validation) {
        Ok(data) => Some(data.claims.reset_password),
        Err(e) => {
            debug!("rejected reset token: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> user::Model {
        user::Model {
            id: 7,
            username: "susan".to_string(),
            email: "susan@example.com".to_string(),
            password_hash: hash_password(password).unwrap(),
            about_me: None,
            last_seen: None,
        }
    }

    #[test]
    fn password_hashing() {
        let u = user_with_password("cat");
        assert!(!check_password(&u, "dog"));
        assert!(check_password(&u, "cat"));
    }

    #[test]
    fn reset_token_round_trips_user_id() {
        let config = AppConfig::for_tests();
        let token = reset_password_token(&config, 42).unwrap();
        assert_eq!(verify_reset_password_token(&config, &token), Some(42));
    }

    #[test]
    fn expired_reset_token_is_rejected() {
        let config = AppConfig::for_tests();
        let exp = (Utc::now() - Duration::hours(1)).timestamp() as usize;
        let token = encode_reset_claims(&config, 42, exp).unwrap();
        assert_eq!(verify_reset_password_token(&config, &token), None);
    }

    #[test]
    fn reset_token_from_other_secret_is_rejected() {
        let config = AppConfig::for_tests();
        let mut other = AppConfig::for_tests();
        other.secret_key = "a-completely-different-secret-value-here".to_string();
        let token = reset_password_token(&other, 42).unwrap();
        assert_eq!(verify_reset_password_token(&config, &token), None);
        assert_eq!(verify_reset_password_token(&config, "not.a.token"), None);
    }
}
