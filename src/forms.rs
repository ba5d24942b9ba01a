//! Submitted forms and their validation rules. Every field defaults to empty
//! so a missing input surfaces as a validation message, not a 400.

use std::collections::BTreeMap;

use actix_session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::csrf;
use crate::entity::user;

const REQUIRED: &str = "This field is required.";
const CSRF_FIELD: &str = "csrf_token";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email pattern"));

#[derive(Debug, Default)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, msg: impl Into<String>) {
        self.0.entry(field).or_default().push(msg.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn csrf(&self) -> &[String] {
        self.get(CSRF_FIELD)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn required(errors: &mut FormErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        return false;
    }
    true
}

fn max_length(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("Field must be between 0 and {} characters long.", max),
        );
    }
}

fn email(errors: &mut FormErrors, field: &'static str, value: &str) {
    if required(errors, field, value) && !EMAIL_RE.is_match(value.trim()) {
        errors.add(field, "Invalid email address.");
    }
}

fn equal_to(errors: &mut FormErrors, field: &'static str, value: &str, other: &str, other_name: &str) {
    if required(errors, field, value) && value != other {
        errors.add(field, format!("Field must be equal to {}.", other_name));
    }
}

fn check_csrf(errors: &mut FormErrors, session: &Session, config: &AppConfig, submitted: &str) {
    if config.csrf_enabled && !csrf::verify(session, submitted) {
        errors.add(CSRF_FIELD, "The CSRF token is missing or invalid.");
    }
}

async fn username_taken(db: &DatabaseConnection, username: &str) -> Result<bool, DbErr> {
    let count = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .count(db)
        .await?;
    Ok(count > 0)
}

async fn email_taken(db: &DatabaseConnection, email: &str) -> Result<bool, DbErr> {
    let count = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .count(db)
        .await?;
    Ok(count > 0)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub remember_me: Option<String>,
    pub csrf_token: String,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        matches!(self.remember_me.as_deref(), Some(v) if !v.is_empty() && v != "false")
    }

    pub fn validate(&self, session: &Session, config: &AppConfig) -> FormErrors {
        let mut errors = FormErrors::default();
        check_csrf(&mut errors, session, config, &self.csrf_token);
        required(&mut errors, "username", &self.username);
        required(&mut errors, "password", &self.password);
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub csrf_token: String,
}

impl RegistrationForm {
    pub async fn validate(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        config: &AppConfig,
    ) -> Result<FormErrors, DbErr> {
        let mut errors = FormErrors::default();
        check_csrf(&mut errors, session, config, &self.csrf_token);
        if required(&mut errors, "username", &self.username) {
            max_length(&mut errors, "username", self.username.trim(), 64);
            if username_taken(db, self.username.trim()).await? {
                errors.add("username", "Please use a different username.");
            }
        }
        email(&mut errors, "email", &self.email);
        if errors.get("email").is_empty() && email_taken(db, self.email.trim()).await? {
            errors.add("email", "Please use a different email address.");
        }
        required(&mut errors, "password", &self.password);
        equal_to(&mut errors, "password2", &self.password2, &self.password, "password");
        Ok(errors)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditProfileForm {
    pub username: String,
    pub about_me: String,
    pub csrf_token: String,
}

impl EditProfileForm {
    /// `original_username` may be kept even though it exists in the table.
    pub async fn validate(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        config: &AppConfig,
        original_username: &str,
    ) -> Result<FormErrors, DbErr> {
        let mut errors = FormErrors::default();
        check_csrf(&mut errors, session, config, &self.csrf_token);
        let username = self.username.trim();
        if required(&mut errors, "username", username) {
            max_length(&mut errors, "username", username, 64);
            if username != original_username && username_taken(db, username).await? {
                errors.add("username", "Please use a different username.");
            }
        }
        max_length(&mut errors, "about_me", &self.about_me, 140);
        Ok(errors)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub post: String,
    pub csrf_token: String,
}

impl PostForm {
    pub fn validate(&self, session: &Session, config: &AppConfig) -> FormErrors {
        let mut errors = FormErrors::default();
        check_csrf(&mut errors, session, config, &self.csrf_token);
        if required(&mut errors, "post", &self.post) && self.post.trim().chars().count() > 140 {
            errors.add("post", "Field must be between 1 and 140 characters long.");
        }
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequestForm {
    pub email: String,
    pub csrf_token: String,
}

impl ResetPasswordRequestForm {
    pub fn validate(&self, session: &Session, config: &AppConfig) -> FormErrors {
        let mut errors = FormErrors::default();
        check_csrf(&mut errors, session, config, &self.csrf_token);
        email(&mut errors, "email", &self.email);
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password2: String,
    pub csrf_token: String,
}

impl ResetPasswordForm {
    pub fn validate(&self, session: &Session, config: &AppConfig) -> FormErrors {
        let mut errors = FormErrors::default();
        check_csrf(&mut errors, session, config, &self.csrf_token);
        required(&mut errors, "password", &self.password);
        equal_to(&mut errors, "password2", &self.password2, &self.password, "password");
        errors
    }
}
