use log::{info, warn};
use serde::Serialize;

use crate::auth::reset_password_token;
use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::templates::email;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Builds the reset message and hands it off; delivery happens in the
/// background and never fails the request.
pub fn send_password_reset_email(
    config: &AppConfig,
    user: &user::Model,
    base_url: &str,
) -> Result<(), AppError> {
    let token = reset_password_token(config, user.id)?;
    let message = password_reset_message(config, user, base_url, &token);
    send_async(config.clone(), message);
    Ok(())
}

fn password_reset_message(
    config: &AppConfig,
    user: &user::Model,
    base_url: &str,
    token: &str,
) -> Message {
    let link = format!("{}/reset_password/{}", base_url.trim_end_matches('/'), token);
    Message {
        sender: config.mail_sender.clone(),
        recipients: vec![user.email.clone()],
        subject: "[Microblog] Reset Your Password".to_string(),
        text_body: email::reset_password_text(&user.username, &link),
        html_body: email::reset_password_html(&user.username, &link),
    }
}

fn send_async(config: AppConfig, message: Message) {
    actix_web::rt::spawn(async move {
        if let Err(e) = deliver(&config, &message).await {
            warn!("mail delivery to {:?} failed: {}", message.recipients, e);
        }
    });
}

async fn deliver(config: &AppConfig, message: &Message) -> Result<(), reqwest::Error> {
    let url = match &config.mail_relay_url {
        Some(url) => url,
        None => {
            info!(
                "mail relay not configured, message to {:?}: {}\n{}",
                message.recipients, message.subject, message.text_body
            );
            return Ok(());
        }
    };

    let client = reqwest::Client::new();
    let mut req = client.post(url).json(message);
    if let Some(token) = &config.mail_relay_token {
        req = req.bearer_auth(token);
    }
    req.send().await?.error_for_status()?;
    info!("mail sent to {:?}", message.recipients);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_reset_password_token;

    #[test]
    fn reset_message_links_to_token() {
        let config = AppConfig::for_tests();
        let user = user::Model {
            id: 3,
            username: "susan".to_string(),
            email: "susan@example.com".to_string(),
            password_hash: String::new(),
            about_me: None,
            last_seen: None,
        };
        let token = reset_password_token(&config, user.id).unwrap();
        let msg = password_reset_message(&config, &user, "http://localhost:5000/", &token);

        assert_eq!(msg.recipients, vec!["susan@example.com".to_string()]);
        assert_eq!(msg.subject, "[Microblog] Reset Your Password");
        let link = format!("http://localhost:5000/reset_password/{}", token);
        assert!(msg.text_body.contains(&link));
        assert!(msg.html_body.contains(&link));
        assert_eq!(verify_reset_password_token(&config, &token), Some(3));
    }

    #[test]
    fn relay_payload_carries_both_bodies() {
        let msg = Message {
            sender: "noreply@microblog.local".to_string(),
            recipients: vec!["john@example.com".to_string()],
            subject: "hi".to_string(),
            text_body: "plain".to_string(),
            html_body: "<p>rich</p>".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["recipients"][0], "john@example.com");
        assert_eq!(value["text_body"], "plain");
        assert_eq!(value["html_body"], "<p>rich</p>");
        assert_eq!(value["sender"], "noreply@microblog.local");
    }
}
