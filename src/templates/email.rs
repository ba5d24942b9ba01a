use super::{attr, text};

pub fn reset_password_text(username: &str, link: &str) -> String {
    format!(
        "Dear {username},\n\n\
         To reset your password click on the following link:\n\n\
         {link}\n\n\
         If you have not requested a password reset simply ignore this message.\n\n\
         Sincerely,\n\n\
         The Microblog Team\n"
    )
}

pub fn reset_password_html(username: &str, link: &str) -> String {
    format!(
        r#"<p>Dear {username},</p>
<p>To reset your password <a href="{href}">click here</a>.</p>
<p>Alternatively, you can paste the following link in your browser's address bar:</p>
<p>{link}</p>
<p>If you have not requested a password reset simply ignore this message.</p>
<p>Sincerely,</p>
<p>The Microblog Team</p>
"#,
        username = text(username),
        href = attr(link),
        link = text(link),
    )
}
