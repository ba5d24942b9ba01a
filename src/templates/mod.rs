//! Server-rendered pages. Markup is assembled in Rust; every dynamic value
//! goes through `text` or `attr` before it reaches the output.

pub mod auth;
pub mod email;
pub mod errors;
pub mod posts;
pub mod user;

use std::collections::HashMap;
use std::fmt::Write;

use actix_session::Session;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::csrf;
use crate::entity::{post, user as user_entity};
use crate::flash;
use crate::forms::FormErrors;
use crate::pagination::Page;
use crate::response::user_path;

/// Per-request state shared by every page: who is signed in, pending
/// flashes, and the form token.
pub struct PageContext<'a> {
    pub user: Option<&'a user_entity::Model>,
    pub flashes: Vec<String>,
    pub csrf_token: String,
}

impl<'a> PageContext<'a> {
    pub fn new(session: &Session, user: Option<&'a user_entity::Model>) -> Self {
        Self {
            user,
            flashes: flash::take(session),
            csrf_token: csrf::token(session),
        }
    }
}

pub(crate) fn text(value: &str) -> String {
    encode_text(value).to_string()
}

pub(crate) fn attr(value: &str) -> String {
    encode_double_quoted_attribute(value).to_string()
}

pub fn layout(ctx: &PageContext<'_>, title: Option<&str>, content: &str) -> String {
    let title = match title {
        Some(t) => format!("{} - Microblog", text(t)),
        None => "Welcome to Microblog".to_string(),
    };

    let mut nav = String::from(
        r#"<a href="/index">Home</a> <a href="/explore">Explore</a>"#,
    );
    match ctx.user {
        Some(u) => {
            let _ = write!(
                nav,
                r#" <a href="{}">Profile</a> <a href="/logout">Logout</a>"#,
                attr(&user_path("user", &u.username))
            );
        }
        None => nav.push_str(r#" <a href="/login">Login</a>"#),
    }

    let mut flashes = String::new();
    if !ctx.flashes.is_empty() {
        flashes.push_str(r#"<ul class="flashes">"#);
        for msg in &ctx.flashes {
            let _ = write!(flashes, "<li>{}</li>", text(msg));
        }
        flashes.push_str("</ul>");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<div class="nav">Microblog: {nav}</div>
<hr>
{flashes}
{content}
</body>
</html>
"#
    )
}

pub(crate) fn csrf_input(ctx: &PageContext<'_>) -> String {
    format!(
        r#"<input type="hidden" name="csrf_token" value="{}">"#,
        attr(&ctx.csrf_token)
    )
}

pub(crate) fn field_errors(errors: &FormErrors, field: &str) -> String {
    errors
        .get(field)
        .iter()
        .map(|e| format!(r#"<span class="error">[{}]</span>"#, text(e)))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn form_errors_banner(errors: &FormErrors) -> String {
    let csrf = errors.csrf();
    if csrf.is_empty() {
        return String::new();
    }
    format!(r#"<p class="error">{}</p>"#, text(&csrf.join(" ")))
}

pub(crate) fn input(
    label: &str,
    name: &str,
    kind: &str,
    value: &str,
    size: u32,
    errors: &FormErrors,
) -> String {
    format!(
        r#"<p>
<label for="{name}">{label}</label><br>
<input id="{name}" name="{name}" type="{kind}" size="{size}" value="{value}">
{errs}
</p>"#,
        name = attr(name),
        label = text(label),
        kind = attr(kind),
        size = size,
        value = attr(value),
        errs = field_errors(errors, name),
    )
}

pub(crate) fn textarea(
    label: &str,
    name: &str,
    value: &str,
    cols: u32,
    rows: u32,
    errors: &FormErrors,
) -> String {
    format!(
        r#"<p>
<label for="{name}">{label}</label><br>
<textarea id="{name}" name="{name}" cols="{cols}" rows="{rows}">{value}</textarea>
{errs}
</p>"#,
        name = attr(name),
        label = text(label),
        cols = cols,
        rows = rows,
        value = text(value),
        errs = field_errors(errors, name),
    )
}

pub(crate) fn submit(label: &str) -> String {
    format!(r#"<p><input type="submit" value="{}"></p>"#, attr(label))
}

pub(crate) fn post_row(post: &post::Model, author: Option<&user_entity::Model>) -> String {
    let (avatar, name) = match author {
        Some(a) => (
            format!(r#"<img src="{}">"#, attr(&a.avatar(36))),
            format!(
                r#"<a href="{}">{}</a>"#,
                attr(&user_path("user", &a.username)),
                text(&a.username)
            ),
        ),
        None => (String::new(), "unknown".to_string()),
    };
    format!(
        r#"<table class="post"><tr valign="top">
<td>{avatar}</td>
<td>{name} said <span class="timestamp">{ts}</span>:<br>{body}</td>
</tr></table>"#,
        avatar = avatar,
        name = name,
        ts = text(&post.timestamp.format("%Y-%m-%d %H:%M UTC").to_string()),
        body = text(&post.body),
    )
}

pub(crate) fn post_list(
    page: &Page<post::Model>,
    authors: &HashMap<i32, user_entity::Model>,
) -> String {
    page.items
        .iter()
        .map(|p| post_row(p, authors.get(&p.user_id)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Newer/older links; `base` is the route without query string.
pub(crate) fn pager<T>(page: &Page<T>, base: &str) -> String {
    let mut out = String::new();
    if let Some(prev) = page.prev_num() {
        let _ = write!(
            out,
            r#"<a class="prev" href="{}?page={}">Newer posts</a>"#,
            attr(base),
            prev
        );
    }
    if let Some(next) = page.next_num() {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(
            out,
            r#"<a class="next" href="{}?page={}">Older posts</a>"#,
            attr(base),
            next
        );
    }
    out
}
