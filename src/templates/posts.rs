use std::collections::HashMap;

use super::{csrf_input, form_errors_banner, layout, pager, post_list, submit, text, textarea, PageContext};
use crate::entity::{post, user};
use crate::forms::{FormErrors, PostForm};
use crate::pagination::Page;

/// Home timeline; `form` is `None` on the explore page.
pub fn index(
    ctx: &PageContext<'_>,
    title: &str,
    form: Option<(&PostForm, &FormErrors)>,
    page: &Page<post::Model>,
    authors: &HashMap<i32, user::Model>,
    base: &str,
) -> String {
    let greeting = ctx
        .user
        .map(|u| format!("<h1>Hi, {}!</h1>", text(&u.username)))
        .unwrap_or_default();

    let form_html = match form {
        Some((form, errors)) => format!(
            r#"<form action="/index" method="post" novalidate>
{csrf}
{banner}
{post}
{submit}
</form>"#,
            csrf = csrf_input(ctx),
            banner = form_errors_banner(errors),
            post = textarea("Say something", "post", &form.post, 32, 4, errors),
            submit = submit("Submit"),
        ),
        None => String::new(),
    };

    let content = format!(
        "{greeting}\n{form_html}\n{posts}\n<p class=\"pager\">{pager}</p>",
        greeting = greeting,
        form_html = form_html,
        posts = post_list(page, authors),
        pager = pager(page, base),
    );
    layout(ctx, Some(title), &content)
}
