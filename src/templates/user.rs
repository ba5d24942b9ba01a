use std::collections::HashMap;

use super::{attr, csrf_input, form_errors_banner, input, layout, pager, post_list, submit, text, textarea, PageContext};
use crate::entity::{post, user};
use crate::forms::{EditProfileForm, FormErrors};
use crate::pagination::Page;
use crate::response::user_path;

pub struct Profile<'a> {
    pub user: &'a user::Model,
    pub followers: u64,
    pub following: u64,
    pub is_following: bool,
}

pub fn profile(
    ctx: &PageContext<'_>,
    profile: &Profile<'_>,
    page: &Page<post::Model>,
    authors: &HashMap<i32, user::Model>,
) -> String {
    let u = profile.user;
    let about = u
        .about_me
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|a| format!("<p>{}</p>", text(a)))
        .unwrap_or_default();
    let last_seen = u
        .last_seen
        .map(|ts| format!("<p>Last seen on: {}</p>", text(&ts.format("%Y-%m-%d %H:%M UTC").to_string())))
        .unwrap_or_default();

    let is_self = ctx.user.map(|me| me.id == u.id).unwrap_or(false);
    let action = if is_self {
        r#"<p><a href="/edit_profile">Edit your profile</a></p>"#.to_string()
    } else if !profile.is_following {
        format!(r#"<p><a href="{}">Follow</a></p>"#, attr(&user_path("follow", &u.username)))
    } else {
        format!(r#"<p><a href="{}">Unfollow</a></p>"#, attr(&user_path("unfollow", &u.username)))
    };

    let base = user_path("user", &u.username);
    let content = format!(
        r#"<table><tr valign="top">
<td><img src="{avatar}"></td>
<td>
<h1>User: {name}</h1>
{about}
{last_seen}
<p>{followers} followers, {following} following.</p>
{action}
</td>
</tr></table>
<hr>
{posts}
<p class="pager">{pager}</p>"#,
        avatar = attr(&u.avatar(128)),
        name = text(&u.username),
        about = about,
        last_seen = last_seen,
        followers = profile.followers,
        following = profile.following,
        action = action,
        posts = post_list(page, authors),
        pager = pager(page, &base),
    );
    layout(ctx, Some(&u.username), &content)
}

pub fn edit_profile(ctx: &PageContext<'_>, form: &EditProfileForm, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>Edit Profile</h1>
<form action="/edit_profile" method="post" novalidate>
{csrf}
{banner}
{username}
{about_me}
{submit}
</form>"#,
        csrf = csrf_input(ctx),
        banner = form_errors_banner(errors),
        username = input("Username", "username", "text", &form.username, 32, errors),
        about_me = textarea("About me", "about_me", &form.about_me, 50, 4, errors),
        submit = submit("Submit"),
    );
    layout(ctx, Some("Edit Profile"), &content)
}
