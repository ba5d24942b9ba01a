use super::{csrf_input, form_errors_banner, input, layout, submit, PageContext};
use crate::forms::{FormErrors, LoginForm, RegistrationForm, ResetPasswordRequestForm};

pub fn login(ctx: &PageContext<'_>, form: &LoginForm, errors: &FormErrors, action: &str) -> String {
    let checked = if form.remember() { " checked" } else { "" };
    let content = format!(
        r#"<h1>Sign In</h1>
<form action="{action}" method="post" novalidate>
{csrf}
{banner}
{username}
{password}
<p><input id="remember_me" name="remember_me" type="checkbox" value="y"{checked}> <label for="remember_me">Remember Me</label></p>
{submit}
</form>
<p>New User? <a href="/register">Click to Register!</a></p>
<p>Forgot Your Password? <a href="/reset_password">Click to Reset It</a></p>"#,
        action = super::attr(action),
        csrf = csrf_input(ctx),
        banner = form_errors_banner(errors),
        username = input("Username", "username", "text", &form.username, 32, errors),
        password = input("Password", "password", "password", "", 32, errors),
        checked = checked,
        submit = submit("Sign In"),
    );
    layout(ctx, Some("Sign in"), &content)
}

pub fn register(ctx: &PageContext<'_>, form: &RegistrationForm, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>Register</h1>
<form action="/register" method="post" novalidate>
{csrf}
{banner}
{username}
{email}
{password}
{password2}
{submit}
</form>"#,
        csrf = csrf_input(ctx),
        banner = form_errors_banner(errors),
        username = input("Username", "username", "text", &form.username, 32, errors),
        email = input("Email", "email", "text", &form.email, 64, errors),
        password = input("Password", "password", "password", "", 32, errors),
        password2 = input("Repeat Password", "password2", "password", "", 32, errors),
        submit = submit("Register"),
    );
    layout(ctx, Some("Register"), &content)
}

pub fn reset_password_request(
    ctx: &PageContext<'_>,
    form: &ResetPasswordRequestForm,
    errors: &FormErrors,
) -> String {
    let content = format!(
        r#"<h1>Reset Password</h1>
<form action="/reset_password" method="post" novalidate>
{csrf}
{banner}
{email}
{submit}
</form>"#,
        csrf = csrf_input(ctx),
        banner = form_errors_banner(errors),
        email = input("Email", "email", "text", &form.email, 64, errors),
        submit = submit("Request Password Reset"),
    );
    layout(ctx, Some("Reset password"), &content)
}

pub fn reset_password(ctx: &PageContext<'_>, errors: &FormErrors, action: &str) -> String {
    let content = format!(
        r#"<h1>Reset Your Password</h1>
<form action="{action}" method="post" novalidate>
{csrf}
{banner}
{password}
{password2}
{submit}
</form>"#,
        action = super::attr(action),
        csrf = csrf_input(ctx),
        banner = form_errors_banner(errors),
        password = input("Password", "password", "password", "", 32, errors),
        password2 = input("Repeat Password", "password2", "password", "", 32, errors),
        submit = submit("Request Password Reset"),
    );
    layout(ctx, Some("Reset password"), &content)
}
