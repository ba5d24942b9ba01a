use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use url::Url;

use crate::auth::{self, MaybeUser};
use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::flash::flash;
use crate::forms::{
    FormErrors, LoginForm, RegistrationForm, ResetPasswordForm, ResetPasswordRequestForm,
};
use crate::mail;
use crate::response::{html, redirect};
use crate::social;
use crate::templates::{self, PageContext};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/login")
            .route(web::get().to(login_page))
            .route(web::post().to(login)),
    )
    .service(
        web::resource("/register")
            .route(web::get().to(register_page))
            .route(web::post().to(register)),
    )
    .service(web::resource("/logout").route(web::get().to(logout)))
    .service(
        web::resource("/reset_password")
            .route(web::get().to(reset_password_request_page))
            .route(web::post().to(reset_password_request)),
    )
    .service(
        web::resource("/reset_password/{token}")
            .route(web::get().to(reset_password_page))
            .route(web::post().to(reset_password)),
    );
}

#[derive(Deserialize)]
struct NextQuery {
    next: Option<String>,
}

/// Only same-site relative targets are honored.
fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if next.is_empty() {
        return None;
    }
    let base = Url::parse("http://microblog.invalid/").ok()?;
    let joined = base.join(next).ok()?;
    if joined.host_str() != base.host_str() || joined.scheme() != base.scheme() {
        debug!("ignoring off-site next target: {}", next);
        return None;
    }
    if Url::parse(next).is_ok() {
        return None;
    }
    Some(next.to_string())
}

fn login_action(query: &NextQuery) -> String {
    match safe_next(query.next.as_deref()) {
        Some(next) => {
            let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
            format!("/login?next={}", encoded)
        }
        None => "/login".to_string(),
    }
}

async fn login_page(
    current: MaybeUser,
    session: Session,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, AppError> {
    if current.0.is_some() {
        return Ok(redirect("/index"));
    }
    let ctx = PageContext::new(&session, None);
    let body = templates::auth::login(
        &ctx,
        &LoginForm::default(),
        &FormErrors::default(),
        &login_action(&query),
    );
    Ok(html(body))
}

async fn login(
    current: MaybeUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    if current.0.is_some() {
        return Ok(redirect("/index"));
    }
    let form = form.into_inner();
    let errors = form.validate(&session, &config);
    if !errors.is_empty() {
        let ctx = PageContext::new(&session, None);
        return Ok(html(templates::auth::login(
            &ctx,
            &form,
            &errors,
            &login_action(&query),
        )));
    }

    let user = social::find_by_username(db.get_ref(), form.username.trim()).await?;
    let user = match user {
        Some(u) if auth::check_password(&u, &form.password) => u,
        _ => {
            flash(&session, "Incorrect user or login");
            return Ok(redirect("/login"));
        }
    };

    auth::login_user(&session, &config, user.id, form.remember())?;
    info!("user {} signed in", user.id);
    let target = safe_next(query.next.as_deref()).unwrap_or_else(|| "/index".to_string());
    Ok(redirect(&target))
}

async fn register_page(current: MaybeUser, session: Session) -> Result<HttpResponse, AppError> {
    if current.0.is_some() {
        return Ok(redirect("/index"));
    }
    let ctx = PageContext::new(&session, None);
    Ok(html(templates::auth::register(
        &ctx,
        &RegistrationForm::default(),
        &FormErrors::default(),
    )))
}

async fn register(
    current: MaybeUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<RegistrationForm>,
) -> Result<HttpResponse, AppError> {
    if current.0.is_some() {
        return Ok(redirect("/index"));
    }
    let form = form.into_inner();
    let errors = form.validate(db.get_ref(), &session, &config).await?;
    if !errors.is_empty() {
        let ctx = PageContext::new(&session, None);
        return Ok(html(templates::auth::register(&ctx, &form, &errors)));
    }

    let user_model = user::ActiveModel {
        username: Set(form.username.trim().to_string()),
        email: Set(form.email.trim().to_string()),
        password_hash: Set(auth::hash_password(&form.password)?),
        ..Default::default()
    };
    let inserted = user_model.insert(db.get_ref()).await?;
    info!("registered user id={}", inserted.id);

    flash(&session, "You successfully registered");
    Ok(redirect("/login"))
}

async fn logout(session: Session) -> HttpResponse {
    auth::logout_user(&session);
    redirect("/index")
}

fn external_base(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

async fn reset_password_request_page(
    current: MaybeUser,
    session: Session,
) -> Result<HttpResponse, AppError> {
    if current.0.is_some() {
        return Ok(redirect("/index"));
    }
    let ctx = PageContext::new(&session, None);
    Ok(html(templates::auth::reset_password_request(
        &ctx,
        &ResetPasswordRequestForm::default(),
        &FormErrors::default(),
    )))
}

async fn reset_password_request(
    req: HttpRequest,
    current: MaybeUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<ResetPasswordRequestForm>,
) -> Result<HttpResponse, AppError> {
    if current.0.is_some() {
        return Ok(redirect("/index"));
    }
    let form = form.into_inner();
    let errors = form.validate(&session, &config);
    if !errors.is_empty() {
        let ctx = PageContext::new(&session, None);
        return Ok(html(templates::auth::reset_password_request(
            &ctx, &form, &errors,
        )));
    }

    if let Some(user) = social::find_by_email(db.get_ref(), form.email.trim()).await? {
        mail::send_password_reset_email(&config, &user, &external_base(&req))?;
    }
    flash(&session, "Check your email for password reset");
    Ok(redirect("/login"))
}

async fn user_for_token(
    db: &DatabaseConnection,
    config: &AppConfig,
    token: &str,
) -> Result<Option<user::Model>, AppError> {
    match auth::verify_reset_password_token(config, token) {
        Some(id) => Ok(user::Entity::find_by_id(id).one(db).await?),
        None => Ok(None),
    }
}

async fn reset_password_page(
    current: MaybeUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    if current.0.is_some() {
        return Ok(redirect("/index"));
    }
    let token = path.into_inner();
    if user_for_token(db.get_ref(), &config, &token).await?.is_none() {
        return Ok(redirect("/login"));
    }
    let ctx = PageContext::new(&session, None);
    let action = format!("/reset_password/{}", token);
    Ok(html(templates::auth::reset_password(
        &ctx,
        &FormErrors::default(),
        &action,
    )))
}

async fn reset_password(
    current: MaybeUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<String>,
    form: web::Form<ResetPasswordForm>,
) -> Result<HttpResponse, AppError> {
    if current.0.is_some() {
        return Ok(redirect("/index"));
    }
    let token = path.into_inner();
    let user = match user_for_token(db.get_ref(), &config, &token).await? {
        Some(u) => u,
        None => return Ok(redirect("/login")),
    };

    let form = form.into_inner();
    let errors = form.validate(&session, &config);
    if !errors.is_empty() {
        let ctx = PageContext::new(&session, None);
        let action = format!("/reset_password/{}", token);
        return Ok(html(templates::auth::reset_password(&ctx, &errors, &action)));
    }

    let active = user::ActiveModel {
        id: Set(user.id),
        password_hash: Set(auth::hash_password(&form.password)?),
        ..Default::default()
    };
    user::Entity::update(active).exec(db.get_ref()).await?;
    info!("password reset for user id={}", user.id);

    flash(&session, "Password successfully changed!");
    Ok(redirect("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        body_string, create_user, location, login, test_app, test_app_with, Jar,
    };
    use actix_web::{http::StatusCode, test::TestRequest};

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/user/john?page=2")).as_deref(), Some("/user/john?page=2"));
        assert_eq!(safe_next(Some("explore")).as_deref(), Some("explore"));
        assert_eq!(safe_next(Some("http://evil.example/")), None);
        assert_eq!(safe_next(Some("//evil.example/path")), None);
        assert_eq!(safe_next(Some("")), None);
        assert_eq!(safe_next(None), None);
    }

    #[actix_web::test]
    async fn login_accepts_only_correct_password() {
        let (app, db) = test_app().await;
        create_user(&db, "susan", "cat").await;
        let mut jar = Jar::default();

        let res = jar
            .send(&app, TestRequest::post().uri("/login").set_form([
                ("username", "susan"),
                ("password", "dog"),
            ]))
            .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/login");
        let page = body_string(jar.send(&app, TestRequest::get().uri("/login")).await).await;
        assert!(page.contains("Incorrect user or login"));

        let res = jar
            .send(&app, TestRequest::get().uri("/index"))
            .await;
        assert_eq!(location(&res), "/login?next=%2Findex");

        let res = jar
            .send(&app, TestRequest::post().uri("/login?next=%2Fexplore").set_form([
                ("username", "susan"),
                ("password", "cat"),
            ]))
            .await;
        assert_eq!(location(&res), "/explore");

        let res = jar.send(&app, TestRequest::get().uri("/index")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let page = body_string(res).await;
        assert!(page.contains("Hi, susan!"));

        let res = jar.send(&app, TestRequest::get().uri("/login")).await;
        assert_eq!(location(&res), "/index");

        let res = jar.send(&app, TestRequest::get().uri("/logout")).await;
        assert_eq!(location(&res), "/index");
        let res = jar.send(&app, TestRequest::get().uri("/index")).await;
        assert_eq!(res.status(), StatusCode::FOUND);
    }

    #[actix_web::test]
    async fn login_without_remember_me_expires() {
        let mut config = AppConfig::for_tests();
        config.session_lifetime_minutes = 0;
        let (app, db) = test_app_with(config).await;
        create_user(&db, "susan", "cat").await;

        let mut jar = Jar::default();
        login(&app, &mut jar, "susan", "cat").await;
        let res = jar.send(&app, TestRequest::get().uri("/index")).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/login?next=%2Findex");

        let mut jar = Jar::default();
        let res = jar
            .send(&app, TestRequest::post().uri("/login").set_form([
                ("username", "susan"),
                ("password", "cat"),
                ("remember_me", "y"),
            ]))
            .await;
        assert_eq!(location(&res), "/index");
        let res = jar.send(&app, TestRequest::get().uri("/index")).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn off_site_next_falls_back_to_index() {
        let (app, db) = test_app().await;
        create_user(&db, "susan", "cat").await;
        let mut jar = Jar::default();
        let res = jar
            .send(
                &app,
                TestRequest::post()
                    .uri("/login?next=http%3A%2F%2Fevil.example%2F")
                    .set_form([("username", "susan"), ("password", "cat")]),
            )
            .await;
        assert_eq!(location(&res), "/index");
    }

    #[actix_web::test]
    async fn registration_flow_and_validation() {
        let (app, db) = test_app().await;
        create_user(&db, "susan", "cat").await;
        let mut jar = Jar::default();

        let res = jar
            .send(&app, TestRequest::post().uri("/register").set_form([
                ("username", "susan"),
                ("email", "susan@example.com"),
                ("password", "a"),
                ("password2", "b"),
            ]))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let page = body_string(res).await;
        assert!(page.contains("Please use a different username."));
        assert!(page.contains("Please use a different email address."));
        assert!(page.contains("Field must be equal to password."));

        let res = jar
            .send(&app, TestRequest::post().uri("/register").set_form([
                ("username", "john"),
                ("email", "john@example.com"),
                ("password", "dog"),
                ("password2", "dog"),
            ]))
            .await;
        assert_eq!(location(&res), "/login");
        let page = body_string(jar.send(&app, TestRequest::get().uri("/login")).await).await;
        assert!(page.contains("You successfully registered"));

        let res = jar
            .send(&app, TestRequest::post().uri("/login").set_form([
                ("username", "john"),
                ("password", "dog"),
            ]))
            .await;
        assert_eq!(location(&res), "/index");
    }

    #[actix_web::test]
    async fn password_reset_with_token() {
        let (app, db) = test_app().await;
        let susan = create_user(&db, "susan", "cat").await;
        let config = AppConfig::for_tests();
        let mut jar = Jar::default();

        let res = jar
            .send(&app, TestRequest::post().uri("/reset_password").set_form([
                ("email", "nobody@example.com"),
            ]))
            .await;
        assert_eq!(location(&res), "/login");

        let res = jar
            .send(&app, TestRequest::post().uri("/reset_password").set_form([
                ("email", "susan@example.com"),
            ]))
            .await;
        assert_eq!(location(&res), "/login");
        let page = body_string(jar.send(&app, TestRequest::get().uri("/login")).await).await;
        assert!(page.contains("Check your email for password reset"));

        let res = jar
            .send(&app, TestRequest::get().uri("/reset_password/garbage"))
            .await;
        assert_eq!(location(&res), "/login");

        let token = auth::reset_password_token(&config, susan.id).unwrap();
        let uri = format!("/reset_password/{}", token);
        let res = jar.send(&app, TestRequest::get().uri(&uri)).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = jar
            .send(&app, TestRequest::post().uri(&uri).set_form([
                ("password", "lion"),
                ("password2", "lion"),
            ]))
            .await;
        assert_eq!(location(&res), "/login");

        let updated = user::Entity::find_by_id(susan.id).one(&db).await.unwrap().unwrap();
        assert!(auth::check_password(&updated, "lion"));
        assert!(!auth::check_password(&updated, "cat"));
    }

    fn csrf_value(page: &str) -> String {
        let marker = r#"name="csrf_token" value=""#;
        let start = page.find(marker).expect("csrf input") + marker.len();
        let end = start + page[start..].find('"').expect("closing quote");
        page[start..end].to_string()
    }

    #[actix_web::test]
    async fn forms_require_csrf_token_when_enabled() {
        let mut config = AppConfig::for_tests();
        config.csrf_enabled = true;
        let (app, db) = test_app_with(config).await;
        let mut jar = Jar::default();

        let page = body_string(jar.send(&app, TestRequest::get().uri("/register")).await).await;
        let token = csrf_value(&page);

        let fields = [
            ("username", "john"),
            ("email", "john@example.com"),
            ("password", "dog"),
            ("password2", "dog"),
        ];
        let res = jar
            .send(&app, TestRequest::post().uri("/register").set_form(fields))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("The CSRF token is missing or invalid."));
        assert!(social::find_by_username(&db, "john").await.unwrap().is_none());

        let res = jar
            .send(&app, TestRequest::post().uri("/register").set_form([
                ("username", "john"),
                ("email", "john@example.com"),
                ("password", "dog"),
                ("password2", "dog"),
                ("csrf_token", token.as_str()),
            ]))
            .await;
        assert_eq!(location(&res), "/login");
        assert!(social::find_by_username(&db, "john").await.unwrap().is_some());
    }
}
