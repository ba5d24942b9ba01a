//! Shared fixtures for handler tests: an in-memory database, the full app
//! stack, and a one-cookie jar that carries the session between requests.

use actix_http::Request;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    body::MessageBody,
    cookie::{Cookie, Key},
    dev::{Service, ServiceResponse},
    http::header,
    middleware, test, web, App,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::db::connect_memory;
use crate::entity::user;
use crate::response::form_error_handler;
use crate::routes;

pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

pub async fn test_app() -> (
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    DatabaseConnection,
) {
    test_app_with(AppConfig::for_tests()).await
}

pub async fn test_app_with(
    config: AppConfig,
) -> (
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    DatabaseConnection,
) {
    let db = connect_memory().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::FormConfig::default().error_handler(form_error_handler))
            .wrap(middleware::from_fn(routes::last_seen::update_last_seen))
            .wrap(test_session_middleware())
            .configure(routes::configure)
            .default_service(web::to(routes::not_found)),
    )
    .await;
    (app, db)
}

pub async fn create_user(db: &DatabaseConnection, username: &str, password: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set(hash_password(password).expect("hash password")),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

#[derive(Default)]
pub struct Jar {
    session: Option<Cookie<'static>>,
}

impl Jar {
    pub async fn send<S, B>(&mut self, app: &S, req: test::TestRequest) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let req = match &self.session {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        };
        let res = test::call_service(app, req.to_request()).await;
        if let Some(cookie) = res.response().cookies().find(|c| c.name() == "session") {
            self.session = if cookie.value().is_empty() {
                None
            } else {
                Some(cookie.into_owned())
            };
        }
        res
    }
}

pub async fn login<S, B>(app: &S, jar: &mut Jar, username: &str, password: &str)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = jar
        .send(
            app,
            test::TestRequest::post()
                .uri("/login")
                .set_form([("username", username), ("password", password)]),
        )
        .await;
    assert_eq!(location(&res), "/index", "login as {} failed", username);
}

pub fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_string<B: MessageBody>(res: ServiceResponse<B>) -> String {
    let bytes = test::read_body(res).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
