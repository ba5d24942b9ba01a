mod auth;
mod config;
mod csrf;
mod db;
mod entity;
mod error;
mod flash;
mod forms;
mod mail;
mod pagination;
mod response;
mod routes;
mod social;
mod templates;
#[cfg(test)]
mod test_support;

use actix_session::{
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
    SessionMiddleware,
};
use actix_web::{
    cookie::{time::Duration, Key},
    middleware, web, App, HttpServer,
};
use config::AppConfig;
use db::connect_db;
use log::info;
use response::form_error_handler;

fn session_middleware(config: &AppConfig, key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_string())
        .cookie_path("/".to_string())
        .cookie_secure(config.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .session_lifecycle(
            PersistentSession::default().session_ttl(Duration::days(config.remember_cookie_days)),
        )
        .build()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env();
    let db = connect_db(&config).await.map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("db connect failed: {}", e),
        )
    })?;
    let server_port = config.server_port;
    let session_key = config.session_key();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::FormConfig::default().error_handler(form_error_handler))
            .wrap(middleware::from_fn(routes::last_seen::update_last_seen))
            .wrap(session_middleware(&config, session_key.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
            .default_service(web::to(routes::not_found))
    })
    .bind(("0.0.0.0", server_port))?;
    info!("server started at http://0.0.0.0:{}", server_port);
    server.run().await
}
