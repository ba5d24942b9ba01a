use actix_session::Session;
use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::auth::CurrentUser;
use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::flash::flash;
use crate::forms::{FormErrors, PostForm};
use crate::pagination::{paginate_posts, PageQuery};
use crate::response::{html, redirect};
use crate::social;
use crate::templates::{self, PageContext};

pub fn config(cfg: &mut web::ServiceConfig) {
    for path in ["/", "/index", "/index/"] {
        cfg.service(
            web::resource(path)
                .route(web::get().to(index))
                .route(web::post().to(create_post)),
        );
    }
    cfg.service(web::resource("/explore").route(web::get().to(explore)));
}

async fn render_home(
    db: &DatabaseConnection,
    config: &AppConfig,
    session: &Session,
    me: &user::Model,
    page_no: u64,
    form: &PostForm,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    let page = paginate_posts(db, social::followed_posts(me.id), page_no, config.posts_per_page).await?;
    let authors = social::authors_of(db, &page.items).await?;
    let ctx = PageContext::new(session, Some(me));
    Ok(html(templates::posts::index(
        &ctx,
        "Home Page",
        Some((form, errors)),
        &page,
        &authors,
        "/index",
    )))
}

async fn index(
    current: CurrentUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    render_home(
        db.get_ref(),
        &config,
        &session,
        &current.0,
        query.number(),
        &PostForm::default(),
        &FormErrors::default(),
    )
    .await
}

async fn create_post(
    current: CurrentUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<PageQuery>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse, AppError> {
    let me = current.0;
    let form = form.into_inner();
    let errors = form.validate(&session, &config);
    if !errors.is_empty() {
        return render_home(db.get_ref(), &config, &session, &me, query.number(), &form, &errors).await;
    }

    social::create_post(db.get_ref(), me.id, form.post.trim()).await?;
    flash(&session, "Your post successfully added");
    Ok(redirect("/index"))
}

async fn explore(
    current: CurrentUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let me = current.0;
    let page = paginate_posts(
        db.get_ref(),
        social::all_posts(),
        query.number(),
        config.posts_per_page,
    )
    .await?;
    let authors = social::authors_of(db.get_ref(), &page.items).await?;
    let ctx = PageContext::new(&session, Some(&me));
    Ok(html(templates::posts::index(
        &ctx, "Explore", None, &page, &authors, "/explore",
    )))
}
