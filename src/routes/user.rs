use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::info;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::auth::CurrentUser;
use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::flash::flash;
use crate::forms::{EditProfileForm, FormErrors};
use crate::pagination::{paginate_posts, PageQuery};
use crate::response::{html, redirect, user_path};
use crate::social;
use crate::templates::{self, user::Profile, PageContext};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/user/{username}").route(web::get().to(profile)))
        .service(
            web::resource("/edit_profile")
                .route(web::get().to(edit_profile_page))
                .route(web::post().to(edit_profile)),
        )
        .service(
            web::resource("/follow/{username}")
                .route(web::get().to(follow))
                .route(web::post().to(follow)),
        )
        .service(
            web::resource("/unfollow/{username}")
                .route(web::get().to(unfollow))
                .route(web::post().to(unfollow)),
        );
}

async fn profile(
    current: CurrentUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let me = current.0;
    let target = social::find_by_username(db.get_ref(), &path)
        .await?
        .ok_or_else(AppError::not_found)?;

    let page = paginate_posts(
        db.get_ref(),
        social::user_posts(target.id),
        query.number(),
        config.posts_per_page,
    )
    .await?;
    let authors = social::authors_of(db.get_ref(), &page.items).await?;
    let details = Profile {
        user: &target,
        followers: social::followers_count(db.get_ref(), target.id).await?,
        following: social::following_count(db.get_ref(), target.id).await?,
        is_following: social::is_following(db.get_ref(), me.id, target.id).await?,
    };

    let ctx = PageContext::new(&session, Some(&me));
    Ok(html(templates::user::profile(&ctx, &details, &page, &authors)))
}

async fn edit_profile_page(current: CurrentUser, session: Session) -> Result<HttpResponse, AppError> {
    let me = current.0;
    let form = EditProfileForm {
        username: me.username.clone(),
        about_me: me.about_me.clone().unwrap_or_default(),
        ..Default::default()
    };
    let ctx = PageContext::new(&session, Some(&me));
    Ok(html(templates::user::edit_profile(
        &ctx,
        &form,
        &FormErrors::default(),
    )))
}

async fn edit_profile(
    current: CurrentUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<EditProfileForm>,
) -> Result<HttpResponse, AppError> {
    let me = current.0;
    let form = form.into_inner();
    let errors = form
        .validate(db.get_ref(), &session, &config, &me.username)
        .await?;
    if !errors.is_empty() {
        let ctx = PageContext::new(&session, Some(&me));
        return Ok(html(templates::user::edit_profile(&ctx, &form, &errors)));
    }

    let active = user::ActiveModel {
        id: Set(me.id),
        username: Set(form.username.trim().to_string()),
        about_me: Set(Some(form.about_me.clone())),
        ..Default::default()
    };
    user::Entity::update(active).exec(db.get_ref()).await?;
    info!("profile updated for user id={}", me.id);

    flash(&session, "Changes have been saved");
    Ok(redirect("/edit_profile"))
}

async fn follow(
    current: CurrentUser,
    db: web::Data<DatabaseConnection>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let me = current.0;
    let target = match social::find_by_username(db.get_ref(), &path).await? {
        Some(u) => u,
        None => {
            flash(&session, "No user with such username");
            return Ok(redirect("/index"));
        }
    };
    if target.id == me.id {
        flash(&session, "You cannot follow yourself");
        return Ok(redirect("/index"));
    }

    social::follow(db.get_ref(), me.id, target.id).await?;
    flash(&session, format!("You are following {}!", target.username));
    Ok(redirect(&user_path("user", &target.username)))
}

async fn unfollow(
    current: CurrentUser,
    db: web::Data<DatabaseConnection>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let me = current.0;
    let target = match social::find_by_username(db.get_ref(), &path).await? {
        Some(u) => u,
        None => {
            flash(&session, "No user with such username");
            return Ok(redirect("/index"));
        }
    };
    if target.id == me.id {
        flash(&session, "You cannot unfollow yourself");
        return Ok(redirect("/index"));
    }

    social::unfollow(db.get_ref(), me.id, target.id).await?;
    flash(&session, format!("You have unfollowed {}!", target.username));
    Ok(redirect(&user_path("user", &target.username)))
}
