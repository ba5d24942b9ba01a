use std::collections::HashMap;

use chrono::Utc;
use log::debug;
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select, Set,
};

use crate::entity::{follow, post, user};

pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn is_following(
    db: &DatabaseConnection,
    follower_id: i32,
    followed_id: i32,
) -> Result<bool, DbErr> {
    let count = follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(follower_id))
        .filter(follow::Column::FollowedId.eq(followed_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Adds the edge unless it already exists.
pub async fn follow(db: &DatabaseConnection, follower_id: i32, followed_id: i32) -> Result<(), DbErr> {
    if is_following(db, follower_id, followed_id).await? {
        return Ok(());
    }
    let edge = follow::ActiveModel {
        follower_id: Set(follower_id),
        followed_id: Set(followed_id),
        created: Set(Some(Utc::now())),
        ..Default::default()
    };
    edge.insert(db).await?;
    debug!("user {} follows {}", follower_id, followed_id);
    Ok(())
}

pub async fn unfollow(
    db: &DatabaseConnection,
    follower_id: i32,
    followed_id: i32,
) -> Result<(), DbErr> {
    let result = follow::Entity::delete_many()
        .filter(follow::Column::FollowerId.eq(follower_id))
        .filter(follow::Column::FollowedId.eq(followed_id))
        .exec(db)
        .await?;
    debug!(
        "user {} unfollows {} removed={}",
        follower_id, followed_id, result.rows_affected
    );
    Ok(())
}

pub async fn followers_count(db: &DatabaseConnection, user_id: i32) -> Result<u64, DbErr> {
    follow::Entity::find()
        .filter(follow::Column::FollowedId.eq(user_id))
        .count(db)
        .await
}

pub async fn following_count(db: &DatabaseConnection, user_id: i32) -> Result<u64, DbErr> {
    follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(user_id))
        .count(db)
        .await
}

fn newest_first(select: Select<post::Entity>) -> Select<post::Entity> {
    select
        .order_by_desc(post::Column::Timestamp)
        .order_by_desc(post::Column::Id)
}

/// Posts by the accounts `user_id` follows, plus its own.
pub fn followed_posts(user_id: i32) -> Select<post::Entity> {
    let followed = Query::select()
        .column(follow::Column::FollowedId)
        .from(follow::Entity)
        .and_where(follow::Column::FollowerId.eq(user_id))
        .to_owned();
    newest_first(
        post::Entity::find().filter(
            Condition::any()
                .add(post::Column::UserId.in_subquery(followed))
                .add(post::Column::UserId.eq(user_id)),
        ),
    )
}

pub fn user_posts(user_id: i32) -> Select<post::Entity> {
    newest_first(post::Entity::find().filter(post::Column::UserId.eq(user_id)))
}

pub fn all_posts() -> Select<post::Entity> {
    newest_first(post::Entity::find())
}

pub async fn create_post(
    db: &DatabaseConnection,
    user_id: i32,
    body: &str,
) -> Result<post::Model, DbErr> {
    let model = post::ActiveModel {
        body: Set(body.to_string()),
        timestamp: Set(Utc::now()),
        user_id: Set(user_id),
        ..Default::default()
    };
    let inserted = model.insert(db).await?;
    debug!("post saved id={} user={}", inserted.id, user_id);
    Ok(inserted)
}

/// Authors of `posts`, keyed by user id, for rendering.
pub async fn authors_of(
    db: &DatabaseConnection,
    posts: &[post::Model],
) -> Result<HashMap<i32, user::Model>, DbErr> {
    let mut ids: Vec<i32> = posts.iter().map(|p| p.user_id).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}
