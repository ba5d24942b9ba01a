use actix_session::SessionExt;
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error,
};
use chrono::Utc;
use log::warn;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::auth::session_user_id;
use crate::entity::user;

/// Stamps `last_seen` for the signed-in user before the handler runs.
pub async fn update_last_seen<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody,
{
    let session = req.get_session();
    if let Some(user_id) = session_user_id(&session) {
        if let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() {
            let active = user::ActiveModel {
                id: Set(user_id),
                last_seen: Set(Some(Utc::now())),
                ..Default::default()
            };
            if let Err(e) = user::Entity::update(active).exec(db.get_ref()).await {
                warn!("last_seen update failed for user id={}: {}", user_id, e);
            }
        }
    }

    next.call(req).await
}
