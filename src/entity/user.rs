use md5::{Digest, Md5};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "t_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub about_me: Option<String>,
    pub last_seen: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Gravatar identicon for the account email.
    pub fn avatar(&self, size: u32) -> String {
        let digest = Md5::digest(self.email.trim().to_lowercase().as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!(
            "https://www.gravatar.com/avatar/{}?d=identicon&s={}",
            hex, size
        )
    }
}
