use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{NewUser, User};

/// Write-side entity for the users table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at.to_utc(),
            updated_at: model.updated_at.to_utc(),
            version: model.version,
        }
    }
}

// New rows start at version 0; the id comes from the sequence
impl From<NewUser> for ActiveModel {
    fn from(user: NewUser) -> Self {
        ActiveModel {
            id: NotSet,
            name: Set(user.name),
            email: Set(user.email),
            created_at: Set(user.created_at.fixed_offset()),
            updated_at: Set(user.updated_at.fixed_offset()),
            version: Set(0),
        }
    }
}
