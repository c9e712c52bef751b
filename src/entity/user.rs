//! Registered user entity.

use sea_orm::entity::prelude::*;

/// A registered account.
///
/// | Column   | Type                     | Description                     |
/// |----------|--------------------------|---------------------------------|
/// | id       | INTEGER (Primary Key)    | Generated identifier            |
/// | username | TEXT (Unique)            | Case-sensitive login name       |
/// | password | TEXT                     | Argon2 PHC hash string          |
///
/// Rows are created by registration and never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Salted one-way hash, never the plain password.
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
