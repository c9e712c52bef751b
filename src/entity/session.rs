//! Session entity model backing [`crate::SeaOrmStore`].

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing a stored session.
///
/// # Database Schema
///
/// | Column      | Type                    | Description                       |
/// |-------------|-------------------------|-----------------------------------|
/// | id          | TEXT (Primary Key)      | Session ID                        |
/// | data        | BLOB / BYTEA            | MessagePack-serialized record     |
/// | expiry_date | TIMESTAMPTZ             | Session expiration timestamp      |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// The `tower_sessions::session::Id` in its string form.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// The whole `tower_sessions::session::Record`, including the signed-in user.
    pub data: Vec<u8>,

    /// Rows past this instant are ignored on load and removed by the sweep.
    pub expiry_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
