use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set, TransactionTrait,
};
use time::OffsetDateTime;
use tower_sessions::{session::Id, session::Record, session_store, ExpiredDeletion, SessionStore};
use tracing::{debug, warn};

use crate::entity::session::{self, ActiveModel as SessionActiveModel, Entity as SessionEntity};

/// Session store persisting `tower-sessions` records in the application database.
///
/// Records are serialized with MessagePack and kept in the `sessions` table
/// created by [`crate::migration::Migrator`]. Works on every backend the crate
/// is built for (Postgres in production, SQLite in tests).
///
/// # Error Handling
///
/// - Database errors → `session_store::Error::Backend`
/// - Serialization errors → `session_store::Error::Encode`
/// - Deserialization errors → `session_store::Error::Decode`
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    conn: DatabaseConnection,
}

impl SeaOrmStore {
    /// Creates a store over `conn`. Run the migrations before first use.
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Runs [`ExpiredDeletion::delete_expired`] every `period` until the task is dropped.
    ///
    /// Failures are logged and retried on the next tick.
    pub async fn continuously_delete_expired(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match self.delete_expired().await {
                Ok(()) => debug!("expired sessions removed"),
                Err(e) => warn!(error = %e, "failed to remove expired sessions"),
            }
        }
    }
}

#[async_trait]
impl SessionStore for SeaOrmStore {
    /// Inserts a new record, regenerating its id until it does not collide.
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let txn = self.conn.begin().await.map_err(backend)?;

        while SessionEntity::find_by_id(record.id.to_string())
            .one(&txn)
            .await
            .map_err(backend)?
            .is_some()
        {
            record.id = Id::default();
        }

        let data =
            rmp_serde::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))?;

        SessionActiveModel {
            id: Set(record.id.to_string()),
            data: Set(data),
            expiry_date: Set(to_db_time(record.expiry_date)?),
        }
        .insert(&txn)
        .await
        .map_err(backend)?;

        txn.commit().await.map_err(backend)?;

        Ok(())
    }

    /// Updates the record in place, or inserts it if it is not stored yet.
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data =
            rmp_serde::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))?;
        let expiry_date = to_db_time(record.expiry_date)?;

        match SessionEntity::find_by_id(record.id.to_string())
            .one(&self.conn)
            .await
            .map_err(backend)?
        {
            Some(existing) => {
                let mut active_model = existing.into_active_model();
                active_model.data = Set(data);
                active_model.expiry_date = Set(expiry_date);
                active_model.update(&self.conn).await.map_err(backend)?;
            }
            None => {
                SessionActiveModel {
                    id: Set(record.id.to_string()),
                    data: Set(data),
                    expiry_date: Set(expiry_date),
                }
                .insert(&self.conn)
                .await
                .map_err(backend)?;
            }
        }

        Ok(())
    }

    /// Loads an unexpired record. Expired rows read as absent.
    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = to_db_time(OffsetDateTime::now_utc())?;

        let Some(model) = SessionEntity::find_by_id(session_id.to_string())
            .filter(session::Column::ExpiryDate.gt(now))
            .one(&self.conn)
            .await
            .map_err(backend)?
        else {
            return Ok(None);
        };

        let record = rmp_serde::from_slice(&model.data)
            .map_err(|e| session_store::Error::Decode(e.to_string()))?;
        Ok(Some(record))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        SessionEntity::delete_by_id(session_id.to_string())
            .exec(&self.conn)
            .await
            .map_err(backend)?;

        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SeaOrmStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = to_db_time(OffsetDateTime::now_utc())?;

        SessionEntity::delete_many()
            .filter(session::Column::ExpiryDate.lt(now))
            .exec(&self.conn)
            .await
            .map_err(backend)?;

        Ok(())
    }
}

fn backend(e: DbErr) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

// time::OffsetDateTime -> chrono, which is what sea-orm binds for timestamptz columns.
fn to_db_time(time: OffsetDateTime) -> session_store::Result<DateTimeWithTimeZone> {
    DateTime::from_timestamp(time.unix_timestamp(), time.nanosecond())
        .map(Into::into)
        .ok_or_else(|| {
            session_store::Error::Encode(format!("expiry date {time} is out of range"))
        })
}
