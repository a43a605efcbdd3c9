//! The module contains the `Event` struct and its implementation.
//!
//! An event is a community sports gathering any authenticated user can
//! create. Joins only ever increment `participants_count`; there is no leave
//! operation and no expiry, past-dated events remain in the store until their
//! creator deletes them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

/// A community sports event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Stable identifier, generated once and persisted as the primary key.
    pub id: Uuid,
    pub address: String,
    pub sports: String,
    pub cost: String,
    /// When the event takes place.
    pub date: DateTime<Utc>,
    pub duration: String,
    /// Incremented on each successful join, never decremented.
    pub participants_count: i64,
    /// Insertion timestamp. The projection is ordered by it so "insertion
    /// order" stays deterministic across reloads.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Build a fresh event with no participants. Fields are intentionally
    /// not validated: empty strings are accepted, matching the permissive
    /// creation contract.
    pub fn new(
        address: String,
        sports: String,
        cost: String,
        date: DateTime<Utc>,
        duration: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            address,
            sports,
            cost,
            date,
            duration,
            participants_count: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub address: String,
    pub sports: String,
    pub cost: String,
    pub date: DateTimeUtc,
    pub duration: String,
    pub participants_count: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Event> for ActiveModel {
    fn from(event: &Event) -> Self {
        Self {
            id: ActiveValue::Set(event.id.to_string()),
            address: ActiveValue::Set(event.address.clone()),
            sports: ActiveValue::Set(event.sports.clone()),
            cost: ActiveValue::Set(event.cost.clone()),
            date: ActiveValue::Set(event.date),
            duration: ActiveValue::Set(event.duration.clone()),
            participants_count: ActiveValue::Set(event.participants_count),
            created_at: ActiveValue::Set(event.created_at),
        }
    }
}

impl TryFrom<Model> for Event {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("event not exists".to_string()))?,
            address: model.address,
            sports: model.sports,
            cost: model.cost,
            date: model.date,
            duration: model.duration,
            participants_count: model.participants_count,
            created_at: model.created_at,
        })
    }
}
