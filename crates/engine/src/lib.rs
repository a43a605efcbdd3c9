//! GoFit engine: the event participation and points-economy core.
//!
//! The [`Engine`] owns an in-memory projection of the persisted events, the
//! session-scoped joined/created sets and the acting user. Every mutation
//! goes through the store; multi-record mutations share one database
//! transaction so counters and balances move together or not at all. After a
//! mutation the projection is reloaded wholesale and a fresh snapshot is
//! published to subscribers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tokio::sync::watch;
use uuid::Uuid;

pub use error::EngineError;
pub use events::Event;
pub use session::Session;
pub use shop::ShopItem;
pub use users::User;

mod error;
pub mod events;
mod session;
pub mod shop;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;

/// GoPoints granted for joining an event.
pub const JOIN_EVENT_POINTS: i64 = 10;
/// GoPoints granted for completing a recommended exercise.
pub const EXERCISE_POINTS: i64 = 5;

/// Read-only view published to subscribers after every successful mutation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventsSnapshot {
    pub events: Vec<Event>,
    pub current_user: Option<User>,
    pub joined_events: HashSet<Uuid>,
    pub created_events: HashSet<Uuid>,
}

#[derive(Debug)]
pub struct Engine {
    events: Vec<Event>,
    joined_events: HashSet<Uuid>,
    created_events: HashSet<Uuid>,
    current_user: Option<User>,
    session: Session,
    database: DatabaseConnection,
    snapshot_tx: watch::Sender<EventsSnapshot>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Events in insertion order, mirroring the store as of the last reload.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Event ids this session joined.
    pub fn joined_events(&self) -> &HashSet<Uuid> {
        &self.joined_events
    }

    /// Event ids this session created.
    pub fn created_events(&self) -> &HashSet<Uuid> {
        &self.created_events
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Watch the engine state. The receiver holds the latest snapshot and is
    /// updated after every successful mutation.
    pub fn subscribe(&self) -> watch::Receiver<EventsSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(EventsSnapshot {
            events: self.events.clone(),
            current_user: self.current_user.clone(),
            joined_events: self.joined_events.clone(),
            created_events: self.created_events.clone(),
        });
    }

    /// Replace the in-memory projection with the store contents.
    ///
    /// The projection is a read-model convenience; the store stays the source
    /// of truth and this reload runs after every mutating operation.
    pub async fn load_events(&mut self) -> ResultEngine<()> {
        let models = events::Entity::find()
            .order_by_asc(events::Column::CreatedAt)
            .all(&self.database)
            .await?;

        let mut events = Vec::with_capacity(models.len());
        for model in models {
            events.push(Event::try_from(model)?);
        }
        self.events = events;
        Ok(())
    }

    /// Bind the acting user directly.
    pub fn set_current_user(&mut self, user: User) {
        self.current_user = Some(user);
        self.publish();
    }

    /// Resolve the acting user from the session identifier.
    ///
    /// A missing record leaves the user unset and the engine behaves as
    /// logged out for reward purposes.
    pub async fn load_current_user(&mut self) -> ResultEngine<()> {
        let Some(user_id) = self.session.user_id() else {
            self.current_user = None;
            return Ok(());
        };

        match users::Entity::find_by_id(user_id).one(&self.database).await? {
            Some(model) => self.current_user = Some(User::try_from(model)?),
            None => {
                tracing::warn!(user_id, "session user not in store, treating as logged out");
                self.current_user = None;
            }
        }
        Ok(())
    }

    /// Register a new user. The caller still has to [`login`] to bind the
    /// session to it.
    ///
    /// [`login`]: Engine::login
    pub async fn register_user(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        profile_picture: Option<Vec<u8>>,
    ) -> ResultEngine<User> {
        if users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .is_some()
        {
            return Err(EngineError::ExistingKey(email.to_string()));
        }

        let mut user = User::new(username.to_string(), email.to_string(), password);
        user.profile_picture = profile_picture;

        let user_model: users::ActiveModel = (&user).into();
        user_model.insert(&self.database).await?;

        Ok(user)
    }

    /// Verify credentials and bind the session to the matching user.
    ///
    /// Joined/created sets belong to the previous login and are dropped, so
    /// a user switch never inherits event ownership or join history.
    /// Returns the logged-in [`Session`] so the caller can persist it.
    pub async fn login(&mut self, email: &str, password: &str) -> ResultEngine<Session> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .map(User::try_from)
            .transpose()?
            .ok_or(EngineError::InvalidCredentials)?;

        if !user.verify_password(password) {
            return Err(EngineError::InvalidCredentials);
        }

        let session = Session::logged_in(user.id.to_string());
        self.session = session.clone();
        self.current_user = Some(user);
        self.joined_events.clear();
        self.created_events.clear();
        self.publish();
        Ok(session)
    }

    /// Unbind the acting user and drop the session-scoped joined/created
    /// sets. Returns the logged-out [`Session`] so the caller can persist it.
    pub fn logout(&mut self) -> Session {
        self.session = Session::logged_out();
        self.current_user = None;
        self.joined_events.clear();
        self.created_events.clear();
        self.publish();
        self.session.clone()
    }

    /// Create a new event with a fresh id and no participants.
    ///
    /// Fields are not validated (empty strings are accepted). The new id is
    /// recorded in the session's created set, which gates deletion.
    pub async fn create_event(
        &mut self,
        address: &str,
        sports: &str,
        cost: &str,
        date: DateTime<Utc>,
        duration: &str,
    ) -> ResultEngine<Uuid> {
        let event = Event::new(
            address.to_string(),
            sports.to_string(),
            cost.to_string(),
            date,
            duration.to_string(),
        );
        let event_id = event.id;

        let event_model: events::ActiveModel = (&event).into();
        event_model.insert(&self.database).await?;

        self.created_events.insert(event_id);
        self.load_events().await?;
        self.publish();
        Ok(event_id)
    }

    /// Join an event.
    ///
    /// Joining again in the same session is a no-op and never double-rewards.
    /// Within one transaction the event's participant counter, the user's
    /// event counter and the user's GoPoints move together; if no user is
    /// bound the participant counter still moves and only the reward is
    /// skipped.
    pub async fn join_event(&mut self, event_id: Uuid) -> ResultEngine<()> {
        if self.joined_events.contains(&event_id) {
            tracing::debug!(%event_id, "already joined, nothing to do");
            return Ok(());
        }

        let event_model = events::Entity::find_by_id(event_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("event not exists".to_string()))?;

        let db_tx = self.database.begin().await?;

        let event_update = events::ActiveModel {
            id: ActiveValue::Set(event_model.id.clone()),
            participants_count: ActiveValue::Set(event_model.participants_count + 1),
            ..Default::default()
        };
        event_update.update(&db_tx).await?;

        let rewarded = match &self.current_user {
            Some(user) => {
                let user_update = users::ActiveModel {
                    id: ActiveValue::Set(user.id.to_string()),
                    events_count: ActiveValue::Set(user.events_count + 1),
                    go_points: ActiveValue::Set(user.go_points + JOIN_EVENT_POINTS),
                    ..Default::default()
                };
                user_update.update(&db_tx).await?;
                true
            }
            None => {
                tracing::warn!(%event_id, "no current user, join recorded without reward");
                false
            }
        };

        db_tx.commit().await?;

        // Apply changes to in-memory state only after the commit.
        if rewarded {
            if let Some(user) = self.current_user.as_mut() {
                user.events_count += 1;
                user.go_points += JOIN_EVENT_POINTS;
            }
        }
        self.joined_events.insert(event_id);
        self.load_events().await?;
        self.publish();
        Ok(())
    }

    /// Delete an event created by this session.
    ///
    /// The record is removed from the projection directly in addition to the
    /// reload; users who joined keep their counters and points.
    pub async fn delete_event(&mut self, event_id: Uuid) -> ResultEngine<()> {
        if events::Entity::find_by_id(event_id.to_string())
            .one(&self.database)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound("event not exists".to_string()));
        }

        if !self.created_events.contains(&event_id) {
            return Err(EngineError::NotAuthorized(
                "only the creator can delete an event".to_string(),
            ));
        }

        events::Entity::delete_by_id(event_id.to_string())
            .exec(&self.database)
            .await?;

        self.created_events.remove(&event_id);
        self.events.retain(|event| event.id != event_id);
        self.load_events().await?;
        self.publish();
        Ok(())
    }

    /// Grant the exercise-completion reward to the acting user.
    ///
    /// Deliberately repeatable: a daily habit reward, not a one-time grant.
    /// Returns the new GoPoints balance.
    pub async fn complete_exercise(&mut self) -> ResultEngine<i64> {
        let user = self.current_user.as_ref().ok_or(EngineError::NoCurrentUser)?;
        let new_balance = user.go_points + EXERCISE_POINTS;

        let user_update = users::ActiveModel {
            id: ActiveValue::Set(user.id.to_string()),
            go_points: ActiveValue::Set(new_balance),
            ..Default::default()
        };
        user_update.update(&self.database).await?;

        if let Some(user) = self.current_user.as_mut() {
            user.go_points = new_balance;
        }
        self.publish();
        Ok(new_balance)
    }

    /// Spend GoPoints on a shop item. Returns the new balance.
    pub async fn purchase_item(&mut self, item: &ShopItem) -> ResultEngine<i64> {
        let user = self.current_user.as_ref().ok_or(EngineError::NoCurrentUser)?;
        if user.go_points < item.cost {
            return Err(EngineError::InsufficientFunds(item.name.to_string()));
        }
        let new_balance = user.go_points - item.cost;

        let user_update = users::ActiveModel {
            id: ActiveValue::Set(user.id.to_string()),
            go_points: ActiveValue::Set(new_balance),
            ..Default::default()
        };
        user_update.update(&self.database).await?;

        if let Some(user) = self.current_user.as_mut() {
            user.go_points = new_balance;
        }
        self.publish();
        Ok(new_balance)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    session: Session,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the session restored by the caller.
    pub fn session(mut self, session: Session) -> EngineBuilder {
        self.session = session;
        self
    }

    /// Construct `Engine`, loading the projection and resolving the session
    /// user from the store.
    pub async fn build(self) -> ResultEngine<Engine> {
        let (snapshot_tx, _) = watch::channel(EventsSnapshot::default());
        let mut engine = Engine {
            events: Vec::new(),
            joined_events: HashSet::new(),
            created_events: HashSet::new(),
            current_user: None,
            session: self.session,
            database: self.database,
            snapshot_tx,
        };

        engine.load_events().await?;
        engine.load_current_user().await?;
        engine.publish();
        Ok(engine)
    }
}
