//! The module contains the `User` struct and its implementation.
//!
//! A user is created at registration, loaded at login and mutated during the
//! session (counters, points, picture). Users are never deleted in-app.

use sea_orm::{ActiveValue, entity::prelude::*};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::EngineError;

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Stable identifier, generated once and persisted as the primary key.
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// `salt$hex(sha256(salt || password))`. A placeholder credential, not a
    /// security-grade scheme.
    pub password_hash: String,
    /// Number of events this user joined.
    pub events_count: i64,
    /// GoPoints balance. Only mutated inside the same store transaction as
    /// the change that motivated it.
    pub go_points: i64,
    pub is_pro_user: bool,
    pub profile_picture: Option<Vec<u8>>,
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl User {
    pub fn new(username: String, email: String, password: &str) -> Self {
        let mut user = Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash: String::new(),
            events_count: 0,
            go_points: 0,
            is_pro_user: false,
            profile_picture: None,
        };
        user.set_password(password);
        user
    }

    /// Replace the stored credential with a freshly salted digest.
    pub fn set_password(&mut self, password: &str) {
        let salt = Uuid::new_v4().to_string();
        self.password_hash = format!("{salt}${}", digest(&salt, password));
    }

    pub fn verify_password(&self, password: &str) -> bool {
        match self.password_hash.split_once('$') {
            Some((salt, hash)) => digest(salt, password) == hash,
            None => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub events_count: i64,
    pub go_points: i64,
    pub is_pro_user: bool,
    pub profile_picture: Option<Vec<u8>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.to_string()),
            username: ActiveValue::Set(user.username.clone()),
            email: ActiveValue::Set(user.email.clone()),
            password_hash: ActiveValue::Set(user.password_hash.clone()),
            events_count: ActiveValue::Set(user.events_count),
            go_points: ActiveValue::Set(user.go_points),
            is_pro_user: ActiveValue::Set(user.is_pro_user),
            profile_picture: ActiveValue::Set(user.profile_picture.clone()),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("user not exists".to_string()))?,
            username: model.username,
            email: model.email,
            password_hash: model.password_hash,
            events_count: model.events_count,
            go_points: model.go_points,
            is_pro_user: model.is_pro_user,
            profile_picture: model.profile_picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            String::from("alice"),
            String::from("alice@example.com"),
            "secret",
        )
    }

    #[test]
    fn new_user_starts_at_zero() {
        let user = user();

        assert_eq!(user.events_count, 0);
        assert_eq!(user.go_points, 0);
        assert!(!user.is_pro_user);
        assert!(user.profile_picture.is_none());
    }

    #[test]
    fn verify_password() {
        let user = user();

        assert!(user.verify_password("secret"));
        assert!(!user.verify_password("Secret"));
        assert!(!user.verify_password(""));
    }

    #[test]
    fn set_password_salts_per_user() {
        let a = user();
        let b = user();

        assert_ne!(a.password_hash, b.password_hash);
        assert!(b.verify_password("secret"));
    }

    #[test]
    fn model_round_trip() {
        let mut user = user();
        user.go_points = 25;
        user.events_count = 2;

        let model = Model {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            events_count: user.events_count,
            go_points: user.go_points,
            is_pro_user: user.is_pro_user,
            profile_picture: None,
        };

        assert_eq!(User::try_from(model).unwrap(), user);
    }
}
