//! Session identity.
//!
//! The `is_user_logged_in` / `current_user_id` pair is an explicit value
//! handed to the engine at construction and returned from login/logout, so
//! the caller decides where to persist it instead of relying on ambient
//! process-wide state.

use serde::{Deserialize, Serialize};

/// Identity of the acting user for one running instance of the app.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub is_user_logged_in: bool,
    pub current_user_id: Option<String>,
}

impl Session {
    pub fn logged_in(user_id: String) -> Self {
        Self {
            is_user_logged_in: true,
            current_user_id: Some(user_id),
        }
    }

    pub fn logged_out() -> Self {
        Self::default()
    }

    /// The user id to resolve at startup, present only when logged in.
    pub fn user_id(&self) -> Option<&str> {
        if self.is_user_logged_in {
            self.current_user_id.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_out_has_no_user() {
        assert_eq!(Session::logged_out().user_id(), None);
    }

    #[test]
    fn user_id_requires_login_flag() {
        let session = Session {
            is_user_logged_in: false,
            current_user_id: Some(String::from("abc")),
        };
        assert_eq!(session.user_id(), None);

        let session = Session::logged_in(String::from("abc"));
        assert_eq!(session.user_id(), Some("abc"));
    }
}
