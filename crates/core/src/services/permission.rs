//! Ownership checks for vote records.
//!
//! A vote may be read or changed by the user who owns it, or by an
//! administrator. Nothing else is consulted.

use polling_common::{AppError, AppResult};
use polling_db::entities::user;
use serde::{Deserialize, Serialize};

/// The user on whose behalf a call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    /// System Manager role.
    pub is_admin: bool,
}

impl Actor {
    /// A regular user.
    #[must_use]
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }

    /// An administrator.
    #[must_use]
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }
}

impl From<&user::Model> for Actor {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Operation attempted on a vote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Read,
    Modify,
    Submit,
    Amend,
    Delete,
}

impl VoteAction {
    const fn denied_message(self) -> &'static str {
        match self {
            Self::Read => "You can only view your own votes.",
            Self::Modify => "You can only modify your own votes.",
            Self::Submit => "You can only submit your own votes.",
            Self::Amend => "You can only amend your own votes.",
            Self::Delete => "You can only delete your own votes.",
        }
    }
}

/// Whether `actor` may act on a record owned by `owner_id`.
#[must_use]
pub fn has_permission(actor: &Actor, owner_id: &str) -> bool {
    actor.is_admin || actor.id == owner_id
}

/// Fail with [`AppError::Forbidden`] unless `actor` owns the record or is an administrator.
pub fn check_ownership(actor: &Actor, owner_id: &str, action: VoteAction) -> AppResult<()> {
    if has_permission(actor, owner_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(action.denied_message().to_string()))
    }
}

/// Fail with [`AppError::Forbidden`] unless `actor` is an administrator.
pub fn require_admin(actor: &Actor) -> AppResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only administrators can manage polls".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ACTIONS: [VoteAction; 5] = [
        VoteAction::Read,
        VoteAction::Modify,
        VoteAction::Submit,
        VoteAction::Amend,
        VoteAction::Delete,
    ];

    #[test]
    fn test_owner_is_allowed_everything() {
        let alice = Actor::user("alice");
        for action in ACTIONS {
            assert!(check_ownership(&alice, "alice", action).is_ok());
        }
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let root = Actor::admin("root");
        for action in ACTIONS {
            assert!(check_ownership(&root, "alice", action).is_ok());
        }
    }

    #[test]
    fn test_stranger_is_denied_with_action_message() {
        let bob = Actor::user("bob");

        let err = check_ownership(&bob, "alice", VoteAction::Amend).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref msg) if msg == "You can only amend your own votes."));

        for action in ACTIONS {
            assert!(matches!(
                check_ownership(&bob, "alice", action),
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn test_ownership_is_exact_match() {
        assert!(!has_permission(&Actor::user("Alice"), "alice"));
        assert!(!has_permission(&Actor::user(""), "alice"));
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&Actor::admin("root")).is_ok());
        assert!(matches!(
            require_admin(&Actor::user("alice")),
            Err(AppError::Forbidden(_))
        ));
    }
}
