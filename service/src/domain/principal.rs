//! [`Principal`] definitions.

use serde::Serialize;

use super::{agent, user};

/// Caller of an operation, as established by its [`Session`].
///
/// [`Session`]: user::Session
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Principal {
    /// Administrator.
    Admin(Admin),

    /// Agent.
    Agent(AgentRef),

    /// Caller without a valid [`Session`].
    ///
    /// [`Session`]: user::Session
    #[default]
    Anonymous,
}

/// [`Principal::Admin`] details.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Admin {
    /// [`user::Username`] of this [`Admin`].
    pub username: user::Username,

    /// ID of the stored [`User`] of this [`Admin`].
    ///
    /// [`None`] for the environment-configured admin.
    ///
    /// [`User`]: user::User
    pub user_id: Option<user::Id>,
}

/// [`Principal::Agent`] details.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AgentRef {
    /// [`user::Username`] of this [`AgentRef`].
    pub username: user::Username,

    /// ID of the stored [`User`] of this [`AgentRef`].
    ///
    /// [`User`]: user::User
    pub user_id: user::Id,

    /// ID of the linked [`Agent`], if any.
    ///
    /// [`Agent`]: super::Agent
    pub agent_id: Option<agent::Id>,
}

impl Principal {
    /// Derives a [`Principal`] from the provided stored [`User`].
    ///
    /// [`User`]: user::User
    #[must_use]
    pub fn from_user(user: &user::User) -> Self {
        match user.role {
            user::Role::Admin => Self::Admin(Admin {
                username: user.username.clone(),
                user_id: Some(user.id),
            }),
            user::Role::Agent => Self::Agent(AgentRef {
                username: user.username.clone(),
                user_id: user.id,
                agent_id: user.agent_id,
            }),
        }
    }

    /// Returns the [`user::Username`] of this [`Principal`], if any.
    #[must_use]
    pub fn username(&self) -> Option<&user::Username> {
        match self {
            Self::Admin(a) => Some(&a.username),
            Self::Agent(a) => Some(&a.username),
            Self::Anonymous => None,
        }
    }

    /// Returns the ID of the stored [`User`] of this [`Principal`], if any.
    ///
    /// [`User`]: user::User
    #[must_use]
    pub fn user_id(&self) -> Option<user::Id> {
        match self {
            Self::Admin(a) => a.user_id,
            Self::Agent(a) => Some(a.user_id),
            Self::Anonymous => None,
        }
    }

    /// Returns the [`user::Role`] of this [`Principal`], if any.
    #[must_use]
    pub fn role(&self) -> Option<user::Role> {
        match self {
            Self::Admin(_) => Some(user::Role::Admin),
            Self::Agent(_) => Some(user::Role::Agent),
            Self::Anonymous => None,
        }
    }
}
