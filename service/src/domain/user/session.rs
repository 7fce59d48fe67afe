//! [`Session`] definitions.

use common::{unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::domain::{define_id, user, Entity};
#[cfg(doc)]
use crate::domain::{Principal, User};

define_id!("Session");

/// Server-side record of a signed-in [`Principal`].
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of this [`Session`].
    pub id: Id,

    /// [`user::Username`] this [`Session`] was created for.
    pub username: user::Username,

    /// ID of the [`User`] this [`Session`] belongs to.
    ///
    /// [`None`] for the environment-configured admin, which has no stored
    /// [`User`].
    pub user_id: Option<user::Id>,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: ExpirationDateTime,

    /// [`DateTime`] when this [`Session`] was created.
    pub created_at: CreationDateTime,
}

impl Session {
    /// Checks whether this [`Session`] is expired at the provided moment.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime) -> bool {
        self.expires_at.coerce() <= now
    }
}

impl Entity for Session {
    type Id = Id;

    const NAME: &'static str = "Session";

    fn id(&self) -> Id {
        self.id
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }
}

/// Claims of a [`Token`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// ID of the [`Session`] the [`Token`] refers to.
    pub sid: Id,

    /// [`DateTime`] when the [`Token`] expires.
    #[serde(with = "common::datetime::serde_unix")]
    pub exp: ExpirationDateTime,
}

/// Signed access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

/// [`DateTime`] when a [`Session`] was created.
pub type CreationDateTime = DateTimeOf<(Session, unit::Creation)>;
