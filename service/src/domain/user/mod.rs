//! [`User`] definitions.

pub mod session;

use std::{fmt, sync::LazyLock};

use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq as _;

use super::{agent, define_id, Entity, Invalid};

pub use self::session::Session;

define_id!("User");

define_kind! {
    #[doc = "Role of a [`User`]."]
    enum Role {
        #[doc = "Manages everything."]
        Admin = 1,

        #[doc = "Manages own listings, showings, contracts and transactions."]
        Agent = 2,
    }
}

/// Account to sign in with.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// Unique [`Username`] of this [`User`].
    pub username: Username,

    /// [`PasswordHash`] of this [`User`].
    #[serde(skip)]
    pub password_hash: PasswordHash,

    /// [`Role`] of this [`User`].
    pub role: Role,

    /// ID of the [`Agent`] this [`User`] signs in as.
    ///
    /// Present if and only if the [`Role`] is [`Role::Agent`].
    ///
    /// [`Agent`]: super::Agent
    pub agent_id: Option<agent::Id>,

    /// [`DateTime`] when this [`User`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Entity for User {
    type Id = Id;

    const NAME: &'static str = "User";

    fn id(&self) -> Id {
        self.id
    }

    fn validate(&self) -> Result<(), Invalid> {
        match (self.role, self.agent_id) {
            (Role::Agent, Some(_)) | (Role::Admin, None) => Ok(()),
            (Role::Agent, None) => {
                Err(Invalid("agent `User` must be linked to an `Agent`"))
            }
            (Role::Admin, Some(_)) => {
                Err(Invalid("admin `User` cannot be linked to an `Agent`"))
            }
        }
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }
}

/// Username of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, Into, PartialEq, Serialize,
)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Username`].
    fn check(name: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Username`] format:
        /// - 3 to 50 characters long;
        /// - ASCII letters, digits, `_`, `.`, `-` and `@` only.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Za-z0-9_.@-]{3,50}$").expect("valid regex")
        });

        REGEX.is_match(name.as_ref())
    }
}

impl TryFrom<String> for Username {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `Username`")
    }
}

impl std::str::FromStr for Username {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Username`")
    }
}

/// Password of a [`User`].
///
/// Any input converts into a [`Password`] to be checked against a
/// [`PasswordHash`], while [`Password::new()`] enforces the format required
/// for setting one.
#[derive(Clone, Deserialize, Eq, From, PartialEq)]
#[from(&str, String)]
#[serde(from = "String")]
pub struct Password(String);

impl Password {
    /// Minimal length of a new [`Password`].
    pub const MIN_LEN: usize = 8;

    /// Maximal length of a new [`Password`] in bytes, as [`bcrypt`] ignores
    /// everything after.
    pub const MAX_LEN: usize = 72;

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        (password.chars().count() >= Self::MIN_LEN
            && password.len() <= Self::MAX_LEN)
            .then_some(Self(password))
    }

    /// Checks whether this [`Password`] satisfies [`Password::new()`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        Self::new(self.0.as_str()).is_some()
    }

    /// Compares this [`Password`] with the `other` one in constant time.
    #[must_use]
    pub fn ct_eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl AsRef<[u8]> for Password {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [`bcrypt`] hash of a [`Password`].
#[derive(AsRef, Clone, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the provided [`Password`] with the given [`bcrypt`] `cost`.
    ///
    /// CPU-heavy, so should be called on a blocking thread.
    ///
    /// # Errors
    ///
    /// If the `cost` is out of the range supported by [`bcrypt`].
    pub fn new(
        password: &Password,
        cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        bcrypt::hash(password, cost).map(Self)
    }

    /// Wraps an already computed hash.
    #[must_use]
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Checks whether the provided [`Password`] matches this [`PasswordHash`].
    ///
    /// CPU-heavy, so should be called on a blocking thread. A malformed hash
    /// never matches.
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        bcrypt::verify(password, &self.0).unwrap_or(false)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(***)")
    }
}

/// [`DateTime`] when a [`User`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;
