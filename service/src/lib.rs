//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
#[cfg(test)]
mod fixture;
pub mod infra;
pub mod query;
pub mod read;

use std::{sync::Arc, time::Duration};

use derive_more::Debug;
use secrecy::SecretBox;
use tokio::sync::OnceCell;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::user::Session;
#[cfg(feature = "postgres")]
use crate::infra::Postgres;
#[cfg(doc)]
use infra::Database;

pub use self::{command::Command, infra::Images, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Admin signing in with credentials from the environment, without a
    /// stored [`User`].
    ///
    /// [`User`]: domain::User
    pub admin: Option<EnvAdmin>,

    /// Lifetime of a new [`Session`].
    pub session_ttl: Duration,

    /// [`bcrypt`] cost of new password hashes.
    pub password_cost: u32,
}

impl Config {
    /// Default lifetime of a new [`Session`].
    pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

    /// Creates a new [`Config`] signing tokens with the provided `secret`
    /// and defaults for everything else.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            admin: None,
            session_ttl: Self::DEFAULT_SESSION_TTL,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Admin configured via environment.
#[derive(Clone, Debug)]
pub struct EnvAdmin {
    /// [`user::Username`] of the admin.
    pub username: user::Username,

    /// [`user::Password`] of the admin.
    pub password: SecretBox<user::Password>,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Images`] storage of this [`Service`].
    images: Images,

    /// [`user::PasswordHash`] verified when no [`User`] matches the provided
    /// credentials.
    ///
    /// Hashed lazily with the configured [`Config::password_cost`].
    ///
    /// [`User`]: domain::User
    dummy_hash: Arc<OnceCell<user::PasswordHash>>,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db, images: Images) -> Self {
        Self {
            config,
            database,
            images,
            dummy_hash: Arc::default(),
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Images`] storage of this [`Service`].
    #[must_use]
    pub fn images(&self) -> &Images {
        &self.images
    }
}

#[cfg(feature = "postgres")]
impl Service<Postgres> {
    /// Creates a copy of this [`Service`] holding its own [`Postgres`]
    /// connection, to serve a single request.
    #[must_use]
    pub fn for_request(&self) -> Self {
        Self {
            config: self.config.clone(),
            database: self.database.fork(),
            images: self.images.clone(),
            dummy_hash: Arc::clone(&self.dummy_hash),
        }
    }
}

