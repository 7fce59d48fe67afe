//! [`Command`] for authenticating a [`Principal`] by credentials.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task::JoinError;
use tracerr::Traced;

use crate::{
    domain::{
        principal,
        user::{self, Password, PasswordHash},
        Principal, User,
    },
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::EnvAdmin;

use super::Command;

/// [`Command`] for authenticating a [`Principal`] by credentials.
///
/// Never creates a [`Session`].
///
/// [`Session`]: user::Session
#[derive(Clone, Debug)]
pub struct Authenticate {
    /// Provided username.
    ///
    /// Not parsed into a [`user::Username`], so that malformed input fails in
    /// the same way as an unknown one.
    pub username: String,

    /// Provided [`Password`].
    pub password: SecretBox<Password>,
}

impl<Db> Command<Authenticate> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Username>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Principal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: Authenticate) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Authenticate { username, password } = cmd;

        if let Some(admin) = &self.config().admin {
            if admin.username.as_ref() == username {
                let matches = admin
                    .password
                    .expose_secret()
                    .ct_eq(password.expose_secret());
                return if matches {
                    tracing::info!(%username, role = "ADMIN", "authenticated");
                    Ok(Principal::Admin(principal::Admin {
                        username: admin.username.clone(),
                        user_id: None,
                    }))
                } else {
                    tracing::warn!(%username, "authentication failed");
                    Err(tracerr::new!(E::InvalidCredentials))
                };
            }
        }

        let user = match user::Username::new(username.as_str()) {
            Some(name) => self
                .database()
                .execute(Select(By::new(name)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?,
            None => None,
        };

        let hash = match &user {
            Some(u) => u.password_hash.clone(),
            None => dummy_hash(self)
                .await
                .map_err(tracerr::from_and_wrap!(=> E))?,
        };
        let verified = tokio::task::spawn_blocking(move || {
            hash.verify(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?;

        match user {
            Some(user) if verified => {
                tracing::info!(
                    %username,
                    role = %user.role,
                    "authenticated",
                );
                Ok(Principal::from_user(&user))
            }
            Some(_) | None => {
                tracing::warn!(%username, "authentication failed");
                Err(tracerr::new!(E::InvalidCredentials))
            }
        }
    }
}

/// Returns the [`PasswordHash`] verified when no [`User`] is found, so that
/// unknown usernames take as long to reject as wrong passwords.
///
/// Hashed once per [`Service`] on a blocking thread, with the configured
/// [`bcrypt`] cost.
async fn dummy_hash<Db>(svc: &Service<Db>) -> Result<PasswordHash, JoinError> {
    let cost = svc.config().password_cost;
    svc.dummy_hash
        .get_or_try_init(|| {
            tokio::task::spawn_blocking(move || {
                PasswordHash::new(&Password::from("dummy-password"), cost)
                    .unwrap_or_else(|_| PasswordHash::from_hash(""))
            })
        })
        .await
        .cloned()
}

/// Error of [`Authenticate`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Password verification task failed.
    #[display("Password verification failed: {_0}")]
    Blocking(JoinError),

    /// Provided credentials match neither a [`User`] nor the [`EnvAdmin`].
    #[display("Invalid username or password")]
    InvalidCredentials,
}
