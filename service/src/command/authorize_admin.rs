//! [`Command`] for authorizing an admin.

use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{principal, user::session, Principal},
    Service,
};

use super::{resolve_user_session, Command, ResolveUserSession};

/// [`Command`] for authorizing an admin [`Principal`] by the provided
/// [`session::Token`].
#[derive(Clone, Debug, Default, From)]
pub struct AuthorizeAdmin {
    /// [`session::Token`] of the caller, if any.
    pub token: Option<session::Token>,
}

impl<Db> Command<AuthorizeAdmin> for Service<Db>
where
    Self: Command<
        ResolveUserSession,
        Ok = Option<Principal>,
        Err = Traced<resolve_user_session::ExecutionError>,
    >,
{
    type Ok = principal::Admin;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeAdmin,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeAdmin { token } = cmd;

        let principal = match token {
            Some(token) => self
                .execute(ResolveUserSession { token })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .unwrap_or_default(),
            None => Principal::Anonymous,
        };

        match principal {
            Principal::Admin(admin) => {
                tracing::debug!(
                    username = %admin.username,
                    role = "ADMIN",
                    "admin access granted",
                );
                Ok(admin)
            }
            Principal::Agent(agent) => {
                tracing::warn!(
                    username = %agent.username,
                    role = "AGENT",
                    "admin access denied",
                );
                Err(tracerr::new!(E::Forbidden))
            }
            Principal::Anonymous => {
                tracing::info!("admin access denied: no session");
                Err(tracerr::new!(E::Unauthorized))
            }
        }
    }
}

/// Error of [`AuthorizeAdmin`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Session`] resolution failed.
    ///
    /// [`Session`]: crate::domain::user::Session
    #[display("Failed to resolve `Session`: {_0}")]
    Resolve(resolve_user_session::ExecutionError),

    /// Caller has no valid [`Session`].
    ///
    /// [`Session`]: crate::domain::user::Session
    #[display("Authorization required")]
    Unauthorized,

    /// Caller is not an admin.
    #[display("Admin access required")]
    Forbidden,
}
