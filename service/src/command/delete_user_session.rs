//! [`Command`] for deleting a [`Session`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::{session, Session},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Session`] by its [`session::Token`]
/// (signing out).
///
/// Malformed [`session::Token`]s are ignored, while expired ones still delete
/// their [`Session`].
#[derive(Clone, Debug, From)]
pub struct DeleteUserSession {
    /// [`session::Token`] of the [`Session`] to delete.
    pub token: session::Token,
}

impl<Db> Command<DeleteUserSession> for Service<Db>
where
    Db: Database<
        Delete<By<Session, session::Id>>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteUserSession { token } = cmd;

        let mut validation = Validation::default();
        validation.validate_exp = false;
        let Ok(data) = jsonwebtoken::decode::<session::Claims>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &validation,
        ) else {
            return Ok(());
        };

        self.database()
            .execute(Delete(By::<Session, _>::new(data.claims.sid)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::debug!(session_id = %data.claims.sid, "session deleted");

        Ok(())
    }
}

/// Error of [`DeleteUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
