//! [`Command`] for creating a [`Session`].

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::session::Token;
use crate::{
    domain::{
        user::{session, Session},
        Principal,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`] of an authenticated [`Principal`].
#[derive(Clone, Debug, From)]
pub struct CreateUserSession {
    /// [`Principal`] to create a [`Session`] for.
    pub principal: Principal,
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// Created [`Session`].
    pub session: Session,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<Insert<Session>, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUserSession { principal } = cmd;

        let username = principal
            .username()
            .cloned()
            .ok_or_else(|| tracerr::new!(E::Anonymous))?;

        let now = DateTime::now();
        let session = Session {
            id: session::Id::new(),
            username,
            user_id: principal.user_id(),
            expires_at: (now + self.config().session_ttl).coerce(),
            created_at: now.coerce(),
        };

        self.database()
            .execute(Insert(session.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &session::Claims {
                sid: session.id,
                exp: session.expires_at,
            },
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid
        //         `session::Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { session::Token::new_unchecked(token) };

        tracing::debug!(
            session_id = %session.id,
            username = %session.username,
            "session created",
        );

        Ok(Output { token, session })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// [`Principal::Anonymous`] cannot have a [`Session`].
    #[display("Anonymous `Principal` cannot have a `Session`")]
    Anonymous,
}
