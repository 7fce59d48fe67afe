//! [`Command`] for resolving the [`Principal`] of a [`Session`].

use common::{
    operations::{By, Delete, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        principal,
        user::{self, session, Session},
        Principal, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for resolving the [`Principal`] of a [`Session`] by its
/// [`session::Token`].
///
/// Resolves to [`None`] whenever the [`Session`] is not valid anymore: the
/// [`session::Token`] is malformed or expired, the [`Session`] is deleted or
/// expired, its [`User`] is removed or renamed, or the configured admin has
/// changed. An expired [`Session`] is deleted once seen.
#[derive(Clone, Debug, From)]
pub struct ResolveUserSession {
    /// [`session::Token`] to resolve.
    pub token: session::Token,
}

impl<Db> Command<ResolveUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<Session>, session::Id>>,
            Ok = Option<Session>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Session, session::Id>>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Principal>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ResolveUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ResolveUserSession { token } = cmd;

        let claims = match jsonwebtoken::decode::<session::Claims>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("rejected session token: {e}");
                return Ok(None);
            }
        };

        let Some(session) = self
            .database()
            .execute(Select(By::new(claims.sid)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        else {
            return Ok(None);
        };

        if session.is_expired_at(DateTime::now()) {
            self.database()
                .execute(Delete(By::<Session, _>::new(session.id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tracing::debug!(session_id = %session.id, "expired session deleted");
            return Ok(None);
        }

        let Some(user_id) = session.user_id else {
            let principal = self
                .config()
                .admin
                .as_ref()
                .filter(|admin| admin.username == session.username)
                .map(|admin| {
                    Principal::Admin(principal::Admin {
                        username: admin.username.clone(),
                        user_id: None,
                    })
                });
            return Ok(principal);
        };

        let user = self
            .database()
            .execute(Select(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user
            .filter(|u| u.username == session.username)
            .map(|u| Principal::from_user(&u)))
    }
}

/// Error of [`ResolveUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Update, DateTime};

    use crate::{
        command::{create_user_session, CreateUserSession},
        domain::{user::Username, Principal},
        fixture, Command as _,
    };

    use super::ResolveUserSession;

    #[tokio::test]
    async fn resolves_stored_user_principal() {
        let svc = fixture::service();
        let user = fixture::user("root", "root-password", None);
        fixture::insert(&svc, user.clone()).await;
        let create_user_session::Output { token, .. } = svc
            .execute(CreateUserSession::from(Principal::from_user(&user)))
            .await
            .unwrap();

        let principal = svc.execute(ResolveUserSession { token }).await.unwrap();

        assert_eq!(principal, Some(Principal::from_user(&user)));
    }

    #[tokio::test]
    async fn rejects_forged_tokens() {
        let svc = fixture::service();

        let principal = svc
            .execute(ResolveUserSession {
                token: "not.a.token".parse().unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(principal, None);
    }

    #[tokio::test]
    async fn deletes_expired_sessions() {
        let svc = fixture::service();
        let user = fixture::user("root", "root-password", None);
        fixture::insert(&svc, user.clone()).await;
        let create_user_session::Output { token, mut session } = svc
            .execute(CreateUserSession::from(Principal::from_user(&user)))
            .await
            .unwrap();
        session.expires_at =
            (DateTime::now() - Duration::from_secs(1)).coerce();
        svc.database().execute(Update(session.clone())).await.unwrap();

        let principal = svc.execute(ResolveUserSession { token }).await.unwrap();

        assert_eq!(principal, None);
        assert!(!svc.database().tables().sessions.contains_key(&session.id));
    }

    #[tokio::test]
    async fn invalidates_sessions_of_renamed_users() {
        let svc = fixture::service();
        let mut user = fixture::user("root", "root-password", None);
        fixture::insert(&svc, user.clone()).await;
        let create_user_session::Output { token, .. } = svc
            .execute(CreateUserSession::from(Principal::from_user(&user)))
            .await
            .unwrap();
        user.username = Username::new("groot").unwrap();
        svc.database().execute(Update(user)).await.unwrap();

        let principal = svc.execute(ResolveUserSession { token }).await.unwrap();

        assert_eq!(principal, None);
    }

    #[tokio::test]
    async fn invalidates_env_admin_sessions_on_reconfiguration() {
        let svc = fixture::service();
        let admin = Principal::Admin(crate::domain::principal::Admin {
            username: Username::new("former-admin").unwrap(),
            user_id: None,
        });
        let create_user_session::Output { token, .. } = svc
            .execute(CreateUserSession::from(admin))
            .await
            .unwrap();

        let principal = svc.execute(ResolveUserSession { token }).await.unwrap();

        assert_eq!(principal, None);
    }
}
