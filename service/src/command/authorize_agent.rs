//! [`Command`] for authorizing an [`Agent`].

use common::{
    operations::{By, Select},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{agent, principal, user::session, Agent, Principal, Scope},
    infra::{database, Database},
    Service,
};

use super::{resolve_user_session, Command, ResolveUserSession};

/// [`Command`] for authorizing an [`Agent`] [`Principal`] by the provided
/// [`session::Token`].
#[derive(Clone, Debug, Default, From)]
pub struct AuthorizeAgent {
    /// [`session::Token`] of the caller, if any.
    pub token: Option<session::Token>,
}

/// Output of [`AuthorizeAgent`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Authorized [`Principal`].
    pub principal: principal::AgentRef,

    /// [`Agent`] the [`Principal`] acts as.
    pub agent: Agent,
}

impl Output {
    /// Returns the [`Scope`] of operations performed by the authorized
    /// [`Agent`].
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::Agent(self.agent.id)
    }
}

impl<Db> Command<AuthorizeAgent> for Service<Db>
where
    Self: Command<
        ResolveUserSession,
        Ok = Option<Principal>,
        Err = Traced<resolve_user_session::ExecutionError>,
    >,
    Db: Database<
        Select<By<Option<Agent>, agent::Id>>,
        Ok = Option<Agent>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeAgent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeAgent { token } = cmd;

        let principal = match token {
            Some(token) => self
                .execute(ResolveUserSession { token })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .unwrap_or_default(),
            None => Principal::Anonymous,
        };

        let principal = match principal {
            Principal::Agent(agent) => agent,
            Principal::Admin(admin) => {
                tracing::warn!(
                    username = %admin.username,
                    role = "ADMIN",
                    "agent access denied",
                );
                return Err(tracerr::new!(E::Forbidden));
            }
            Principal::Anonymous => {
                tracing::info!("agent access denied: no session");
                return Err(tracerr::new!(E::Unauthorized));
            }
        };

        let agent = match principal.agent_id {
            Some(id) => self
                .database()
                .execute(Select(By::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?,
            None => None,
        };
        let Some(agent) = agent else {
            tracing::warn!(
                username = %principal.username,
                role = "AGENT",
                "agent access denied: no linked `Agent`",
            );
            return Err(tracerr::new!(E::Forbidden));
        };

        if agent.is_license_expired(Date::today()) {
            tracing::warn!(
                username = %principal.username,
                role = "AGENT",
                agent_id = %agent.id,
                "agent access denied: license expired",
            );
            return Err(tracerr::new!(E::LicenseExpired));
        }

        tracing::debug!(
            username = %principal.username,
            role = "AGENT",
            agent_id = %agent.id,
            "agent access granted",
        );
        Ok(Output { principal, agent })
    }
}

/// Error of [`AuthorizeAgent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

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

    /// Caller is not an [`Agent`].
    #[display("Agent access required")]
    Forbidden,

    /// License of the [`Agent`] has expired.
    #[display("Agent license has expired")]
    LicenseExpired,
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        command::{create_user_session, CreateUserSession},
        domain::{user::session, Agent, Principal},
        fixture,
        infra::database::memory::Memory,
        Command as _, Service,
    };

    use super::{AuthorizeAgent, ExecutionError};

    async fn sign_in(svc: &Service<Memory>, agent: &Agent) -> session::Token {
        let user = fixture::user("jane", "jane-password", Some(agent.id));
        fixture::insert(svc, user.clone()).await;
        let create_user_session::Output { token, .. } = svc
            .execute(CreateUserSession::from(Principal::from_user(&user)))
            .await
            .unwrap();
        token
    }

    #[tokio::test]
    async fn admits_licensed_agents() {
        let svc = fixture::service();
        let brokerage = fixture::brokerage();
        let agent = fixture::agent(brokerage.id);
        fixture::insert(&svc, brokerage).await;
        fixture::insert(&svc, agent.clone()).await;
        let token = sign_in(&svc, &agent).await;

        let out = svc.execute(AuthorizeAgent::from(Some(token))).await.unwrap();

        assert_eq!(out.agent.id, agent.id);
        assert_eq!(out.principal.agent_id, Some(agent.id));
    }

    #[tokio::test]
    async fn forbids_expired_licenses() {
        let svc = fixture::service();
        let brokerage = fixture::brokerage();
        let mut agent = fixture::agent(brokerage.id);
        agent.license_expiration = Date::from_ymd(2000, 1, 1);
        fixture::insert(&svc, brokerage).await;
        fixture::insert(&svc, agent.clone()).await;
        let token = sign_in(&svc, &agent).await;

        let err = svc
            .execute(AuthorizeAgent::from(Some(token)))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LicenseExpired));
    }

    #[tokio::test]
    async fn forbids_admins_and_rejects_anonymous() {
        let svc = fixture::service();
        let admin = fixture::user("root", "root-password", None);
        fixture::insert(&svc, admin.clone()).await;
        let create_user_session::Output { token, .. } = svc
            .execute(CreateUserSession::from(Principal::from_user(&admin)))
            .await
            .unwrap();

        let err = svc
            .execute(AuthorizeAgent::from(Some(token)))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden));

        let err = svc.execute(AuthorizeAgent::default()).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Unauthorized));
    }
}
