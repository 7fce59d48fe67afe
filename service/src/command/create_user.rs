//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task::JoinError;
use tracerr::Traced;

use crate::{
    domain::{
        agent,
        user::{self, Password, PasswordHash},
        Agent, Entity as _, Invalid, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`user::Username`] of a new [`User`].
    pub username: user::Username,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<Password>,

    /// [`user::Role`] of a new [`User`].
    pub role: user::Role,

    /// ID of the [`Agent`] a new [`User`] signs in as.
    ///
    /// Required for [`user::Role::Agent`] and forbidden otherwise.
    pub agent_id: Option<agent::Id>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: Database<
            Select<By<Option<Agent>, agent::Id>>,
            Ok = Option<Agent>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            username,
            password,
            role,
            agent_id,
        } = cmd;

        if !password.expose_secret().is_valid() {
            return Err(tracerr::new!(E::WeakPassword));
        }
        if self
            .config()
            .admin
            .as_ref()
            .is_some_and(|admin| admin.username == username)
        {
            return Err(tracerr::new!(E::UsernameOccupied(username)));
        }

        let cost = self.config().password_cost;
        let password_hash = tokio::task::spawn_blocking(move || {
            PasswordHash::new(password.expose_secret(), cost)
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let user = User {
            id: user::Id::new(),
            username,
            password_hash,
            role,
            agent_id,
            created_at: DateTime::now().coerce(),
        };
        user.validate().map_err(tracerr::from_and_wrap!(=> E))?;

        if let Some(id) = agent_id {
            _ = self
                .database()
                .execute(Select(By::<Option<Agent>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| tracerr::new!(E::AgentNotExists(id)))?;
        }

        self.database()
            .execute(Insert(user.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation() {
                    tracerr::new!(E::UsernameOccupied(user.username.clone()))
                } else if let Some(id) =
                    agent_id.filter(|_| e.as_ref().is_foreign_key_violation())
                {
                    tracerr::new!(E::AgentNotExists(id))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;

        tracing::info!(
            username = %user.username,
            role = %user.role,
            "user created",
        );

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Password hashing task failed.
    #[display("Password hashing failed: {_0}")]
    Blocking(JoinError),

    /// [`bcrypt`] error.
    #[display("Password hashing failed: {_0}")]
    Hash(bcrypt::BcryptError),

    /// [`User`] violates an invariant.
    #[display("Invalid `User`: {_0}")]
    Invalid(Invalid),

    /// [`Agent`] to link does not exist.
    #[display("`Agent(id: {_0})` does not exist")]
    #[from(ignore)]
    AgentNotExists(#[error(not(source))] agent::Id),

    /// [`user::Username`] is already taken.
    #[display("`Username` `{_0}` is already taken")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] user::Username),

    /// [`Password`] doesn't satisfy the requirements.
    #[display(
        "`Password` must be {}..={} bytes long",
        Password::MIN_LEN,
        Password::MAX_LEN
    )]
    WeakPassword,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        domain::{
            agent,
            user::{self, Password, Username},
        },
        fixture::{self, ADMIN},
        Command as _,
    };

    use super::{CreateUser, ExecutionError};

    fn cmd(
        username: &str,
        role: user::Role,
        agent_id: Option<agent::Id>,
    ) -> CreateUser {
        CreateUser {
            username: Username::new(username).unwrap(),
            password: SecretBox::new(Box::new(Password::from("secret-pass"))),
            role,
            agent_id,
        }
    }

    #[tokio::test]
    async fn creates_agent_user() {
        let svc = fixture::service();
        let brokerage = fixture::brokerage();
        let agent = fixture::agent(brokerage.id);
        fixture::insert(&svc, brokerage).await;
        fixture::insert(&svc, agent.clone()).await;

        let user = svc
            .execute(cmd("jane", user::Role::Agent, Some(agent.id)))
            .await
            .unwrap();

        assert!(user.password_hash.verify(&Password::from("secret-pass")));
        assert!(svc.database().tables().users.contains_key(&user.id));
    }

    #[tokio::test]
    async fn requires_agent_link_only_for_agents() {
        let svc = fixture::service();

        let err = svc
            .execute(cmd("jane", user::Role::Agent, None))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Invalid(_)));

        let err = svc
            .execute(cmd("root", user::Role::Admin, Some(agent::Id::new())))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Invalid(_)));

        let err = svc
            .execute(cmd("jane", user::Role::Agent, Some(agent::Id::new())))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AgentNotExists(_)));
    }

    #[tokio::test]
    async fn rejects_taken_usernames() {
        let svc = fixture::service();
        fixture::insert(&svc, fixture::user("root", "root-password", None))
            .await;

        let err = svc
            .execute(cmd("root", user::Role::Admin, None))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UsernameOccupied(_)));

        let err = svc
            .execute(cmd(ADMIN, user::Role::Admin, None))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UsernameOccupied(_)));
    }

    #[tokio::test]
    async fn rejects_weak_passwords() {
        let svc = fixture::service();
        let mut cmd = cmd("root", user::Role::Admin, None);
        cmd.password = SecretBox::new(Box::new(Password::from("short")));

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WeakPassword));
    }
}
