//! [`Config`]-related definitions.

use std::{collections::HashMap, env, path::PathBuf, time};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::SecretBox;
use serde::Deserialize;
use service::domain::user;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Database configuration.
    pub database: Database,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the `CONF.`-prefixed environment variables (if any);
    /// - overriding it with the legacy environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        Self::load(path, env::vars().collect())
    }

    /// Loads a [`Config`] as [`Config::new()`] does, but reading the
    /// environment variables from the provided `vars`.
    fn load(
        path: impl AsRef<str>,
        vars: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let legacy = |name: &str| vars.get(name).cloned();

        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("CONF")
                    .separator(".")
                    .source(Some(vars.clone())),
            )
            .set_override_option("database.host", legacy("MYSQL_HOST"))?
            .set_override_option("database.port", legacy("MYSQL_PORT"))?
            .set_override_option("database.user", legacy("MYSQL_USER"))?
            .set_override_option(
                "database.password",
                legacy("MYSQL_PASSWORD"),
            )?
            .set_override_option("database.dbname", legacy("MYSQL_DATABASE"))?
            .set_override_option("service.secret_key", legacy("SECRET_KEY"))?
            .set_override_option(
                "service.admin.username",
                legacy("ADMIN_USERNAME"),
            )?
            .set_override_option(
                "service.admin.password",
                legacy("ADMIN_PASSWORD"),
            )?
            .set_override_option(
                "service.environment",
                legacy("ENVIRONMENT").map(|e| e.to_lowercase()),
            )?
            .set_override_option(
                "log.level",
                legacy("LOG_LEVEL").map(|l| l.to_uppercase()),
            )?
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Deployment environment.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,

    /// Production deployment.
    Production,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Secret signing session tokens.
    ///
    /// Must be overridden in [`Environment::Production`].
    #[default(Service::DEFAULT_SECRET_KEY.to_owned())]
    pub secret_key: String,

    /// [`Environment`] the application runs in.
    ///
    /// Session cookies are `Secure` in [`Environment::Production`].
    pub environment: Environment,

    /// Session configuration.
    pub session: Session,

    /// Environment admin configuration.
    pub admin: Admin,

    /// Property images configuration.
    pub images: Images,

    /// [`bcrypt`] cost of new password hashes.
    ///
    /// [`bcrypt`]: https://wikipedia.org/wiki/Bcrypt
    #[default(12)]
    pub password_cost: u32,
}

impl Service {
    /// Built-in [`Service::secret_key`], usable for development only.
    pub const DEFAULT_SECRET_KEY: &'static str = "secret";
}

impl TryFrom<Service> for service::Config {
    type Error = ConfigError;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            secret_key,
            environment,
            session,
            admin,
            images: _,
            password_cost,
        } = value;

        if environment == Environment::Production
            && secret_key == Service::DEFAULT_SECRET_KEY
        {
            return Err(ConfigError::Message(
                "`secret_key` must be set in production".into(),
            ));
        }

        let admin = match (admin.username, admin.password) {
            (Some(username), Some(password)) => Some(service::EnvAdmin {
                username: user::Username::new(username.as_str()).ok_or_else(
                    || {
                        ConfigError::Message(format!(
                            "`{username}` is not a valid admin username",
                        ))
                    },
                )?,
                password: SecretBox::new(Box::new(user::Password::from(
                    password,
                ))),
            }),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::Message(
                    "admin username and password must be set together".into(),
                ));
            }
        };

        let mut config = Self::new(secret_key.as_bytes());
        config.admin = admin;
        config.session_ttl = session.ttl;
        config.password_cost = password_cost;
        Ok(config)
    }
}

/// Session configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Session {
    /// Lifetime of a new session.
    #[default(service::Config::DEFAULT_SESSION_TTL)]
    #[serde(with = "humantime_serde")]
    pub ttl: time::Duration,

    /// Name of the session cookie.
    #[default("real_estate_session".to_owned())]
    pub cookie: String,
}

/// Environment admin configuration.
///
/// Disabled unless both fields are set.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Admin {
    /// Username of the admin.
    pub username: Option<String>,

    /// Password of the admin.
    pub password: Option<String>,
}

/// Property images configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Images {
    /// Directory to store images in.
    #[default(PathBuf::from("static/property_images"))]
    pub dir: PathBuf,

    /// Maximum size of a single image, in bytes.
    #[default(service::Images::DEFAULT_MAX_SIZE)]
    pub max_size: usize,
}

impl From<Images> for service::Images {
    fn from(value: Images) -> Self {
        let Images { dir, max_size } = value;
        Self::new(dir, max_size)
    }
}

/// Database configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Database {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("real_estate".to_owned())]
    pub dbname: String,

    /// Connection pool configuration.
    pub pool: Pool,
}

/// Connection pool configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Pool {
    /// Maximum number of open connections.
    #[default(5)]
    pub max_size: usize,

    /// Maximum time to wait for a free connection.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

impl From<Database> for service::infra::postgres::Config {
    fn from(value: Database) -> Self {
        use service::infra::postgres::PoolConfig;

        let Database {
            host,
            port,
            user,
            password,
            dbname,
            pool: Pool { max_size, timeout },
        } = value;

        let mut pool = PoolConfig::new(max_size);
        pool.timeouts.wait = Some(timeout);
        pool.timeouts.create = Some(timeout);

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            pool: Some(pool),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{collections::HashMap, time::Duration};

    use secrecy::ExposeSecret as _;

    use super::{Config, Environment, LogLevel};

    const NO_FILE: &str = "does-not-exist";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn uses_defaults() {
        let config = Config::load(NO_FILE, HashMap::new()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.pool.max_size, 5);
        assert_eq!(config.database.pool.timeout, Duration::from_secs(30));
        assert_eq!(config.service.session.cookie, "real_estate_session");
        assert_eq!(config.service.session.ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.service.environment, Environment::Development);
        assert_eq!(config.log.level, LogLevel::Info);
        assert!(config.service.admin.username.is_none());
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = Config::load(
            NO_FILE,
            vars(&[
                ("CONF.SERVER.PORT", "9000"),
                ("CONF.SERVICE.SESSION.TTL", "1h"),
                ("CONF.DATABASE.POOL.MAX_SIZE", "7"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.service.session.ttl, Duration::from_secs(60 * 60));
        assert_eq!(config.database.pool.max_size, 7);
    }

    #[test]
    fn legacy_variables_override() {
        let config = Config::load(
            NO_FILE,
            vars(&[
                ("CONF.DATABASE.HOST", "ignored"),
                ("MYSQL_HOST", "db.internal"),
                ("MYSQL_PORT", "3306"),
                ("MYSQL_USER", "broker"),
                ("MYSQL_PASSWORD", "hunter2"),
                ("MYSQL_DATABASE", "estate"),
                ("SECRET_KEY", "s3cr3t"),
                ("ADMIN_USERNAME", "root"),
                ("ADMIN_PASSWORD", "root-password"),
                ("LOG_LEVEL", "debug"),
                ("ENVIRONMENT", "Production"),
            ]),
        )
        .unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.database.user, "broker");
        assert_eq!(config.database.password, "hunter2");
        assert_eq!(config.database.dbname, "estate");
        assert_eq!(config.service.secret_key, "s3cr3t");
        assert_eq!(config.service.admin.username.as_deref(), Some("root"));
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.service.environment, Environment::Production);
    }

    #[test]
    fn converts_env_admin() {
        let config = Config::load(
            NO_FILE,
            vars(&[
                ("ADMIN_USERNAME", "root"),
                ("ADMIN_PASSWORD", "root-password"),
            ]),
        )
        .unwrap();

        let service = service::Config::try_from(config.service).unwrap();

        let admin = service.admin.unwrap();
        assert_eq!(admin.username.as_ref(), "root");
        assert!(admin
            .password
            .expose_secret()
            .ct_eq(&"root-password".into()));
    }

    #[test]
    fn rejects_half_configured_admin() {
        let config =
            Config::load(NO_FILE, vars(&[("ADMIN_USERNAME", "root")]))
                .unwrap();

        assert!(service::Config::try_from(config.service).is_err());
    }

    #[test]
    fn rejects_invalid_admin_username() {
        let config = Config::load(
            NO_FILE,
            vars(&[("ADMIN_USERNAME", "r"), ("ADMIN_PASSWORD", "whatever")]),
        )
        .unwrap();

        assert!(service::Config::try_from(config.service).is_err());
    }

    #[test]
    fn rejects_default_secret_in_production() {
        let config =
            Config::load(NO_FILE, vars(&[("ENVIRONMENT", "production")]))
                .unwrap();
        let err = service::Config::try_from(config.service).unwrap_err();
        assert!(err.to_string().contains("secret_key"), "{err}");

        let config = Config::load(
            NO_FILE,
            vars(&[("ENVIRONMENT", "production"), ("SECRET_KEY", "s3cr3t")]),
        )
        .unwrap();
        assert!(service::Config::try_from(config.service).is_ok());

        let config = Config::load(NO_FILE, HashMap::new()).unwrap();
        assert!(service::Config::try_from(config.service).is_ok());
    }
}
