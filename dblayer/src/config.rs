use std::env;

use crate::error::{DbResult, Error};

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Parameters handed to a driver when opening a connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectParams {
    /// Registered driver name, e.g. `sqlite`, `pgsql` or `mysqli`.
    pub driver: String,
    /// Server host, optionally followed by `:port`. Ignored by file-based
    /// drivers.
    pub host: String,
    /// Database name. For SQLite this is the database file path.
    pub database: String,
    pub user: String,
    pub password: String,
    /// Asks the driver for a persistent connection, if it supports one.
    pub persistent: bool,
}

impl ConnectParams {
    /// Constructs parameters for the given driver and database, using the
    /// default host and empty credentials.
    pub fn new(driver: impl Into<String>, database: impl Into<String>) -> ConnectParams {
        ConnectParams {
            driver: driver.into(),
            host: DEFAULT_HOST.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Reads the parameters from the `DBLAYER_*` environment variables.
    ///
    /// `DBLAYER_DRIVER` is required; every other variable falls back to its
    /// default.
    pub fn from_env() -> DbResult<ConnectParams> {
        let driver = env::var("DBLAYER_DRIVER")
            .map_err(|_| Error::Config("`DBLAYER_DRIVER` is not set".into()))?;
        let var = |name: &str| env::var(name).unwrap_or_default();

        let host = env::var("DBLAYER_HOST").unwrap_or_else(|_| DEFAULT_HOST.into());
        let persistent = matches!(
            var("DBLAYER_PERSIST").to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );

        Ok(ConnectParams {
            driver,
            host,
            database: var("DBLAYER_NAME"),
            user: var("DBLAYER_USER"),
            password: var("DBLAYER_PASSWORD"),
            persistent,
        })
    }

    /// Splits `host` into the host name and an optional port.
    pub fn host_and_port(&self) -> DbResult<(&str, Option<u16>)> {
        match self.host.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid port in `{}`", self.host).into()))?;
                Ok((host, Some(port)))
            }
            None => Ok((&self.host, None)),
        }
    }
}
