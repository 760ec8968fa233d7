use std::{borrow::Cow, io};

pub type DbResult<T, E = Error> = Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No driver is registered under the given name.
    #[error("unable to load database driver `{0}`")]
    UnknownDriver(String),

    /// Invalid or incomplete connection parameters.
    #[error("invalid configuration: {0}")]
    Config(Cow<'static, str>),

    /// A cursor was asked to build or run a statement without a table.
    #[error("no table name")]
    NoTable,

    /// A method that no extension registered was called on a record.
    #[error("call to undefined record method `{0}`")]
    UndefinedMethod(String),

    /// An generic IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// SQLite driver error.
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL driver error.
    #[cfg(feature = "pgsql")]
    #[error("postgresql error: {0}")]
    Postgres(#[from] postgres::Error),

    /// MySQL driver error.
    #[cfg(feature = "mysql")]
    #[error("mysql error: {0}")]
    Mysql(#[from] mysql::Error),
}
