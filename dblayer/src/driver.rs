//! Database drivers.
//!
//! A [`Driver`] is a factory registered by name in a [`DriverRegistry`]. It
//! opens [`Link`]s, the native connection handles, whose queries yield
//! [`ResultSet`]s. Dialect differences live in the driver's
//! [`Syntax`](crate::syntax::Syntax).

use std::collections::HashMap;

use tracing::debug;

use crate::{
    config::ConnectParams,
    error::{DbResult, Error},
    syntax::Syntax,
    value::{Row, Value},
};

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "pgsql")]
pub mod pgsql;

#[cfg(feature = "mysql")]
pub mod mysqli;

/// A database driver.
pub trait Driver {
    /// The name under which the driver is registered.
    fn name(&self) -> &'static str;

    /// Returns the SQL dialect spoken by this driver's connections.
    fn syntax(&self) -> Box<dyn Syntax>;

    /// Opens a new connection.
    fn connect(&self, params: &ConnectParams) -> DbResult<Box<dyn Link>>;

    /// Opens a persistent connection. Drivers without such a notion open a
    /// regular one.
    fn pconnect(&self, params: &ConnectParams) -> DbResult<Box<dyn Link>> {
        self.connect(params)
    }
}

/// A native connection handle.
///
/// Failing calls must remember their error message so that
/// [`Link::last_error`] reports it until the next statement succeeds.
pub trait Link {
    /// Returns the server version.
    fn version(&mut self) -> DbResult<String>;

    /// Runs a statement that produces rows.
    fn query(&mut self, sql: &str) -> DbResult<Box<dyn ResultSet>>;

    /// Runs a statement for its effect.
    fn exec(&mut self, sql: &str) -> DbResult<()>;

    /// Number of rows affected by the last [`Link::exec`].
    fn changes(&self) -> u64;

    /// The message of the last failed statement, if the last statement failed.
    fn last_error(&self) -> Option<&str>;

    /// Locks `table` (an already escaped identifier) for writing.
    fn write_lock(&mut self, table: &str) -> DbResult<()>;

    /// Releases the lock taken by [`Link::write_lock`].
    fn unlock(&mut self) -> DbResult<()>;

    /// Reclaims unused storage of `table` (an already escaped identifier).
    fn vacuum(&mut self, table: &str) -> DbResult<()>;

    /// Closes the native handle.
    fn close(self: Box<Self>) -> DbResult<()>;
}

/// A native query result.
///
/// The result keeps an internal read position: [`ResultSet::fetch_row`]
/// returns the row at that position and advances it.
pub trait ResultSet {
    fn num_rows(&self) -> usize;

    fn num_fields(&self) -> usize;

    fn field_name(&self, i: usize) -> Option<&str>;

    fn field_type(&self, i: usize) -> Option<&str>;

    /// Moves the read position. Returns `false` if `row` is out of bounds.
    fn seek(&mut self, row: usize) -> bool;

    /// Reads the row at the current position and advances.
    fn fetch_row(&mut self) -> Option<Row>;
}

/// A result set fully read into memory by the driver.
#[derive(Debug, Default)]
pub struct BufferedResult {
    names: Vec<String>,
    types: Vec<String>,
    rows: Vec<Vec<Value>>,
    pos: usize,
}

impl BufferedResult {
    /// Constructs a buffered result. Every row must have one value per
    /// column.
    pub fn new(names: Vec<String>, types: Vec<String>, rows: Vec<Vec<Value>>) -> BufferedResult {
        debug_assert_eq!(names.len(), types.len());
        debug_assert!(rows.iter().all(|row| row.len() == names.len()));
        BufferedResult {
            names,
            types,
            rows,
            pos: 0,
        }
    }

    /// A result with no columns and no rows.
    pub fn empty() -> BufferedResult {
        BufferedResult::default()
    }
}

impl ResultSet for BufferedResult {
    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn num_fields(&self) -> usize {
        self.names.len()
    }

    fn field_name(&self, i: usize) -> Option<&str> {
        self.names.get(i).map(String::as_str)
    }

    fn field_type(&self, i: usize) -> Option<&str> {
        self.types.get(i).map(String::as_str)
    }

    fn seek(&mut self, row: usize) -> bool {
        if row >= self.rows.len() {
            return false;
        }
        self.pos = row;
        true
    }

    fn fetch_row(&mut self) -> Option<Row> {
        let values = self.rows.get(self.pos)?;
        self.pos += 1;
        Some(
            self.names
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect(),
        )
    }
}

/// Maps driver names to drivers.
///
/// There is no global registry: build one and hand it to
/// [`Connection::init`](crate::Connection::init).
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<&'static str, Box<dyn Driver>>,
}

impl DriverRegistry {
    /// Constructs an empty registry.
    pub fn new() -> DriverRegistry {
        DriverRegistry {
            drivers: HashMap::new(),
        }
    }

    /// Constructs a registry with every compiled-in driver.
    #[allow(unused_mut)]
    pub fn with_defaults() -> DriverRegistry {
        let mut registry = DriverRegistry::new();
        #[cfg(feature = "sqlite")]
        registry.register(sqlite::SqliteDriver);
        #[cfg(feature = "pgsql")]
        registry.register(pgsql::PgsqlDriver);
        #[cfg(feature = "mysql")]
        {
            registry.register(mysqli::MysqlDriver::utf8());
            registry.register(mysqli::MysqlDriver::utf8mb4());
        }
        registry
    }

    /// Registers a driver, replacing any driver of the same name.
    pub fn register<D: Driver + 'static>(&mut self, driver: D) {
        debug!(name = driver.name(), "registering driver");
        self.drivers.insert(driver.name(), Box::new(driver));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Driver> {
        self.drivers.get(name).map(|driver| &**driver)
    }

    /// Same as [`Self::get`], but failing with [`Error::UnknownDriver`].
    pub fn resolve(&self, name: &str) -> DbResult<&dyn Driver> {
        self.get(name)
            .ok_or_else(|| Error::UnknownDriver(name.to_owned()))
    }

    /// Returns the registered driver names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.drivers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
