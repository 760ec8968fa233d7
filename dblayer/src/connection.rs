use std::cell::RefCell;

use tracing::{debug, info, instrument, trace};

use crate::{
    config::ConnectParams,
    cursor::{Cursor, FieldValue},
    driver::{BufferedResult, DriverRegistry, Link, ResultSet},
    error::DbResult,
    record::Record,
    syntax::{InValues, Limit, OrderBy, Syntax},
};

/// A database connection.
///
/// The connection exclusively owns its native link. It is meant to be used
/// from a single thread of control: statements run synchronously, in the
/// order they are issued.
pub struct Connection {
    driver: &'static str,
    version: String,
    database: String,
    syntax: Box<dyn Syntax>,
    link: RefCell<Box<dyn Link>>,
}

impl Connection {
    /// Opens a connection with the driver registered under `params.driver`.
    ///
    /// Fails with [`Error::UnknownDriver`](crate::error::Error::UnknownDriver)
    /// if no such driver is registered.
    #[instrument(level = "debug", skip_all, fields(driver = %params.driver))]
    pub fn init(registry: &DriverRegistry, params: &ConnectParams) -> DbResult<Connection> {
        let driver = registry.resolve(&params.driver)?;
        let link = if params.persistent {
            driver.pconnect(params)?
        } else {
            driver.connect(params)?
        };
        let conn = Connection::from_link(driver.name(), driver.syntax(), link, &params.database)?;
        info!(version = %conn.version, "connected");
        Ok(conn)
    }

    /// Wraps an already opened link.
    pub fn from_link(
        driver: &'static str,
        syntax: Box<dyn Syntax>,
        mut link: Box<dyn Link>,
        database: impl Into<String>,
    ) -> DbResult<Connection> {
        let version = link.version()?;
        Ok(Connection {
            driver,
            version,
            database: database.into(),
            syntax,
            link: RefCell::new(link),
        })
    }

    /// Closes the native link.
    pub fn close(self) -> DbResult<()> {
        debug!(driver = self.driver, "closing connection");
        self.link.into_inner().close()
    }

    /// The driver name, e.g. `pgsql`.
    pub fn driver(&self) -> &'static str {
        self.driver
    }

    /// The dialect name, e.g. `postgresql`.
    pub fn syntax(&self) -> &'static str {
        self.syntax.name()
    }

    /// The server version.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Runs a query and wraps its result in a [`Record`].
    #[instrument(level = "debug", skip(self))]
    pub fn select(&self, sql: &str) -> DbResult<Record> {
        let result = self.link.borrow_mut().query(sql)?;

        let cols = result.num_fields();
        let mut names = Vec::with_capacity(cols);
        let mut types = Vec::with_capacity(cols);
        for i in 0..cols {
            names.push(result.field_name(i).unwrap_or_default().to_owned());
            types.push(result.field_type(i).unwrap_or_default().to_owned());
        }
        trace!(cols, rows = result.num_rows(), "selected");

        Ok(Record::new(result, names, types))
    }

    /// Returns a record with no rows and no columns.
    pub fn null_record(&self) -> Record {
        let result: Box<dyn ResultSet> = Box::new(BufferedResult::empty());
        Record::new(result, Vec::new(), Vec::new())
    }

    /// Runs a statement for its effect.
    ///
    /// Returns `Ok(true)` once the driver has run the statement. A driver
    /// failure is returned as an error and remains available through
    /// [`Connection::error`] until the next statement succeeds.
    #[instrument(level = "debug", skip(self))]
    pub fn execute(&self, sql: &str) -> DbResult<bool> {
        self.link.borrow_mut().exec(sql)?;
        Ok(true)
    }

    pub fn begin(&self) -> DbResult<bool> {
        self.execute("BEGIN")
    }

    pub fn commit(&self) -> DbResult<bool> {
        self.execute("COMMIT")
    }

    pub fn rollback(&self) -> DbResult<bool> {
        self.execute("ROLLBACK")
    }

    /// Locks `table` for writing.
    pub fn write_lock(&self, table: &str) -> DbResult<()> {
        let table = self.escape_system(table);
        self.link.borrow_mut().write_lock(&table)
    }

    pub fn unlock(&self) -> DbResult<()> {
        self.link.borrow_mut().unlock()
    }

    /// Reclaims unused storage of `table`.
    pub fn vacuum(&self, table: &str) -> DbResult<()> {
        let table = self.escape_system(table);
        self.link.borrow_mut().vacuum(&table)
    }

    /// Number of rows affected by the last [`Connection::execute`].
    pub fn changes(&self) -> u64 {
        self.link.borrow().changes()
    }

    /// Returns the error message of the last statement, if it failed.
    pub fn error(&self) -> Option<String> {
        self.link.borrow().last_error().map(str::to_owned)
    }

    /// Escapes a string for use between single quotes.
    pub fn escape(&self, value: &str) -> String {
        self.syntax.escape_string(value)
    }

    /// Escapes every string of `values`.
    pub fn escape_all<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        values.iter().map(|value| self.escape(value.as_ref())).collect()
    }

    /// Escapes and single-quotes a string literal.
    pub fn escape_str(&self, value: &str) -> String {
        self.syntax.quote(value)
    }

    /// Quotes a table or column name.
    pub fn escape_system(&self, name: &str) -> String {
        self.syntax.escape_system(name)
    }

    /// Renders a cursor value as SQL.
    pub fn format_value(&self, value: &FieldValue) -> String {
        value.to_sql(&*self.syntax)
    }

    /// Builds a ` LIMIT ` fragment from `count`, `(offset, count)` or
    /// `[offset, count]`.
    pub fn limit(&self, limit: impl Into<Limit>) -> String {
        self.syntax.limit(limit.into())
    }

    /// Builds an ` IN (...) ` fragment.
    pub fn in_values(&self, values: impl Into<InValues>) -> String {
        self.syntax.in_values(&values.into())
    }

    pub fn order_by(&self, items: &[OrderBy]) -> String {
        self.syntax.order_by(items)
    }

    pub fn lex_fields(&self, fields: &[&str]) -> String {
        self.syntax.lex_fields(fields)
    }

    pub fn concat(&self, parts: &[&str]) -> String {
        self.syntax.concat(parts)
    }

    pub fn date_format(&self, field: &str, pattern: &str) -> String {
        self.syntax.date_format(field, pattern)
    }

    /// Opens a [`Cursor`] on `table`.
    pub fn open_cursor(&self, table: impl Into<String>) -> Cursor<'_> {
        Cursor::new(self, table)
    }
}
