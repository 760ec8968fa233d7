//! SQLite driver, backed by `rusqlite`.

use rusqlite::{types::ValueRef, Connection};
use tracing::{debug, instrument, trace};

use crate::{
    config::ConnectParams,
    driver::{BufferedResult, Driver, Link, ResultSet},
    error::DbResult,
    syntax::Syntax,
    value::Value,
};

/// Type reported for columns without a declared type, such as expressions.
const UNTYPED_COLUMN: &str = "";

/// The `sqlite` driver. The database name is the path to the database file;
/// `:memory:` opens a private in-memory database.
#[derive(Copy, Clone, Debug, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn syntax(&self) -> Box<dyn Syntax> {
        Box::new(SqliteSyntax)
    }

    #[instrument(level = "debug", skip_all, fields(database = %params.database))]
    fn connect(&self, params: &ConnectParams) -> DbResult<Box<dyn Link>> {
        debug!("opening sqlite database");
        let conn = Connection::open(&params.database)?;
        Ok(Box::new(SqliteLink {
            conn,
            changes: 0,
            last_error: None,
        }))
    }
}

/// SQLite dialect.
#[derive(Copy, Clone, Debug, Default)]
pub struct SqliteSyntax;

impl Syntax for SqliteSyntax {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn date_format(&self, field: &str, pattern: &str) -> String {
        format!("strftime({},{field})", self.quote(pattern))
    }
}

struct SqliteLink {
    conn: Connection,
    changes: u64,
    last_error: Option<String>,
}

impl SqliteLink {
    /// Records the outcome of a statement for [`Link::last_error`].
    fn track<T>(&mut self, result: rusqlite::Result<T>) -> DbResult<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(error) => {
                debug!(%error, "sqlite statement failed");
                self.last_error = Some(error.to_string());
                Err(error.into())
            }
        }
    }
}

impl Link for SqliteLink {
    fn version(&mut self) -> DbResult<String> {
        Ok(rusqlite::version().to_owned())
    }

    fn query(&mut self, sql: &str) -> DbResult<Box<dyn ResultSet>> {
        let result = self.track(read_result(&self.conn, sql))?;
        trace!(rows = result.num_rows(), "query done");
        Ok(Box::new(result))
    }

    fn exec(&mut self, sql: &str) -> DbResult<()> {
        self.track(self.conn.execute_batch(sql))?;
        self.changes = self.conn.changes() as u64;
        Ok(())
    }

    fn changes(&self) -> u64 {
        self.changes
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn write_lock(&mut self, _table: &str) -> DbResult<()> {
        // SQLite locks the whole database.
        self.exec("BEGIN EXCLUSIVE TRANSACTION")
    }

    fn unlock(&mut self) -> DbResult<()> {
        self.exec("COMMIT")
    }

    fn vacuum(&mut self, _table: &str) -> DbResult<()> {
        self.exec("VACUUM")
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        let SqliteLink { conn, .. } = *self;
        conn.close().map_err(|(_, error)| error.into())
    }
}

/// Runs `sql` and reads every row into memory.
fn read_result(conn: &Connection, sql: &str) -> rusqlite::Result<BufferedResult> {
    let mut stmt = conn.prepare(sql)?;
    let (names, types): (Vec<_>, Vec<_>) = stmt
        .columns()
        .iter()
        .map(|column| {
            let ty = column.decl_type().unwrap_or(UNTYPED_COLUMN);
            (column.name().to_owned(), ty.to_ascii_lowercase())
        })
        .unzip();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(names.len());
        for i in 0..names.len() {
            values.push(convert(row.get_ref(i)?));
        }
        rows.push(values);
    }

    Ok(BufferedResult::new(names, types, rows))
}

fn convert(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(inner) => Value::Int(inner),
        ValueRef::Real(inner) => Value::Float(inner),
        ValueRef::Text(inner) => Value::Text(String::from_utf8_lossy(inner).into_owned()),
        ValueRef::Blob(inner) => Value::Blob(inner.to_vec()),
    }
}
