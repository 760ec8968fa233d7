//! MySQL driver, backed by the `mysql` crate.
//!
//! Registered twice: `mysqli` talks `utf8`, `mysqlimb4` talks `utf8mb4`.

use ::mysql::{prelude::Queryable, Conn, OptsBuilder, Value as MyValue};
use tracing::{debug, instrument, trace};

use crate::{
    config::ConnectParams,
    driver::{BufferedResult, Driver, Link, ResultSet},
    error::DbResult,
    syntax::{translate_pattern, Syntax},
    value::Value,
};

/// `strftime` codes that MySQL spells differently.
const DATE_CODES: &[(char, &str)] = &[('M', "%i"), ('S', "%s")];

/// The `mysqli` and `mysqlimb4` drivers.
#[derive(Copy, Clone, Debug)]
pub struct MysqlDriver {
    name: &'static str,
    charset: &'static str,
    collation: &'static str,
}

impl MysqlDriver {
    pub fn utf8() -> MysqlDriver {
        MysqlDriver {
            name: "mysqli",
            charset: "utf8",
            collation: "utf8_unicode_ci",
        }
    }

    pub fn utf8mb4() -> MysqlDriver {
        MysqlDriver {
            name: "mysqlimb4",
            charset: "utf8mb4",
            collation: "utf8mb4_unicode_ci",
        }
    }
}

impl Driver for MysqlDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn syntax(&self) -> Box<dyn Syntax> {
        Box::new(MysqlSyntax {
            collation: self.collation,
        })
    }

    #[instrument(level = "debug", skip_all, fields(driver = self.name, host = %params.host))]
    fn connect(&self, params: &ConnectParams) -> DbResult<Box<dyn Link>> {
        let (host, port) = params.host_and_port()?;
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .tcp_port(port.unwrap_or(3306))
            .user(Some(&params.user))
            .pass(Some(&params.password))
            .db_name(Some(&params.database));

        debug!("connecting to mysql");
        let mut conn = Conn::new(opts)?;
        conn.query_drop(format!("SET NAMES {}", self.charset))?;

        Ok(Box::new(MysqlLink {
            conn,
            changes: 0,
            last_error: None,
        }))
    }
}

/// MySQL dialect.
#[derive(Copy, Clone, Debug)]
pub struct MysqlSyntax {
    collation: &'static str,
}

impl MysqlSyntax {
    pub fn new(collation: &'static str) -> MysqlSyntax {
        MysqlSyntax { collation }
    }
}

impl Syntax for MysqlSyntax {
    fn name(&self) -> &'static str {
        "mysql"
    }

    /// Escapes like `mysql_real_escape_string`.
    fn escape_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\x1a' => out.push_str("\\Z"),
                c => out.push(c),
            }
        }
        out
    }

    fn escape_system(&self, name: &str) -> String {
        format!("`{name}`")
    }

    fn limit(&self, limit: crate::syntax::Limit) -> String {
        match limit.offset {
            Some(offset) => format!(" LIMIT {offset}, {} ", limit.count),
            None => format!(" LIMIT {} ", limit.count),
        }
    }

    fn collate(&self, field: &str) -> String {
        format!("{field} COLLATE {}", self.collation)
    }

    fn concat(&self, parts: &[&str]) -> String {
        format!("CONCAT({})", parts.join(","))
    }

    fn date_format(&self, field: &str, pattern: &str) -> String {
        let pattern = translate_pattern(pattern, DATE_CODES);
        format!("DATE_FORMAT({field},{})", self.quote(&pattern))
    }
}

struct MysqlLink {
    conn: Conn,
    changes: u64,
    last_error: Option<String>,
}

impl MysqlLink {
    fn track<T>(&mut self, result: Result<T, ::mysql::Error>) -> DbResult<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(error) => {
                debug!(%error, "mysql statement failed");
                self.last_error = Some(error.to_string());
                Err(error.into())
            }
        }
    }
}

impl Link for MysqlLink {
    fn version(&mut self) -> DbResult<String> {
        let (major, minor, patch) = self.conn.server_version();
        Ok(format!("{major}.{minor}.{patch}"))
    }

    fn query(&mut self, sql: &str) -> DbResult<Box<dyn ResultSet>> {
        let result = read_result(&mut self.conn, sql);
        let result = self.track(result)?;
        trace!(rows = result.num_rows(), "query done");
        Ok(Box::new(result))
    }

    fn exec(&mut self, sql: &str) -> DbResult<()> {
        let result = self.conn.query_drop(sql);
        self.track(result)?;
        self.changes = self.conn.affected_rows();
        Ok(())
    }

    fn changes(&self) -> u64 {
        self.changes
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn write_lock(&mut self, table: &str) -> DbResult<()> {
        self.exec(&format!("LOCK TABLES {table} WRITE"))
    }

    fn unlock(&mut self) -> DbResult<()> {
        self.exec("UNLOCK TABLES")
    }

    fn vacuum(&mut self, table: &str) -> DbResult<()> {
        self.exec(&format!("OPTIMIZE TABLE {table}"))
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        // The connection is closed when dropped.
        Ok(())
    }
}

fn read_result(conn: &mut Conn, sql: &str) -> Result<BufferedResult, ::mysql::Error> {
    let mut result = conn.query_iter(sql)?;
    let (names, types): (Vec<_>, Vec<_>) = result
        .columns()
        .as_ref()
        .iter()
        .map(|column| {
            let ty = format!("{:?}", column.column_type());
            (column.name_str().into_owned(), ty)
        })
        .unzip();

    let mut rows = Vec::new();
    for row in result.by_ref() {
        let row = row?;
        let values = (0..row.len())
            .map(|i| row.as_ref(i).map_or(Value::Null, convert))
            .collect();
        rows.push(values);
    }

    Ok(BufferedResult::new(names, types, rows))
}

fn convert(value: &MyValue) -> Value {
    match value {
        MyValue::NULL => Value::Null,
        MyValue::Bytes(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        MyValue::Int(inner) => Value::Int(*inner),
        // Unsigned values past `i64::MAX` keep their digits as text.
        MyValue::UInt(inner) => {
            i64::try_from(*inner).map_or_else(|_| Value::Text(inner.to_string()), Value::Int)
        }
        MyValue::Float(inner) => Value::Float(f64::from(*inner)),
        MyValue::Double(inner) => Value::Float(*inner),
        // Dates and times only show up with the binary protocol.
        other => Value::Text(other.as_sql(true).trim_matches('\'').to_owned()),
    }
}
