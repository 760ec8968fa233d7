//! PostgreSQL driver, backed by the synchronous `postgres` client.

use postgres::{Client, Config, NoTls, SimpleQueryMessage};
use tracing::{debug, instrument, trace};

use crate::{
    config::ConnectParams,
    driver::{BufferedResult, Driver, Link, ResultSet},
    error::DbResult,
    syntax::{translate_pattern, Syntax},
    value::Value,
};

/// `strftime` codes understood by [`PgsqlSyntax::date_format`].
const DATE_CODES: &[(char, &str)] = &[
    ('d', "DD"),
    ('H', "HH24"),
    ('M', "MI"),
    ('m', "MM"),
    ('S', "SS"),
    ('Y', "YYYY"),
];

/// The `pgsql` driver.
#[derive(Copy, Clone, Debug, Default)]
pub struct PgsqlDriver;

impl Driver for PgsqlDriver {
    fn name(&self) -> &'static str {
        "pgsql"
    }

    fn syntax(&self) -> Box<dyn Syntax> {
        Box::new(PgsqlSyntax)
    }

    #[instrument(level = "debug", skip_all, fields(host = %params.host, database = %params.database))]
    fn connect(&self, params: &ConnectParams) -> DbResult<Box<dyn Link>> {
        let (host, port) = params.host_and_port()?;

        let mut config = Config::new();
        config.host(host).dbname(&params.database).user(&params.user);
        if !params.password.is_empty() {
            config.password(&params.password);
        }
        if let Some(port) = port {
            config.port(port);
        }

        debug!("connecting to postgresql");
        let client = config.connect(NoTls)?;
        Ok(Box::new(PgsqlLink {
            client,
            changes: 0,
            last_error: None,
        }))
    }
}

/// PostgreSQL dialect.
#[derive(Copy, Clone, Debug, Default)]
pub struct PgsqlSyntax;

impl Syntax for PgsqlSyntax {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn date_format(&self, field: &str, pattern: &str) -> String {
        let pattern = translate_pattern(pattern, DATE_CODES);
        format!("TO_CHAR({field},{})", self.quote(&pattern))
    }
}

struct PgsqlLink {
    client: Client,
    changes: u64,
    last_error: Option<String>,
}

impl PgsqlLink {
    fn track<T>(&mut self, result: Result<T, postgres::Error>) -> DbResult<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(error) => {
                debug!(%error, "postgresql statement failed");
                self.last_error = Some(error.to_string());
                Err(error.into())
            }
        }
    }
}

impl Link for PgsqlLink {
    fn version(&mut self) -> DbResult<String> {
        let messages = self.client.simple_query("SHOW server_version");
        let messages = self.track(messages)?;
        Ok(messages
            .iter()
            .find_map(|message| match message {
                SimpleQueryMessage::Row(row) => row.get(0).map(str::to_owned),
                _ => None,
            })
            .unwrap_or_default())
    }

    fn query(&mut self, sql: &str) -> DbResult<Box<dyn ResultSet>> {
        let result = read_result(&mut self.client, sql);
        let result = self.track(result)?;
        trace!(rows = result.num_rows(), "query done");
        Ok(Box::new(result))
    }

    fn exec(&mut self, sql: &str) -> DbResult<()> {
        let messages = self.client.simple_query(sql);
        let messages = self.track(messages)?;
        // The count of the last command, as for a single statement.
        self.changes = messages
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::CommandComplete(n) => Some(*n),
                _ => None,
            })
            .last()
            .unwrap_or(0);
        Ok(())
    }

    fn changes(&self) -> u64 {
        self.changes
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn write_lock(&mut self, table: &str) -> DbResult<()> {
        self.exec(&format!("BEGIN; LOCK TABLE {table} IN EXCLUSIVE MODE"))
    }

    fn unlock(&mut self) -> DbResult<()> {
        self.exec("COMMIT")
    }

    fn vacuum(&mut self, table: &str) -> DbResult<()> {
        self.exec(&format!("VACUUM {table}"))
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        let PgsqlLink { client, .. } = *self;
        Ok(client.close()?)
    }
}

/// Reads column metadata from the prepared statement, then the rows (as text)
/// through the simple query protocol.
fn read_result(client: &mut Client, sql: &str) -> Result<BufferedResult, postgres::Error> {
    let stmt = client.prepare(sql)?;
    let (names, types): (Vec<_>, Vec<_>) = stmt
        .columns()
        .iter()
        .map(|column| (column.name().to_owned(), column.type_().name().to_owned()))
        .unzip();

    let mut rows = Vec::new();
    for message in client.simple_query(sql)? {
        if let SimpleQueryMessage::Row(row) = message {
            let values = (0..row.len())
                .map(|i| row.get(i).map_or(Value::Null, Value::from))
                .collect();
            rows.push(values);
        }
    }

    Ok(BufferedResult::new(names, types, rows))
}
