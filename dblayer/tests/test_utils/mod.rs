use std::ops::Deref;

use dblayer::{config::ConnectParams, driver::DriverRegistry, error::DbResult, Connection};

/// Sets up tracing subscriber.
#[allow(dead_code)]
pub fn setup_tracing(level: Option<&str>) {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = level
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::try_from_default_env().unwrap_or("warn".into()));
    let fmt_layer = layer()
        .with_test_writer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    // Every test of a binary shares the global subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

const SCHEMA: &str = "
    CREATE TABLE post (
        post_id     INTEGER PRIMARY KEY,
        post_title  TEXT NOT NULL,
        post_status INTEGER NOT NULL DEFAULT 0,
        post_dt     TEXT
    );
    INSERT INTO post (post_id, post_title, post_status, post_dt) VALUES
        (1, 'Hello', 1, '2024-01-02 10:00:00'),
        (2, 'It''s me', 1, '2024-02-03 11:30:00'),
        (3, 'Draft', 0, NULL);
";

/// An in-memory SQLite database holding a `post` table with three rows.
pub struct TestDb(Connection);

impl TestDb {
    pub fn new() -> DbResult<Self> {
        let registry = DriverRegistry::with_defaults();
        let params = ConnectParams::new("sqlite", ":memory:");
        let con = Connection::init(&registry, &params)?;
        con.execute(SCHEMA)?;
        Ok(Self(con))
    }

    #[allow(dead_code)]
    pub fn into_inner(self) -> Connection {
        self.0
    }
}

impl Deref for TestDb {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
