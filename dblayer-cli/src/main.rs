use std::{
    env,
    io::{self, Write},
};

use dblayer::{
    config::ConnectParams,
    driver::DriverRegistry,
    error::DbResult,
    Connection, Record, RecordSet,
};
use tracing::info;

/// Statements run with `select` and printed as a table.
const QUERY_KEYWORDS: &[&str] = &["SELECT", "PRAGMA", "SHOW", "EXPLAIN", "WITH"];

fn main() -> DbResult<()> {
    setup_tracing();

    let mut params = ConnectParams::from_env()?;
    if let Some(database) = env::args().nth(1) {
        params.database = database;
    }

    let registry = DriverRegistry::with_defaults();
    let con = Connection::init(&registry, &params)?;
    println!(
        "connected to `{}` ({} {}). `\\d` describes the connection, `\\q` quits.",
        con.database(),
        con.driver(),
        con.version(),
    );

    while let Some(line) = input("sql> ")? {
        match line.as_str() {
            "" => continue,
            "\\q" => break,
            "\\d" => println!(
                "driver: {}\nsyntax: {}\nversion: {}",
                con.driver(),
                con.syntax(),
                con.version()
            ),
            sql if is_query(sql) => match con.select(sql) {
                Ok(mut rs) => print_record(&mut rs),
                Err(error) => println!("error: {error}"),
            },
            sql => match con.execute(sql) {
                Ok(_) => println!("ok, {} row(s) changed", con.changes()),
                Err(error) => println!("error: {error}"),
            },
        }
    }

    info!("closing connection");
    con.close()?;
    println!("bye");
    Ok(())
}

fn is_query(sql: &str) -> bool {
    let keyword = sql.split_whitespace().next().unwrap_or_default();
    QUERY_KEYWORDS
        .iter()
        .any(|query| keyword.eq_ignore_ascii_case(query))
}

/// Prints every row of `rs` as a table.
fn print_record(rs: &mut Record) {
    let columns = rs.columns().to_vec();
    let rows: Vec<Vec<String>> = rs
        .iter()
        .map(|(_, row)| row.values().map(ToString::to_string).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(name.chars().count(), usize::max)
        })
        .collect();

    let line = |cells: &[String]| {
        let cells: Vec<_> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        println!("{}", cells.join(" | "));
    };

    line(&columns);
    let total = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
    println!("{}", "-".repeat(total));
    for row in &rows {
        line(row);
    }
    println!("({} row(s))", rows.len());
}

/// Sets up tracing subscriber.
fn setup_tracing() {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or("warn".into());
    let fmt_layer = layer()
        .with_writer(io::stderr)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

/// Reads a trimmed line from the stdin. Returns `None` on EOF.
fn input(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut buf = String::new();
    if io::stdin().read_line(&mut buf)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(buf.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_query() {
        assert!(is_query("select 1"));
        assert!(is_query("  WITH t AS (SELECT 1) SELECT * FROM t"));
        assert!(!is_query("INSERT INTO post DEFAULT VALUES"));
        assert!(!is_query(""));
    }
}
