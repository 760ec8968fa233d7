use tracing::{instrument, trace};

use crate::{
    connection::Connection,
    error::{DbResult, Error},
    syntax::Syntax,
    value::Value,
};

/// A value assigned to a cursor field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A SQL fragment inserted without any escaping, e.g. `NOW()`.
    Raw(String),
}

impl FieldValue {
    /// Constructs a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> FieldValue {
        FieldValue::Raw(sql.into())
    }

    /// Renders the value as SQL using the escaping rules of `syntax`.
    pub fn to_sql<S: Syntax + ?Sized>(&self, syntax: &S) -> String {
        match self {
            FieldValue::Null => "NULL".into(),
            FieldValue::Text(inner) => syntax.quote(inner),
            FieldValue::Int(inner) => inner.to_string(),
            FieldValue::Float(inner) => inner.to_string(),
            FieldValue::Bool(inner) => u8::from(*inner).to_string(),
            FieldValue::Raw(inner) => inner.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(inner: &str) -> Self {
        FieldValue::Text(inner.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(inner: String) -> Self {
        FieldValue::Text(inner)
    }
}

impl From<i64> for FieldValue {
    fn from(inner: i64) -> Self {
        FieldValue::Int(inner)
    }
}

impl From<i32> for FieldValue {
    fn from(inner: i32) -> Self {
        FieldValue::Int(inner.into())
    }
}

impl From<u32> for FieldValue {
    fn from(inner: u32) -> Self {
        FieldValue::Int(inner.into())
    }
}

impl From<f64> for FieldValue {
    fn from(inner: f64) -> Self {
        FieldValue::Float(inner)
    }
}

impl From<bool> for FieldValue {
    fn from(inner: bool) -> Self {
        FieldValue::Bool(inner)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(inner: Option<T>) -> Self {
        inner.map_or(FieldValue::Null, Into::into)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Int(inner) => FieldValue::Int(inner),
            Value::Float(inner) => FieldValue::Float(inner),
            Value::Text(inner) => FieldValue::Text(inner),
            Value::Blob(inner) => FieldValue::Text(String::from_utf8_lossy(&inner).into_owned()),
        }
    }
}

/// A pending row mutation against one table.
///
/// Fields keep their assignment order, which is also the column order of the
/// generated statements. A cursor is never cleared after running a statement;
/// call [`Cursor::clean`] before reusing it.
pub struct Cursor<'c> {
    con: &'c Connection,
    table: String,
    fields: Vec<(String, FieldValue)>,
}

impl<'c> Cursor<'c> {
    /// Opens a cursor on `table`. See [`Connection::open_cursor`].
    pub(crate) fn new(con: &'c Connection, table: impl Into<String>) -> Cursor<'c> {
        Cursor {
            con,
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Changes the target table. Pending fields are discarded.
    pub fn set_table(&mut self, table: impl Into<String>) {
        self.table = table.into();
        self.clean();
    }

    pub fn table(&self) -> Option<&str> {
        (!self.table.is_empty()).then_some(self.table.as_str())
    }

    /// Sets a field. The database checks that the column exists.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn unset_field(&mut self, name: &str) {
        self.fields.retain(|(field, _)| field != name);
    }

    pub fn is_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Removes every field, keeping the table.
    pub fn clean(&mut self) {
        self.fields.clear();
    }

    /// Builds the `INSERT` statement for the current fields.
    pub fn get_insert(&self) -> DbResult<String> {
        let table = self.require_table()?;
        let (columns, values): (Vec<_>, Vec<_>) = self.format_fields().into_iter().unzip();

        Ok(format!(
            "INSERT INTO {table} (\n{}\n) VALUES (\n{}\n) ",
            columns.join(",\n"),
            values.join(",\n"),
        ))
    }

    /// Builds the `UPDATE` statement for the current fields. `where_clause` is
    /// appended verbatim and must include the `WHERE` keyword.
    pub fn get_update(&self, where_clause: &str) -> DbResult<String> {
        let table = self.require_table()?;
        let assignments: Vec<_> = self
            .format_fields()
            .into_iter()
            .map(|(column, value)| format!("{column} = {value}"))
            .collect();

        Ok(format!(
            "UPDATE {table} SET \n{}\n{where_clause}",
            assignments.join(",\n"),
        ))
    }

    /// Runs the `INSERT` statement through the owning connection.
    #[instrument(level = "debug", skip_all, fields(table = %self.table))]
    pub fn insert(&self) -> DbResult<bool> {
        let sql = self.get_insert()?;
        self.con.execute(&sql)
    }

    /// Runs the `UPDATE` statement through the owning connection.
    #[instrument(level = "debug", skip_all, fields(table = %self.table))]
    pub fn update(&self, where_clause: &str) -> DbResult<bool> {
        let sql = self.get_update(where_clause)?;
        self.con.execute(&sql)
    }

    fn require_table(&self) -> DbResult<String> {
        match self.table() {
            Some(table) => Ok(self.con.escape_system(table)),
            None => {
                trace!("cursor has no table");
                Err(Error::NoTable)
            }
        }
    }

    /// Returns `(escaped column, SQL value)` pairs.
    fn format_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, value)| (self.con.escape_system(name), self.con.format_value(value)))
            .collect()
    }
}
