use tracing::trace;

use crate::{
    error::DbResult,
    record::{
        cmp::{compare_lexical, compare_values, merge_sort_by, Order},
        extension::{Extension, Extensions},
        lookup, Position, RecordSet,
    },
    value::{Row, Value},
};

/// A materialized result.
///
/// Unlike [`Record`](crate::Record), a static record holds every row in
/// memory and never touches the database again: rows may be changed in place
/// and reordered.
#[derive(Clone, Debug, Default)]
pub struct StaticRecord {
    data: Vec<Row>,
    columns: Vec<String>,
    types: Vec<String>,
    pos: Position,
    extensions: Extensions,
}

impl StaticRecord {
    /// Builds a record from in-memory rows. Column names and types are taken
    /// from the first row.
    pub fn new_from_array(data: Vec<Row>) -> StaticRecord {
        let (columns, types) = match data.first() {
            Some(first) => first
                .iter()
                .map(|(name, value)| (name.to_owned(), value.type_name().to_owned()))
                .unzip(),
            None => (Vec::new(), Vec::new()),
        };
        StaticRecord::from_parts(data, columns, types, Extensions::new())
    }

    pub(crate) fn from_parts(
        data: Vec<Row>,
        columns: Vec<String>,
        types: Vec<String>,
        extensions: Extensions,
    ) -> StaticRecord {
        StaticRecord {
            data,
            columns,
            types,
            pos: Position::default(),
            extensions,
        }
    }

    /// Returns every row.
    pub fn rows(&self) -> &[Row] {
        &self.data
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.data
    }

    /// A static record is already static.
    pub fn to_static(self) -> StaticRecord {
        self
    }

    /// Sets a field of the current row, adding it if the row doesn't have it.
    /// Returns `false` if there is no current row.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.data.get_mut(self.pos.index) {
            Some(row) => {
                row.set(name, value);
                true
            }
            None => false,
        }
    }

    /// Sorts the rows by `field`.
    ///
    /// Two values that both look like canonical integers compare numerically;
    /// any other pair compares its text byte by byte. Does nothing if the
    /// first row has no such field.
    pub fn sort(&mut self, field: &str, order: Order) {
        self.sort_with(field, order, compare_values);
    }

    /// Sorts the rows by `field`, comparing lower-cased text.
    pub fn lexical_sort(&mut self, field: &str, order: Order) {
        self.sort_with(field, order, compare_lexical);
    }

    fn sort_with<F>(&mut self, field: &str, order: Order, cmp: F)
    where
        F: Fn(&Value, &Value) -> std::cmp::Ordering,
    {
        if !self.data.first().is_some_and(|row| row.contains(field)) {
            trace!(field, "nothing to sort by");
            return;
        }
        let data = std::mem::take(&mut self.data);
        self.data = merge_sort_by(data, &mut |a: &Row, b: &Row| {
            order.apply(cmp(&a[field], &b[field]))
        });
        self.pos = Position::default();
    }

    /// Registers the methods of the extension `E`.
    pub fn extend<E: Extension>(&mut self) {
        E::register(&mut self.extensions);
    }

    /// Registers every method of `extensions`.
    pub fn extend_with(&mut self, extensions: &Extensions) {
        self.extensions.merge(extensions);
    }

    /// Names of the registered extension methods.
    pub fn extensions(&self) -> Vec<&str> {
        self.extensions.names()
    }

    /// Calls the extension method `name` with this record and `args`.
    pub fn call(&mut self, name: &str, args: &[Value]) -> DbResult<Value> {
        let method = lookup(&self.extensions, name)?;
        method(self as &mut dyn RecordSet, args)
    }
}

impl RecordSet for StaticRecord {
    fn count(&self) -> usize {
        self.data.len()
    }

    fn seek(&mut self, row: isize) -> bool {
        match usize::try_from(row) {
            Ok(row) if row < self.data.len() => {
                self.pos.index = row;
                true
            }
            _ => false,
        }
    }

    fn row(&self) -> Option<&Row> {
        self.data.get(self.pos.index)
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn column_types(&self) -> &[String] {
        &self.types
    }

    fn position(&self) -> &Position {
        &self.pos
    }

    fn position_mut(&mut self) -> &mut Position {
        &mut self.pos
    }
}

impl From<Vec<Row>> for StaticRecord {
    fn from(data: Vec<Row>) -> Self {
        StaticRecord::new_from_array(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(rs: &mut StaticRecord) -> Vec<String> {
        rs.iter().map(|(_, row)| row["name"].to_string()).collect()
    }

    #[test]
    fn test_new_from_array() {
        let rs = StaticRecord::new_from_array(vec![
            Row::from([("id", Value::Int(1)), ("name", "a".into())]),
            Row::from([("id", Value::Int(2)), ("name", "b".into())]),
        ]);
        assert_eq!(rs.count(), 2);
        assert_eq!(rs.columns(), ["id", "name"]);
        assert_eq!(rs.column_types(), ["integer", "string"]);
        assert_eq!(rs.f("name"), Some(&Value::from("a")));
    }

    #[test]
    fn test_empty_array() {
        let mut rs = StaticRecord::new_from_array(Vec::new());
        assert!(rs.is_empty());
        assert!(rs.columns().is_empty());
        assert!(!rs.set("x", 1));
        assert!(!rs.fetch());
    }

    #[test]
    fn test_sort_mixed_formats() {
        let mut rs = StaticRecord::new_from_array(vec![
            Row::from([("name", "7")]),
            Row::from([("name", "10")]),
            Row::from([("name", "007")]),
            Row::from([("name", "9")]),
        ]);
        rs.sort("name", Order::Asc);
        // "007" only ever meets the others as text.
        assert_eq!(names(&mut rs), ["007", "7", "9", "10"]);

        rs.sort("name", Order::Desc);
        assert_eq!(names(&mut rs), ["10", "9", "7", "007"]);
    }

    #[test]
    fn test_lexical_sort() {
        let mut rs = StaticRecord::new_from_array(vec![
            Row::from([("name", "banana")]),
            Row::from([("name", "Apple")]),
            Row::from([("name", "cherry")]),
        ]);
        rs.sort("name", Order::Asc);
        assert_eq!(names(&mut rs), ["Apple", "banana", "cherry"]);

        rs.lexical_sort("name", Order::Desc);
        assert_eq!(names(&mut rs), ["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_sort_unknown_field_is_noop() {
        let mut rs = StaticRecord::new_from_array(vec![
            Row::from([("id", 2)]),
            Row::from([("id", 1)]),
        ]);
        rs.seek(1);
        rs.sort("nope", Order::Asc);
        assert_eq!(rs.index(), 1);
        assert_eq!(rs.rows()[0]["id"], Value::Int(2));
    }
}
