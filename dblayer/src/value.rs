use std::{borrow::Cow, fmt, ops::Index};

static NULL: Value = Value::Null;

/// A database value, as read from a result row.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Checks whether the value is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the inner string, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the textual rendering of the value. `NULL` renders as the
    /// empty string and blobs are decoded lossily.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Int(inner) => Cow::Owned(inner.to_string()),
            Value::Float(inner) => Cow::Owned(inner.to_string()),
            Value::Text(inner) => Cow::Borrowed(inner),
            Value::Blob(inner) => String::from_utf8_lossy(inner),
        }
    }

    /// Interprets the value as an integer, parsing text values.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(inner) => Some(*inner),
            Value::Float(inner) => Some(*inner as i64),
            Value::Text(inner) => inner.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the integer this value renders as, only if the rendering is
    /// exactly the canonical form of that integer.
    ///
    /// `"7"` and `-3` qualify; `"007"`, `"+7"`, `" 7"` and `"1.5"` don't.
    pub fn as_clean_int(&self) -> Option<i64> {
        if let Value::Int(inner) = self {
            return Some(*inner);
        }
        let text = self.to_text();
        let n: i64 = text.parse().ok()?;
        (n.to_string() == text).then_some(n)
    }

    /// Returns the name of the value kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::Blob(_) => "blob",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<i64> for Value {
    fn from(inner: i64) -> Self {
        Value::Int(inner)
    }
}

impl From<i32> for Value {
    fn from(inner: i32) -> Self {
        Value::Int(inner.into())
    }
}

impl From<f64> for Value {
    fn from(inner: f64) -> Self {
        Value::Float(inner)
    }
}

impl From<&str> for Value {
    fn from(inner: &str) -> Self {
        Value::Text(inner.to_owned())
    }
}

impl From<String> for Value {
    fn from(inner: String) -> Self {
        Value::Text(inner)
    }
}

impl From<Vec<u8>> for Value {
    fn from(inner: Vec<u8>) -> Self {
        Value::Blob(inner)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(inner: Option<T>) -> Self {
        inner.map_or(Value::Null, Into::into)
    }
}

/// Addresses a field of a [`Row`] either by column name or by its 0-based
/// position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldRef<'a> {
    Name(&'a str),
    Position(usize),
}

impl<'a> From<&'a str> for FieldRef<'a> {
    fn from(name: &'a str) -> Self {
        FieldRef::Name(name)
    }
}

impl<'a> From<&'a String> for FieldRef<'a> {
    fn from(name: &'a String) -> Self {
        FieldRef::Name(name)
    }
}

impl From<usize> for FieldRef<'_> {
    fn from(position: usize) -> Self {
        FieldRef::Position(position)
    }
}

/// A result row. Each field is reachable both by name and by position, and
/// both ways address the same value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Constructs a new empty row.
    pub fn new() -> Row {
        Row { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Row {
        Row {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Returns a reference to the value addressed by `key`.
    pub fn get<'k>(&self, key: impl Into<FieldRef<'k>>) -> Option<&Value> {
        match key.into() {
            FieldRef::Name(name) => self.position(name).map(|i| &self.fields[i].1),
            FieldRef::Position(i) => self.fields.get(i).map(|(_, value)| value),
        }
    }

    /// Checks whether the row has a field with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Sets a value. An existing field keeps its position; a new one is
    /// appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.fields[i].1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Returns the field names, in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the values, in column order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(field, _)| field == name)
    }
}

impl Index<&str> for Row {
    type Output = Value;

    /// Missing fields read as `NULL`.
    fn index(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NULL)
    }
}

impl Index<usize> for Row {
    type Output = Value;

    /// Missing fields read as `NULL`.
    fn index(&self, position: usize) -> &Value {
        self.get(position).unwrap_or(&NULL)
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dual_addressing() {
        let mut row = Row::from([("id", Value::Int(3)), ("name", "c".into())]);
        assert_eq!(row.get("name"), row.get(1));
        assert_eq!(row[0], Value::Int(3));

        row.set("name", "d");
        assert_eq!(row[1], Value::from("d"));
        assert_eq!(row.len(), 2);

        row.set("extra", Value::Null);
        assert_eq!(row.names().collect::<Vec<_>>(), ["id", "name", "extra"]);
    }

    #[test]
    fn test_missing_fields_read_as_null() {
        let row = Row::from([("id", 1)]);
        assert_eq!(row.get("nope"), None);
        assert_eq!(row.get(4), None);
        assert!(row["nope"].is_null());
        assert!(row[4].is_null());
    }

    #[test]
    fn test_clean_int() {
        assert_eq!(Value::from("7").as_clean_int(), Some(7));
        assert_eq!(Value::from("-12").as_clean_int(), Some(-12));
        assert_eq!(Value::Int(42).as_clean_int(), Some(42));
        assert_eq!(Value::Float(2.0).as_clean_int(), Some(2));
        assert_eq!(Value::from("007").as_clean_int(), None);
        assert_eq!(Value::from("+7").as_clean_int(), None);
        assert_eq!(Value::from(" 7").as_clean_int(), None);
        assert_eq!(Value::from("1.5").as_clean_int(), None);
        assert_eq!(Value::Null.as_clean_int(), None);
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Float(1.5).to_text(), "1.5");
        assert_eq!(Value::Blob(b"abc".to_vec()).to_string(), "abc");
    }
}
