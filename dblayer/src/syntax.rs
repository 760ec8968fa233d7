//! SQL dialect fragments.
//!
//! Every builder here is a pure string function. The default method bodies of
//! [`Syntax`] form the base dialect; drivers override what their server
//! spells differently.

use crate::{cursor::FieldValue, record::cmp::Order};

/// Dialect-specific SQL fragment builders.
pub trait Syntax {
    /// The dialect name, e.g. `postgresql`.
    fn name(&self) -> &'static str;

    /// Escapes a string so that it may be put between single quotes.
    fn escape_string(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    /// Quotes a system identifier (table or column name).
    fn escape_system(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    /// Escapes and single-quotes a string literal.
    fn quote(&self, value: &str) -> String {
        format!("'{}'", self.escape_string(value))
    }

    /// Builds a ` LIMIT ` fragment.
    fn limit(&self, limit: Limit) -> String {
        match limit.offset {
            Some(offset) => format!(" LIMIT {} OFFSET {offset} ", limit.count),
            None => format!(" LIMIT {} ", limit.count),
        }
    }

    /// Builds an ` IN (...) ` fragment.
    fn in_values(&self, values: &InValues) -> String {
        match values {
            InValues::Null => " IN (NULL) ".into(),
            InValues::One(value) => format!(" IN ({}) ", value.to_sql(self)),
            InValues::List(values) => {
                let list: Vec<_> = values.iter().map(|value| value.to_sql(self)).collect();
                format!(" IN ({}) ", list.join(","))
            }
        }
    }

    /// Builds an ` ORDER BY ` clause, or the empty string if there is nothing
    /// to order by.
    fn order_by(&self, items: &[OrderBy]) -> String {
        let terms: Vec<_> = items
            .iter()
            .filter_map(|item| match item {
                OrderBy::Raw(sql) => Some(sql.clone()),
                OrderBy::Field { field, .. } if field.is_empty() => None,
                OrderBy::Field {
                    field,
                    order,
                    collate,
                } => {
                    let field = if *collate {
                        self.collate(field)
                    } else {
                        field.clone()
                    };
                    Some(match order {
                        Order::Asc => field,
                        Order::Desc => format!("{field} DESC"),
                    })
                }
            })
            .collect();

        if terms.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {} ", terms.join(","))
        }
    }

    /// Wraps each field for case-insensitive comparison.
    fn lex_fields(&self, fields: &[&str]) -> String {
        let fields: Vec<_> = fields.iter().map(|field| self.collate(field)).collect();
        fields.join(",")
    }

    /// Case-insensitive form of a single field.
    fn collate(&self, field: &str) -> String {
        format!("LOWER({field})")
    }

    /// Concatenates SQL expressions.
    fn concat(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }

    /// Formats a date column with a `strftime`-like pattern.
    fn date_format(&self, field: &str, pattern: &str) -> String {
        format!("TO_CHAR({field},{})", self.quote(pattern))
    }
}

/// The base dialect, with no overrides.
#[derive(Copy, Clone, Debug, Default)]
pub struct StandardSyntax;

impl Syntax for StandardSyntax {
    fn name(&self) -> &'static str {
        "standard"
    }
}

/// A row limit with an optional offset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Limit {
    pub offset: Option<u64>,
    pub count: u64,
}

impl From<u64> for Limit {
    fn from(count: u64) -> Self {
        Limit {
            offset: None,
            count,
        }
    }
}

/// `(offset, count)`.
impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit {
            offset: Some(offset),
            count,
        }
    }
}

/// `[offset, count]`.
impl From<[u64; 2]> for Limit {
    fn from([offset, count]: [u64; 2]) -> Self {
        (offset, count).into()
    }
}

/// The operand of an ` IN (...) ` fragment.
#[derive(Clone, Debug, PartialEq)]
pub enum InValues {
    Null,
    One(FieldValue),
    List(Vec<FieldValue>),
}

impl<T: Into<FieldValue>> From<Vec<T>> for InValues {
    fn from(values: Vec<T>) -> Self {
        InValues::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for InValues {
    fn from(value: &str) -> Self {
        InValues::One(value.into())
    }
}

impl From<i64> for InValues {
    fn from(value: i64) -> Self {
        InValues::One(value.into())
    }
}

impl<T: Into<InValues>> From<Option<T>> for InValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(InValues::Null, Into::into)
    }
}

/// An ` ORDER BY ` term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderBy {
    /// Used verbatim.
    Raw(String),
    Field {
        field: String,
        order: Order,
        /// Compare case-insensitively.
        collate: bool,
    },
}

impl OrderBy {
    /// An ascending, case-sensitive term on `field`.
    pub fn field(field: impl Into<String>) -> OrderBy {
        OrderBy::Field {
            field: field.into(),
            order: Order::Asc,
            collate: false,
        }
    }

    pub fn desc(self) -> OrderBy {
        self.with_order(Order::Desc)
    }

    pub fn with_order(self, order: Order) -> OrderBy {
        match self {
            OrderBy::Field { field, collate, .. } => OrderBy::Field {
                field,
                order,
                collate,
            },
            raw => raw,
        }
    }

    pub fn collate(self) -> OrderBy {
        match self {
            OrderBy::Field { field, order, .. } => OrderBy::Field {
                field,
                order,
                collate: true,
            },
            raw => raw,
        }
    }
}

impl From<&str> for OrderBy {
    fn from(sql: &str) -> Self {
        OrderBy::Raw(sql.to_owned())
    }
}

/// Translates `%`-codes of a `strftime` pattern with the given table,
/// leaving every other character untouched.
#[cfg_attr(not(any(feature = "pgsql", feature = "mysql")), allow(dead_code))]
pub(crate) fn translate_pattern(pattern: &str, table: &[(char, &str)]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(code) => match table.iter().find(|(from, _)| *from == code) {
                Some((_, to)) => out.push_str(to),
                None => {
                    out.push('%');
                    out.push(code);
                }
            },
            None => out.push('%'),
        }
    }
    out
}
