//! Query results.
//!
//! A [`Record`] is a navigable view over a live query result: exactly one row,
//! the current one, is read at a time. A [`StaticRecord`] is a materialized
//! snapshot that can be mutated and sorted. Both implement [`RecordSet`].
//!
//! The usual way to consume a result is the fetch loop:
//!
//! ```ignore
//! let mut rs = con.select("SELECT post_id, post_title FROM post")?;
//! while rs.fetch() {
//!     println!("{}: {}", rs.f("post_id").unwrap(), rs.f("post_title").unwrap());
//! }
//! ```

use std::sync::Arc;

use tracing::{error, trace};

use crate::{
    driver::ResultSet,
    error::{DbResult, Error},
    value::{FieldRef, Row, Value},
};

pub mod cmp;
pub mod extension;
pub mod static_record;

use extension::{Extension, Extensions, Method};
use static_record::StaticRecord;

mod private {
    pub trait Sealed {}

    impl Sealed for super::Record {}
    impl Sealed for super::StaticRecord {}
}

/// Position state shared by every record kind.
#[doc(hidden)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Position {
    index: usize,
    /// Whether a fetch loop is in progress.
    fetching: bool,
}

/// Navigation over the rows of a result.
///
/// Out-of-range moves never fail loudly: they return `false` and leave the
/// record untouched.
pub trait RecordSet: private::Sealed {
    /// Total number of rows.
    fn count(&self) -> usize;

    /// Moves to `row`. Returns `false`, without any other effect, if `row` is
    /// not in `0..count()`.
    fn seek(&mut self, row: isize) -> bool;

    /// The current row, if there is one.
    fn row(&self) -> Option<&Row>;

    /// Column names, in result order.
    fn columns(&self) -> &[String];

    /// Column types, as reported by the driver.
    fn column_types(&self) -> &[String];

    #[doc(hidden)]
    fn position(&self) -> &Position;

    #[doc(hidden)]
    fn position_mut(&mut self) -> &mut Position;

    /// The current row index.
    fn index(&self) -> usize {
        self.position().index
    }

    /// Advances the fetch loop.
    ///
    /// The first call moves to row 0 and each further call to the next row.
    /// Past the last row it returns `false` and resets the record to row 0,
    /// out of the loop, so the next call starts over.
    fn fetch(&mut self) -> bool {
        let next = if self.position().fetching {
            self.index() as isize + 1
        } else {
            self.position_mut().fetching = true;
            0
        };

        if self.seek(next) {
            return true;
        }
        self.position_mut().fetching = false;
        if !self.seek(0) {
            self.position_mut().index = 0;
        }
        false
    }

    /// Moves to the first row and leaves the fetch loop.
    fn move_start(&mut self) -> bool {
        self.position_mut().fetching = false;
        self.seek(0)
    }

    fn move_end(&mut self) -> bool {
        self.seek(self.count() as isize - 1)
    }

    fn move_next(&mut self) -> bool {
        self.seek(self.index() as isize + 1)
    }

    fn move_prev(&mut self) -> bool {
        self.seek(self.index() as isize - 1)
    }

    /// Checks whether the current row is the last one.
    fn is_end(&self) -> bool {
        self.index() + 1 == self.count()
    }

    fn is_start(&self) -> bool {
        self.index() == 0
    }

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Restarts the fetch loop and moves to the first row.
    fn rewind(&mut self) -> bool {
        self.move_start();
        self.fetch()
    }

    /// Same as [`RecordSet::fetch`].
    fn next_row(&mut self) -> bool {
        self.fetch()
    }

    /// Checks whether a fetch loop is positioned on a row.
    fn valid(&self) -> bool {
        self.position().fetching
    }

    /// Same as [`RecordSet::index`].
    fn key(&self) -> usize {
        self.index()
    }

    /// Returns the record itself, positioned on its current row.
    fn current(&self) -> &Self
    where
        Self: Sized,
    {
        self
    }

    /// Checks whether the current row has a field named `name`.
    fn exists(&self, name: &str) -> bool {
        self.row().is_some_and(|row| row.contains(name))
    }

    /// Iterates over `(index, row)` pairs through the fetch loop, starting
    /// over from the first row.
    fn iter(&mut self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        self.move_start();
        Rows { record: self }
    }
}

/// Adds the `field` and `f` accessors to a record type.
///
/// They are generic over the key, so they live outside of [`RecordSet`] to
/// keep it usable as `dyn RecordSet`.
macro_rules! field_accessors {
    ($($ty:ty),+) => {$(
        impl $ty {
            /// Returns a field of the current row, by name or position.
            pub fn field<'k>(&self, key: impl Into<FieldRef<'k>>) -> Option<&Value> {
                RecordSet::row(self)?.get(key)
            }

            /// Same as `field`.
            pub fn f<'k>(&self, key: impl Into<FieldRef<'k>>) -> Option<&Value> {
                self.field(key)
            }
        }
    )+};
}

field_accessors!(Record, StaticRecord, dyn RecordSet + '_);

/// Iterator over the rows of a record. See [`RecordSet::iter`].
pub struct Rows<'r, R> {
    record: &'r mut R,
}

impl<R: RecordSet> Iterator for Rows<'_, R> {
    type Item = (usize, Row);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.record.fetch() {
            return None;
        }
        let row = self.record.row().cloned().unwrap_or_default();
        Some((self.record.index(), row))
    }
}

/// A navigable view over a live query result.
///
/// The record owns its native result exclusively. Moving to a row reads that
/// row from the result.
pub struct Record {
    result: Box<dyn ResultSet>,
    columns: Vec<String>,
    types: Vec<String>,
    rows: usize,
    pos: Position,
    current: Option<Row>,
    extensions: Extensions,
}

impl Record {
    /// Wraps a native result. The first row, if any, becomes the current one.
    pub(crate) fn new(result: Box<dyn ResultSet>, columns: Vec<String>, types: Vec<String>) -> Record {
        let rows = result.num_rows();
        let mut record = Record {
            result,
            columns,
            types,
            rows,
            pos: Position::default(),
            current: None,
            extensions: Extensions::new(),
        };
        record.seek(0);
        record
    }

    /// Reads every row, then restores the native read position.
    pub fn rows(&mut self) -> Vec<Row> {
        if self.rows == 0 {
            return Vec::new();
        }
        self.result.seek(0);
        let mut rows = Vec::with_capacity(self.rows);
        while let Some(row) = self.result.fetch_row() {
            rows.push(row);
        }
        self.result.seek(self.pos.index);
        rows
    }

    /// Materializes the record into a [`StaticRecord`], keeping its
    /// extensions.
    pub fn to_static(mut self) -> StaticRecord {
        let rows = self.rows();
        StaticRecord::from_parts(rows, self.columns, self.types, self.extensions)
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

impl RecordSet for Record {
    fn count(&self) -> usize {
        self.rows
    }

    fn seek(&mut self, row: isize) -> bool {
        let Ok(row) = usize::try_from(row) else {
            return false;
        };
        if row >= self.rows {
            trace!(row, rows = self.rows, "seek out of range");
            return false;
        }
        if !self.result.seek(row) {
            return false;
        }
        let current = self.result.fetch_row();
        self.result.seek(row);

        self.pos.index = row;
        self.current = current;
        true
    }

    fn row(&self) -> Option<&Row> {
        self.current.as_ref()
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

/// Finds an extension method, failing loudly when it doesn't exist.
pub(crate) fn lookup(extensions: &Extensions, name: &str) -> DbResult<Arc<Method>> {
    extensions.get(name).ok_or_else(|| {
        error!(name, "call to undefined record method");
        Error::UndefinedMethod(name.to_owned())
    })
}
