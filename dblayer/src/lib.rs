pub mod error;

pub mod config;

pub mod value;

pub mod syntax;

pub mod driver;

pub mod connection;
pub use connection::Connection;

pub mod cursor;
pub use cursor::{Cursor, FieldValue};

pub mod record;
pub use record::{
    extension::{Extension, Extensions},
    static_record::StaticRecord,
    Record, RecordSet,
};
