//! Record extensions.
//!
//! Domain code adds methods to records without wrapping them: an
//! [`Extension`] registers named handlers into a record's [`Extensions`]
//! table, and `record.call(name, args)` later invokes the handler with the
//! record as first argument.
//!
//! Calling a name that nothing registered is an error
//! ([`Error::UndefinedMethod`](crate::error::Error::UndefinedMethod)), never a
//! silent no-op.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{error::DbResult, record::RecordSet, value::Value};

/// An extension method. It receives the record it was called on and the call
/// arguments.
pub type Method = dyn Fn(&mut dyn RecordSet, &[Value]) -> DbResult<Value>;

/// A provider of extension methods, usually a unit struct grouping the
/// helpers of one kind of result (posts, comments...).
pub trait Extension {
    /// Registers the provided methods.
    fn register(registry: &mut Extensions);
}

/// A table of extension methods, by name.
#[derive(Clone, Default)]
pub struct Extensions {
    methods: HashMap<String, Arc<Method>>,
}

impl Extensions {
    pub fn new() -> Extensions {
        Extensions {
            methods: HashMap::new(),
        }
    }

    /// Registers `method` under `name`, replacing any previous method of the
    /// same name.
    pub fn register<F>(&mut self, name: impl Into<String>, method: F)
    where
        F: Fn(&mut dyn RecordSet, &[Value]) -> DbResult<Value> + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
    }

    /// Builds a table holding the methods of `E`.
    pub fn of<E: Extension>() -> Extensions {
        let mut registry = Extensions::new();
        E::register(&mut registry);
        registry
    }

    pub fn get(&self, name: &str) -> Option<Arc<Method>> {
        self.methods.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Copies every method of `other` into this table.
    pub fn merge(&mut self, other: &Extensions) {
        for (name, method) in &other.methods {
            self.methods.insert(name.clone(), Arc::clone(method));
        }
    }

    /// Returns the method names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
