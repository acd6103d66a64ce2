//! Compile textual filter expressions into predicates over typed records.
//!
//! A query such as `LastName eq "Bond" and Birthday gt "1970-01-01"` is
//! tokenized, parsed with AND binding tighter than OR, type-checked against a
//! [`RecordType`] and compiled into a [`Filter`] that can be applied to any
//! iterator of records.
//!
//! - [`record`] describes record shapes and reads values from records.
//! - [`filter`] holds the compiler and the compiled [`Filter`].
//! - [`query`] adds ordering and paging.
//! - [`config`] controls date/time literal formats and input bounds.

pub mod config;
pub mod filter;
pub mod query;
pub mod record;

pub use config::{CompilerConfig, ConfigError};
pub use filter::{Condition, Filter, FilterCompiler, FilterError, FilterResult};
pub use query::{Direction, QueryExt, SortKey, SortOrder};
pub use record::{Describe, Field, FieldType, Record, RecordType, Value};
