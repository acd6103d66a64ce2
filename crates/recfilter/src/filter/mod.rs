//! Filter expression compiler.
//!
//! This module turns a textual filter expression into a reusable predicate
//! over records of a known [`RecordType`](crate::record::RecordType).
//!
//! # Supported Syntax
//!
//! ## Comparisons
//! - `Name eq "Bob"` - Equality
//! - `Score gt 5`, `Score lt 5` - Ordering (numbers, dates, enums)
//! - `Name in "ob"` - Substring of a string member
//! - `"Tag1" in Tags` - Membership in a list member
//! - `Status in ["Online", "Away"]` - Membership of the member in a list literal
//!
//! Either operand may come first: `5 lt Score` means `Score gt 5`.
//!
//! ## Literals
//! - `"text"` - Quoted strings. Text that parses as a date or date-time (see
//!   [`CompilerConfig`](crate::CompilerConfig)) is treated as an instant.
//! - `12`, `100.5` - Numbers
//! - `true`, `false`, `null`
//!
//! ## Members
//! - `Team.Leader.LastName` - Dotted paths through nested records
//!
//! ## Boolean Operators
//! - `and` - binds tighter than `or`
//! - `or`
//! - `()` - Grouping
//!
//! Keywords and member names are case-insensitive. An empty query matches
//! every record.
//!
//! # Example
//!
//! ```
//! use recfilter::filter::{Condition, FilterCompiler};
//! use recfilter::record::{json::JsonRecord, FieldType, RecordType};
//! use serde_json::json;
//!
//! let compiler = FilterCompiler::<JsonRecord>::with_record_type(
//!     RecordType::new("User")
//!         .field("LastName", FieldType::String)
//!         .field("Score", FieldType::Integer),
//! );
//!
//! let filter = compiler
//!     .try_compile("LastName eq \"Bond\" or Score gt 10 and Score lt 20")
//!     .unwrap();
//! assert!(matches!(filter.condition(), Condition::Or(..)));
//!
//! let users = JsonRecord::from_document(
//!     json!([{"LastName": "Bond", "Score": 1}, {"LastName": "Bing", "Score": 30}]),
//!     compiler.record_type(),
//! );
//! assert_eq!(filter.apply(&users).count(), 1);
//! ```

mod compiler;
mod condition;
mod element;
mod error;
mod lexer;
mod parser;
mod predicate;

pub use compiler::FilterCompiler;
pub use condition::{CompareOp, Condition, ResolvedPath};
pub use element::{BooleanOperator, Comparison, ComparisonOperator, Element, Literal, PropertyPath};
pub use error::{FilterError, FilterResult};
pub use lexer::{Lexer, PositionedToken, Token};
pub use parser::FilterParser;
pub use predicate::{Filter, Matching};
