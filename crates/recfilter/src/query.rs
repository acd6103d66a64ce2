//! Ordering and paging helpers that compose with compiled filters.
//!
//! ```
//! use recfilter::filter::FilterCompiler;
//! use recfilter::query::QueryExt;
//! use recfilter::record::{json::JsonRecord, FieldType, RecordType};
//! use serde_json::json;
//!
//! let compiler = FilterCompiler::<JsonRecord>::with_record_type(
//!     RecordType::new("User")
//!         .field("Name", FieldType::String)
//!         .field("Score", FieldType::Integer),
//! );
//! let records = JsonRecord::from_document(
//!     json!([
//!         {"Name": "Ann", "Score": 7},
//!         {"Name": "Bob", "Score": 9},
//!         {"Name": "Cid", "Score": 2},
//!     ]),
//!     compiler.record_type(),
//! );
//!
//! let filter = compiler.try_compile("Score gt 5").unwrap();
//! let order = compiler.order_by_descending(&["Score"]).unwrap();
//! let names: Vec<String> = records
//!     .iter()
//!     .filter_by(&filter)
//!     .order_with(&order)
//!     .page_by(1, 1)
//!     .filter_map(|record| record.json()["Name"].as_str().map(String::from))
//!     .collect();
//! assert_eq!(names, ["Bob"]);
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::{Skip, Take};
use std::marker::PhantomData;

use crate::filter::{
    Filter, FilterCompiler, FilterError, FilterResult, Matching, PropertyPath, ResolvedPath,
};
use crate::record::{Record, Value};

/// Sort direction of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest first; nulls first.
    #[default]
    Ascending,
    /// Largest first; nulls last.
    Descending,
}

/// A member path to sort by, with its direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    path: ResolvedPath,
    direction: Direction,
}

impl SortKey {
    /// Returns the member path.
    pub fn path(&self) -> &ResolvedPath {
        &self.path
    }

    /// Returns the direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn compare(&self, a: &dyn Record, b: &dyn Record) -> Ordering {
        let ordering = compare_values(&self.path.read(a), &self.path.read(b));
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{}", self.path),
            Direction::Descending => write!(f, "{} desc", self.path),
        }
    }
}

/// Orders null before everything else; unrelated kinds compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

/// A multi-key ordering over records of type `T`.
///
/// Keys are applied in sequence; later keys break ties left by earlier ones.
/// Sorting is stable.
pub struct SortOrder<T> {
    keys: Vec<SortKey>,
    _record: PhantomData<fn(&T)>,
}

impl<T> SortOrder<T> {
    fn new(keys: Vec<SortKey>) -> Self {
        Self {
            keys,
            _record: PhantomData,
        }
    }

    /// Appends a tie-breaking key.
    pub fn then(mut self, key: SortKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Returns the keys in order of precedence.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

impl<T: Record> SortOrder<T> {
    /// Compares two records key by key.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Sorts a slice of records (owned or borrowed) in place.
    pub fn sort<R: Borrow<T>>(&self, records: &mut [R]) {
        records.sort_by(|a, b| {
            self.compare(<R as Borrow<T>>::borrow(a), <R as Borrow<T>>::borrow(b))
        });
    }

    /// Collects and sorts a source of records.
    pub fn apply<I>(&self, source: I) -> std::vec::IntoIter<I::Item>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        let mut records: Vec<I::Item> = source.into_iter().collect();
        self.sort(&mut records);
        records.into_iter()
    }
}

impl<T> Clone for SortOrder<T> {
    fn clone(&self) -> Self {
        Self::new(self.keys.clone())
    }
}

impl<T> fmt::Debug for SortOrder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortOrder").field("keys", &self.keys).finish()
    }
}

impl<T> FilterCompiler<T> {
    /// Resolves a single sort key.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownMember`] if the path does not resolve.
    pub fn sort_key(&self, path: &str, direction: Direction) -> FilterResult<SortKey> {
        let path = self.resolve(&PropertyPath::parse(path))?;
        Ok(SortKey { path, direction })
    }

    /// Builds an ascending ordering over one or more dotted paths.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::EmptyOrdering`] for an empty key list, or
    /// [`FilterError::UnknownMember`] if a path does not resolve.
    pub fn order_by<S: AsRef<str>>(&self, keys: &[S]) -> FilterResult<SortOrder<T>> {
        self.ordering(keys, Direction::Ascending)
    }

    /// Builds a descending ordering over one or more dotted paths.
    ///
    /// # Errors
    ///
    /// Same as [`order_by`](Self::order_by).
    pub fn order_by_descending<S: AsRef<str>>(&self, keys: &[S]) -> FilterResult<SortOrder<T>> {
        self.ordering(keys, Direction::Descending)
    }

    fn ordering<S: AsRef<str>>(
        &self,
        keys: &[S],
        direction: Direction,
    ) -> FilterResult<SortOrder<T>> {
        if keys.is_empty() {
            return Err(FilterError::EmptyOrdering);
        }
        let keys = keys
            .iter()
            .map(|key| self.sort_key(key.as_ref(), direction))
            .collect::<FilterResult<Vec<_>>>()?;
        Ok(SortOrder::new(keys))
    }
}

/// Filtering, ordering and paging adapters for any iterator of records.
pub trait QueryExt: Iterator + Sized {
    /// Keeps the records that match `filter`.
    fn filter_by<T>(self, filter: &Filter<T>) -> Matching<Self, T>
    where
        T: Record,
        Self::Item: Borrow<T>,
    {
        filter.apply(self)
    }

    /// Sorts the records. Consumes the iterator.
    fn order_with<T>(self, order: &SortOrder<T>) -> std::vec::IntoIter<Self::Item>
    where
        T: Record,
        Self::Item: Borrow<T>,
    {
        order.apply(self)
    }

    /// Returns one page of records.
    ///
    /// Pages are numbered from 1; a page below 1 is treated as the first.
    fn page_by(self, page: usize, page_size: usize) -> Take<Skip<Self>> {
        let offset = page.max(1).saturating_sub(1).saturating_mul(page_size);
        self.skip(offset).take(page_size)
    }
}

impl<I: Iterator> QueryExt for I {}
