//! Compiled filters.

use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::compiler::FilterCompiler;
use super::condition::Condition;
use super::error::FilterResult;
use crate::record::{Describe, Record};

/// A compiled, reusable predicate over records of type `T`.
///
/// Cloning is cheap; clones share the compiled condition. A filter is
/// `Send + Sync` and may be applied concurrently.
pub struct Filter<T> {
    condition: Arc<Condition>,
    _record: PhantomData<fn(&T) -> bool>,
}

impl<T> Filter<T> {
    pub(crate) fn new(condition: Condition) -> Self {
        Self {
            condition: Arc::new(condition),
            _record: PhantomData,
        }
    }

    /// Returns a filter that matches every record.
    pub fn unrestricted() -> Self {
        Self::new(Condition::Always)
    }

    /// Returns the compiled condition tree.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Returns true if the filter matches every record.
    pub fn is_unrestricted(&self) -> bool {
        self.condition.is_always()
    }
}

impl<T: Describe> Filter<T> {
    /// Compiles a query with a fresh compiler and the default configuration.
    ///
    /// Prefer a shared [`FilterCompiler`] when compiling many queries.
    ///
    /// # Example
    ///
    /// ```
    /// # use recfilter::record::{Describe, Field, FieldType, Record, RecordType};
    /// use recfilter::Filter;
    ///
    /// # struct Book { pages: i64 }
    /// # impl Record for Book {
    /// #     fn field(&self, name: &str) -> Option<Field<'_>> {
    /// #         (name == "Pages").then(|| Field::value(self.pages))
    /// #     }
    /// # }
    /// # impl Describe for Book {
    /// #     fn record_type() -> RecordType {
    /// #         RecordType::new("Book").field("Pages", FieldType::Integer)
    /// #     }
    /// # }
    /// let long_books = Filter::<Book>::try_compile("Pages gt 300").unwrap();
    /// assert!(long_books.matches(&Book { pages: 412 }));
    /// ```
    pub fn try_compile(query: &str) -> FilterResult<Self> {
        FilterCompiler::<T>::new().try_compile(query)
    }
}

impl<T: Record> Filter<T> {
    /// Tests a single record.
    pub fn matches(&self, record: &T) -> bool {
        self.condition.evaluate(record)
    }

    /// Returns an owned predicate closure sharing this filter's condition.
    pub fn predicate(&self) -> impl Fn(&T) -> bool + Send + Sync {
        let condition = Arc::clone(&self.condition);
        move |record: &T| condition.evaluate(record)
    }

    /// Lazily filters a source of records (owned or borrowed).
    pub fn apply<I>(&self, source: I) -> Matching<I::IntoIter, T>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        Matching {
            inner: source.into_iter(),
            filter: self.clone(),
        }
    }

    /// Returns references to the records in a slice that match.
    pub fn filter_records<'a>(&self, records: &'a [T]) -> Vec<&'a T> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            condition: Arc::clone(&self.condition),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("condition", &self.condition)
            .finish()
    }
}

impl<T> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.condition)
    }
}

/// Iterator over the records of a source that match a [`Filter`].
///
/// Created by [`Filter::apply`] and [`QueryExt::filter_by`](crate::query::QueryExt::filter_by).
pub struct Matching<I, T> {
    inner: I,
    filter: Filter<T>,
}

impl<I, T> Iterator for Matching<I, T>
where
    I: Iterator,
    I::Item: Borrow<T>,
    T: Record,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = &self.filter;
        self.inner
            .find(|item| filter.matches(<I::Item as Borrow<T>>::borrow(item)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, FieldType, RecordType};

    #[derive(Debug, PartialEq)]
    struct Item {
        score: i64,
    }

    impl Record for Item {
        fn field(&self, name: &str) -> Option<Field<'_>> {
            match name {
                "Score" => Some(Field::value(self.score)),
                _ => None,
            }
        }
    }

    impl Describe for Item {
        fn record_type() -> RecordType {
            RecordType::new("Item").field("Score", FieldType::Integer)
        }
    }

    fn items() -> Vec<Item> {
        [3, 8, 12, 5].into_iter().map(|score| Item { score }).collect()
    }

    #[test]
    fn test_apply_borrowed_and_owned() {
        let filter = Filter::<Item>::try_compile("Score gt 4").unwrap();
        let items = items();

        let borrowed: Vec<&Item> = filter.apply(&items).collect();
        assert_eq!(borrowed.len(), 3);

        let owned: Vec<Item> = filter.apply(items).collect();
        assert_eq!(owned[0], Item { score: 8 });
    }

    #[test]
    fn test_predicate_outlives_filter() {
        let predicate = {
            let filter = Filter::<Item>::try_compile("Score lt 6").unwrap();
            filter.predicate()
        };
        assert!(predicate(&Item { score: 5 }));
        assert!(!predicate(&Item { score: 6 }));
    }

    #[test]
    fn test_unrestricted() {
        let filter = Filter::<Item>::try_compile("   ").unwrap();
        assert!(filter.is_unrestricted());
        assert_eq!(filter.filter_records(&items()).len(), 4);
        assert!(Filter::<Item>::unrestricted().is_unrestricted());
    }

    #[test]
    fn test_filter_is_send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<Filter<Item>>();
        assert_send_sync::<FilterCompiler<Item>>();
    }

    #[test]
    fn test_clone_shares_condition() {
        let filter = Filter::<Item>::try_compile("Score eq 3").unwrap();
        let clone = filter.clone();
        assert!(Arc::ptr_eq(&filter.condition, &clone.condition));
    }
}
