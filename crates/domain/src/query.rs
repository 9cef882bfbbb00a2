//! List queries: equality filters, one sort key, and eager-loaded relations.
//!
//! Filter and sort keys arrive as plain strings from the outside world. Each
//! record type exposes a closed set of fields through [`FieldKey`]; a key that
//! does not name one of those fields is dropped while the query is built, so
//! it neither filters nor sorts anything.
//!
//! A built [`ListQuery`] is inert: storage adapters render it to their own
//! query language, and [`ListQuery::apply`] evaluates it in memory.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::NaiveDate;

/// A named field of a record type.
pub trait FieldKey: Copy + Eq + Debug + 'static {
    /// Resolve a public key, returning `None` for unknown keys.
    fn from_key(key: &str) -> Option<Self>;

    /// Public key of this field.
    fn key(self) -> &'static str;
}

/// Accessor from a field to its value on a record of type `R`.
pub trait Field<R>: FieldKey {
    fn value(self, record: &R) -> FieldValue<'_>;
}

/// The value of a field, as seen by filters and sorts.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Date(NaiveDate),
    Number(f64),
}

impl FieldValue<'_> {
    /// Whether this value equals the raw filter string.
    ///
    /// Dates compare in `YYYY-MM-DD` form and numbers after parsing as `f64`.
    /// A raw string that does not parse never matches.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            Self::Text(text) => text.as_ref() == raw,
            Self::Date(date) => raw.parse::<NaiveDate>().is_ok_and(|d| d == *date),
            Self::Number(number) => raw.parse::<f64>().is_ok_and(|n| n == *number),
        }
    }

    /// Total order between two values of the same kind.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// A single sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub order: SortOrder,
}

impl<F: FieldKey> Sort<F> {
    /// Parse `name` (ascending) or `-name` (descending).
    ///
    /// Returns `None` when the field is unknown.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let (key, order) = match spec.strip_prefix('-') {
            Some(rest) => (rest, SortOrder::Descending),
            None => (spec, SortOrder::Ascending),
        };
        F::from_key(key).map(|field| Self { field, order })
    }
}

/// An exact-match predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter<F> {
    pub field: F,
    pub value: String,
}

/// Filters (ANDed), an optional sort, and the relations to load with each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<F, L> {
    filters: Vec<Filter<F>>,
    sort: Option<Sort<F>>,
    relations: Vec<L>,
}

impl<F, L> Default for ListQuery<F, L> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: None,
            relations: Vec::new(),
        }
    }
}

impl<F: FieldKey, L: Copy + Eq> ListQuery<F, L> {
    /// Create a builder for constructing a [`ListQuery`].
    #[must_use]
    pub fn builder() -> ListQueryBuilder<F, L> {
        ListQueryBuilder {
            query: Self::default(),
        }
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter<F>] {
        &self.filters
    }

    #[must_use]
    pub fn sort(&self) -> Option<Sort<F>> {
        self.sort
    }

    /// Whether `relation` must be loaded alongside each row.
    #[must_use]
    pub fn loads(&self, relation: L) -> bool {
        self.relations.contains(&relation)
    }

    /// Whether `record` satisfies every filter.
    #[must_use]
    pub fn matches<R>(&self, record: &R) -> bool
    where
        F: Field<R>,
    {
        self.filters
            .iter()
            .all(|filter| filter.field.value(record).matches(&filter.value))
    }

    /// Keep the matching records and order them. Ties keep their input order.
    #[must_use]
    pub fn apply<R>(&self, records: Vec<R>) -> Vec<R>
    where
        F: Field<R>,
    {
        let mut kept: Vec<R> = records.into_iter().filter(|r| self.matches(r)).collect();
        if let Some(sort) = self.sort {
            kept.sort_by(|a, b| {
                let ordering = sort.field.value(a).compare(&sort.field.value(b));
                match sort.order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        kept
    }
}

/// Step-by-step builder for [`ListQuery`].
#[derive(Debug)]
pub struct ListQueryBuilder<F, L> {
    query: ListQuery<F, L>,
}

impl<F: FieldKey, L: Copy + Eq> ListQueryBuilder<F, L> {
    /// Add an equality filter by public key.
    ///
    /// Unknown keys are skipped, and so are `None` or empty values.
    #[must_use]
    pub fn filter(self, key: &str, value: Option<impl Into<String>>) -> Self {
        let value = value.map(Into::into).filter(|v: &String| !v.is_empty());
        match (F::from_key(key), value) {
            (Some(field), Some(value)) => self.filter_field(field, value),
            _ => self,
        }
    }

    /// Add an equality filter on a known field.
    #[must_use]
    pub fn filter_field(mut self, field: F, value: impl Into<String>) -> Self {
        self.query.filters.push(Filter {
            field,
            value: value.into(),
        });
        self
    }

    /// Sort by a `name` / `-name` spec. Unknown fields leave the query unsorted.
    #[must_use]
    pub fn sort(mut self, spec: Option<&str>) -> Self {
        if let Some(sort) = spec.and_then(Sort::<F>::parse) {
            self.query.sort = Some(sort);
        }
        self
    }

    #[must_use]
    pub fn sort_by(mut self, field: F, order: SortOrder) -> Self {
        self.query.sort = Some(Sort { field, order });
        self
    }

    /// Load `relation` alongside each row.
    #[must_use]
    pub fn load(mut self, relation: L) -> Self {
        if !self.query.relations.contains(&relation) {
            self.query.relations.push(relation);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> ListQuery<F, L> {
        self.query
    }
}
