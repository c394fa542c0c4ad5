//! Ordered slot retrieval
//!
//! A slot is a page of a table's records in a requested order. The
//! scan-based algorithm lives on [`Table`](super::Table); this module holds
//! the ordering vocabulary and the contract an alternative (indexed)
//! implementation would have to meet.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use super::PrimaryKey;

/// One live record and its primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<T> {
    pub pkey: PrimaryKey,
    pub data: T,
}

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Requested order of a slot
pub enum OrderBy<T> {
    /// pkey ascending
    Ascending,

    /// pkey descending
    Descending,

    /// Caller-supplied comparator over record data (not over the pkey)
    ///
    /// Records are scanned in pkey-ascending order and the sort is stable, so
    /// records the comparator ranks equal keep numeric pkey order.
    Custom(Comparator<T>),
}

impl<T> OrderBy<T> {
    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        OrderBy::Custom(Box::new(compare))
    }

    /// Sort `records` in place
    pub fn sort(&self, records: &mut [Record<T>]) {
        match self {
            OrderBy::Ascending => records.sort_by_key(|r| r.pkey),
            OrderBy::Descending => records.sort_by(|a, b| b.pkey.cmp(&a.pkey)),
            OrderBy::Custom(compare) => records.sort_by(|a, b| compare(&a.data, &b.data)),
        }
    }
}

impl<T> FromStr for OrderBy<T> {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(OrderBy::Ascending),
            "desc" => Ok(OrderBy::Descending),
            other => Err(TableError::InvalidArgument(format!(
                "order must be asc, desc, or a comparator, got '{}'",
                other
            ))),
        }
    }
}

impl<T> fmt::Debug for OrderBy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBy::Ascending => f.write_str("Ascending"),
            OrderBy::Descending => f.write_str("Descending"),
            OrderBy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Paginated, ordered access to a table's records
pub trait OrderedRetrieval<T> {
    /// Up to `count` records starting at `offset` in `order_by` order.
    ///
    /// Fewer than `count` records come back when the table runs out, none when
    /// `offset` is past the end.
    fn slot(&self, offset: usize, count: usize, order_by: &OrderBy<T>) -> Result<Vec<Record<T>>>;
}

/// Cut `[offset, offset + count)` out of an already ordered sequence
pub(crate) fn paginate<T>(records: Vec<Record<T>>, offset: usize, count: usize) -> Vec<Record<T>> {
    records.into_iter().skip(offset).take(count).collect()
}
