//! Typed query specifications for member reads.
//!
//! # Responsibility
//! - Describe filters, sorting and paging without SQL leaking to callers.
//! - Build exactly one SQL statement per read, plus one count statement for
//!   paged reads.
//!
//! # Invariants
//! - Ordering always ends with `m.id ASC` so equal sort keys stay stable.
//! - Count statements reuse the data predicate and never join `teams`.

pub mod filter;
pub mod page;

pub use filter::{AgeFilter, Fetch, MemberFilter};
pub use page::{Direction, Page, PageRequest, Slice, Sort, SortField};

/// Errors raised while validating a query specification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("page size must be at least 1, got {0}")]
    InvalidPageSize(u32),
}
