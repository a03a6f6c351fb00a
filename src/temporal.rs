//! Temporal chunking and calendar grouping of acquisition timestamps
//!
//! Timestamps are split into fixed-size batches for incremental loads, or
//! grouped into runs that share a calendar year or month. Grouping is a single
//! linear scan that starts a new group whenever the key changes, so input is
//! expected to be sorted by the grouping key already.

use crate::errors::{ChunkerError, Result};
use chrono::Datelike;
use log::debug;

/// Default number of timestamps per batch
pub const DEFAULT_TIME_CHUNK_SIZE: usize = 10;

/// Sort direction applied before batching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Least recent first
    #[default]
    Ascending,
    /// Most recent first
    Descending,
}

/// Batching parameters for [`create_time_chunks`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeChunker {
    pub order: SortOrder,
    /// `None` keeps every timestamp in a single batch
    pub chunk_size: Option<usize>,
}

impl Default for TimeChunker {
    fn default() -> Self {
        Self {
            order: SortOrder::Ascending,
            chunk_size: Some(DEFAULT_TIME_CHUNK_SIZE),
        }
    }
}

impl TimeChunker {
    /// Sort and batch `datetimes`
    pub fn chunk<T: Ord + Clone>(&self, datetimes: &[T]) -> Result<Vec<Vec<T>>> {
        create_time_chunks(datetimes, self.order, self.chunk_size)
    }
}

/// Sort timestamps and split them into contiguous batches
///
/// With `time_chunk_size` of `None` the whole sorted list is returned as one
/// batch. Otherwise every batch holds exactly `time_chunk_size` items except
/// possibly the last.
///
/// # Errors
///
/// Returns [`ChunkerError::InvalidChunkSize`] for a batch size of zero.
///
/// # Examples
///
/// ```
/// use dc_chunker::temporal::{create_time_chunks, SortOrder};
///
/// let days: Vec<u32> = (1..=25).rev().collect();
/// let batches = create_time_chunks(&days, SortOrder::Ascending, Some(10)).unwrap();
/// assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![10, 10, 5]);
/// assert_eq!(batches[0][0], 1);
/// ```
pub fn create_time_chunks<T: Ord + Clone>(
    datetimes: &[T],
    order: SortOrder,
    time_chunk_size: Option<usize>,
) -> Result<Vec<Vec<T>>> {
    if time_chunk_size == Some(0) {
        return Err(ChunkerError::InvalidChunkSize {
            message: "time chunk size must be at least 1".to_string(),
        });
    }

    let mut sorted = datetimes.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort(),
        SortOrder::Descending => sorted.sort_by(|a, b| b.cmp(a)),
    }

    let batches = match time_chunk_size {
        None => vec![sorted],
        Some(size) => chunk_slice(&sorted, size),
    };

    debug!(
        "Split {} timestamps into {} batches ({:?}, size {:?})",
        datetimes.len(),
        batches.len(),
        order,
        time_chunk_size
    );
    Ok(batches)
}

fn chunk_slice<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// An adjacent run of timestamps sharing one calendar key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGroup<K, T> {
    pub key: K,
    pub members: Vec<T>,
}

/// Start a new group every time `key` changes between neighbours
fn split_on_key_change<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<CalendarGroup<K, T>>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut groups: Vec<CalendarGroup<K, T>> = Vec::new();
    for item in items {
        let k = key(&item);
        match groups.last_mut() {
            Some(group) if group.key == k => group.members.push(item),
            _ => groups.push(CalendarGroup {
                key: k,
                members: vec![item],
            }),
        }
    }
    groups
}

/// Group timestamps by calendar year
///
/// Only adjacent timestamps are grouped: `[2019, 2020, 2019]` yields three
/// groups.
pub fn group_datetimes_by_year<T: Datelike + Clone>(datetimes: &[T]) -> Vec<CalendarGroup<i32, T>> {
    split_on_key_change(datetimes.iter().cloned(), Datelike::year)
}

/// Months kept by [`group_datetimes_by_month`]
///
/// The default keeps all twelve months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthFilter {
    months: Vec<u32>,
}

impl MonthFilter {
    /// Keep only `months` (1 = January)
    ///
    /// # Errors
    ///
    /// Returns [`ChunkerError::InvalidMonth`] for a value outside `1..=12`.
    pub fn new(months: impl IntoIterator<Item = u32>) -> Result<Self> {
        let mut months: Vec<u32> = months.into_iter().collect();
        if let Some(&bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ChunkerError::InvalidMonth(bad));
        }
        months.sort_unstable();
        months.dedup();
        Ok(Self { months })
    }

    #[must_use]
    pub fn contains(&self, month: u32) -> bool {
        self.months.binary_search(&month).is_ok()
    }

    #[must_use]
    pub fn months(&self) -> &[u32] {
        &self.months
    }
}

impl Default for MonthFilter {
    fn default() -> Self {
        Self {
            months: (1..=12).collect(),
        }
    }
}

/// Group timestamps by calendar month, dropping months not in `months`
///
/// Excluded timestamps are removed before grouping, so runs of the same month
/// separated only by excluded months end up in one group. The key is the month
/// number alone; January 2020 directly followed by January 2021 forms a single
/// group.
pub fn group_datetimes_by_month<T: Datelike + Clone>(
    datetimes: &[T],
    months: &MonthFilter,
) -> Vec<CalendarGroup<u32, T>> {
    let kept = datetimes
        .iter()
        .filter(|dt| months.contains(dt.month()))
        .cloned();
    split_on_key_change(kept, Datelike::month)
}
