//! dc_chunker: chunked loading helpers for data cube queries
//!
//! Large geospatial/temporal queries are loaded piece by piece. This crate
//! plans the pieces and puts the results back together:
//!
//! - **Geographic chunking**: split a lat/lon box into latitude bands of bounded area
//! - **Temporal chunking**: sort acquisition timestamps into fixed-size batches,
//!   or group them by calendar year / month
//! - **Chunk recombination**: merge partially overlapping gridded chunks into one
//!   deduplicated dataset whose axes are ordered like an unchunked load
//! - **Baselines**: overlapping windows over a sequence
//!
//! Nothing here loads data or schedules work; callers dispatch the planned
//! chunks however they like.
//!
//! ## Module Organization
//!
//! - [`geographic`]: bounding boxes and latitude-band chunking
//! - [`temporal`]: timestamp batching and calendar grouping
//! - [`dataset`]: coordinate-indexed gridded datasets and reindexing
//! - [`combine`]: `combine_first` merging and chunk recombination
//! - [`baseline`]: sliding baseline windows
//! - [`parallel`]: parallel fill configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust
//! use dc_chunker::prelude::*;
//!
//! let chunks = create_geographic_chunks(Some((10.0, 20.0)), Some((0.0, 1.0)), 0.5).unwrap();
//! assert_eq!(chunks.len(), 20);
//!
//! let batches = create_time_chunks(&[3, 1, 2], SortOrder::Descending, None).unwrap();
//! assert_eq!(batches, vec![vec![3, 2, 1]]);
//! ```

pub mod baseline;
pub mod combine;
pub mod dataset;
pub mod errors;
pub mod geographic;
pub mod parallel;
pub mod temporal;

pub use baseline::*;
pub use combine::*;
pub use dataset::*;
pub use errors::*;
pub use geographic::*;
pub use parallel::*;
pub use temporal::*;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::baseline::generate_baseline;
    pub use crate::combine::{combine_geographic_chunks, combine_geographic_chunks_with};
    pub use crate::dataset::{CoordinateAxis, GriddedDataset};
    pub use crate::errors::{ChunkerError, Result};
    pub use crate::geographic::{
        create_geographic_chunks, BoundingBox, ChunkDescriptor, GeographicChunker,
    };
    pub use crate::parallel::ParallelConfig;
    pub use crate::temporal::{
        create_time_chunks, group_datetimes_by_month, group_datetimes_by_year, CalendarGroup,
        MonthFilter, SortOrder, TimeChunker,
    };
}
