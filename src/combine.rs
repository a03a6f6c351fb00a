//! Recombination of geographically chunked loads
//!
//! Chunks produced by [`create_geographic_chunks`](crate::geographic::create_geographic_chunks)
//! are loaded independently and may overlap at band edges. Combining is a
//! left-to-right [`GriddedDataset::combine_first`] fold, evaluated as a single
//! fill over the union of all chunk coordinates: each cell takes the value of
//! the first chunk holding it. The union axes are built in canonical order, so
//! the result is laid out like a single unchunked load.

use crate::dataset::{gather, label_cmp, GatherSource, GriddedDataset};
use crate::errors::{ChunkerError, Result};
use crate::parallel::ParallelConfig;
use log::debug;
use std::collections::BTreeSet;

impl GriddedDataset {
    /// Merge two datasets, preferring `self`'s values
    ///
    /// The result covers the union of both coordinate sets. A cell takes
    /// `self`'s value when that value is present (not NaN), otherwise
    /// `other`'s. Variables found in only one operand are carried through.
    /// Axes of the result are in canonical order.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkerError::AxisMismatch`] if only one operand has a time axis.
    pub fn combine_first(&self, other: &GriddedDataset) -> Result<GriddedDataset> {
        self.combine_first_with(other, &ParallelConfig::default())
    }

    /// [`combine_first`](Self::combine_first) with explicit parallel settings
    pub fn combine_first_with(
        &self,
        other: &GriddedDataset,
        parallel: &ParallelConfig,
    ) -> Result<GriddedDataset> {
        merge_in_order(&[self, other], parallel)
    }
}

/// Outer-join `datasets` onto canonical union axes, earlier datasets winning
/// wherever they hold a non-NaN value.
fn merge_in_order(datasets: &[&GriddedDataset], parallel: &ParallelConfig) -> Result<GriddedDataset> {
    let Some(first) = datasets.first() else {
        return Err(ChunkerError::EmptyChunkSequence);
    };
    if datasets.iter().any(|ds| ds.has_time() != first.has_time()) {
        return Err(ChunkerError::AxisMismatch {
            message: "cannot combine datasets with a time axis and datasets without".to_string(),
        });
    }

    let mut latitude: Vec<f64> = datasets.iter().flat_map(|ds| ds.latitude()).copied().collect();
    latitude.sort_unstable_by(|a, b| label_cmp(b, a));
    latitude.dedup();

    let mut longitude: Vec<f64> = datasets.iter().flat_map(|ds| ds.longitude()).copied().collect();
    longitude.sort_unstable_by(label_cmp);
    longitude.dedup();

    let time = first.has_time().then(|| {
        let mut time: Vec<_> = datasets
            .iter()
            .filter_map(|ds| ds.time())
            .flatten()
            .copied()
            .collect();
        time.sort_unstable();
        time.dedup();
        time
    });

    let mut merged = GriddedDataset::new(latitude, longitude, time)?;
    let plans = datasets
        .iter()
        .map(|ds| merged.plan_from(ds))
        .collect::<Result<Vec<_>>>()?;
    let shape = merged.grid_shape();

    let names: BTreeSet<&str> = datasets.iter().flat_map(|ds| ds.variable_names()).collect();
    for name in names {
        let sources: Vec<GatherSource<'_>> = datasets
            .iter()
            .zip(&plans)
            .filter_map(|(ds, plans)| ds.variable(name).map(|data| GatherSource { data, plans }))
            .collect();
        merged.add_variable(name, gather(&shape, &sources, parallel))?;
    }

    Ok(merged)
}

/// Combine chunks into one dataset equivalent to an unchunked load
///
/// Earlier chunks take precedence; each later chunk only fills cells the
/// preceding ones leave missing. The result has latitude descending,
/// longitude ascending and, if present, time ascending.
///
/// # Errors
///
/// - [`ChunkerError::EmptyChunkSequence`] if `chunks` is empty
/// - [`ChunkerError::AxisMismatch`] if chunks disagree on having a time axis
pub fn combine_geographic_chunks(chunks: &[GriddedDataset]) -> Result<GriddedDataset> {
    combine_geographic_chunks_with(chunks, &ParallelConfig::default())
}

/// [`combine_geographic_chunks`] with explicit parallel settings
pub fn combine_geographic_chunks_with(
    chunks: &[GriddedDataset],
    parallel: &ParallelConfig,
) -> Result<GriddedDataset> {
    debug!("Combining {} geographic chunks", chunks.len());

    let chunks: Vec<&GriddedDataset> = chunks.iter().collect();
    let combined = merge_in_order(&chunks, parallel)?;

    debug!(
        "Combined grid: {} latitude x {} longitude{}",
        combined.latitude().len(),
        combined.longitude().len(),
        combined
            .time()
            .map(|t| format!(" x {} time", t.len()))
            .unwrap_or_default()
    );
    Ok(combined)
}
