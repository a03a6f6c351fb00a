//! Coordinate-indexed gridded datasets
//!
//! [`GriddedDataset`] is the in-memory form of one loaded chunk: a latitude
//! axis, a longitude axis, an optional time axis, and any number of named
//! `f32` data variables laid out as `[time, latitude, longitude]` (or
//! `[latitude, longitude]` without time). Missing cells are `NaN`.

use crate::errors::{ChunkerError, Result};
use crate::parallel::ParallelConfig;
use chrono::{DateTime, Utc};
use ndarray::{ArrayD, Dimension, IxDyn};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Coordinate axes a dataset may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateAxis {
    Time,
    Latitude,
    Longitude,
}

impl CoordinateAxis {
    /// Get the coordinate name as it appears in loader parameters
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        }
    }
}

/// Gridded result of one (possibly chunked) load
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedDataset {
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    time: Option<Vec<DateTime<Utc>>>,
    variables: BTreeMap<String, ArrayD<f32>>,
}

impl GriddedDataset {
    /// Create an empty dataset over the given coordinate axes
    ///
    /// # Errors
    ///
    /// Returns [`ChunkerError::DuplicateCoordinate`] if an axis repeats a label
    /// or contains NaN.
    pub fn new(
        latitude: Vec<f64>,
        longitude: Vec<f64>,
        time: Option<Vec<DateTime<Utc>>>,
    ) -> Result<Self> {
        check_labels(CoordinateAxis::Latitude, &latitude)?;
        check_labels(CoordinateAxis::Longitude, &longitude)?;
        if let Some(time) = &time {
            let mut sorted = time.clone();
            sorted.sort_unstable();
            if sorted.windows(2).any(|w| w[0] == w[1]) {
                return Err(ChunkerError::DuplicateCoordinate {
                    axis: CoordinateAxis::Time.as_str().to_string(),
                });
            }
        }

        Ok(Self {
            latitude,
            longitude,
            time,
            variables: BTreeMap::new(),
        })
    }

    /// Builder-style [`add_variable`](Self::add_variable)
    pub fn with_variable(mut self, name: impl Into<String>, data: ArrayD<f32>) -> Result<Self> {
        self.add_variable(name, data)?;
        Ok(self)
    }

    /// Add or replace a data variable
    ///
    /// # Errors
    ///
    /// Returns [`ChunkerError::ShapeMismatch`] unless `data` has the shape of
    /// the dataset grid.
    pub fn add_variable(&mut self, name: impl Into<String>, data: ArrayD<f32>) -> Result<()> {
        let name = name.into();
        let expected = self.grid_shape();
        if data.shape() != expected.as_slice() {
            return Err(ChunkerError::ShapeMismatch {
                variable: name,
                expected,
                actual: data.shape().to_vec(),
            });
        }
        self.variables.insert(name, data);
        Ok(())
    }

    #[must_use]
    pub fn latitude(&self) -> &[f64] {
        &self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> &[f64] {
        &self.longitude
    }

    #[must_use]
    pub fn time(&self) -> Option<&[DateTime<Utc>]> {
        self.time.as_deref()
    }

    #[must_use]
    pub fn has_time(&self) -> bool {
        self.time.is_some()
    }

    /// Axes in storage order
    #[must_use]
    pub fn axes(&self) -> Vec<CoordinateAxis> {
        let mut axes = Vec::with_capacity(3);
        if self.has_time() {
            axes.push(CoordinateAxis::Time);
        }
        axes.push(CoordinateAxis::Latitude);
        axes.push(CoordinateAxis::Longitude);
        axes
    }

    /// Shape every data variable must have
    #[must_use]
    pub fn grid_shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(3);
        if let Some(time) = &self.time {
            shape.push(time.len());
        }
        shape.push(self.latitude.len());
        shape.push(self.longitude.len());
        shape
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.variables.get(name)
    }

    /// Variable names in sorted order
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Look up a single cell by coordinate labels
    ///
    /// Returns `None` if the variable or any label is absent, and `Some(NaN)`
    /// for a missing cell.
    #[must_use]
    pub fn sel(
        &self,
        variable: &str,
        latitude: f64,
        longitude: f64,
        time: Option<DateTime<Utc>>,
    ) -> Option<f32> {
        let data = self.variables.get(variable)?;
        let mut index = Vec::with_capacity(3);
        match (&self.time, time) {
            (Some(axis), Some(t)) => index.push(axis.iter().position(|&x| x == t)?),
            (None, None) => {}
            _ => return None,
        }
        index.push(self.latitude.iter().position(|&x| x == latitude)?);
        index.push(self.longitude.iter().position(|&x| x == longitude)?);
        data.get(index.as_slice()).copied()
    }

    /// True when latitude descends, longitude ascends and time ascends
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        let lat_ok = self.latitude.windows(2).all(|w| w[0] > w[1]);
        let lon_ok = self.longitude.windows(2).all(|w| w[0] < w[1]);
        let time_ok = self
            .time
            .as_ref()
            .map_or(true, |t| t.windows(2).all(|w| w[0] < w[1]));
        lat_ok && lon_ok && time_ok
    }

    /// Conform the dataset to new coordinate labels
    ///
    /// Cells whose labels are absent from this dataset become NaN. `time` must
    /// be given exactly when the dataset has a time axis.
    ///
    /// # Errors
    ///
    /// - [`ChunkerError::AxisMismatch`] if `time` presence disagrees with the dataset
    /// - [`ChunkerError::DuplicateCoordinate`] if the new labels repeat
    pub fn reindex(
        &self,
        latitude: &[f64],
        longitude: &[f64],
        time: Option<&[DateTime<Utc>]>,
    ) -> Result<Self> {
        self.reindex_with(latitude, longitude, time, &ParallelConfig::default())
    }

    pub(crate) fn reindex_with(
        &self,
        latitude: &[f64],
        longitude: &[f64],
        time: Option<&[DateTime<Utc>]>,
        parallel: &ParallelConfig,
    ) -> Result<Self> {
        let target = Self::new(
            latitude.to_vec(),
            longitude.to_vec(),
            time.map(<[DateTime<Utc>]>::to_vec),
        )?;
        let plans = target.plan_from(self)?;

        let mut variables = BTreeMap::new();
        for (name, data) in &self.variables {
            let source = GatherSource {
                data,
                plans: &plans,
            };
            variables.insert(
                name.clone(),
                gather(&target.grid_shape(), &[source], parallel),
            );
        }

        Ok(Self {
            variables,
            ..target
        })
    }

    /// Reorder axes canonically: latitude descending, longitude ascending,
    /// time ascending.
    pub fn reindex_canonical(&self) -> Result<Self> {
        self.reindex_canonical_with(&ParallelConfig::default())
    }

    pub(crate) fn reindex_canonical_with(&self, parallel: &ParallelConfig) -> Result<Self> {
        if self.is_canonical() {
            return Ok(self.clone());
        }
        let mut latitude = self.latitude.clone();
        latitude.sort_unstable_by(|a, b| label_cmp(b, a));
        let mut longitude = self.longitude.clone();
        longitude.sort_unstable_by(label_cmp);
        let time = self.time.clone().map(|mut t| {
            t.sort_unstable();
            t
        });
        self.reindex_with(&latitude, &longitude, time.as_deref(), parallel)
    }

    /// Per-axis index maps from `self`'s grid into `source`'s grid
    pub(crate) fn plan_from(&self, source: &GriddedDataset) -> Result<Vec<Vec<Option<usize>>>> {
        let mut plans = Vec::with_capacity(3);
        match (&self.time, &source.time) {
            (Some(target), Some(src)) => plans.push(plan_axis(target, src, Ord::cmp)),
            (None, None) => {}
            _ => {
                return Err(ChunkerError::AxisMismatch {
                    message: "datasets must either all carry a time axis or none".to_string(),
                })
            }
        }
        plans.push(plan_axis(&self.latitude, &source.latitude, label_cmp));
        plans.push(plan_axis(&self.longitude, &source.longitude, label_cmp));
        Ok(plans)
    }
}

/// Total order for validated (non-NaN) coordinate labels
pub(crate) fn label_cmp(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

fn check_labels(axis: CoordinateAxis, labels: &[f64]) -> Result<()> {
    let mut sorted = labels.to_vec();
    sorted.sort_unstable_by(label_cmp);
    if sorted.iter().any(|x| x.is_nan()) || sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(ChunkerError::DuplicateCoordinate {
            axis: axis.as_str().to_string(),
        });
    }
    Ok(())
}

/// For every target label, the position of the same label in `source`.
fn plan_axis<L, F>(target: &[L], source: &[L], cmp: F) -> Vec<Option<usize>>
where
    L: Copy,
    F: Fn(&L, &L) -> Ordering,
{
    let mut lookup: Vec<(L, usize)> = source.iter().copied().zip(0..).collect();
    lookup.sort_unstable_by(|a, b| cmp(&a.0, &b.0));
    target
        .iter()
        .map(|label| {
            lookup
                .binary_search_by(|entry| cmp(&entry.0, label))
                .ok()
                .map(|found| lookup[found].1)
        })
        .collect()
}

/// One input to [`gather`]: a data array plus its per-axis index maps.
pub(crate) struct GatherSource<'a> {
    pub data: &'a ArrayD<f32>,
    pub plans: &'a [Vec<Option<usize>>],
}

impl GatherSource<'_> {
    fn value_at(&self, position: &[usize]) -> Option<f32> {
        let mut index = [0usize; 3];
        for (axis, &pos) in position.iter().enumerate() {
            index[axis] = self.plans[axis][pos]?;
        }
        self.data.get(&index[..position.len()]).copied()
    }
}

/// Fill a new grid of `shape`, taking each cell from the first source that
/// maps it to a non-NaN value.
pub(crate) fn gather(
    shape: &[usize],
    sources: &[GatherSource<'_>],
    parallel: &ParallelConfig,
) -> ArrayD<f32> {
    let pick = |position: &[usize]| -> f32 {
        sources
            .iter()
            .filter_map(|source| source.value_at(position))
            .find(|value| !value.is_nan())
            .unwrap_or(f32::NAN)
    };

    let mut out = ArrayD::from_elem(IxDyn(shape), f32::NAN);
    if parallel.use_parallel(out.len()) {
        if let Some(cells) = out.as_slice_mut() {
            cells.par_iter_mut().enumerate().for_each(|(offset, cell)| {
                let position = unravel(offset, shape);
                *cell = pick(&position[..shape.len()]);
            });
            return out;
        }
    }

    for (index, cell) in out.indexed_iter_mut() {
        *cell = pick(index.slice());
    }
    out
}

/// Row-major multi-index of a flat offset into a grid of at most three axes
fn unravel(mut offset: usize, shape: &[usize]) -> [usize; 3] {
    let mut position = [0usize; 3];
    for axis in (0..shape.len()).rev() {
        position[axis] = offset % shape[axis];
        offset /= shape[axis];
    }
    position
}
