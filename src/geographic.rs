//! Geographic chunking of latitude/longitude bounding boxes
//!
//! A bounding box is split into latitude bands of equal height so that each
//! band covers roughly `geographic_chunk_size` square degrees. Longitude is
//! never split: every band carries the full, unchanged longitude range.

use crate::errors::{ChunkerError, Result};
use log::debug;
use serde_json::{json, Value as JsonValue};

/// Default target area per chunk, in square degrees
pub const DEFAULT_GEOGRAPHIC_CHUNK_SIZE: f64 = 0.5;

/// Largest number of bands a single box may be split into
pub const MAX_GEOGRAPHIC_CHUNKS: usize = 1 << 20;

/// A latitude/longitude bounding box
///
/// Ranges are `(min, max)` pairs. `min <= max` is expected but not enforced;
/// inverted ranges produce a non-positive area and therefore a single chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub latitude: (f64, f64),
    pub longitude: (f64, f64),
}

impl BoundingBox {
    /// Create a bounding box, rejecting NaN or infinite endpoints
    pub fn new(latitude: (f64, f64), longitude: (f64, f64)) -> Result<Self> {
        check_finite("latitude", latitude)?;
        check_finite("longitude", longitude)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Height of the box in degrees of latitude
    #[must_use]
    pub fn latitude_span(&self) -> f64 {
        self.latitude.1 - self.latitude.0
    }

    /// Width of the box in degrees of longitude
    #[must_use]
    pub fn longitude_span(&self) -> f64 {
        self.longitude.1 - self.longitude.0
    }

    /// Planar area in square degrees
    #[must_use]
    pub fn area(&self) -> f64 {
        self.latitude_span() * self.longitude_span()
    }
}

fn check_finite(axis: &str, range: (f64, f64)) -> Result<()> {
    if range.0.is_finite() && range.1.is_finite() {
        Ok(())
    } else {
        Err(ChunkerError::InvalidRange {
            axis: axis.to_string(),
            message: format!("endpoints ({}, {}) must be finite", range.0, range.1),
        })
    }
}

/// One geographic sub-region of a larger query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkDescriptor {
    /// Longitude range, identical for every chunk of a box
    pub longitude: (f64, f64),
    /// Latitude band covered by this chunk
    pub latitude: (f64, f64),
}

impl ChunkDescriptor {
    /// Render as a `{"longitude": [..], "latitude": [..]}` mapping for loaders
    /// that accept range overrides.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        json!({
            "longitude": [self.longitude.0, self.longitude.1],
            "latitude": [self.latitude.0, self.latitude.1],
        })
    }
}

/// Splits bounding boxes into latitude bands of bounded area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicChunker {
    chunk_size: f64,
}

impl GeographicChunker {
    /// Create a chunker targeting `chunk_size` square degrees per band
    ///
    /// # Errors
    ///
    /// Returns [`ChunkerError::InvalidChunkSize`] unless `chunk_size` is a
    /// positive finite number.
    pub fn new(chunk_size: f64) -> Result<Self> {
        if !(chunk_size.is_finite() && chunk_size > 0.0) {
            return Err(ChunkerError::InvalidChunkSize {
                message: format!(
                    "geographic chunk size must be a positive finite area, got {}",
                    chunk_size
                ),
            });
        }
        Ok(Self { chunk_size })
    }

    /// Target area per chunk in square degrees
    #[must_use]
    pub fn chunk_size(&self) -> f64 {
        self.chunk_size
    }

    /// Number of bands a box is split into; never less than one.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkerError::InvalidChunkSize`] if the box would need more
    /// than [`MAX_GEOGRAPHIC_CHUNKS`] bands.
    pub fn chunk_count(&self, bbox: &BoundingBox) -> Result<usize> {
        let ratio = (bbox.area() / self.chunk_size).ceil();
        #[allow(clippy::cast_precision_loss)]
        let limit = MAX_GEOGRAPHIC_CHUNKS as f64;
        if ratio > limit {
            return Err(ChunkerError::InvalidChunkSize {
                message: format!(
                    "chunk size {} splits an area of {} into {} bands, more than the maximum of {}",
                    self.chunk_size,
                    bbox.area(),
                    ratio,
                    MAX_GEOGRAPHIC_CHUNKS
                ),
            });
        }
        if ratio >= 1.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                Ok(ratio as usize)
            }
        } else {
            Ok(1)
        }
    }

    /// Lazily iterate the latitude bands of `bbox`
    ///
    /// # Errors
    ///
    /// Fails like [`chunk_count`](Self::chunk_count).
    pub fn chunks(&self, bbox: &BoundingBox) -> Result<GeographicChunks> {
        let total = self.chunk_count(bbox)?;
        #[allow(clippy::cast_precision_loss)]
        let band_height = bbox.latitude_span() / total as f64;

        debug!(
            "GeographicChunker: lat={:?} lon={:?} area={} chunk_size={} -> {} bands of {} degrees",
            bbox.latitude,
            bbox.longitude,
            bbox.area(),
            self.chunk_size,
            total,
            band_height
        );

        Ok(GeographicChunks {
            bbox: *bbox,
            band_height,
            current: 0,
            total,
        })
    }
}

impl Default for GeographicChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_GEOGRAPHIC_CHUNK_SIZE,
        }
    }
}

/// Iterator over the latitude bands of a bounding box, lowest latitude first
#[derive(Debug, Clone)]
pub struct GeographicChunks {
    bbox: BoundingBox,
    band_height: f64,
    current: usize,
    total: usize,
}

impl GeographicChunks {
    fn band(&self, index: usize) -> ChunkDescriptor {
        let lat0 = self.bbox.latitude.0;
        #[allow(clippy::cast_precision_loss)]
        let latitude = (
            lat0 + self.band_height * index as f64,
            lat0 + self.band_height * (index + 1) as f64,
        );
        ChunkDescriptor {
            longitude: self.bbox.longitude,
            latitude,
        }
    }
}

impl Iterator for GeographicChunks {
    type Item = ChunkDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.total {
            let chunk = self.band(self.current);
            self.current += 1;
            Some(chunk)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GeographicChunks {}

/// Split a lat/lon box into latitude bands of roughly `geographic_chunk_size`
/// square degrees each.
///
/// Both ranges are required; they are optional here so that partially filled
/// query parameters can be passed straight through.
///
/// # Errors
///
/// - [`ChunkerError::MissingRange`] if either range is `None`
/// - [`ChunkerError::InvalidRange`] if an endpoint is NaN or infinite
/// - [`ChunkerError::InvalidChunkSize`] if the target area is not positive, or
///   so small that the box would need more than [`MAX_GEOGRAPHIC_CHUNKS`] bands
///
/// # Examples
///
/// ```
/// use dc_chunker::geographic::create_geographic_chunks;
///
/// let chunks = create_geographic_chunks(Some((10.0, 20.0)), Some((0.0, 1.0)), 0.5).unwrap();
/// assert_eq!(chunks.len(), 20);
/// assert_eq!(chunks[0].longitude, (10.0, 20.0));
/// ```
pub fn create_geographic_chunks(
    longitude: Option<(f64, f64)>,
    latitude: Option<(f64, f64)>,
    geographic_chunk_size: f64,
) -> Result<Vec<ChunkDescriptor>> {
    let longitude = longitude.ok_or_else(|| ChunkerError::MissingRange {
        axis: "longitude".to_string(),
    })?;
    let latitude = latitude.ok_or_else(|| ChunkerError::MissingRange {
        axis: "latitude".to_string(),
    })?;

    let bbox = BoundingBox::new(latitude, longitude)?;
    let chunker = GeographicChunker::new(geographic_chunk_size)?;
    Ok(chunker.chunks(&bbox)?.collect())
}
