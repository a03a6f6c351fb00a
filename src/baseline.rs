//! Sliding baseline windows over a sequence

use crate::errors::{ChunkerError, Result};

/// Produce overlapping baseline windows of `window_length` items
///
/// For an input longer than `window_length` the windows start at offsets
/// `0..len - window_length - 1`, so the final full-length window is not
/// produced: five items with a window of two give windows at offsets 0 and 1.
/// An input no longer than `window_length` yields one window holding the whole
/// input.
///
/// # Errors
///
/// Returns [`ChunkerError::InvalidWindowLength`] if `window_length` is zero.
///
/// # Examples
///
/// ```
/// use dc_chunker::baseline::generate_baseline;
///
/// let windows = generate_baseline(&[1, 2, 3, 4, 5], 2).unwrap();
/// assert_eq!(windows, vec![&[1, 2][..], &[2, 3][..]]);
/// ```
pub fn generate_baseline<T>(sequence: &[T], window_length: usize) -> Result<Vec<&[T]>> {
    if window_length == 0 {
        return Err(ChunkerError::InvalidWindowLength);
    }
    if sequence.len() <= window_length {
        return Ok(vec![sequence]);
    }

    let num_windows = sequence.len() - window_length - 1;
    Ok(sequence.windows(window_length).take(num_windows).collect())
}
