//! Row-batch fan-out for large tabular arrays.
//!
//! Rows are independent once the header is fixed, so batches at or above
//! the configured threshold are rendered on worker threads and
//! concatenated in original order. A panic inside the accelerated path is
//! caught at this boundary and normalized to the `Internal` error
//! category; the caller retries once on the sequential reference path.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;

/// Dispatch overhead dominates below the threshold.
pub(crate) fn should_parallelize(total_items: usize, threshold: usize) -> bool {
    cfg!(feature = "parallel") && total_items >= threshold
}

#[cfg(feature = "parallel")]
pub(crate) fn map_items<T, F>(items: &[T], func: F) -> Result<Vec<String>>
where
    T: Sync,
    F: Fn(&T) -> String + Sync + Send,
{
    use crate::error::Error;

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        items.par_iter().map(&func).collect::<Vec<_>>()
    }));
    outcome.map_err(|_| Error::internal("parallel row encoding panicked"))
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn map_items<T, F>(items: &[T], func: F) -> Result<Vec<String>>
where
    F: Fn(&T) -> String,
{
    Ok(items.iter().map(func).collect())
}
