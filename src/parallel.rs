//! Parallel utilities with feature-gated implementations
//!
//! Provides data-parallel loops over the row dimension of sparse kernels,
//! with sequential fallbacks when the `rayon` feature is disabled.

/// Check if parallel processing is available
#[cfg(feature = "rayon")]
pub fn is_parallel_available() -> bool {
    true
}

/// Check if parallel processing is available
#[cfg(not(feature = "rayon"))]
pub fn is_parallel_available() -> bool {
    false
}

/// Parallel map with index
#[cfg(feature = "rayon")]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    use rayon::prelude::*;
    (0..count).into_par_iter().map(f).collect()
}

/// Sequential map with index (fallback)
#[cfg(not(feature = "rayon"))]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    F: Fn(usize) -> U,
{
    (0..count).map(f).collect()
}

/// Parallel in-place update of a slice, indexed
#[cfg(feature = "rayon")]
pub fn parallel_for_each_mut<T, F>(data: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    use rayon::prelude::*;
    data.par_iter_mut().enumerate().for_each(|(i, x)| f(i, x));
}

/// Sequential in-place update of a slice, indexed (fallback)
#[cfg(not(feature = "rayon"))]
pub fn parallel_for_each_mut<T, F>(data: &mut [T], f: F)
where
    F: Fn(usize, &mut T),
{
    data.iter_mut().enumerate().for_each(|(i, x)| f(i, x));
}
