//! Order-preserving batch partitioning.

/// Split `items` into contiguous batches of at most `size` elements.
///
/// A `size` of zero is treated as one.
pub fn partition<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size.max(1)).collect()
}

/// Number of batches [`partition`] produces for `len` items
pub fn batch_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}
