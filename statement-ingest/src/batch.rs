//! Fixed-size, order-preserving batching of statement rows

use thiserror::Error;

/// Rows per extraction call. Kept small so one response stays well under the
/// service's output limit.
pub const DEFAULT_BATCH_SIZE: usize = 15;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("batch size must be at least 1")]
pub struct ZeroBatchSize;

/// A validated, non-zero batch size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(usize);

impl BatchSize {
    pub fn new(size: usize) -> Result<Self, ZeroBatchSize> {
        if size == 0 {
            Err(ZeroBatchSize)
        } else {
            Ok(Self(size))
        }
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(DEFAULT_BATCH_SIZE)
    }
}

/// One contiguous slice of rows together with its offset in the statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    pub index: usize,
    /// Number of rows before this batch
    pub offset: usize,
    pub rows: &'a [String],
}

/// Partition `rows` into contiguous batches of `size`; the last may be shorter.
pub fn batch_rows(rows: &[String], size: BatchSize) -> Vec<Batch<'_>> {
    rows.chunks(size.get())
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            offset: index * size.get(),
            rows: chunk,
        })
        .collect()
}

/// Number of batches `row_count` rows split into
pub fn batch_count(row_count: usize, size: BatchSize) -> usize {
    row_count.div_ceil(size.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("row-{i}")).collect()
    }

    #[test]
    fn test_batches_reassemble_in_order() {
        for n in [0, 1, 14, 15, 16, 31, 45] {
            for b in [1, 2, 7, 15, 50] {
                let input = rows(n);
                let size = BatchSize::new(b).unwrap();
                let batches = batch_rows(&input, size);

                assert_eq!(batches.len(), batch_count(n, size));
                assert_eq!(batches.len(), n.div_ceil(b));

                let joined: Vec<String> = batches.iter().flat_map(|b| b.rows.iter().cloned()).collect();
                assert_eq!(joined, input);

                if let Some((last, rest)) = batches.split_last() {
                    assert!(rest.iter().all(|x| x.rows.len() == b));
                    assert!(!last.rows.is_empty() && last.rows.len() <= b);
                }
            }
        }
    }

    #[test]
    fn test_offsets() {
        let input = rows(40);
        let batches = batch_rows(&input, BatchSize::default());
        let offsets: Vec<usize> = batches.iter().map(|b| b.offset).collect();
        assert_eq!(offsets, vec![0, 15, 30]);
        assert_eq!(batches[2].rows.len(), 10);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert_eq!(BatchSize::new(0), Err(ZeroBatchSize));
    }
}
