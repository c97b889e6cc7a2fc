//! Batching: partition a flat list into contiguous batches for dispatch.
//!
//! Batches only control how coarsely work is handed to the executor.
//! Concatenating them in order always reproduces the input.

/// Errors that can occur when partitioning.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("partition count must be at least 1")]
    ZeroPartitions,
}

/// Splits `items` into exactly `partitions` contiguous slices whose lengths
/// differ by at most one.
///
/// The first `len % partitions` slices carry the extra element. When there are
/// fewer items than partitions the trailing slices are empty.
pub fn partition<T>(items: &[T], partitions: usize) -> Result<Vec<&[T]>, BatchError> {
    if partitions == 0 {
        return Err(BatchError::ZeroPartitions);
    }

    let base = items.len() / partitions;
    let extra = items.len() % partitions;

    let mut batches = Vec::with_capacity(partitions);
    let mut start = 0;
    for i in 0..partitions {
        let len = base + usize::from(i < extra);
        batches.push(&items[start..start + len]);
        start += len;
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_items_into_two() {
        let items = ["u1", "u2", "u3", "u4", "u5"];
        let batches = partition(&items, 2).unwrap();

        assert_eq!(batches, vec![&items[..3], &items[3..]]);
    }

    #[test]
    fn zero_partitions_is_rejected() {
        let err = partition(&[1, 2, 3], 0).unwrap_err();
        assert_eq!(err, BatchError::ZeroPartitions);
    }

    #[test]
    fn fewer_items_than_partitions_leaves_empty_batches() {
        let items = [1, 2];
        let batches = partition(&items, 4).unwrap();

        assert_eq!(batches.len(), 4);
        assert_eq!(batches[0], &[1]);
        assert_eq!(batches[1], &[2]);
        assert!(batches[2].is_empty());
        assert!(batches[3].is_empty());
    }

    #[test]
    fn empty_input() {
        let items: [u8; 0] = [];
        let batches = partition(&items, 3).unwrap();

        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.is_empty()));
    }

    #[test]
    fn covers_input_in_order_with_balanced_sizes() {
        for len in 0..40 {
            let items: Vec<usize> = (0..len).collect();
            for partitions in 1..12 {
                let batches = partition(&items, partitions).unwrap();
                assert_eq!(batches.len(), partitions);

                let joined: Vec<usize> = batches.iter().flat_map(|b| b.iter().copied()).collect();
                assert_eq!(joined, items, "len={len} partitions={partitions}");

                let max = batches.iter().map(|b| b.len()).max().unwrap();
                let min = batches.iter().map(|b| b.len()).min().unwrap();
                assert!(max - min <= 1, "len={len} partitions={partitions}");
            }
        }
    }

    #[test]
    fn deterministic() {
        let items: Vec<u32> = (0..17).collect();
        assert_eq!(partition(&items, 5).unwrap(), partition(&items, 5).unwrap());
    }
}
