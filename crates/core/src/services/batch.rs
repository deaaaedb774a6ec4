//! Batch partitioning.

use crate::models::{Batch, RecipientSet};

/// Default number of recipients per batch.
pub const MAX_QUEUE_RECIPIENTS: usize = masscontact_common::config::DEFAULT_BATCH_SIZE;

/// Split `recipients` into batches of at most `max_size`, in set order.
///
/// Every recipient lands in exactly one batch; only the last batch may be
/// short. A `max_size` of zero is treated as one.
#[must_use]
pub fn partition(recipients: &RecipientSet, max_size: usize) -> Vec<Batch> {
    let max_size = max_size.max(1);
    let mut batches = Vec::with_capacity(recipients.len().div_ceil(max_size));
    let mut current = Vec::with_capacity(max_size.min(recipients.len()));

    for id in recipients {
        current.push(id.clone());
        if current.len() == max_size {
            batches.push(Batch::from(std::mem::take(&mut current)));
        }
    }

    if !current.is_empty() {
        batches.push(Batch::from(current));
    }

    batches
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recipients(n: usize) -> RecipientSet {
        (0..n).map(|i| format!("user{i:04}")).collect()
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(partition(&RecipientSet::new(), MAX_QUEUE_RECIPIENTS).is_empty());
    }

    #[test]
    fn test_sizes_and_coverage() {
        for (n, m) in [(1, 50), (50, 50), (51, 50), (409, 50), (10, 3), (7, 1)] {
            let set = recipients(n);
            let batches = partition(&set, m);

            assert_eq!(batches.len(), n.div_ceil(m), "n={n} m={m}");
            let (last, full) = batches.split_last().unwrap();
            assert!(full.iter().all(|b| b.len() == m));
            assert!(!last.is_empty() && last.len() <= m);

            let flattened: Vec<_> = batches.iter().flat_map(Batch::iter).cloned().collect();
            assert_eq!(flattened, set.iter().cloned().collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_zero_size_is_treated_as_one() {
        let batches = partition(&recipients(3), 0);

        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 1));
    }
}
