//! # Grouping engine
//!
//! Annotates an RT-ordered sequence with neighbour similarities and splits it
//! into contiguous groups: an entry joins the previous entry's group when
//! their similarity is strictly above the threshold, otherwise it opens the
//! next group. Groups never span a break, so two identical spectra separated
//! by a dissimilar one land in different groups.

use log::debug;

use crate::compound::{CompoundTable, MergedCompoundEntry};
use crate::similarity::similarity_or_zero;

/// Default similarity above which adjacent entries share a group
pub const DEFAULT_GROUP_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Compute neighbour similarities and group ids, producing the final table.
pub fn group_entries(mut entries: Vec<MergedCompoundEntry>, threshold: f64) -> CompoundTable {
    let shared: Vec<f64> = entries
        .windows(2)
        .map(|pair| similarity_or_zero(&pair[0].peaks, &pair[1].peaks))
        .collect();

    let groups = assign_groups(&shared, threshold);
    for (i, (entry, &group_id)) in entries.iter_mut().zip(&groups).enumerate() {
        entry.similarity_to_previous = if i > 0 { shared[i - 1] } else { 0.0 };
        entry.similarity_to_next = shared.get(i).copied().unwrap_or(0.0);
        entry.group_id = group_id;
    }

    debug!(
        "Assigned {} entries to {} groups (threshold = {})",
        entries.len(),
        entries.last().map_or(0, |e| e.group_id),
        threshold
    );

    CompoundTable::new(entries)
}

/// Group ids from adjacent-pair similarities alone.
///
/// `shared[i]` is the similarity between entries `i` and `i + 1`; the result
/// has one id per entry, i.e. `shared.len() + 1` values. A NaN
/// similarity always starts a new group.
pub fn assign_groups(shared: &[f64], threshold: f64) -> Vec<u32> {
    let mut groups = Vec::with_capacity(shared.len() + 1);
    let mut group_id = 1;
    groups.push(group_id);
    for &similarity in shared {
        if similarity.is_nan() || similarity <= threshold {
            group_id += 1;
        }
        groups.push(group_id);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::{CompoundRecord, Peak};

    fn entry(rt: f64, peaks: &[(u32, f64)]) -> MergedCompoundEntry {
        let peaks = peaks.iter().copied().map(Peak::from).collect();
        MergedCompoundEntry::from(CompoundRecord::new(rt, peaks))
    }

    #[test]
    fn test_assign_groups_threshold_is_strict() {
        assert_eq!(assign_groups(&[0.95, 0.85], 0.9), vec![1, 1, 2]);
        assert_eq!(assign_groups(&[0.9], 0.9), vec![1, 2]);
        assert_eq!(assign_groups(&[], 0.9), vec![1]);
        assert_eq!(assign_groups(&[f64::NAN, 0.95], 0.9), vec![1, 2, 2]);
    }

    #[test]
    fn test_group_entries() {
        let table = group_entries(
            vec![
                entry(1.0, &[(10, 1.0), (11, 1.0)]),
                entry(2.0, &[(10, 1.0), (11, 1.1)]),
                entry(3.0, &[(50, 1.0)]),
                entry(4.0, &[(10, 1.0)]),
            ],
            DEFAULT_GROUP_SIMILARITY_THRESHOLD,
        );

        let groups: Vec<u32> = table.iter().map(|e| e.group_id).collect();
        assert_eq!(groups, vec![1, 1, 2, 3]);
        assert_eq!(table.group_count(), 3);

        let rows = table.entries();
        assert_eq!(rows[0].similarity_to_previous, 0.0);
        assert_eq!(rows[3].similarity_to_next, 0.0);
        assert!(rows[0].similarity_to_next > 0.99);
        assert_eq!(rows[0].similarity_to_next, rows[1].similarity_to_previous);
        assert_eq!(rows[2].similarity_to_next, 0.0);
    }

    #[test]
    fn test_huge_intensities_do_not_join() {
        let table = group_entries(
            vec![
                entry(1.0, &[(50, 1e160), (60, 1e200)]),
                entry(2.0, &[(50, 1e200), (60, 1e160)]),
            ],
            DEFAULT_GROUP_SIMILARITY_THRESHOLD,
        );

        let groups: Vec<u32> = table.iter().map(|e| e.group_id).collect();
        assert_eq!(groups, vec![1, 2]);
        assert!(table.iter().all(|e| e.similarity_to_previous.is_finite()));
        assert!(table.entries()[1].similarity_to_previous < 1e-30);
    }

    #[test]
    fn test_single_and_empty() {
        let table = group_entries(vec![entry(1.0, &[(10, 1.0)])], 0.9);
        assert_eq!(table.entries()[0].group_id, 1);
        assert_eq!(table.entries()[0].similarity_to_next, 0.0);

        assert!(group_entries(Vec::new(), 0.9).is_empty());
    }
}
