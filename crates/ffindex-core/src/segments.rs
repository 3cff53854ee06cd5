use crate::frame::Interval;

/// Insert `iv` into the sorted, disjoint, fully-coalesced interval list
/// `list`, merging any intervals it touches or bridges.
///
/// `list` must already satisfy the invariant (sorted by start, pairwise
/// disjoint, no two adjacent-or-overlapping entries left unmerged) before
/// the call; it satisfies it again afterward. A degenerate interval
/// (`start >= end`) is silently dropped — it produces no change.
///
/// Algorithm: binary-search for the insertion point, splice the new
/// interval in, then do a single forward pass from the left neighbour
/// (which may itself extend past the new interval's start) merging any
/// run of overlapping/adjacent intervals into one, truncating the list
/// to the merged prefix. O(n) worst case, which is acceptable since a
/// single directory's fragments are small.
pub fn insert(list: &mut Vec<Interval>, iv: Interval) {
    if iv.is_empty() {
        return;
    }

    let pos = list.partition_point(|existing| existing.start < iv.start);
    list.insert(pos, iv);

    let start_scan = pos.saturating_sub(1);
    let mut write = start_scan;
    let mut current = list[start_scan];

    for read in (start_scan + 1)..list.len() {
        let candidate = list[read];
        if candidate.start <= current.end {
            if candidate.end > current.end {
                current.end = candidate.end;
            }
        } else {
            list[write] = current;
            write += 1;
            current = candidate;
        }
    }
    list[write] = current;
    list.truncate(write + 1);
}
