//! Row partitioning shared by the broker's band split and the worker pool.

use std::ops::Range;

/// Split rows `0..total` into `parts` contiguous ranges.
///
/// Every range gets `total / parts` rows and the first `total % parts`
/// ranges get one extra, so ranges are ascending, disjoint, and cover the
/// whole span. Ranges may be empty when `parts > total`. Returns no ranges
/// when `parts` is zero.
pub fn partition_rows(total: usize, parts: usize) -> Vec<Range<usize>> {
    let (Some(base), Some(extra)) = (total.checked_div(parts), total.checked_rem(parts)) else {
        return Vec::new();
    };

    let mut ranges = Vec::with_capacity(parts);
    let mut start: usize = 0;
    for i in 0..parts {
        let len = if i < extra { base.saturating_add(1) } else { base };
        let end = start.saturating_add(len);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Shift every range by `offset` rows.
pub fn offset_ranges(ranges: Vec<Range<usize>>, offset: usize) -> Vec<Range<usize>> {
    ranges
        .into_iter()
        .map(|r| r.start.saturating_add(offset)..r.end.saturating_add(offset))
        .collect()
}
