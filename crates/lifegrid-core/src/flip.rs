//! Flipped-cell computation for the driver's event stream.

use std::collections::BTreeSet;

use lifegrid_types::Cell;

/// Cells whose state differs between two live-cell lists.
///
/// The result is the symmetric difference of the two sets, sorted by
/// `(x, y)`. Duplicates in either input are ignored.
pub fn flipped_cells(before: &[Cell], after: &[Cell]) -> Vec<Cell> {
    let before: BTreeSet<Cell> = before.iter().copied().collect();
    let after: BTreeSet<Cell> = after.iter().copied().collect();
    before.symmetric_difference(&after).copied().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lifegrid_types::Grid;

    use super::*;
    use crate::engine;

    fn cells(points: &[(usize, usize)]) -> Vec<Cell> {
        points.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    #[test]
    fn blinker_flips_four_cells() {
        let horizontal = cells(&[(1, 2), (2, 2), (3, 2)]);
        let vertical = cells(&[(2, 1), (2, 2), (2, 3)]);
        assert_eq!(
            flipped_cells(&horizontal, &vertical),
            cells(&[(1, 2), (2, 1), (2, 3), (3, 2)])
        );
    }

    #[test]
    fn size_is_union_minus_overlap() {
        let glider = cells(&[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let board = Grid::from_live_cells(8, 8, &glider).unwrap();
        let stepped = engine::next_state(&board, 0..8);
        let after = engine::alive_cells(&stepped, 0..8, 0);

        let overlap = glider.iter().filter(|c| after.contains(c)).count();
        let flipped = flipped_cells(&glider, &after);
        assert_eq!(flipped.len(), glider.len() + after.len() - 2 * overlap);
    }

    #[test]
    fn no_change_no_flips() {
        let block = cells(&[(1, 1), (1, 2), (2, 1), (2, 2)]);
        assert!(flipped_cells(&block, &block).is_empty());
    }

    #[test]
    fn from_empty_reports_everything_live() {
        let live = cells(&[(0, 0), (3, 3)]);
        assert_eq!(flipped_cells(&[], &live), live);
    }
}
