//! Grid Engine: the life/death rule over a row range of a toroidal grid.
//!
//! Pure functions with no concurrency of their own. Neighbour lookup wraps
//! both axes modulo the grid's width and height, so the grid behaves as a
//! torus. Output depends only on the input grid and row range.

use std::ops::Range;

use lifegrid_types::{Cell, DEAD, Grid, LIVE};

/// Whether a cell is live in the next generation.
///
/// A live cell survives with 2 or 3 live neighbours; a dead cell becomes
/// live with exactly 3.
pub const fn rule(alive: bool, neighbours: u8) -> bool {
    matches!((alive, neighbours), (true, 2 | 3) | (false, 3))
}

/// Count the live cells among the 8 toroidal neighbours of `(x, y)`.
///
/// Offsets that wrap onto the same cell are each counted, so a live 1x1
/// grid counts itself 8 times.
#[allow(clippy::arithmetic_side_effects)]
pub fn neighbour_count(grid: &Grid, x: usize, y: usize) -> u8 {
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return 0;
    }
    // `n - 1` stands in for -1 under modulo n; width and height are non-zero.
    let columns = [width - 1, 0, 1];
    let rows = [height - 1, 0, 1];

    let mut count: u8 = 0;
    for (j, dy) in rows.iter().enumerate() {
        for (i, dx) in columns.iter().enumerate() {
            if i == 1 && j == 1 {
                continue;
            }
            let nx = (x % width + dx) % width;
            let ny = (y % height + dy) % height;
            if grid.is_alive(nx, ny) {
                count += 1;
            }
        }
    }
    count
}

/// Compute the next generation of rows `rows` of `grid`.
///
/// Returns a new grid holding only those rows. The input is never
/// modified. A range reaching past the grid is clamped to its height.
pub fn next_state(grid: &Grid, rows: Range<usize>) -> Grid {
    let rows = rows.start.min(grid.height())..rows.end.min(grid.height());
    let width = grid.width();
    let mut cells = Vec::with_capacity(width.saturating_mul(rows.len()));
    for y in rows.clone() {
        for x in 0..width {
            let alive = rule(grid.is_alive(x, y), neighbour_count(grid, x, y));
            cells.push(if alive { LIVE } else { DEAD });
        }
    }
    Grid::from_cells(width, rows.len(), cells).unwrap_or_else(|_| Grid::new(width, rows.len()))
}

/// List the live cells in rows `rows` of `grid`, row-major.
///
/// Each reported `y` is shifted by `y_offset`, so a node holding a band
/// that starts at global row `y_offset` reports global coordinates.
pub fn alive_cells(grid: &Grid, rows: Range<usize>, y_offset: usize) -> Vec<Cell> {
    let rows = rows.start.min(grid.height())..rows.end.min(grid.height());
    let mut cells = Vec::new();
    for y in rows {
        for x in 0..grid.width() {
            if grid.is_alive(x, y) {
                cells.push(Cell::new(x, y.saturating_add(y_offset)));
            }
        }
    }
    cells
}
