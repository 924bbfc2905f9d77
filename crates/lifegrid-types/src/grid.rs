//! Cell grid and live-cell coordinates.
//!
//! A [`Grid`] is a row-major byte matrix with one byte per cell: [`DEAD`]
//! (`0`) or [`LIVE`] (`255`). Any byte other than [`LIVE`] reads as dead.
//! Grids are plain values: whoever computed one owns it, and everyone else
//! reads an immutable copy or an `Arc` snapshot.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Byte value of a dead cell.
pub const DEAD: u8 = 0;

/// Byte value of a live cell.
pub const LIVE: u8 = 255;

/// Errors raised when constructing or slicing a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The cell buffer length does not match `width * height`.
    #[error("grid shape mismatch: expected {expected} cells, got {actual}")]
    ShapeMismatch {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of cells actually supplied.
        actual: usize,
    },

    /// A row or band has a different width than the grid it joins.
    #[error("row width mismatch: expected {expected}, got {actual}")]
    WidthMismatch {
        /// Width of the receiving grid.
        expected: usize,
        /// Width of the offending row or band.
        actual: usize,
    },

    /// A coordinate lies outside the grid.
    #[error("cell ({x}, {y}) is outside a {width}x{height} grid")]
    OutOfBounds {
        /// Column.
        x: usize,
        /// Row.
        y: usize,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// A row range does not fit inside the grid.
    #[error("row range {start}..{end} is outside a grid of height {height}")]
    RowRange {
        /// First row of the requested range.
        start: usize,
        /// One past the last row of the requested range.
        end: usize,
        /// Grid height.
        height: usize,
    },
}

/// Coordinate of a live cell. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl Cell {
    /// Create a cell coordinate.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Wire form of a grid. Validated into a [`Grid`] on deserialization.
#[derive(Serialize, Deserialize)]
struct RawGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

/// Rectangular matrix of cell states, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid", into = "RawGrid")]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        Self::from_cells(raw.width, raw.height, raw.cells)
    }
}

impl From<Grid> for RawGrid {
    fn from(grid: Grid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            cells: grid.cells,
        }
    }
}

impl Grid {
    /// Create an all-dead grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![DEAD; width.saturating_mul(height)],
        }
    }

    /// Wrap an existing row-major cell buffer.
    pub fn from_cells(width: usize, height: usize, cells: Vec<u8>) -> Result<Self, GridError> {
        let expected = width.saturating_mul(height);
        if cells.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a grid from a list of equally wide rows.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, GridError> {
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(width.saturating_mul(rows.len()));
        for row in rows {
            if row.len() != width {
                return Err(GridError::WidthMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height: rows.len(),
            cells,
        })
    }

    /// Build a grid with exactly the given cells alive.
    pub fn from_live_cells(width: usize, height: usize, live: &[Cell]) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height);
        for cell in live {
            grid.set(cell.x, cell.y, LIVE)?;
        }
        Ok(grid)
    }

    /// Stack bands vertically, in the order given.
    ///
    /// Every band must be `width` cells wide.
    pub fn stack<'a, I>(width: usize, bands: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut cells = Vec::new();
        let mut height: usize = 0;
        for band in bands {
            if band.width != width {
                return Err(GridError::WidthMismatch {
                    expected: width,
                    actual: band.width,
                });
            }
            cells.extend_from_slice(&band.cells);
            height = height.saturating_add(band.height);
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Number of columns.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Row-major cell buffer.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Consume the grid and return its cell buffer.
    pub fn into_cells(self) -> Vec<u8> {
        self.cells
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        y.checked_mul(self.width)?.checked_add(x)
    }

    /// Cell byte at `(x, y)`, or [`DEAD`] outside the grid.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.offset(x, y)
            .and_then(|i| self.cells.get(i).copied())
            .unwrap_or(DEAD)
    }

    /// Whether the cell at `(x, y)` is live.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == LIVE
    }

    /// Overwrite the cell at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, value: u8) -> Result<(), GridError> {
        let out_of_bounds = GridError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        };
        let slot = self
            .offset(x, y)
            .and_then(|i| self.cells.get_mut(i))
            .ok_or(out_of_bounds)?;
        *slot = value;
        Ok(())
    }

    /// Borrow row `y`.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let start = y.checked_mul(self.width)?;
        let end = start.checked_add(self.width)?;
        if y >= self.height {
            return None;
        }
        self.cells.get(start..end)
    }

    /// Copy rows `rows.start..rows.end` into a new grid of the same width.
    pub fn rows(&self, rows: Range<usize>) -> Result<Self, GridError> {
        let err = GridError::RowRange {
            start: rows.start,
            end: rows.end,
            height: self.height,
        };
        if rows.start > rows.end || rows.end > self.height {
            return Err(err);
        }
        let start = rows.start.saturating_mul(self.width);
        let end = rows.end.saturating_mul(self.width);
        let cells = self.cells.get(start..end).ok_or(err)?.to_vec();
        Ok(Self {
            width: self.width,
            height: rows.len(),
            cells,
        })
    }

    /// Return a copy with `top` prepended and `bottom` appended as extra rows.
    pub fn with_halo(&self, top: &[u8], bottom: &[u8]) -> Result<Self, GridError> {
        for row in [top, bottom] {
            if row.len() != self.width {
                return Err(GridError::WidthMismatch {
                    expected: self.width,
                    actual: row.len(),
                });
            }
        }
        let mut cells = Vec::with_capacity(self.cells.len().saturating_add(self.width.saturating_mul(2)));
        cells.extend_from_slice(top);
        cells.extend_from_slice(&self.cells);
        cells.extend_from_slice(bottom);
        Ok(Self {
            width: self.width,
            height: self.height.saturating_add(2),
            cells,
        })
    }

    /// Number of live cells.
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == LIVE).count()
    }
}
