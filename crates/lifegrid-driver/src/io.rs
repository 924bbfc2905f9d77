//! Image collaborators: loading the initial grid and exporting snapshots.
//!
//! The session only sees the [`ImageLoader`] and [`ImageWriter`] traits.
//! [`PgmDirectory`] reads and writes binary PGM files; [`MemoryImages`]
//! keeps everything in memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use lifegrid_types::Grid;

use crate::error::ImageError;

/// Source of the initial grid.
pub trait ImageLoader: Send + Sync {
    /// Load the `width` x `height` starting grid.
    fn load(&self, width: usize, height: usize) -> Result<Grid, ImageError>;
}

/// Sink for exported grids.
pub trait ImageWriter: Send + Sync {
    /// Persist `grid` as the state at `turn`. Returns the image name.
    fn write(&self, grid: &Grid, turn: u64) -> Result<String, ImageError>;
}

/// Name of an exported image: `<W>x<H>x<turn>`.
pub fn output_name(grid: &Grid, turn: u64) -> String {
    format!("{}x{}x{turn}", grid.width(), grid.height())
}

// ---------------------------------------------------------------------------
// PGM files
// ---------------------------------------------------------------------------

/// Loads `<image_dir>/<W>x<H>.pgm` and writes `<output_dir>/<W>x<H>x<turn>.pgm`.
#[derive(Debug, Clone)]
pub struct PgmDirectory {
    image_dir: PathBuf,
    output_dir: PathBuf,
}

impl PgmDirectory {
    /// Adapter over the two directories.
    pub fn new(image_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            output_dir: output_dir.into(),
        }
    }
}

impl ImageLoader for PgmDirectory {
    fn load(&self, width: usize, height: usize) -> Result<Grid, ImageError> {
        let path = self.image_dir.join(format!("{width}x{height}.pgm"));
        let bytes = std::fs::read(&path).map_err(io_error(&path))?;
        let grid = decode_pgm(&bytes)?;
        if grid.width() != width || grid.height() != height {
            return Err(ImageError::Size {
                width,
                height,
                actual_width: grid.width(),
                actual_height: grid.height(),
            });
        }
        Ok(grid)
    }
}

impl ImageWriter for PgmDirectory {
    fn write(&self, grid: &Grid, turn: u64) -> Result<String, ImageError> {
        std::fs::create_dir_all(&self.output_dir).map_err(io_error(&self.output_dir))?;

        let name = output_name(grid, turn);
        let path = self.output_dir.join(format!("{name}.pgm"));
        std::fs::write(&path, encode_pgm(grid)).map_err(io_error(&path))?;
        Ok(name)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ImageError {
    let path = path.display().to_string();
    move |source| ImageError::Io { path, source }
}

/// Encode `grid` as a binary PGM with maxval 255.
pub fn encode_pgm(grid: &Grid) -> Vec<u8> {
    let mut bytes = format!("P5\n{} {}\n255\n", grid.width(), grid.height()).into_bytes();
    bytes.extend_from_slice(grid.cells());
    bytes
}

/// Decode a binary PGM. Pixels are kept as-is, so only `255` reads as live.
pub fn decode_pgm(bytes: &[u8]) -> Result<Grid, ImageError> {
    let mut rest = bytes;
    if next_token(&mut rest)? != b"P5" {
        return Err(ImageError::Format("missing P5 magic".to_owned()));
    }
    let width = next_number(&mut rest)?;
    let height = next_number(&mut rest)?;
    let maxval = next_number(&mut rest)?;
    if maxval != 255 {
        return Err(ImageError::Format(format!("unsupported maxval {maxval}")));
    }

    // A single whitespace byte separates the header from the pixels.
    let pixels = rest
        .get(1..)
        .and_then(|p| p.get(..width.saturating_mul(height)))
        .ok_or_else(|| ImageError::Format("truncated pixel data".to_owned()))?;
    Ok(Grid::from_cells(width, height, pixels.to_vec())?)
}

fn next_token<'a>(rest: &mut &'a [u8]) -> Result<&'a [u8], ImageError> {
    loop {
        let blank = rest.iter().take_while(|b| b.is_ascii_whitespace()).count();
        *rest = rest.get(blank..).unwrap_or_default();
        if rest.first() != Some(&b'#') {
            break;
        }
        let comment = rest.iter().take_while(|&&b| b != b'\n').count();
        *rest = rest.get(comment..).unwrap_or_default();
    }
    let len = rest.iter().take_while(|b| !b.is_ascii_whitespace()).count();
    let (token, tail) = rest
        .split_at_checked(len)
        .filter(|(token, _)| !token.is_empty())
        .ok_or_else(|| ImageError::Format("truncated header".to_owned()))?;
    *rest = tail;
    Ok(token)
}

fn next_number(rest: &mut &[u8]) -> Result<usize, ImageError> {
    let token = next_token(rest)?;
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            ImageError::Format(format!("bad header field {:?}", String::from_utf8_lossy(token)))
        })
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Images held in memory, keyed by size on input and by name on output.
#[derive(Debug, Default)]
pub struct MemoryImages {
    inputs: Mutex<HashMap<(usize, usize), Grid>>,
    outputs: Mutex<Vec<(String, Grid)>>,
}

impl MemoryImages {
    /// Store `grid` as the starting image for its size.
    pub fn insert(&self, grid: Grid) {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((grid.width(), grid.height()), grid);
    }

    /// Every exported image, in export order.
    pub fn outputs(&self) -> Vec<(String, Grid)> {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ImageLoader for MemoryImages {
    fn load(&self, width: usize, height: usize) -> Result<Grid, ImageError> {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(width, height))
            .cloned()
            .ok_or(ImageError::Missing { width, height })
    }
}

impl ImageWriter for MemoryImages {
    fn write(&self, grid: &Grid, turn: u64) -> Result<String, ImageError> {
        let name = output_name(grid, turn);
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.clone(), grid.clone()));
        Ok(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lifegrid_types::Cell;

    use super::*;

    fn glider() -> Grid {
        let cells = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)].map(|(x, y)| Cell::new(x, y));
        Grid::from_live_cells(6, 4, &cells).unwrap()
    }

    #[test]
    fn pgm_header_layout() {
        let bytes = encode_pgm(&glider());
        assert!(bytes.starts_with(b"P5\n6 4\n255\n"));
        assert_eq!(bytes.len(), 11 + 24);
        assert_eq!(decode_pgm(&bytes).unwrap(), glider());
    }

    #[test]
    fn decode_skips_comments() {
        let mut bytes = b"P5\n# made by hand\n3 1 255\n".to_vec();
        bytes.extend_from_slice(&[0, 7, 255]);
        let grid = decode_pgm(&bytes).unwrap();
        assert_eq!(grid.cells(), &[0, 7, 255]);
        assert!(!grid.is_alive(1, 0));
        assert!(grid.is_alive(2, 0));
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert!(matches!(decode_pgm(b"P2\n1 1\n255\n\0"), Err(ImageError::Format(_))));
        assert!(matches!(decode_pgm(b"P5\n1 1\n15\n\0"), Err(ImageError::Format(_))));
        assert!(matches!(decode_pgm(b"P5\n2 2\n255\n\0"), Err(ImageError::Format(_))));
        assert!(matches!(decode_pgm(b"P5\n2"), Err(ImageError::Format(_))));
    }

    #[test]
    fn directory_round_trip_and_size_check() {
        let dir = std::env::temp_dir().join(format!("lifegrid-pgm-{}", std::process::id()));
        let images = PgmDirectory::new(&dir, &dir);

        let name = images.write(&glider(), 12).unwrap();
        assert_eq!(name, "6x4x12");
        assert!(dir.join("6x4x12.pgm").exists());

        std::fs::rename(dir.join("6x4x12.pgm"), dir.join("6x4.pgm")).unwrap();
        assert_eq!(images.load(6, 4).unwrap(), glider());
        assert!(matches!(images.load(4, 6), Err(ImageError::Io { .. })));

        std::fs::rename(dir.join("6x4.pgm"), dir.join("4x6.pgm")).unwrap();
        assert!(matches!(images.load(4, 6), Err(ImageError::Size { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn memory_images_record_exports() {
        let images = MemoryImages::default();
        assert!(matches!(images.load(6, 4), Err(ImageError::Missing { .. })));
        images.insert(glider());
        assert_eq!(images.load(6, 4).unwrap(), glider());

        images.write(&glider(), 3).unwrap();
        let outputs = images.outputs();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs.first().unwrap().0, "6x4x3");
    }
}
