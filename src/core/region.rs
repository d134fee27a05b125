// Pixel regions and grid-cell slicing

use crate::engine::assets::AssetError;
use glam::UVec2;
use serde::{Deserialize, Serialize};

/// Size of one grid cell in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(16, 16)
    }
}

impl From<(u32, u32)> for GridSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<GridSize> for (u32, u32) {
    fn from(grid: GridSize) -> Self {
        (grid.width, grid.height)
    }
}

/// A rectangle in source pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect covering a whole image of the given size
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn origin(&self) -> UVec2 {
        UVec2::new(self.x, self.y)
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether this rect lies entirely inside an image of the given size
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let end = self.origin().as_u64vec2() + self.size().as_u64vec2();
        end.x <= width as u64 && end.y <= height as u64
    }
}

/// Cell addressing for a grid slice: a single cell, or a `[start, end]` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlicePos {
    Cell(u32),
    Cells(Vec<u32>),
}

impl SlicePos {
    /// Normalize into a `(start, end)` cell pair
    ///
    /// A single value (scalar or one-element list) is used for both ends.
    pub fn cells(&self) -> Result<(u32, u32), AssetError> {
        match self {
            SlicePos::Cell(cell) => Ok((*cell, *cell)),
            SlicePos::Cells(cells) => match cells.as_slice() {
                [] => Err(AssetError::InvalidGeometry(
                    "slice position list is empty".to_string(),
                )),
                [start] => Ok((*start, *start)),
                [start, end] => Ok((*start, *end)),
                _ => Err(AssetError::InvalidGeometry(format!(
                    "slice position takes at most two cells, got {}",
                    cells.len()
                ))),
            },
        }
    }
}

impl From<u32> for SlicePos {
    fn from(cell: u32) -> Self {
        SlicePos::Cell(cell)
    }
}

impl From<(u32, u32)> for SlicePos {
    fn from((start, end): (u32, u32)) -> Self {
        SlicePos::Cells(vec![start, end])
    }
}

/// Convert a grid slice into a pixel rectangle
///
/// Cells are numbered row-major against `floor(source_width / grid.width)`
/// columns. The rect spans from the top-left of the start cell to the
/// bottom-right of the end cell. Cells past the bottom of the source are not
/// rejected here; callers check the result against the source height.
pub fn slice_to_rect(source_width: u32, pos: &SlicePos, grid: GridSize) -> Result<Rect, AssetError> {
    if grid.width == 0 || grid.height == 0 {
        return Err(AssetError::InvalidGeometry(format!(
            "grid cell must be non-zero, got {}x{}",
            grid.width, grid.height
        )));
    }

    let total_cols = source_width / grid.width;
    if total_cols == 0 {
        return Err(AssetError::InvalidGeometry(format!(
            "grid cell width {} exceeds source width {}",
            grid.width, source_width
        )));
    }

    let (start_cell, end_cell) = pos.cells()?;

    let start = UVec2::new(start_cell % total_cols, start_cell / total_cols);
    let end = UVec2::new(end_cell % total_cols, end_cell / total_cols);

    if end.x < start.x || end.y < start.y {
        return Err(AssetError::InvalidGeometry(format!(
            "slice end cell {} lies before start cell {}",
            end_cell, start_cell
        )));
    }

    let cell = UVec2::new(grid.width, grid.height);
    let start_px = start.as_u64vec2() * cell.as_u64vec2();
    let end_px = (end.as_u64vec2() + 1) * cell.as_u64vec2();

    let to_u32 = |v: u64| {
        u32::try_from(v).map_err(|_| {
            AssetError::InvalidGeometry(format!("slice cell {} overflows pixel space", end_cell))
        })
    };

    Ok(Rect::new(
        to_u32(start_px.x)?,
        to_u32(start_px.y)?,
        to_u32(end_px.x - start_px.x)?,
        to_u32(end_px.y - start_px.y)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_first() {
        let rect = slice_to_rect(32, &SlicePos::Cell(0), GridSize::new(16, 16)).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 16, 16));
    }

    #[test]
    fn test_single_cell_matches_grid_formula() {
        let source_width = 96;
        for (gw, gh) in [(16, 16), (8, 24), (32, 4), (12, 12)] {
            let cols = source_width / gw;
            for cell in 0..(cols * 4) {
                let rect =
                    slice_to_rect(source_width, &SlicePos::Cell(cell), GridSize::new(gw, gh))
                        .unwrap();
                assert_eq!(
                    rect,
                    Rect::new((cell % cols) * gw, (cell / cols) * gh, gw, gh),
                    "cell {} on grid {}x{}",
                    cell,
                    gw,
                    gh
                );
            }
        }
    }

    #[test]
    fn test_same_row_span_width() {
        let source_width = 128;
        for (gw, gh) in [(16, 16), (8, 24), (32, 4), (12, 12)] {
            let cols = source_width / gw;
            for row in 0..3 {
                for start_col in 0..cols {
                    for end_col in start_col..cols {
                        let start = row * cols + start_col;
                        let end = row * cols + end_col;
                        let rect = slice_to_rect(
                            source_width,
                            &SlicePos::Cells(vec![start, end]),
                            GridSize::new(gw, gh),
                        )
                        .unwrap();
                        assert_eq!(
                            rect,
                            Rect::new(start_col * gw, row * gh, (end_col - start_col + 1) * gw, gh),
                            "cells {}..={} on grid {}x{}",
                            start,
                            end,
                            gw,
                            gh
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_more_than_two_cells_is_invalid() {
        let err = slice_to_rect(64, &SlicePos::Cells(vec![0, 1, 2]), GridSize::new(16, 16))
            .unwrap_err();
        assert!(matches!(err, AssetError::InvalidGeometry(_)));
    }

    #[test]
    fn test_block_span_across_rows() {
        // 4 columns: cell 1 is (1,0), cell 6 is (2,1)
        let rect = slice_to_rect(64, &SlicePos::Cells(vec![1, 6]), GridSize::new(16, 8)).unwrap();
        assert_eq!(rect, Rect::new(16, 0, 32, 16));
    }

    #[test]
    fn test_one_element_list_uses_same_cell() {
        let grid = GridSize::new(16, 16);
        let single = slice_to_rect(64, &SlicePos::Cells(vec![5]), grid).unwrap();
        let scalar = slice_to_rect(64, &SlicePos::Cell(5), grid).unwrap();
        assert_eq!(single, scalar);
    }

    #[test]
    fn test_fractional_columns_are_floored() {
        // 40 / 16 = 2.5 -> 2 columns, so cell 2 starts the second row
        let rect = slice_to_rect(40, &SlicePos::Cell(2), GridSize::new(16, 16)).unwrap();
        assert_eq!(rect, Rect::new(0, 16, 16, 16));
    }

    #[test]
    fn test_zero_grid_is_invalid() {
        let err = slice_to_rect(32, &SlicePos::Cell(0), GridSize::new(0, 16)).unwrap_err();
        assert!(matches!(err, AssetError::InvalidGeometry(_)));
    }

    #[test]
    fn test_grid_wider_than_source_is_invalid() {
        let err = slice_to_rect(8, &SlicePos::Cell(0), GridSize::new(16, 16)).unwrap_err();
        assert!(matches!(err, AssetError::InvalidGeometry(_)));
    }

    #[test]
    fn test_reversed_span_is_invalid() {
        let err = slice_to_rect(64, &SlicePos::Cells(vec![3, 1]), GridSize::new(16, 16)).unwrap_err();
        assert!(matches!(err, AssetError::InvalidGeometry(_)));
    }

    #[test]
    fn test_empty_pos_list_is_invalid() {
        assert!(SlicePos::Cells(Vec::new()).cells().is_err());
    }

    #[test]
    fn test_cells_below_source_still_produce_rect() {
        // Row 3 of a 32x16 source is out of range but still addressable
        let rect = slice_to_rect(32, &SlicePos::Cell(6), GridSize::new(16, 16)).unwrap();
        assert_eq!(rect, Rect::new(0, 48, 16, 16));
        assert!(!rect.fits_within(32, 16));
    }

    #[test]
    fn test_rect_fits_within() {
        assert!(Rect::new(16, 0, 16, 16).fits_within(32, 16));
        assert!(!Rect::new(17, 0, 16, 16).fits_within(32, 16));
        assert!(Rect::from_size(32, 16).fits_within(32, 16));
    }

    #[test]
    fn test_slice_pos_deserialize() {
        let scalar: SlicePos = serde_json::from_str("4").unwrap();
        let pair: SlicePos = serde_json::from_str("[1, 3]").unwrap();
        assert_eq!(scalar.cells().unwrap(), (4, 4));
        assert_eq!(pair.cells().unwrap(), (1, 3));
    }

    #[test]
    fn test_grid_size_deserialize_from_pair() {
        let grid: GridSize = serde_json::from_str("[8, 12]").unwrap();
        assert_eq!(grid, GridSize::new(8, 12));
    }
}
