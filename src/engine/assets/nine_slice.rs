// Nine-slice decomposition

use super::{AssetError, NineSliceData, NineSliceSpec, Rasterizer};
use crate::core::Rect;
use glam::UVec2;
use image::RgbaImage;

/// The nine source rectangles of a nine-slice, row-major from top-left
///
/// Columns are `(left, center, right)` widths and rows `(top, center, bottom)`
/// heights, laid out by cumulative offset from `offset`.
pub fn nine_slice_rects(spec: &NineSliceSpec, offset: UVec2) -> [Rect; 9] {
    let columns = spec.columns();
    let rows = spec.rows();

    let col_x = [
        offset.x,
        offset.x.saturating_add(columns[0]),
        offset.x.saturating_add(columns[0]).saturating_add(columns[1]),
    ];
    let row_y = [
        offset.y,
        offset.y.saturating_add(rows[0]),
        offset.y.saturating_add(rows[0]).saturating_add(rows[1]),
    ];

    std::array::from_fn(|i| {
        let (row, col) = (i / 3, i % 3);
        Rect::new(col_x[col], row_y[row], columns[col], rows[row])
    })
}

/// Builds nine encoded fragments from a source image
pub struct NineSliceComposer<'a, R: Rasterizer> {
    rasterizer: &'a R,
}

impl<'a, R: Rasterizer> NineSliceComposer<'a, R> {
    pub fn new(rasterizer: &'a R) -> Self {
        Self { rasterizer }
    }

    /// Encode the nine pieces of `spec` starting at `offset`
    pub fn compose(
        &self,
        source: &RgbaImage,
        spec: &NineSliceSpec,
        offset: UVec2,
    ) -> Result<[String; 9], AssetError> {
        let (width, height) = spec.extent();
        let end = offset.as_u64vec2() + glam::U64Vec2::new(width, height);
        if end.x > u32::MAX as u64 || end.y > u32::MAX as u64 {
            return Err(AssetError::InvalidGeometry(format!(
                "nine-slice {}x{} at {} overflows pixel space",
                width, height, offset
            )));
        }

        let rects = nine_slice_rects(spec, offset);
        let mut fragments: [String; 9] = Default::default();
        for (fragment, rect) in fragments.iter_mut().zip(rects) {
            *fragment = self.rasterizer.encode(source, rect)?;
        }

        Ok(fragments)
    }

    /// Compose and bundle with the spec
    pub fn compose_data(
        &self,
        source: &RgbaImage,
        spec: &NineSliceSpec,
        offset: UVec2,
    ) -> Result<NineSliceData, AssetError> {
        let fragments = self.compose(source, spec, offset)?;
        Ok(NineSliceData {
            spec: spec.clone(),
            src: fragments.into(),
        })
    }
}
