// Nine-slice display nodes

use crate::engine::assets::NineSliceSpec;
use glam::Vec2;

/// Where a nine-slice node is placed and how large it is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for NodePlacement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }
}

/// One destination rectangle of a nine-slice node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NinePatch {
    pub position: Vec2,
    pub size: Vec2,
}

/// A renderable nine-slice over a registered texture
#[derive(Debug, Clone, PartialEq)]
pub struct NineSliceNode {
    /// Texture key the node samples from
    pub texture: String,
    /// Top-left corner
    pub position: Vec2,
    /// Drawn size in pixels
    pub size: Vec2,
    pub left_width: f32,
    pub right_width: f32,
    pub top_height: f32,
    pub bottom_height: f32,
}

impl NineSliceNode {
    pub fn new(texture: impl Into<String>, placement: NodePlacement, spec: &NineSliceSpec) -> Self {
        Self {
            texture: texture.into(),
            position: Vec2::new(placement.x, placement.y),
            size: Vec2::new(placement.width, placement.height),
            left_width: spec.left_width as f32,
            right_width: spec.right_width as f32,
            top_height: spec.top_height as f32,
            bottom_height: spec.bottom_height as f32,
        }
    }

    /// Destination rectangles, row-major from top-left
    ///
    /// Corners keep their border size and the center absorbs the rest. When
    /// the node is smaller than its borders, both borders on that axis shrink
    /// proportionally and the center collapses to zero.
    pub fn patches(&self) -> [NinePatch; 9] {
        let columns = split_axis(self.size.x, self.left_width, self.right_width);
        let rows = split_axis(self.size.y, self.top_height, self.bottom_height);

        let col_x = [0.0, columns[0], columns[0] + columns[1]];
        let row_y = [0.0, rows[0], rows[0] + rows[1]];

        std::array::from_fn(|i| {
            let (row, col) = (i / 3, i % 3);
            NinePatch {
                position: self.position + Vec2::new(col_x[col], row_y[row]),
                size: Vec2::new(columns[col], rows[row]),
            }
        })
    }
}

fn split_axis(length: f32, start: f32, end: f32) -> [f32; 3] {
    let borders = start + end;
    if borders > length && borders > 0.0 {
        let scale = length / borders;
        [start * scale, 0.0, end * scale]
    } else {
        [start, length - borders, end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn node(width: f32, height: f32) -> NineSliceNode {
        let spec = NineSliceSpec::new([4, 8, 6], [2, 8, 4]);
        NineSliceNode::new(
            "panel",
            NodePlacement {
                x: 10.0,
                y: 20.0,
                width,
                height,
            },
            &spec,
        )
    }

    #[test]
    fn test_default_placement() {
        let placement = NodePlacement::default();
        assert_eq!(placement.width, 100.0);
        assert_eq!(placement.height, 100.0);
    }

    #[test]
    fn test_center_stretches() {
        let patches = node(100.0, 50.0).patches();

        assert_eq!(patches[0].position, Vec2::new(10.0, 20.0));
        assert_eq!(patches[0].size, Vec2::new(4.0, 2.0));
        assert_relative_eq!(patches[4].size.x, 90.0);
        assert_relative_eq!(patches[4].size.y, 44.0);
        assert_relative_eq!(patches[8].position.x, 10.0 + 94.0);
        assert_relative_eq!(patches[8].position.y, 20.0 + 46.0);
    }

    #[test]
    fn test_patches_cover_node() {
        let n = node(37.0, 19.0);
        let area: f32 = n.patches().iter().map(|p| p.size.x * p.size.y).sum();
        assert_relative_eq!(area, 37.0 * 19.0, epsilon = 1e-3);
    }

    #[test]
    fn test_small_node_shrinks_borders() {
        let patches = node(5.0, 6.0).patches();

        // 4 + 6 borders squeezed into 5 pixels
        assert_relative_eq!(patches[0].size.x, 2.0);
        assert_relative_eq!(patches[1].size.x, 0.0);
        assert_relative_eq!(patches[2].size.x, 3.0);
        // 2 + 4 borders fit exactly in 6
        assert_relative_eq!(patches[4].size.y, 0.0);
        assert_relative_eq!(patches[6].size.y, 4.0);
    }
}
