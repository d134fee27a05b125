// Declarative image descriptors

use super::{AssetError, ImageVariant};
use crate::core::{GridSize, Rect, SlicePos};
use serde::{Deserialize, Serialize};

/// How the center and edge pieces of a nine-slice fill their area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    Repeat,
    Stretch,
}

/// Border measurements of a nine-slice, in source pixels
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NineSliceSpec {
    pub top_height: u32,
    pub center_height: u32,
    pub bottom_height: u32,
    pub left_width: u32,
    pub center_width: u32,
    pub right_width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixelated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
}

impl NineSliceSpec {
    /// Nine-slice with the given column widths and row heights
    pub fn new(columns: [u32; 3], rows: [u32; 3]) -> Self {
        Self {
            left_width: columns[0],
            center_width: columns[1],
            right_width: columns[2],
            top_height: rows[0],
            center_height: rows[1],
            bottom_height: rows[2],
            ..Default::default()
        }
    }

    /// Column widths, left to right
    pub fn columns(&self) -> [u32; 3] {
        [self.left_width, self.center_width, self.right_width]
    }

    /// Row heights, top to bottom
    pub fn rows(&self) -> [u32; 3] {
        [self.top_height, self.center_height, self.bottom_height]
    }

    /// Full width and height covered by the nine pieces
    pub fn extent(&self) -> (u64, u64) {
        let sum = |parts: [u32; 3]| parts.iter().map(|&p| p as u64).sum::<u64>();
        (sum(self.columns()), sum(self.rows()))
    }
}

/// Partial nine-slice, merged field-by-field over a parent spec
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NineSlicePatch {
    pub top_height: Option<u32>,
    pub center_height: Option<u32>,
    pub bottom_height: Option<u32>,
    pub left_width: Option<u32>,
    pub center_width: Option<u32>,
    pub right_width: Option<u32>,
    pub pixelated: Option<bool>,
    pub fill: Option<Fill>,
    pub scale: Option<String>,
}

impl NineSlicePatch {
    /// Overlay this patch on `base`; every measurement must end up present
    pub fn merge_over(&self, base: Option<&NineSliceSpec>) -> Result<NineSliceSpec, AssetError> {
        let pick = |patch: Option<u32>, from_base: Option<u32>, name: &str| {
            patch.or(from_base).ok_or_else(|| {
                AssetError::InvalidGeometry(format!("nine-slice is missing {}", name))
            })
        };

        Ok(NineSliceSpec {
            top_height: pick(self.top_height, base.map(|b| b.top_height), "topHeight")?,
            center_height: pick(self.center_height, base.map(|b| b.center_height), "centerHeight")?,
            bottom_height: pick(self.bottom_height, base.map(|b| b.bottom_height), "bottomHeight")?,
            left_width: pick(self.left_width, base.map(|b| b.left_width), "leftWidth")?,
            center_width: pick(self.center_width, base.map(|b| b.center_width), "centerWidth")?,
            right_width: pick(self.right_width, base.map(|b| b.right_width), "rightWidth")?,
            pixelated: self.pixelated.or(base.and_then(|b| b.pixelated)),
            fill: self.fill.or(base.and_then(|b| b.fill)),
            scale: self
                .scale
                .clone()
                .or_else(|| base.and_then(|b| b.scale.clone())),
        })
    }
}

impl From<NineSliceSpec> for NineSlicePatch {
    fn from(spec: NineSliceSpec) -> Self {
        Self {
            top_height: Some(spec.top_height),
            center_height: Some(spec.center_height),
            bottom_height: Some(spec.bottom_height),
            left_width: Some(spec.left_width),
            center_width: Some(spec.center_width),
            right_width: Some(spec.right_width),
            pixelated: spec.pixelated,
            fill: spec.fill,
            scale: spec.scale,
        }
    }
}

/// Nine-slice setting on a parse entry: `true` inherits the parent, an object overrides it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NineSliceOverride {
    Inherit(bool),
    Override(NineSlicePatch),
}

impl NineSliceOverride {
    /// Resolve against the parent descriptor's spec
    ///
    /// `Ok(None)` means no nine-slice should be composed.
    pub fn resolve(&self, parent: Option<&NineSliceSpec>) -> Result<Option<NineSliceSpec>, AssetError> {
        match self {
            NineSliceOverride::Inherit(false) => Ok(None),
            NineSliceOverride::Inherit(true) => Ok(parent.cloned()),
            NineSliceOverride::Override(patch) => patch.merge_over(parent).map(Some),
        }
    }
}

/// Nine-slice spec plus its nine encoded fragments, row-major from top-left
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NineSliceData {
    #[serde(flatten)]
    pub spec: NineSliceSpec,
    pub src: Vec<String>,
}

/// Grid slice addressing a block of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceSpec {
    pub pos: SlicePos,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridSize>,
}

impl SliceSpec {
    pub fn new(pos: impl Into<SlicePos>) -> Self {
        Self {
            pos: pos.into(),
            grid: None,
        }
    }

    pub fn with_grid(mut self, grid: GridSize) -> Self {
        self.grid = Some(grid);
        self
    }
}

/// Explicit pixel rectangle
pub type RectSpec = Rect;

/// A fragment derived from a parent image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDescriptor {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<SliceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<RectSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nine_slice: Option<NineSliceOverride>,
}

impl ParseDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            slice: None,
            rect: None,
            nine_slice: None,
        }
    }

    pub fn with_slice(mut self, slice: SliceSpec) -> Self {
        self.slice = Some(slice);
        self
    }

    pub fn with_rect(mut self, rect: RectSpec) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn with_nine_slice(mut self, nine_slice: NineSliceOverride) -> Self {
        self.nine_slice = Some(nine_slice);
        self
    }
}

/// A source image and everything derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub key: String,
    #[serde(rename = "url", alias = "sourceUrl")]
    pub source_url: String,
    #[serde(rename = "extruded", alias = "extrudedUrl", default, skip_serializing_if = "Option::is_none")]
    pub extruded_url: Option<String>,
    #[serde(rename = "normal", alias = "normalUrl", default, skip_serializing_if = "Option::is_none")]
    pub normal_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nine_slice: Option<NineSliceSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse: Vec<ParseDescriptor>,
}

impl ImageDescriptor {
    pub fn new(key: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source_url: source_url.into(),
            extruded_url: None,
            normal_url: None,
            grid: None,
            nine_slice: None,
            parse: Vec::new(),
        }
    }

    pub fn with_extruded(mut self, url: impl Into<String>) -> Self {
        self.extruded_url = Some(url.into());
        self
    }

    pub fn with_normal(mut self, url: impl Into<String>) -> Self {
        self.normal_url = Some(url.into());
        self
    }

    pub fn with_grid(mut self, grid: GridSize) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn with_nine_slice(mut self, spec: NineSliceSpec) -> Self {
        self.nine_slice = Some(spec);
        self
    }

    pub fn with_parse(mut self, parse: ParseDescriptor) -> Self {
        self.parse.push(parse);
        self
    }

    /// Every `(load key, url)` pair this descriptor asks the engine for
    pub fn load_requests(&self) -> Vec<(String, &str)> {
        ImageVariant::ALL
            .iter()
            .filter_map(|variant| {
                let url = match variant {
                    ImageVariant::Base => Some(self.source_url.as_str()),
                    ImageVariant::Extruded => self.extruded_url.as_deref(),
                    ImageVariant::Normal => self.normal_url.as_deref(),
                };
                url.map(|url| (variant.key_for(&self.key), url))
            })
            .collect()
    }
}
