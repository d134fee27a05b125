// Core geometry shared by the asset pipeline

pub mod region;

pub use region::{slice_to_rect, GridSize, Rect, SlicePos};
