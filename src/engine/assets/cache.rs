// Keyed stores for derived artifacts

use super::{AssetError, ImageVariant, NineSliceData};
use log::warn;
use std::collections::HashMap;

/// Encoded images and nine-slice data, keyed by asset key
///
/// Keys are shared between whole images and parse fragments and must be
/// unique across both.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    images: HashMap<String, String>,
    nine_slices: HashMap<String, NineSliceData>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_image(&mut self, key: impl Into<String>, encoded: String) {
        let key = key.into();
        if self.images.insert(key.clone(), encoded).is_some() {
            warn!("Replaced cached image for {}", key);
        }
    }

    pub fn insert_nine_slice(&mut self, key: impl Into<String>, data: NineSliceData) {
        let key = key.into();
        if self.nine_slices.insert(key.clone(), data).is_some() {
            warn!("Replaced cached nine-slice for {}", key);
        }
    }

    /// Encoded image for a key
    pub fn get(&self, key: &str) -> Result<&str, AssetError> {
        self.images
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| AssetError::NotFound(key.to_string()))
    }

    /// Encoded image for a variant of a key
    pub fn get_variant(&self, key: &str, variant: ImageVariant) -> Result<&str, AssetError> {
        self.get(&variant.key_for(key))
    }

    pub fn get_nine_slice(&self, key: &str) -> Result<&NineSliceData, AssetError> {
        self.nine_slices
            .get(key)
            .ok_or_else(|| AssetError::NotFound(key.to_string()))
    }

    /// Remove a key, its `_extruded` and `_normal` variants, and its nine-slice
    ///
    /// Returns the number of entries dropped.
    pub fn remove(&mut self, key: &str) -> usize {
        let images = ImageVariant::ALL
            .iter()
            .filter(|variant| self.images.remove(&variant.key_for(key)).is_some())
            .count();
        images + usize::from(self.nine_slices.remove(key).is_some())
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.nine_slices.clear();
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.nine_slices.is_empty()
    }

    pub fn images(&self) -> impl Iterator<Item = (&str, &str)> {
        self.images.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn nine_slices(&self) -> impl Iterator<Item = (&str, &NineSliceData)> {
        self.nine_slices.iter().map(|(k, v)| (k.as_str(), v))
    }
}
