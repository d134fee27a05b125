// Engine modules: image assets and the host boundary

pub mod assets;
pub mod host;
