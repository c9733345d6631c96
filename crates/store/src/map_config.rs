//! Map configuration loader.

use std::path::Path;

use eagleeye_core::map::MapConfig;

use crate::error::StoreError;

/// Read and parse the map configuration document at `path`.
///
/// Geometry is not validated here; build a
/// [`CoordinateMapper`](eagleeye_core::map::CoordinateMapper) from the result
/// to reject degenerate maps.
pub fn load_map_config(path: &Path) -> Result<MapConfig, StoreError> {
    let raw = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let config: MapConfig = serde_json::from_str(&raw).map_err(|e| StoreError::json(path, e))?;
    tracing::info!(
        path = %path.display(),
        name = %config.name,
        cameras = config.cameras.len(),
        "Map config loaded"
    );
    Ok(config)
}
