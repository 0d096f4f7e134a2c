//! The human-readable asset file.
//!
//! One JSON file per asset, at `content_root/<resource path>`:
//!
//! ```json
//! { "type": "Texture", "attributes": { "types": [...], "values": { ... } } }
//! ```

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AssetError, AssetResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDocument {
    /// Registered name of the asset type.
    #[serde(rename = "type")]
    pub asset_type: String,
    /// Output of [`crate::AttributeRegistry::save_blackboard`].
    #[serde(default)]
    pub attributes: Value,
}

impl AssetDocument {
    /// Parse a document. `origin` names the file in error messages.
    pub fn from_slice(bytes: &[u8], origin: &Path) -> AssetResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| AssetError::serialization(format!("asset file '{}'", origin.display()), e))
    }

    /// Read the document at `file`. Returns `Ok(None)` if the file does not exist.
    pub fn read(file: &Path) -> AssetResult<Option<Self>> {
        match std::fs::read(file) {
            Ok(bytes) => Self::from_slice(&bytes, file).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AssetError::io(file, e)),
        }
    }

    /// Write the document to `file`, creating parent directories as needed.
    pub fn write(&self, file: &Path) -> AssetResult<()> {
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
        }
        let text = serde_json::to_vec_pretty(self)
            .map_err(|e| AssetError::serialization(format!("asset file '{}'", file.display()), e))?;
        std::fs::write(file, text).map_err(|e| AssetError::io(file, e))
    }
}
