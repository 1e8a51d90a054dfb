//! The gallery manifest (`gallery.json`).
//!
//! ```json
//! {
//!   "meta": {"sunpy": "0.4.0"},
//!   "sections": {
//!     "gallery": ["b"],
//!     "tutorials": ["a"]
//!   }
//! }
//! ```
//!
//! Section keys serialize in sorted order. Entry lists keep discovery order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub meta: Meta,
    pub sections: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Version of the tool the notebooks were written against.
    #[serde(rename = "sunpy")]
    pub tool_version: String,
}

impl Gallery {
    pub fn new(tool_version: impl Into<String>) -> Self {
        Self {
            meta: Meta {
                tool_version: tool_version.into(),
            },
            sections: BTreeMap::new(),
        }
    }

    /// Total number of entries across all sections.
    pub fn entry_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
