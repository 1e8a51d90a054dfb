//! Conversion trait and shared error type.
//!
//! The [`NotebookConverter`] trait defines the two exports the gallery builder
//! needs from a notebook: a full HTML page and the extracted output resources.
//!
//! The production implementation is
//! [`NativeConverter`](super::native::NativeConverter). Tests use the mock
//! converter in this module, which records calls and serves canned outputs.

use super::resources::ExtractedNotebook;
use crate::notebook::NotebookError;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Notebook(#[from] NotebookError),
    #[error("Invalid base64 payload in {resource}: {source}")]
    Base64 {
        resource: String,
        source: base64::DecodeError,
    },
}

/// Trait for notebook conversion backends.
pub trait NotebookConverter {
    /// Render a notebook as a complete, standalone HTML document.
    fn to_html(&self, path: &Path) -> Result<String, ConvertError>;

    /// Run the secondary exporter: a markdown body plus every extracted
    /// output resource, in notebook order.
    fn extract_outputs(&self, path: &Path) -> Result<ExtractedNotebook, ConvertError>;
}
