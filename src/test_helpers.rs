//! Shared test utilities for the nbgallery test suite.
//!
//! Provides a gallery-root fixture, a builder for on-disk notebooks, and
//! small encoded images to embed in them.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = gallery_root();
//! NotebookBuilder::new()
//!     .markdown("# Flares")
//!     .png_output(&png_bytes(4, 4))
//!     .write(&tmp.path().join("tutorials/flares.ipynb"));
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

use crate::gallery::Section;

// =========================================================================
// Fixture setup
// =========================================================================

/// A temp gallery root containing the default reserved directories.
pub fn gallery_root() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("resources")).unwrap();
    std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
    tmp
}

/// Create `<root>/<section>/<stem>.ipynb` holding an empty notebook.
pub fn touch_notebook(root: &Path, section: &str, stem: &str) {
    NotebookBuilder::new().write(&root.join(section).join(format!("{stem}.ipynb")));
}

/// Section names in discovery order.
pub fn section_names(sections: &[Section]) -> Vec<&str> {
    sections.iter().map(|s| s.name.as_str()).collect()
}

// =========================================================================
// Images
// =========================================================================

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

// =========================================================================
// Notebooks
// =========================================================================

/// Builds an nbformat 4 notebook. Every output method appends a new code
/// cell holding that single output.
#[derive(Default)]
pub struct NotebookBuilder {
    cells: Vec<Value>,
}

impl NotebookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markdown(mut self, source: &str) -> Self {
        self.cells.push(json!({
            "cell_type": "markdown",
            "metadata": {},
            "source": source,
        }));
        self
    }

    pub fn text_output(self, text: &str) -> Self {
        self.code_cell(json!({
            "output_type": "stream",
            "name": "stdout",
            "text": text,
        }))
    }

    pub fn png_output(self, bytes: &[u8]) -> Self {
        self.display("image/png", bytes)
    }

    pub fn jpeg_output(self, bytes: &[u8]) -> Self {
        self.display("image/jpeg", bytes)
    }

    fn display(self, mime: &str, bytes: &[u8]) -> Self {
        self.code_cell(json!({
            "output_type": "display_data",
            "metadata": {},
            "data": {
                mime: STANDARD.encode(bytes),
                "text/plain": "<Figure>",
            },
        }))
    }

    fn code_cell(mut self, output: Value) -> Self {
        let count = self.cells.len() + 1;
        self.cells.push(json!({
            "cell_type": "code",
            "execution_count": count,
            "metadata": {},
            "source": "plot()",
            "outputs": [output],
        }));
        self
    }

    pub fn to_json(&self) -> String {
        json!({
            "cells": self.cells,
            "metadata": {
                "kernelspec": {"name": "python3", "display_name": "Python 3", "language": "python"},
            },
            "nbformat": 4,
            "nbformat_minor": 5,
        })
        .to_string()
    }

    /// Write the notebook, creating parent directories.
    pub fn write(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, self.to_json()).unwrap();
    }
}
