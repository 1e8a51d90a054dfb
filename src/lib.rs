//! # nbgallery
//!
//! Builds a browsable gallery from a directory of Jupyter notebooks. Every
//! top-level directory is a section, every notebook inside it becomes a
//! standalone HTML page plus a thumbnail, and a JSON manifest lists the
//! result for the gallery front end.
//!
//! # Build Flow
//!
//! ```text
//! root/            discover   sections + notebooks (reserved dirs must exist)
//! X.ipynb    →     convert    X.html               (full page, inline images)
//! X.ipynb    →     extract    X.png | X.jpg        (last image output, verbatim)
//! all OK     →     manifest   root/gallery.json
//! ```
//!
//! Notebooks are converted one at a time. Failures are collected per entry;
//! the manifest is only written when every entry succeeded.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gallery`] | Discovery, per-entry build loop, failure report, build events |
//! | [`notebook`] | nbformat model, v3 upgrade, multiline text handling |
//! | [`convert`] | `NotebookConverter` trait, native HTML renderer, output extraction |
//! | [`thumbnail`] | Last-image selection and verbatim write |
//! | [`manifest`] | `gallery.json` model, write and read-back |
//! | [`version`] | Tool version for the manifest `meta` block |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation, CSS |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Deterministic "Last Image"
//!
//! Extracted outputs are named `output_<cell>_<output>.<ext>`. The thumbnail is
//! the candidate with the largest `(cell, output)` pair compared numerically,
//! never by directory listing order, so repeated builds pick the same image.
//!
//! ## No Working Directory Changes
//!
//! Every path is composed from the gallery root. The library never calls
//! `set_current_dir`, so it can run inside a larger process or a test harness.
//!
//! ## Maud For Pages
//!
//! Notebook pages are rendered with [Maud](https://maud.lambda.xyz/). Notebook
//! text is escaped by default; only rendered markdown, `text/html` outputs,
//! and SVG are inserted as markup.

pub mod config;
pub mod convert;
pub mod gallery;
pub mod manifest;
pub mod notebook;
pub mod output;
pub mod thumbnail;
pub mod version;

#[cfg(test)]
pub(crate) mod test_helpers;
