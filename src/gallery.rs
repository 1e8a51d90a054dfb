//! Gallery build.
//!
//! Walks the gallery root, converts every notebook, and writes the manifest.
//!
//! ## Directory Structure
//!
//! ```text
//! gallery-root/
//! ├── config.toml             # Optional configuration
//! ├── resources/              # Reserved (must exist, never a section)
//! ├── .git/                   # Reserved (must exist, never a section)
//! ├── tutorials/              # Section
//! │   ├── a.ipynb
//! │   ├── a.html              # ← written
//! │   └── a.jpg               # ← written (last image output)
//! └── gallery/                # Section
//!     ├── b.ipynb
//!     ├── b.html              # ← written
//!     └── b.png               # ← written
//! ```
//!
//! and `gallery-root/gallery.json` once every notebook has been converted.
//!
//! ## Failure handling
//!
//! A missing reserved directory aborts before anything is converted.
//! Per-notebook failures are collected into a [`BuildReport`]; with
//! `build.keep_going` the remaining notebooks are still converted. Any
//! failure means no manifest is written. A manifest left by an earlier run is
//! removed once discovery succeeds, so a `gallery.json` on disk always
//! describes a complete gallery. Artifacts of notebooks converted before the
//! failure stay on disk.
//!
//! Dangling symlinks in the root or a section are skipped.
//!
//! Paths are composed from the root; the process working directory is never
//! changed.

use crate::config::GalleryConfig;
use crate::convert::{ConvertError, NativeConverter, NotebookConverter};
use crate::manifest::{Gallery, ManifestError};
use crate::thumbnail::{self, Thumbnail, ThumbnailError};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Missing expected directory: {0}")]
    MissingReservedDir(String),
    #[error("{report}")]
    Failed { report: BuildReport },
}

/// Failure of a single notebook.
#[derive(Error, Debug)]
pub enum EntryError {
    #[error("HTML export failed: {0}")]
    Convert(#[from] ConvertError),
    #[error("Thumbnail extraction failed: {0}")]
    Thumbnail(#[from] ThumbnailError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A section directory discovered in the gallery root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub path: PathBuf,
    /// Notebook files in discovery order.
    pub notebooks: Vec<PathBuf>,
}

/// Progress events emitted while building.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    SectionStarted {
        name: String,
        notebooks: usize,
    },
    EntryStarted {
        section: String,
        file: String,
    },
    EntryBuilt {
        section: String,
        entry: String,
        html: PathBuf,
        thumbnail: Thumbnail,
    },
    EntryFailed {
        section: String,
        entry: String,
        error: String,
    },
    ManifestWritten {
        path: PathBuf,
        sections: usize,
        entries: usize,
    },
}

/// A successfully converted notebook.
#[derive(Debug, Clone)]
pub struct BuiltEntry {
    pub section: String,
    pub entry: String,
    pub html: PathBuf,
    pub thumbnail: Thumbnail,
}

/// A notebook that failed to convert.
#[derive(Debug)]
pub struct EntryFailure {
    pub section: String,
    pub entry: String,
    pub notebook: PathBuf,
    pub error: EntryError,
}

/// Per-entry outcomes of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub built: Vec<BuiltEntry>,
    pub failures: Vec<EntryFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.built.len() + self.failures.len();
        write!(
            f,
            "{} of {} notebooks failed to build",
            self.failures.len(),
            total
        )
    }
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildOutput {
    pub gallery: Gallery,
    pub manifest_path: PathBuf,
    pub report: BuildReport,
}

/// Build the gallery with the native converter.
pub fn build(
    root: &Path,
    config: &GalleryConfig,
    tool_version: &str,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildOutput, BuildError> {
    let converter = NativeConverter::new(config);
    build_with_converter(&converter, root, config, tool_version, events)
}

/// Build the gallery using a specific converter (allows testing with mock).
pub fn build_with_converter(
    converter: &impl NotebookConverter,
    root: &Path,
    config: &GalleryConfig,
    tool_version: &str,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildOutput, BuildError> {
    let emit = |event: BuildEvent| {
        if let Some(tx) = &events {
            // A dropped receiver only loses progress output
            tx.send(event).ok();
        }
    };

    let sections = discover(root, config)?;
    let manifest_path = root.join(&config.manifest_file);
    remove_stale_manifest(&manifest_path)?;
    let mut gallery = Gallery::new(tool_version);
    let mut report = BuildReport::default();

    for section in &sections {
        emit(BuildEvent::SectionStarted {
            name: section.name.clone(),
            notebooks: section.notebooks.len(),
        });
        let entries = gallery.sections.entry(section.name.clone()).or_default();

        for notebook in &section.notebooks {
            let entry = entry_name(notebook);
            entries.push(entry.clone());
            emit(BuildEvent::EntryStarted {
                section: section.name.clone(),
                file: file_name(notebook),
            });

            match build_entry(converter, notebook, config) {
                Ok((html, thumbnail)) => {
                    emit(BuildEvent::EntryBuilt {
                        section: section.name.clone(),
                        entry: entry.clone(),
                        html: html.clone(),
                        thumbnail: thumbnail.clone(),
                    });
                    report.built.push(BuiltEntry {
                        section: section.name.clone(),
                        entry,
                        html,
                        thumbnail,
                    });
                }
                Err(error) => {
                    emit(BuildEvent::EntryFailed {
                        section: section.name.clone(),
                        entry: entry.clone(),
                        error: error.to_string(),
                    });
                    report.failures.push(EntryFailure {
                        section: section.name.clone(),
                        entry,
                        notebook: notebook.clone(),
                        error,
                    });
                    if !config.build.keep_going {
                        return Err(BuildError::Failed { report });
                    }
                }
            }
        }
    }

    if !report.is_success() {
        return Err(BuildError::Failed { report });
    }

    gallery.write(&manifest_path)?;
    emit(BuildEvent::ManifestWritten {
        path: manifest_path.clone(),
        sections: gallery.sections.len(),
        entries: gallery.entry_count(),
    });

    Ok(BuildOutput {
        gallery,
        manifest_path,
        report,
    })
}

/// Convert one notebook: HTML page first, then the thumbnail.
fn build_entry(
    converter: &impl NotebookConverter,
    notebook: &Path,
    config: &GalleryConfig,
) -> Result<(PathBuf, Thumbnail), EntryError> {
    let html = render_html(converter, notebook)?;
    let thumbnail =
        thumbnail::extract_thumbnail(converter, notebook, &config.thumbnails.extensions)?;
    Ok((html, thumbnail))
}

/// Render a notebook to `<stem>.html` beside it.
pub fn render_html(
    converter: &impl NotebookConverter,
    notebook: &Path,
) -> Result<PathBuf, EntryError> {
    let body = converter.to_html(notebook)?;
    let path = notebook.with_extension("html");
    fs::write(&path, body)?;
    Ok(path)
}

/// Planned gallery layout without converting anything.
///
/// Applies the same reserved-directory check and discovery as [`build`].
pub fn check(root: &Path, config: &GalleryConfig) -> Result<Vec<Section>, BuildError> {
    discover(root, config)
}

/// List sections and their notebooks.
pub fn discover(root: &Path, config: &GalleryConfig) -> Result<Vec<Section>, BuildError> {
    let dirs = list_dirs(root)?;

    for reserved in &config.reserved_dirs {
        if !dirs.contains_key(reserved) {
            return Err(BuildError::MissingReservedDir(reserved.clone()));
        }
    }

    dirs.into_iter()
        .filter(|(name, _)| !config.reserved_dirs.contains(name))
        .map(|(name, path)| {
            let notebooks = list_notebooks(&path, &config.notebook_extension)?;
            Ok(Section {
                name,
                path,
                notebooks,
            })
        })
        .collect()
}

fn remove_stale_manifest(path: &Path) -> Result<(), BuildError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Immediate children of `dir`, symlinks followed, sorted by name.
///
/// Links whose target is missing are left out.
fn list_children(dir: &Path) -> Result<Vec<DirEntry>, BuildError> {
    let mut children = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => children.push(entry),
            Err(e) if is_dangling_link(&e) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(children)
}

fn is_dangling_link(error: &walkdir::Error) -> bool {
    let not_found = error
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
    let is_link = error
        .path()
        .and_then(|p| p.symlink_metadata().ok())
        .is_some_and(|m| m.file_type().is_symlink());
    not_found && is_link
}

/// Immediate subdirectories of `root`, keyed by name.
fn list_dirs(root: &Path) -> Result<BTreeMap<String, PathBuf>, BuildError> {
    Ok(list_children(root)?
        .into_iter()
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| {
            (
                entry.file_name().to_string_lossy().to_string(),
                entry.into_path(),
            )
        })
        .collect())
}

/// Non-hidden files in `dir` with the notebook extension, sorted by name.
fn list_notebooks(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, BuildError> {
    Ok(list_children(dir)?
        .into_iter()
        .filter(|entry| {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            let matches = entry.path().extension().is_some_and(|e| e == extension);
            entry.file_type().is_file() && !hidden && matches
        })
        .map(DirEntry::into_path)
        .collect())
}

/// Entry name: the notebook file name without its extension.
pub fn entry_name(notebook: &Path) -> String {
    notebook
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
