//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! ========================================
//! Processing section: gallery
//! ========================================
//! --> b.ipynb
//!     HTML: b.html
//!     Thumbnail: b.png (output_3_0.png, 640x480)
//! --> broken.ipynb
//!     FAILED: HTML export failed: ...
//!
//! Wrote gallery.json: 2 sections, 5 entries
//! ```
//!
//! ## Check
//!
//! ```text
//! gallery (2 notebooks)
//!     b.ipynb
//!     c.ipynb
//! tutorials (1 notebook)
//!     a.ipynb
//!
//! Reserved: resources, .git
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::GalleryConfig;
use crate::gallery::{BuildEvent, BuildReport, Section};
use crate::thumbnail::Thumbnail;
use std::path::Path;

const RULE_WIDTH: usize = 40;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Thumbnail context: written file, source resource, and dimensions if known.
fn thumbnail_line(thumbnail: &Thumbnail) -> String {
    let detail = match thumbnail.dimensions {
        Some(d) => format!("{}, {}x{}", thumbnail.resource, d.width, d.height),
        None => thumbnail.resource.clone(),
    };
    format!(
        "{}Thumbnail: {} ({})",
        indent(1),
        file_name(&thumbnail.path),
        detail
    )
}

// ============================================================================
// Build output
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::SectionStarted { name, .. } => vec![
            rule(),
            format!("Processing section: {name}"),
            rule(),
        ],
        BuildEvent::EntryStarted { file, .. } => vec![format!("--> {file}")],
        BuildEvent::EntryBuilt {
            html, thumbnail, ..
        } => vec![
            format!("{}HTML: {}", indent(1), file_name(html)),
            thumbnail_line(thumbnail),
        ],
        BuildEvent::EntryFailed { error, .. } => {
            vec![format!("{}FAILED: {}", indent(1), error)]
        }
        BuildEvent::ManifestWritten {
            path,
            sections,
            entries,
        } => vec![
            String::new(),
            format!(
                "Wrote {}: {}, {}",
                file_name(path),
                plural(*sections, "section", "sections"),
                plural(*entries, "entry", "entries")
            ),
        ],
    }
}

/// Format the failure list of an unsuccessful build.
pub fn format_failures(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![String::new(), format!("Build failed: {report}")];
    for failure in &report.failures {
        lines.push(format!("{}{}/{}", indent(1), failure.section, failure.entry));
        lines.push(format!("{}{}", indent(2), failure.error));
    }
    lines.push("No manifest written".to_string());
    lines
}

pub fn print_failures(report: &BuildReport) {
    for line in format_failures(report) {
        eprintln!("{line}");
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the planned gallery layout.
pub fn format_check_output(sections: &[Section], config: &GalleryConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for section in sections {
        lines.push(format!(
            "{} ({})",
            section.name,
            plural(section.notebooks.len(), "notebook", "notebooks")
        ));
        for notebook in &section.notebooks {
            lines.push(format!("{}{}", indent(1), file_name(notebook)));
        }
    }
    if sections.is_empty() {
        lines.push("No sections".to_string());
    }
    lines.push(String::new());
    lines.push(format!("Reserved: {}", config.reserved_dirs.join(", ")));
    lines
}

pub fn print_check_output(sections: &[Section], config: &GalleryConfig) {
    for line in format_check_output(sections, config) {
        println!("{line}");
    }
}
