//! Native converter: reads the notebook JSON directly.
//!
//! Nothing is executed; pages and resources reflect the outputs stored in the
//! notebook at save time.

use super::backend::{ConvertError, NotebookConverter};
use super::html::{self, HtmlOptions};
use super::resources::{self, ExtractedNotebook};
use crate::config::{self, GalleryConfig};
use crate::notebook::Notebook;
use std::path::Path;

const NOTEBOOK_CSS: &str = include_str!("../../static/notebook.css");

#[derive(Debug, Clone, Default)]
pub struct NativeConverter {
    options: HtmlOptions,
}

impl NativeConverter {
    pub fn new(config: &GalleryConfig) -> Self {
        let color_css = config::generate_color_css(&config.colors);
        Self {
            options: HtmlOptions {
                css: format!("{}\n\n{}", color_css, NOTEBOOK_CSS),
                mathjax: config.html.mathjax,
            },
        }
    }
}

impl NotebookConverter for NativeConverter {
    fn to_html(&self, path: &Path) -> Result<String, ConvertError> {
        let notebook = Notebook::from_path(path)?;
        let title = notebook.metadata.title.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        });
        Ok(html::render_notebook(&notebook, &title, &self.options).into_string())
    }

    fn extract_outputs(&self, path: &Path) -> Result<ExtractedNotebook, ConvertError> {
        let notebook = Notebook::from_path(path)?;
        resources::extract_outputs(&notebook)
    }
}
