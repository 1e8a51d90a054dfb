//! Jupyter notebook document model.
//!
//! Notebooks are JSON documents. This module deserializes the nbformat v4
//! layout directly and upgrades nbformat v3 documents (the layout written by
//! IPython 1.x and 2.x) into the same in-memory model before deserializing.
//!
//! ## nbformat v4
//!
//! ```text
//! {
//!   "cells": [
//!     {"cell_type": "markdown", "source": "# Title"},
//!     {"cell_type": "code", "execution_count": 1, "source": ["plot()"],
//!      "outputs": [{"output_type": "display_data",
//!                   "data": {"image/png": "iVBORw0..."}}]}
//!   ],
//!   "metadata": {"kernelspec": {...}, "language_info": {"name": "python"}},
//!   "nbformat": 4,
//!   "nbformat_minor": 5
//! }
//! ```
//!
//! ## nbformat v3
//!
//! Cells live under `worksheets[].cells`, code cells carry `input` and
//! `prompt_number`, outputs use `pyout`/`pyerr` and short mime keys
//! (`png`, `jpeg`, `text`, ...). Headings are a separate cell type. All of
//! this is rewritten to the v4 shape by [`upgrade_v3`].
//!
//! Multiline fields (`source`, stream `text`, mime payloads) may be either a
//! single string or a list of strings; both are joined into one `String`.

use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported nbformat version: {0}")]
    UnsupportedVersion(u64),
    #[error("Malformed notebook: {0}")]
    Malformed(String),
}

/// Output data keyed by mime type (`image/png`, `text/plain`, ...).
///
/// Values stay as raw JSON: text payloads are strings or string lists,
/// `application/json` payloads are arbitrary objects.
pub type MimeBundle = BTreeMap<String, Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: NotebookMetadata,
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub kernelspec: Option<KernelSpec>,
    #[serde(default)]
    pub language_info: Option<LanguageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KernelSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageInfo {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Markdown {
        #[serde(default, deserialize_with = "multiline")]
        source: String,
        #[serde(default)]
        attachments: BTreeMap<String, MimeBundle>,
    },
    Code {
        #[serde(default, deserialize_with = "multiline")]
        source: String,
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    Raw {
        #[serde(default, deserialize_with = "multiline")]
        source: String,
        #[serde(default)]
        metadata: RawCellMetadata,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCellMetadata {
    /// Target mime type of a raw cell (`text/html`, `text/latex`, ...).
    #[serde(default, alias = "raw_mimetype")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        #[serde(default = "default_stream_name")]
        name: String,
        #[serde(default, deserialize_with = "multiline")]
        text: String,
    },
    DisplayData {
        #[serde(default)]
        data: MimeBundle,
    },
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        data: MimeBundle,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl Output {
    /// Rich data of display and execute-result outputs.
    pub fn data(&self) -> Option<&MimeBundle> {
        match self {
            Output::DisplayData { data } | Output::ExecuteResult { data, .. } => Some(data),
            _ => None,
        }
    }
}

fn default_stream_name() -> String {
    "stdout".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Multiline {
    Single(String),
    Lines(Vec<String>),
}

fn multiline<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Multiline::deserialize(deserializer)? {
        Multiline::Single(s) => s,
        Multiline::Lines(lines) => lines.concat(),
    })
}

/// Join a mime payload into text.
///
/// Strings and string lists are concatenated; any other JSON value (the
/// `application/json` case) is serialized.
pub fn bundle_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .concat(),
        other => other.to_string(),
    }
}

impl Notebook {
    pub fn from_path(path: &Path) -> Result<Self, NotebookError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, NotebookError> {
        let value: Value = serde_json::from_str(content)?;
        let version = value
            .get("nbformat")
            .and_then(Value::as_u64)
            .ok_or_else(|| NotebookError::Malformed("missing nbformat".into()))?;
        let value = match version {
            4 => value,
            3 => upgrade_v3(value)?,
            other => return Err(NotebookError::UnsupportedVersion(other)),
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Kernel language, used as the code block language class.
    pub fn language(&self) -> &str {
        self.metadata
            .language_info
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .or_else(|| {
                self.metadata
                    .kernelspec
                    .as_ref()
                    .and_then(|k| k.language.as_deref())
            })
            .unwrap_or("python")
    }
}

// =============================================================================
// nbformat v3 upgrade
// =============================================================================

/// Short v3 output keys and the mime types they became in v4.
const V3_MIME_KEYS: &[(&str, &str)] = &[
    ("text", "text/plain"),
    ("html", "text/html"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpeg", "image/jpeg"),
    ("latex", "text/latex"),
    ("json", "application/json"),
    ("javascript", "application/javascript"),
    ("pdf", "application/pdf"),
];

/// Rewrite an nbformat v3 document into the v4 layout.
fn upgrade_v3(notebook: Value) -> Result<Value, NotebookError> {
    let mut cells = Vec::new();
    let worksheets = notebook
        .get("worksheets")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for worksheet in worksheets {
        let ws_cells = worksheet
            .get("cells")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for cell in ws_cells {
            cells.push(upgrade_cell_v3(cell)?);
        }
    }

    let mut metadata = notebook.get("metadata").cloned().unwrap_or_else(|| json!({}));
    if let Some(map) = metadata.as_object_mut()
        && !map.contains_key("title")
        && let Some(name) = map.get("name").and_then(Value::as_str).filter(|n| !n.is_empty())
    {
        let name = name.to_string();
        map.insert("title".into(), Value::String(name));
    }

    Ok(json!({
        "cells": cells,
        "metadata": metadata,
        "nbformat": 4,
        "nbformat_minor": 0,
    }))
}

fn upgrade_cell_v3(cell: &Value) -> Result<Value, NotebookError> {
    let cell_type = cell
        .get("cell_type")
        .and_then(Value::as_str)
        .ok_or_else(|| NotebookError::Malformed("cell without cell_type".into()))?;
    let source = |key: &str| cell.get(key).map(bundle_text).unwrap_or_default();

    match cell_type {
        "code" => {
            let outputs = cell
                .get("outputs")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .map(upgrade_output_v3)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(json!({
                "cell_type": "code",
                "source": source("input"),
                "execution_count": cell.get("prompt_number").cloned().unwrap_or(Value::Null),
                "outputs": outputs,
            }))
        }
        "markdown" => Ok(json!({"cell_type": "markdown", "source": source("source")})),
        "heading" => {
            let level = cell
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6) as usize;
            let heading = format!("{} {}", "#".repeat(level), source("source").trim());
            Ok(json!({"cell_type": "markdown", "source": heading}))
        }
        "raw" => Ok(json!({"cell_type": "raw", "source": source("source")})),
        other => Err(NotebookError::Malformed(format!(
            "unknown v3 cell type: {other}"
        ))),
    }
}

fn upgrade_output_v3(output: &Value) -> Result<Value, NotebookError> {
    let output_type = output
        .get("output_type")
        .and_then(Value::as_str)
        .ok_or_else(|| NotebookError::Malformed("output without output_type".into()))?;

    let data = || {
        let mut bundle = serde_json::Map::new();
        for (short, mime) in V3_MIME_KEYS {
            if let Some(value) = output.get(*short) {
                bundle.insert((*mime).to_string(), value.clone());
            }
        }
        Value::Object(bundle)
    };

    match output_type {
        "pyout" => Ok(json!({
            "output_type": "execute_result",
            "execution_count": output.get("prompt_number").cloned().unwrap_or(Value::Null),
            "data": data(),
        })),
        "display_data" => Ok(json!({"output_type": "display_data", "data": data()})),
        "stream" => Ok(json!({
            "output_type": "stream",
            "name": output.get("stream").and_then(Value::as_str).unwrap_or("stdout"),
            "text": output.get("text").map(bundle_text).unwrap_or_default(),
        })),
        "pyerr" => Ok(json!({
            "output_type": "error",
            "ename": output.get("ename").cloned().unwrap_or_else(|| json!("")),
            "evalue": output.get("evalue").cloned().unwrap_or_else(|| json!("")),
            "traceback": output.get("traceback").cloned().unwrap_or_else(|| json!([])),
        })),
        other => Err(NotebookError::Malformed(format!(
            "unknown v3 output type: {other}"
        ))),
    }
}
