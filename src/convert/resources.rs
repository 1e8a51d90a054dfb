//! Secondary exporter: output extraction.
//!
//! Produces a markdown rendition of the notebook in which every image-like
//! output is replaced by a reference to an extracted resource, plus the
//! resources themselves. Resource names follow the
//! `output_<cell index>_<output index>.<ext>` convention, where the cell index
//! counts every cell (markdown and raw included) from zero.
//!
//! ## Extracted mime types
//!
//! | Mime type | Extension | Payload |
//! |---|---|---|
//! | `image/svg+xml` | `svg` | UTF-8 text |
//! | `application/pdf` | `pdf` | base64 |
//! | `image/jpeg` | `jpg` | base64 |
//! | `image/png` | `png` | base64 |
//!
//! Within one output, resources are emitted in the table's order.

use super::backend::ConvertError;
use super::html::strip_ansi;
use crate::notebook::{Cell, MimeBundle, Notebook, Output, bundle_text};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;

pub const EXTRACTED_MIME_TYPES: &[(&str, &str)] = &[
    ("image/svg+xml", "svg"),
    ("application/pdf", "pdf"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
];

/// File extension for an extractable mime type.
pub fn extension_for(mime: &str) -> Option<&'static str> {
    EXTRACTED_MIME_TYPES
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, ext)| *ext)
}

/// One extracted output blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputResource {
    pub cell_index: usize,
    pub output_index: usize,
    pub mime_type: String,
    pub extension: String,
    pub data: Vec<u8>,
}

impl OutputResource {
    pub fn new(cell_index: usize, output_index: usize, mime_type: &str, data: Vec<u8>) -> Self {
        Self {
            cell_index,
            output_index,
            mime_type: mime_type.to_string(),
            extension: extension_for(mime_type).unwrap_or("bin").to_string(),
            data,
        }
    }

    /// Resource name, e.g. `output_3_0.png`.
    pub fn name(&self) -> String {
        format!(
            "output_{}_{}.{}",
            self.cell_index, self.output_index, self.extension
        )
    }
}

/// Result of the secondary exporter.
#[derive(Debug, Clone, Default)]
pub struct ExtractedNotebook {
    /// Markdown rendition referencing extracted resources by name.
    pub body: String,
    /// Extracted resources in notebook order.
    pub outputs: Vec<OutputResource>,
}

impl ExtractedNotebook {
    /// Resource name → bytes view of the extracted outputs.
    pub fn resources(&self) -> BTreeMap<String, &[u8]> {
        self.outputs
            .iter()
            .map(|o| (o.name(), o.data.as_slice()))
            .collect()
    }
}

pub fn extract_outputs(notebook: &Notebook) -> Result<ExtractedNotebook, ConvertError> {
    let language = notebook.language();
    let mut body = String::new();
    let mut outputs = Vec::new();

    for (cell_index, cell) in notebook.cells.iter().enumerate() {
        match cell {
            Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
                push_block(&mut body, source);
            }
            Cell::Code {
                source,
                outputs: cell_outputs,
                ..
            } => {
                push_block(&mut body, &format!("```{language}\n{source}\n```"));
                for (output_index, output) in cell_outputs.iter().enumerate() {
                    match output {
                        Output::Stream { text, .. } => push_block(&mut body, &indent(text)),
                        Output::Error { traceback, .. } => {
                            push_block(&mut body, &indent(&strip_ansi(&traceback.join("\n"))))
                        }
                        Output::DisplayData { data } | Output::ExecuteResult { data, .. } => {
                            let extracted = extract_bundle(data, cell_index, output_index)?;
                            if extracted.is_empty()
                                && let Some(text) = data.get("text/plain")
                            {
                                push_block(&mut body, &indent(&bundle_text(text)));
                            }
                            for resource in extracted {
                                let name = resource.name();
                                push_block(&mut body, &format!("![{name}]({name})"));
                                outputs.push(resource);
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(ExtractedNotebook { body, outputs })
}

fn extract_bundle(
    data: &MimeBundle,
    cell_index: usize,
    output_index: usize,
) -> Result<Vec<OutputResource>, ConvertError> {
    let mut resources = Vec::new();
    for (mime, _) in EXTRACTED_MIME_TYPES {
        let Some(value) = data.get(*mime) else {
            continue;
        };
        let text = bundle_text(value);
        let bytes = if *mime == "image/svg+xml" {
            text.into_bytes()
        } else {
            decode_base64(&text).map_err(|source| ConvertError::Base64 {
                resource: OutputResource::new(cell_index, output_index, mime, Vec::new()).name(),
                source,
            })?
        };
        resources.push(OutputResource::new(cell_index, output_index, mime, bytes));
    }
    Ok(resources)
}

/// Decode a base64 payload, ignoring the line breaks notebooks wrap it with.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = payload.split_whitespace().collect();
    STANDARD.decode(compact)
}

fn push_block(body: &mut String, block: &str) {
    let block = block.trim_end();
    if block.is_empty() {
        return;
    }
    body.push_str(block);
    body.push_str("\n\n");
}

fn indent(text: &str) -> String {
    text.trim_end()
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
