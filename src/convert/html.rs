//! Full-page HTML export.
//!
//! Renders a notebook as one standalone document: doctype, `<head>` with the
//! page title and an inline stylesheet, and one block per cell. Nothing is
//! written next to the page; images are inlined as base64 data URIs.
//!
//! ## Cell rendering
//!
//! - **Markdown**: pulldown-cmark (tables, strikethrough, footnotes). Cell
//!   attachments referenced as `attachment:<name>` become data URIs.
//! - **Code**: `In [n]:` prompt + source in `<pre><code class="language-…">`,
//!   followed by the stored outputs.
//! - **Raw**: inlined only when the cell's format is `text/html`.
//!
//! ## Output priority
//!
//! Rich outputs render the first available of [`DISPLAY_PRIORITY`]. Error
//! tracebacks have their ANSI color sequences stripped.

use crate::notebook::{Cell, MimeBundle, Notebook, Output, bundle_text};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html as md_html};
use std::collections::BTreeMap;

const MATHJAX_URL: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js";
const MATHJAX_CONFIG: &str = r#"window.MathJax = {
    tex: { inlineMath: [['$', '$'], ['\\(', '\\)']], processEscapes: true }
};"#;

/// Mime types the page can display, most preferred first.
pub const DISPLAY_PRIORITY: &[&str] = &[
    "text/html",
    "text/markdown",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "text/latex",
    "text/plain",
];

/// Page-level rendering options.
#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Complete stylesheet embedded in `<head>`.
    pub css: String,
    /// Load MathJax for `$…$` math in markdown cells.
    pub mathjax: bool,
}

pub fn render_notebook(notebook: &Notebook, title: &str, options: &HtmlOptions) -> Markup {
    let language = notebook.language();
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(&options.css)) }
                @if options.mathjax {
                    script { (PreEscaped(MATHJAX_CONFIG)) }
                    script src=(MATHJAX_URL) defer {}
                }
            }
            body {
                main.notebook {
                    @for cell in &notebook.cells {
                        (render_cell(cell, language))
                    }
                }
            }
        }
    }
}

fn render_cell(cell: &Cell, language: &str) -> Markup {
    match cell {
        Cell::Markdown {
            source,
            attachments,
        } => html! {
            div.cell.text-cell {
                div.rendered-markdown {
                    (PreEscaped(markdown_with_attachments(source, attachments)))
                }
            }
        },
        Cell::Code {
            source,
            execution_count,
            outputs,
        } => html! {
            div.cell.code-cell {
                div.input {
                    div.prompt.input-prompt { "In [" (prompt_number(*execution_count)) "]:" }
                    pre.input-area {
                        code class={ "language-" (language) } { (source) }
                    }
                }
                @if !outputs.is_empty() {
                    div.outputs {
                        @for output in outputs {
                            (render_output(output))
                        }
                    }
                }
            }
        },
        Cell::Raw { source, metadata } => html! {
            @if metadata.format.as_deref() == Some("text/html") {
                div.cell.raw-cell { (PreEscaped(source)) }
            }
        },
    }
}

fn render_output(output: &Output) -> Markup {
    match output {
        Output::Stream { name, text } => html! {
            div.output-area {
                pre class={ "output-stream output-" (name) } { (text) }
            }
        },
        Output::DisplayData { data } => html! {
            div.output-area { (render_mime_bundle(data)) }
        },
        Output::ExecuteResult {
            execution_count,
            data,
        } => html! {
            div.output-area {
                div.prompt.output-prompt { "Out[" (prompt_number(*execution_count)) "]:" }
                (render_mime_bundle(data))
            }
        },
        Output::Error {
            ename,
            evalue,
            traceback,
        } => {
            let text = if traceback.is_empty() {
                format!("{ename}: {evalue}")
            } else {
                strip_ansi(&traceback.join("\n"))
            };
            html! {
                div.output-area {
                    pre.output-error { (text) }
                }
            }
        }
    }
}

/// Render the highest-priority displayable entry of a mime bundle.
fn render_mime_bundle(data: &MimeBundle) -> Markup {
    let Some((mime, value)) = DISPLAY_PRIORITY
        .iter()
        .find_map(|mime| data.get(*mime).map(|value| (*mime, value)))
    else {
        return html! {};
    };
    let text = bundle_text(value);

    match mime {
        "text/html" => html! { div.output-html { (PreEscaped(text)) } },
        "image/svg+xml" => html! { div.output-svg { (PreEscaped(text)) } },
        "text/markdown" => html! {
            div.output-markdown { (PreEscaped(markdown_to_html(&text))) }
        },
        "image/png" | "image/jpeg" => html! {
            div.output-image {
                img src=(data_uri(mime, &text)) alt="output";
            }
        },
        "text/latex" => html! { div.output-latex { (text) } },
        _ => html! { pre.output-text { (text) } },
    }
}

fn prompt_number(execution_count: Option<u64>) -> String {
    execution_count.map(|n| n.to_string()).unwrap_or_default()
}

fn data_uri(mime: &str, base64_payload: &str) -> String {
    let compact: String = base64_payload.split_whitespace().collect();
    format!("data:{mime};base64,{compact}")
}

/// Render markdown to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    markdown_with_attachments(markdown, &BTreeMap::new())
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Render markdown, pointing images whose whole destination is
/// `attachment:<name>` at a data URI of that attachment's first raster
/// payload.
fn markdown_with_attachments(
    markdown: &str,
    attachments: &BTreeMap<String, MimeBundle>,
) -> String {
    let parser = Parser::new_ext(markdown, markdown_options()).map(|event| match event {
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let inlined = dest_url
                .strip_prefix("attachment:")
                .and_then(|name| attachment_uri(attachments.get(name)?));
            let dest_url = inlined.map(CowStr::from).unwrap_or(dest_url);
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    });
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

fn attachment_uri(bundle: &MimeBundle) -> Option<String> {
    bundle
        .iter()
        .find(|(mime, _)| mime.starts_with("image/") && *mime != "image/svg+xml")
        .map(|(mime, value)| data_uri(mime, &bundle_text(value)))
}

/// Strip ANSI escape sequences (colored tracebacks).
pub(crate) fn strip_ansi(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            result.push(c);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            // CSI: parameters and intermediates until a final byte in @..~
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
    }
    result
}
