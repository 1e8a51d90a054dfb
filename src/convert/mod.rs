//! Notebook conversion.
//!
//! | Operation | Output |
//! |---|---|
//! | **HTML export** | full standalone page (maud template, inline stylesheet) |
//! | **Output extraction** | markdown body + binary output resources |
//!
//! The module is split into:
//! - **Backend**: [`NotebookConverter`] trait + [`ConvertError`]
//! - **Html**: page template for the full HTML export
//! - **Resources**: the secondary exporter that pulls output blobs out of cells
//! - **Native**: [`NativeConverter`], the production implementation

pub mod backend;
pub mod html;
pub mod native;
pub mod resources;

pub use backend::{ConvertError, NotebookConverter};
pub use html::HtmlOptions;
pub use native::NativeConverter;
pub use resources::{ExtractedNotebook, OutputResource};
