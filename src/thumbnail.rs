//! Thumbnail extraction.
//!
//! A notebook's thumbnail is its last image output. Candidates are the
//! resources of the secondary exporter whose extension is listed in
//! `thumbnails.extensions`; the winner is the candidate with the highest
//! `(cell index, output index)`. Two candidates from the same output (a
//! display carrying both JPEG and PNG data) resolve to the one extracted
//! later, which is PNG.
//!
//! The chosen blob is written verbatim: no decoding, resizing, or
//! re-encoding. Dimensions are read from the header for build output only.

use crate::convert::{ConvertError, NotebookConverter, OutputResource};
use image::ImageReader;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error("No thumbnail candidate ({extensions}) in notebook: {path}")]
    NoCandidate { path: PathBuf, extensions: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A written thumbnail.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Where the image was written (`<stem>.<ext>` beside the notebook).
    pub path: PathBuf,
    /// Resource name the bytes came from, e.g. `output_7_0.png`.
    pub resource: String,
    pub size: usize,
    /// `None` when the header could not be read.
    pub dimensions: Option<Dimensions>,
}

/// Pick the thumbnail among extracted outputs.
pub fn select_thumbnail<'a>(
    outputs: &'a [OutputResource],
    extensions: &[String],
) -> Option<&'a OutputResource> {
    outputs
        .iter()
        .filter(|o| extensions.iter().any(|e| e.eq_ignore_ascii_case(&o.extension)))
        // max_by_key keeps the last of equal keys
        .max_by_key(|o| (o.cell_index, o.output_index))
}

/// Extract a notebook's thumbnail and write it beside the notebook.
pub fn extract_thumbnail(
    converter: &impl NotebookConverter,
    notebook_path: &Path,
    extensions: &[String],
) -> Result<Thumbnail, ThumbnailError> {
    let extracted = converter.extract_outputs(notebook_path)?;
    let selected = select_thumbnail(&extracted.outputs, extensions).ok_or_else(|| {
        ThumbnailError::NoCandidate {
            path: notebook_path.to_path_buf(),
            extensions: extensions.join(", "),
        }
    })?;

    let path = notebook_path.with_extension(&selected.extension);
    fs::write(&path, &selected.data)?;

    Ok(Thumbnail {
        path,
        resource: selected.name(),
        size: selected.data.len(),
        dimensions: identify(&selected.data),
    })
}

/// Read image dimensions from encoded bytes.
pub fn identify(bytes: &[u8]) -> Option<Dimensions> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    Some(Dimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::backend::tests::MockConverter;
    use crate::test_helpers::{jpeg_bytes, png_bytes};
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["png".to_string(), "jpg".to_string()]
    }

    #[test]
    fn selects_highest_cell_and_output_index() {
        let outputs = vec![
            OutputResource::new(1, 0, "image/png", vec![1]),
            OutputResource::new(4, 2, "image/jpeg", vec![2]),
            OutputResource::new(4, 1, "image/png", vec![3]),
            OutputResource::new(2, 5, "image/png", vec![4]),
        ];
        let selected = select_thumbnail(&outputs, &exts()).unwrap();
        assert_eq!(selected.name(), "output_4_2.jpg");
    }

    #[test]
    fn index_order_is_numeric_not_lexicographic() {
        let outputs = vec![
            OutputResource::new(10, 0, "image/png", vec![1]),
            OutputResource::new(9, 0, "image/png", vec![2]),
        ];
        let selected = select_thumbnail(&outputs, &exts()).unwrap();
        assert_eq!(selected.cell_index, 10);
    }

    #[test]
    fn png_wins_over_jpeg_in_same_output() {
        let outputs = vec![
            OutputResource::new(3, 0, "image/jpeg", vec![1]),
            OutputResource::new(3, 0, "image/png", vec![2]),
        ];
        let selected = select_thumbnail(&outputs, &exts()).unwrap();
        assert_eq!(selected.extension, "png");
    }

    #[test]
    fn unrecognized_extensions_are_skipped() {
        let outputs = vec![
            OutputResource::new(1, 0, "image/png", vec![1]),
            OutputResource::new(2, 0, "image/svg+xml", b"<svg/>".to_vec()),
            OutputResource::new(3, 0, "application/pdf", vec![9]),
        ];
        let selected = select_thumbnail(&outputs, &exts()).unwrap();
        assert_eq!(selected.name(), "output_1_0.png");
    }

    #[test]
    fn extension_match_ignores_case() {
        let outputs = vec![OutputResource::new(0, 0, "image/png", vec![1])];
        assert!(select_thumbnail(&outputs, &["PNG".to_string()]).is_some());
    }

    #[test]
    fn no_candidate_when_empty() {
        assert!(select_thumbnail(&[], &exts()).is_none());
    }

    #[test]
    fn writes_selected_bytes_verbatim() {
        let tmp = TempDir::new().unwrap();
        let notebook = tmp.path().join("flares.ipynb");
        let png = png_bytes(8, 6);
        let converter = MockConverter::new()
            .with_output("flares", OutputResource::new(0, 0, "image/jpeg", jpeg_bytes(2, 2)))
            .with_output("flares", OutputResource::new(2, 0, "image/png", png.clone()));

        let thumb = extract_thumbnail(&converter, &notebook, &exts()).unwrap();

        assert_eq!(thumb.path, tmp.path().join("flares.png"));
        assert_eq!(thumb.resource, "output_2_0.png");
        assert_eq!(thumb.size, png.len());
        assert_eq!(fs::read(&thumb.path).unwrap(), png);
        assert_eq!(
            thumb.dimensions,
            Some(Dimensions {
                width: 8,
                height: 6
            })
        );
        assert!(!tmp.path().join("flares.jpg").exists());
    }

    #[test]
    fn missing_candidate_is_error() {
        let tmp = TempDir::new().unwrap();
        let notebook = tmp.path().join("text-only.ipynb");
        let converter = MockConverter::new();

        let result = extract_thumbnail(&converter, &notebook, &exts());
        assert!(matches!(result, Err(ThumbnailError::NoCandidate { .. })));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn identify_reads_jpeg_header() {
        let dims = identify(&jpeg_bytes(5, 7)).unwrap();
        assert_eq!(dims, Dimensions { width: 5, height: 7 });
    }

    #[test]
    fn identify_garbage_is_none() {
        assert_eq!(identify(b"not an image"), None);
    }
}
