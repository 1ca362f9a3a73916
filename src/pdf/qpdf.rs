//! qpdf FFI wrapper for output rewriting
//!
//! PDFium writes classic cross-reference tables and keeps the AcroForm
//! dictionary after flattening. Saved bytes are passed through qpdf (vendored
//! FFI) to pack objects into object streams and to drop the form.

use crate::error::{Error, Result};
use qpdf::{ObjectStreamMode, QPdf};

/// How `QpdfWrapper::rewrite` transforms a saved document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Pack objects into object streams; otherwise write a classic table
    pub object_streams: bool,
    /// Drop the catalog's AcroForm entry
    pub remove_form: bool,
}

/// Wrapper for qpdf operations via FFI
pub struct QpdfWrapper;

/// Map qpdf crate errors to our error types
fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    Error::Qpdf {
        reason: e.to_string(),
    }
}

impl QpdfWrapper {
    /// Rewrite a PDF
    ///
    /// # Arguments
    /// * `input_data` - Raw PDF bytes
    /// * `options` - Object-stream and form handling
    ///
    /// # Returns
    /// The rewritten PDF as bytes
    pub fn rewrite(input_data: &[u8], options: &RewriteOptions) -> Result<Vec<u8>> {
        let qpdf = QPdf::read_from_memory(input_data).map_err(map_qpdf_error)?;

        if options.remove_form {
            if let Some(root) = qpdf.get_root() {
                root.remove("/AcroForm");
            }
        }

        let mode = if options.object_streams {
            ObjectStreamMode::Generate
        } else {
            ObjectStreamMode::Disable
        };

        let mut writer = qpdf.writer();
        writer
            .object_stream_mode(mode)
            .compress_streams(true)
            .preserve_unreferenced_objects(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Whether the document catalog carries an AcroForm entry
    pub fn has_form(input_data: &[u8]) -> Result<bool> {
        let qpdf = QPdf::read_from_memory(input_data).map_err(map_qpdf_error)?;
        Ok(qpdf
            .get_root()
            .map(|root| root.has("/AcroForm"))
            .unwrap_or(false))
    }

    /// Get the page count of a PDF
    pub fn get_page_count(input_data: &[u8]) -> Result<u32> {
        let qpdf = QPdf::read_from_memory(input_data).map_err(map_qpdf_error)?;
        qpdf.get_num_pages().map_err(map_qpdf_error)
    }
}
