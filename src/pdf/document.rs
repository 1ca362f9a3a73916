//! PDF document adapter: PDFium binding, load and save

use crate::error::{Error, Result};
use crate::pdf::qpdf::{QpdfWrapper, RewriteOptions};
use pdfium_render::prelude::*;

/// Directories searched for the PDFium shared library, after any explicit path
const PDFIUM_SEARCH_DIRS: [&str; 2] = ["./", "/opt/pdfium/lib"];

/// Options applied when serializing a document back to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Append one blank page when the document has none
    pub add_default_page: bool,
    /// Rewrite the output with object streams and a cross-reference stream
    pub use_object_streams: bool,
    /// Drop the catalog's AcroForm entry
    pub remove_form: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            add_default_page: false,
            use_object_streams: true,
            remove_form: false,
        }
    }
}

/// Bind the PDFium library.
///
/// An explicit `library_path` directory is tried first, then the working
/// directory, `/opt/pdfium/lib` and finally the system library path.
/// PDFium is not thread-safe, so callers create one instance per batch.
pub fn create_pdfium(library_path: Option<&str>) -> Result<Pdfium> {
    let dirs = library_path.into_iter().chain(PDFIUM_SEARCH_DIRS);

    for dir in dirs {
        if let Ok(bindings) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        {
            return Ok(Pdfium::new(bindings));
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })
}

/// Reject input that does not start with a PDF header
pub fn check_header(data: &[u8]) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::MalformedDocument {
            reason: "Not a valid PDF file".to_string(),
        });
    }
    Ok(())
}

/// Load a document from bytes
pub fn load<'a>(pdfium: &'a Pdfium, data: &'a [u8]) -> Result<PdfDocument<'a>> {
    check_header(data)?;

    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(map_load_error)?;

    tracing::debug!(
        bytes = data.len(),
        pages = document.pages().len(),
        has_form = document.form().is_some(),
        "document loaded"
    );

    Ok(document)
}

fn map_load_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::MalformedDocument {
                reason: "PDF is password protected".to_string(),
            }
        }
        _ => Error::MalformedDocument {
            reason: format!("{}", err),
        },
    }
}

/// Serialize a document to bytes
pub fn serialize(document: &mut PdfDocument, options: &SaveOptions) -> Result<Vec<u8>> {
    if options.add_default_page && document.pages().len() == 0 {
        document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to add default page: {}", e),
            })?;
    }

    let bytes = document.save_to_bytes().map_err(|e| Error::Pdfium {
        reason: format!("Failed to save PDF: {}", e),
    })?;

    if !options.use_object_streams && !options.remove_form {
        return Ok(bytes);
    }

    QpdfWrapper::rewrite(
        &bytes,
        &RewriteOptions {
            object_streams: options.use_object_streams,
            remove_form: options.remove_form,
        },
    )
}
