//! Form engine: the boundary between item orchestration and the PDF library

use crate::error::Result;
use crate::pdf::document::{create_pdfium, load, SaveOptions};
use crate::pdf::fill::{map_fields, FieldAssignment, FillReport};
use crate::pdf::form::{extract_fields, ExtractionResult};
use pdfium_render::prelude::*;
use std::cell::OnceCell;

/// A filled and flattened document
#[derive(Debug, Clone)]
pub struct MappedDocument {
    pub data: Vec<u8>,
    pub report: FillReport,
}

/// Operations the item pipeline runs against one PDF at a time.
///
/// A document is loaded once, then handed to exactly one operation.
pub trait FormEngine {
    /// A loaded document, borrowing the engine and the input bytes
    type Document<'d>
    where
        Self: 'd;

    /// Parse PDF bytes into a document
    fn load<'d>(&'d self, data: &'d [u8]) -> Result<Self::Document<'d>>;

    /// Describe the form fields of a loaded document
    fn extract<'d>(&'d self, document: &Self::Document<'d>) -> Result<ExtractionResult>;

    /// Fill named fields, flatten the form and serialize the result
    fn map<'d>(
        &'d self,
        document: &mut Self::Document<'d>,
        assignments: &[FieldAssignment],
        options: &SaveOptions,
    ) -> Result<MappedDocument>;
}

/// PDFium-backed form engine.
///
/// The library is bound on first use, so a batch whose items all fail
/// before loading a document never touches PDFium.
pub struct PdfiumEngine {
    library_path: Option<String>,
    pdfium: OnceCell<Pdfium>,
}

impl PdfiumEngine {
    pub fn new(library_path: Option<String>) -> Self {
        Self {
            library_path,
            pdfium: OnceCell::new(),
        }
    }

    fn pdfium(&self) -> Result<&Pdfium> {
        if let Some(pdfium) = self.pdfium.get() {
            return Ok(pdfium);
        }
        let pdfium = create_pdfium(self.library_path.as_deref())?;
        Ok(self.pdfium.get_or_init(|| pdfium))
    }
}

impl Default for PdfiumEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FormEngine for PdfiumEngine {
    type Document<'d> = PdfDocument<'d>;

    fn load<'d>(&'d self, data: &'d [u8]) -> Result<PdfDocument<'d>> {
        load(self.pdfium()?, data)
    }

    fn extract<'d>(&'d self, document: &PdfDocument<'d>) -> Result<ExtractionResult> {
        extract_fields(document)
    }

    fn map<'d>(
        &'d self,
        document: &mut PdfDocument<'d>,
        assignments: &[FieldAssignment],
        options: &SaveOptions,
    ) -> Result<MappedDocument> {
        let (data, report) = map_fields(document, assignments, options)?;
        Ok(MappedDocument { data, report })
    }
}
