//! PDF processing layer
//!
//! This module provides the AcroForm field model on top of PDFium, with
//! qpdf used to rewrite saved output.

mod document;
mod engine;
mod fill;
mod form;
mod qpdf;

pub use document::{check_header, create_pdfium, load, serialize, SaveOptions};
pub use engine::{FormEngine, MappedDocument, PdfiumEngine};
pub use fill::{
    apply_assignments, draw_text_values, flatten, map_fields, FieldAssignment, FillReport,
};
pub use form::{
    extract_fields, ExtractionResult, FieldInfo, FieldKind, FieldValue, FormField, FormFields,
    OtherKind,
};
pub use qpdf::{QpdfWrapper, RewriteOptions};
