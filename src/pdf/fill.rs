//! Field value writer and form flattener

use crate::error::{Error, Result};
use crate::pdf::document::{serialize, SaveOptions};
use crate::pdf::form::{FieldKind, FormFields};
use pdfium_render::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A field name paired with the text to write into it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldAssignment {
    /// Name of the PDF form field (use extract_form_fields to discover names)
    pub field_name: String,
    /// Value to set for the field
    #[serde(default)]
    pub field_value: String,
}

impl FieldAssignment {
    pub fn new(field_name: impl Into<String>, field_value: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            field_value: field_value.into(),
        }
    }
}

/// Outcome of applying a batch of assignments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Assignments written to a field
    pub applied: usize,
    /// Assignments whose field exists but rejected the write
    pub failed: usize,
    /// Assignments naming no field in the form
    pub unmatched: usize,
}

/// Apply assignments to the document's fields.
///
/// Every matched field is written through the text-field interface
/// regardless of its kind. Writes the field rejects are logged and
/// counted; unknown names are skipped without logging.
pub fn apply_assignments(
    document: &PdfDocument,
    fields: &FormFields,
    assignments: &[FieldAssignment],
) -> FillReport {
    let mut report = FillReport::default();

    for assignment in assignments {
        if fields.get(&assignment.field_name).is_none() {
            report.unmatched += 1;
            continue;
        }

        match set_text(document, &assignment.field_name, &assignment.field_value) {
            Ok(true) => report.applied += 1,
            Ok(false) => report.unmatched += 1,
            Err(e) => {
                tracing::warn!(field = %assignment.field_name, error = %e, "field assignment skipped");
                report.failed += 1;
            }
        }
    }

    report
}

/// Set the text of the first widget named `name`.
///
/// Returns `Ok(false)` when no widget carries that name.
fn set_text(document: &PdfDocument, name: &str, value: &str) -> Result<bool> {
    for page in document.pages().iter() {
        for mut annotation in page.annotations().iter() {
            if let Some(field) = annotation.as_form_field_mut() {
                if field.name().as_deref() != Some(name) {
                    continue;
                }

                let kind = FieldKind::classify(field.field_type());

                return match field.as_text_field_mut() {
                    Some(text_field) => {
                        text_field
                            .set_value(value)
                            .map_err(|e| Error::FieldWrite {
                                name: name.to_string(),
                                reason: format!("{}", e),
                            })?;
                        Ok(true)
                    }
                    None => Err(Error::FieldWrite {
                        name: name.to_string(),
                        reason: format!("{} does not accept text", kind.tag()),
                    }),
                };
            }
        }
    }

    Ok(false)
}

/// Point size of drawn text values when the widget is tall enough
const TEXT_SIZE: f32 = 12.0;

/// Gap between a widget's edge and its drawn text
const TEXT_INSET: f32 = 2.0;

/// Draw every text widget's current value into its page and remove the widget.
///
/// Flattening bakes only a widget's stored appearance stream, and writing a
/// value does not regenerate it. Returns the number of values drawn.
pub fn draw_text_values(document: &mut PdfDocument) -> Result<usize> {
    let font = document.fonts_mut().helvetica();
    let mut drawn = 0;

    for (page_index, mut page) in document.pages().iter().enumerate() {
        let mut widgets: Vec<(PdfPageAnnotationIndex, PdfRect, Option<String>)> = Vec::new();

        for (index, annotation) in page.annotations().iter().enumerate() {
            let value = match annotation.as_form_field().and_then(|f| f.as_text_field()) {
                Some(text_field) => text_field.value(),
                None => continue,
            };
            let bounds = annotation
                .bounds()
                .map_err(|e| page_error(page_index, "read widget bounds", e))?;
            widgets.push((index, bounds, value));
        }

        // Highest index first so the remaining indices stay valid
        for (index, bounds, value) in widgets.into_iter().rev() {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                let height = bounds.height().value;
                let size = TEXT_SIZE.min(height - 2.0 * TEXT_INSET).max(1.0);
                let x = bounds.left().value + TEXT_INSET;
                let y = bounds.bottom().value + (height - size) / 2.0 + size * 0.2;

                page.objects_mut()
                    .create_text_object(
                        PdfPoints::new(x),
                        PdfPoints::new(y),
                        value,
                        font,
                        PdfPoints::new(size),
                    )
                    .map_err(|e| page_error(page_index, "draw field value", e))?;
                drawn += 1;
            }

            let annotation = page
                .annotations()
                .get(index)
                .map_err(|e| page_error(page_index, "read widget", e))?;
            page.annotations_mut()
                .delete_annotation(annotation)
                .map_err(|e| page_error(page_index, "remove widget", e))?;
        }
    }

    Ok(drawn)
}

fn page_error(page_index: usize, action: &str, e: PdfiumError) -> Error {
    Error::Pdfium {
        reason: format!("Page {}: failed to {}: {}", page_index + 1, action, e),
    }
}

/// Flatten every page, baking widgets into static page content
pub fn flatten(document: &PdfDocument) -> Result<()> {
    for (page_index, mut page) in document.pages().iter().enumerate() {
        page.flatten()
            .map_err(|e| page_error(page_index, "flatten page", e))?;
    }
    Ok(())
}

/// Fill, draw, flatten and serialize a loaded document, in that order.
///
/// The output carries no interactive form: the catalog's AcroForm entry is
/// dropped on save.
pub fn map_fields(
    document: &mut PdfDocument,
    assignments: &[FieldAssignment],
    options: &SaveOptions,
) -> Result<(Vec<u8>, FillReport)> {
    let fields = FormFields::collect(document)?;
    let report = apply_assignments(document, &fields, assignments);

    tracing::debug!(
        applied = report.applied,
        failed = report.failed,
        unmatched = report.unmatched,
        "assignments applied"
    );

    let drawn = draw_text_values(document)?;
    tracing::debug!(drawn, "text values drawn");

    flatten(document)?;

    let options = SaveOptions {
        remove_form: true,
        ..*options
    };
    let data = serialize(document, &options)?;

    Ok((data, report))
}
