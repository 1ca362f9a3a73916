//! Form field registry, classifier and value reader
//!
//! PDFium exposes form fields through the widget annotations on each page.
//! A field with several widgets (a radio group, or a text field shown on
//! more than one page) shows up once per widget; the registry folds those
//! into one logical field at the position of its first widget.

use crate::error::{Error, Result};
use pdfium_render::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// Radio and checkbox state name meaning "nothing selected"
const OFF_STATE: &str = "Off";

/// Concrete kind of a form field, mapped once from PDFium's field type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    TextField,
    CheckBox,
    RadioGroup,
    Dropdown,
    Other(OtherKind),
}

/// Field kinds that are enumerated but never read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtherKind {
    Button,
    OptionList,
    Signature,
    Unknown,
}

impl FieldKind {
    /// Map PDFium's native field type to a field kind
    pub fn classify(field_type: PdfFormFieldType) -> Self {
        match field_type {
            PdfFormFieldType::Text => FieldKind::TextField,
            PdfFormFieldType::Checkbox => FieldKind::CheckBox,
            PdfFormFieldType::RadioButton => FieldKind::RadioGroup,
            PdfFormFieldType::ComboBox => FieldKind::Dropdown,
            PdfFormFieldType::PushButton => FieldKind::Other(OtherKind::Button),
            PdfFormFieldType::ListBox => FieldKind::Other(OtherKind::OptionList),
            PdfFormFieldType::Signature => FieldKind::Other(OtherKind::Signature),
            _ => FieldKind::Other(OtherKind::Unknown),
        }
    }

    /// Type tag reported in extraction output
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::TextField => "TextField",
            FieldKind::CheckBox => "CheckBox",
            FieldKind::RadioGroup => "RadioGroup",
            FieldKind::Dropdown => "Dropdown",
            FieldKind::Other(OtherKind::Button) => "Button",
            FieldKind::Other(OtherKind::OptionList) => "OptionList",
            FieldKind::Other(OtherKind::Signature) => "Signature",
            FieldKind::Other(OtherKind::Unknown) => "Unknown",
        }
    }
}

/// Current value of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text content, or the selected option of a radio group or dropdown
    Text(String),
    /// Checked state of a checkbox
    Checked(bool),
}

/// One logical form field
#[derive(Debug)]
pub struct FormField {
    /// 1-based position in the form's field enumeration
    pub index: usize,
    /// Fully qualified field name
    pub name: String,
    pub kind: FieldKind,
    /// 1-based page of the field's first widget
    pub page: u32,
    value: Result<Option<FieldValue>>,
}

impl FormField {
    pub fn new(
        index: usize,
        name: impl Into<String>,
        kind: FieldKind,
        page: u32,
        value: Result<Option<FieldValue>>,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            kind,
            page,
            value,
        }
    }

    /// The value read for this field, or the error that prevented reading it
    pub fn value(&self) -> std::result::Result<Option<&FieldValue>, &Error> {
        self.value.as_ref().map(Option::as_ref)
    }

    /// Descriptor for extraction output; read failures degrade to null
    pub fn info(&self) -> FieldInfo {
        let value = match &self.value {
            Ok(value) => value.clone(),
            Err(e) => {
                tracing::debug!(field = %self.name, error = %e, "field value degraded to null");
                None
            }
        };

        FieldInfo {
            index: self.index,
            name: self.name.clone(),
            field_type: self.kind.tag().to_string(),
            value,
        }
    }
}

/// Flat per-field descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub index: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub value: Option<FieldValue>,
}

/// Result of the extract operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub total_fields: usize,
    pub fields: Vec<FieldInfo>,
    pub field_names: Vec<String>,
}

/// Ordered collection of a document's form fields
#[derive(Debug, Default)]
pub struct FormFields {
    fields: Vec<FormField>,
}

impl FormFields {
    /// Collect the fields of a loaded document.
    ///
    /// A document without an interactive form yields an empty collection.
    pub fn collect(document: &PdfDocument) -> Result<Self> {
        if document.form().is_none() {
            tracing::debug!("document has no interactive form");
            return Ok(Self::default());
        }

        let mut fields: Vec<FormField> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (page_index, page) in document.pages().iter().enumerate() {
            for annotation in page.annotations().iter() {
                if let Some(field) = annotation.as_form_field() {
                    let name = field.name();

                    if let Some(name) = &name {
                        if !seen.insert(name.clone()) {
                            continue;
                        }
                    }

                    let name = name.unwrap_or_default();
                    let kind = FieldKind::classify(field.field_type());
                    let value = read_value(&name, field, kind);

                    fields.push(FormField::new(
                        fields.len() + 1,
                        name,
                        kind,
                        page_index as u32 + 1,
                        value,
                    ));
                }
            }
        }

        tracing::debug!(fields = fields.len(), "form fields collected");

        Ok(Self { fields })
    }

    pub fn from_fields(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter()
    }

    /// Look up a field by name; the first field in enumeration order wins
    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    /// Build the extraction output for this collection
    pub fn extraction(&self) -> ExtractionResult {
        ExtractionResult {
            total_fields: self.fields.len(),
            fields: self.fields.iter().map(FormField::info).collect(),
            field_names: self.names(),
        }
    }
}

/// Extract field descriptors from a loaded document
pub fn extract_fields(document: &PdfDocument) -> Result<ExtractionResult> {
    Ok(FormFields::collect(document)?.extraction())
}

fn read_error(name: &str, reason: impl std::fmt::Display) -> Error {
    Error::FieldRead {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn kind_mismatch(name: &str, kind: FieldKind) -> Error {
    read_error(name, format!("widget does not expose a {} interface", kind.tag()))
}

fn read_value(name: &str, field: &PdfFormField, kind: FieldKind) -> Result<Option<FieldValue>> {
    match kind {
        FieldKind::TextField => {
            let text_field = field
                .as_text_field()
                .ok_or_else(|| kind_mismatch(name, kind))?;
            // PDFium reports an absent and an empty value alike
            Ok(Some(FieldValue::Text(text_field.value().unwrap_or_default())))
        }
        FieldKind::CheckBox => {
            let checkbox = field
                .as_checkbox_field()
                .ok_or_else(|| kind_mismatch(name, kind))?;
            let checked = checkbox.is_checked().map_err(|e| read_error(name, e))?;
            Ok(Some(FieldValue::Checked(checked)))
        }
        FieldKind::RadioGroup => {
            let radio = field
                .as_radio_button_field()
                .ok_or_else(|| kind_mismatch(name, kind))?;
            Ok(selected_state(radio.group_value()).map(FieldValue::Text))
        }
        FieldKind::Dropdown => {
            let combo = field
                .as_combo_box_field()
                .ok_or_else(|| kind_mismatch(name, kind))?;
            let options = combo.options();
            for i in 0..options.len() {
                let option = options.get(i).map_err(|e| read_error(name, e))?;
                if option.is_set() {
                    return Ok(option.label().cloned().map(FieldValue::Text));
                }
            }
            Ok(None)
        }
        FieldKind::Other(_) => Ok(None),
    }
}

/// Normalize a radio group state: empty or "Off" means nothing is selected
fn selected_state(state: Option<String>) -> Option<String> {
    state.filter(|s| !s.is_empty() && s != OFF_STATE)
}
