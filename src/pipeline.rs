//! Item pipeline: binary resolution, operation dispatch and output records
//!
//! Each input item is processed on its own, strictly in order. An item
//! moves through the stages of [`ItemStage`]; a failure at any stage either
//! becomes an error record (continue-on-fail) or aborts the whole batch.

use crate::error::{Error, Result};
use crate::pdf::{FieldAssignment, FormEngine, SaveOptions};
use base64::Engine;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// MIME type of mapped output
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// File extension of mapped output
pub const PDF_FILE_EXTENSION: &str = "pdf";

/// Default key into an item's binary attachments
pub const DEFAULT_BINARY_PROPERTY: &str = "data";

/// Operation applied to every item of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Describe the form fields of the PDF
    #[default]
    ExtractFields,
    /// Fill named fields and flatten the form into a new PDF
    MapFields,
}

/// Text encoding of binary attachment payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BinaryEncoding {
    /// Standard alphabet with padding
    #[default]
    Base64,
    /// URL-safe alphabet with padding
    Base64Url,
}

impl BinaryEncoding {
    pub fn decode(&self, data: &str) -> Result<Vec<u8>> {
        let bytes = match self {
            BinaryEncoding::Base64 => base64::engine::general_purpose::STANDARD.decode(data)?,
            BinaryEncoding::Base64Url => base64::engine::general_purpose::URL_SAFE.decode(data)?,
        };
        Ok(bytes)
    }

    pub fn encode(&self, data: &[u8]) -> String {
        match self {
            BinaryEncoding::Base64 => base64::engine::general_purpose::STANDARD.encode(data),
            BinaryEncoding::Base64Url => base64::engine::general_purpose::URL_SAFE.encode(data),
        }
    }
}

/// One binary attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    /// Encoded file content
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    /// Size in bytes, as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    /// Any other metadata, passed through untouched
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl BinaryData {
    /// Build a PDF attachment from raw bytes
    pub fn pdf(data: &[u8], file_name: Option<String>, encoding: BinaryEncoding) -> Self {
        Self {
            data: encoding.encode(data),
            mime_type: Some(PDF_MIME_TYPE.to_string()),
            file_name,
            file_extension: Some(PDF_FILE_EXTENSION.to_string()),
            file_size: Some(data.len().to_string()),
            metadata: Map::new(),
        }
    }
}

/// Binary attachments of an item, by property name
pub type BinaryTable = BTreeMap<String, BinaryData>;

/// One input record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InputItem {
    #[serde(default)]
    pub json: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<BinaryTable>,
}

/// One output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutputItem {
    pub json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<BinaryTable>,
}

impl OutputItem {
    /// Error record carrying the item's original attachments
    pub fn error(message: impl Into<String>, binary: Option<BinaryTable>) -> Self {
        Self {
            json: serde_json::json!({ "error": message.into() }),
            binary,
        }
    }
}

/// Field name and value echoed back by the map operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedField {
    pub name: String,
    pub value: String,
}

/// JSON result of the map operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
    pub success: bool,
    /// Number of submitted assignments
    pub total_fields: usize,
    pub mapped_fields: Vec<MappedField>,
}

impl MappingResult {
    fn from_assignments(assignments: &[FieldAssignment]) -> Self {
        Self {
            success: true,
            total_fields: assignments.len(),
            mapped_fields: assignments
                .iter()
                .map(|a| MappedField {
                    name: a.field_name.clone(),
                    value: a.field_value.clone(),
                })
                .collect(),
        }
    }
}

/// Per-item parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormParameters {
    pub operation: Operation,
    /// Key into the item's binary attachments
    pub binary_property_name: String,
    /// Output file name; empty reuses the input attachment's name
    pub output_filename: String,
    /// Assignments applied by the map operation
    pub fields: Vec<FieldAssignment>,
}

impl Default for FormParameters {
    fn default() -> Self {
        Self {
            operation: Operation::default(),
            binary_property_name: DEFAULT_BINARY_PROPERTY.to_string(),
            output_filename: String::new(),
            fields: Vec::new(),
        }
    }
}

/// Batch-level settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Turn item failures into error records instead of aborting the batch
    pub continue_on_fail: bool,
    pub binary_encoding: BinaryEncoding,
    pub save_options: SaveOptions,
}

/// Processing stage of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    Start,
    BinaryResolved,
    DocumentLoaded,
    OperationDispatched,
    ExtractDone,
    MapDone,
    Emitted,
    ErrorEmitted,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStage::Start => "start",
            ItemStage::BinaryResolved => "binary_resolved",
            ItemStage::DocumentLoaded => "document_loaded",
            ItemStage::OperationDispatched => "operation_dispatched",
            ItemStage::ExtractDone => "extract_done",
            ItemStage::MapDone => "map_done",
            ItemStage::Emitted => "emitted",
            ItemStage::ErrorEmitted => "error_emitted",
        };
        f.write_str(name)
    }
}

/// Stage tracker for one item
struct ItemRun {
    index: usize,
    stage: ItemStage,
}

impl ItemRun {
    fn new(index: usize) -> Self {
        Self {
            index,
            stage: ItemStage::Start,
        }
    }

    fn advance(&mut self, stage: ItemStage) {
        tracing::debug!(item = self.index, from = %self.stage, to = %stage, "item stage");
        self.stage = stage;
    }
}

/// Look up an item's named attachment
pub fn resolve_binary<'i>(item: &'i InputItem, property: &str) -> Result<&'i BinaryData> {
    let binary = item
        .binary
        .as_ref()
        .filter(|table| !table.is_empty())
        .ok_or(Error::MissingBinaryCollection)?;

    binary.get(property).ok_or_else(|| Error::MissingBinaryProperty {
        name: property.to_string(),
    })
}

/// Runs extract or map over a batch of items
pub struct FormPipeline<'e, E: FormEngine> {
    engine: &'e E,
    config: PipelineConfig,
}

impl<'e, E: FormEngine> FormPipeline<'e, E> {
    pub fn new(engine: &'e E, config: PipelineConfig) -> Self {
        Self { engine, config }
    }

    /// Process every item in order, producing one record per item.
    ///
    /// Without continue-on-fail the first failing item aborts the batch
    /// and no records are returned.
    pub fn run(&self, items: &[InputItem], parameters: &FormParameters) -> Result<Vec<OutputItem>> {
        let mut output = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let mut run = ItemRun::new(index);

            match self.process_item(&mut run, item, parameters) {
                Ok(record) => {
                    run.advance(ItemStage::Emitted);
                    output.push(record);
                }
                Err(e) if self.config.continue_on_fail => {
                    tracing::warn!(item = index, stage = %run.stage, error = %e, "item failed, continuing");
                    run.advance(ItemStage::ErrorEmitted);
                    output.push(OutputItem::error(e.to_string(), item.binary.clone()));
                }
                Err(e) => {
                    tracing::warn!(item = index, stage = %run.stage, error = %e, "item failed, aborting batch");
                    return Err(e);
                }
            }
        }

        Ok(output)
    }

    fn process_item(
        &self,
        run: &mut ItemRun,
        item: &InputItem,
        parameters: &FormParameters,
    ) -> Result<OutputItem> {
        let binary = resolve_binary(item, &parameters.binary_property_name)?;
        let data = self.config.binary_encoding.decode(&binary.data)?;
        run.advance(ItemStage::BinaryResolved);

        let mut document = self.engine.load(&data)?;
        run.advance(ItemStage::DocumentLoaded);

        run.advance(ItemStage::OperationDispatched);
        match parameters.operation {
            Operation::ExtractFields => {
                let result = self.engine.extract(&document)?;
                run.advance(ItemStage::ExtractDone);

                Ok(OutputItem {
                    json: serde_json::to_value(result)?,
                    binary: None,
                })
            }
            Operation::MapFields => {
                let mapped = self.engine.map(
                    &mut document,
                    &parameters.fields,
                    &self.config.save_options,
                )?;
                run.advance(ItemStage::MapDone);

                let file_name = if parameters.output_filename.is_empty() {
                    binary.file_name.clone()
                } else {
                    Some(parameters.output_filename.clone())
                };

                let mut table = BinaryTable::new();
                table.insert(
                    parameters.binary_property_name.clone(),
                    BinaryData::pdf(&mapped.data, file_name, self.config.binary_encoding),
                );

                Ok(OutputItem {
                    json: serde_json::to_value(MappingResult::from_assignments(
                        &parameters.fields,
                    ))?,
                    binary: Some(table),
                })
            }
        }
    }
}
