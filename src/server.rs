//! MCP Server implementation using rmcp

use crate::pdf::{FieldAssignment, PdfiumEngine, SaveOptions};
use crate::pipeline::{
    BinaryEncoding, FormParameters, FormPipeline, InputItem, Operation, OutputItem,
    PipelineConfig, DEFAULT_BINARY_PROPERTY,
};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use std::sync::Arc;

/// Runtime configuration for the PDF Form MCP Server
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Directory holding the PDFium shared library (default: search standard locations)
    pub pdfium_library_path: Option<String>,
    /// Default continue-on-fail mode when a request does not set one (default: false)
    pub continue_on_fail: bool,
    /// Encoding of binary attachment payloads (default: base64)
    pub binary_encoding: BinaryEncoding,
    /// Serialization options for mapped output
    pub save_options: SaveOptions,
}

/// PDF Form MCP Server
#[derive(Clone)]
pub struct PdfFormServer {
    tool_router: ToolRouter<Self>,
    /// Server configuration
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request types
// ============================================================================

fn default_binary_property_name() -> String {
    DEFAULT_BINARY_PROPERTY.to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractFormFieldsParams {
    /// Input items; each carries its PDF in `binary.<binary_property_name>.data`
    pub items: Vec<InputItem>,
    /// Name of the binary property containing the PDF file (default: "data")
    #[serde(default = "default_binary_property_name")]
    pub binary_property_name: String,
    /// Turn per-item failures into error records instead of failing the batch
    #[serde(default)]
    pub continue_on_fail: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MapFormFieldsParams {
    /// Input items; each carries its PDF in `binary.<binary_property_name>.data`
    pub items: Vec<InputItem>,
    /// Name of the binary property containing the PDF file (default: "data")
    #[serde(default = "default_binary_property_name")]
    pub binary_property_name: String,
    /// Name of the output PDF file. Leave empty to use the input filename
    #[serde(default)]
    pub output_filename: String,
    /// Field name/value pairs to write before flattening
    #[serde(default)]
    pub fields: Vec<FieldAssignment>,
    /// Turn per-item failures into error records instead of failing the batch
    #[serde(default)]
    pub continue_on_fail: Option<bool>,
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl PdfFormServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfFormServer with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Extract form fields from PDF items
    #[tool(
        description = "Extract form fields from PDF files. Returns, per item, the field count, each field's index, name, type and current value, and the list of field names.

Field types: TextField (text value), CheckBox (boolean), RadioGroup (selected option), Dropdown (selected option), and Button, OptionList, Signature, Unknown (value always null).

Use this first to get the field names, then pass them to map_form_fields.

Item format: {\"json\": {}, \"binary\": {\"data\": {\"data\": \"<base64 PDF>\", \"fileName\": \"form.pdf\"}}}"
    )]
    async fn extract_form_fields(
        &self,
        Parameters(params): Parameters<ExtractFormFieldsParams>,
    ) -> String {
        let parameters = FormParameters {
            operation: Operation::ExtractFields,
            binary_property_name: params.binary_property_name,
            ..FormParameters::default()
        };

        let result = self
            .run_batch(params.items, parameters, params.continue_on_fail)
            .await;
        Self::render(result)
    }

    /// Fill form fields and flatten PDF items
    #[tool(
        description = "Fill named form fields and flatten the form into a static, non-editable PDF. Returns, per item, the new PDF as a base64 binary entry plus {success, totalFields, mappedFields}.

Each fields entry is {\"fieldName\": \"...\", \"fieldValue\": \"...\"}. Values are written as text; names not present in the PDF are ignored.

Item format: {\"json\": {}, \"binary\": {\"data\": {\"data\": \"<base64 PDF>\", \"fileName\": \"form.pdf\"}}}"
    )]
    async fn map_form_fields(&self, Parameters(params): Parameters<MapFormFieldsParams>) -> String {
        let parameters = FormParameters {
            operation: Operation::MapFields,
            binary_property_name: params.binary_property_name,
            output_filename: params.output_filename,
            fields: params.fields,
        };

        let result = self
            .run_batch(params.items, parameters, params.continue_on_fail)
            .await;
        Self::render(result)
    }
}

impl PdfFormServer {
    /// Run a batch on a blocking thread with a fresh PDFium binding
    pub async fn run_batch(
        &self,
        items: Vec<InputItem>,
        parameters: FormParameters,
        continue_on_fail: Option<bool>,
    ) -> crate::error::Result<Vec<OutputItem>> {
        let config = PipelineConfig {
            continue_on_fail: continue_on_fail.unwrap_or(self.config.continue_on_fail),
            binary_encoding: self.config.binary_encoding,
            save_options: self.config.save_options,
        };
        let library_path = self.config.pdfium_library_path.clone();

        tracing::debug!(
            items = items.len(),
            operation = ?parameters.operation,
            continue_on_fail = config.continue_on_fail,
            "running batch"
        );

        // PDFium is blocking and not thread-safe
        tokio::task::spawn_blocking(move || {
            let engine = PdfiumEngine::new(library_path);
            FormPipeline::new(&engine, config).run(&items, &parameters)
        })
        .await
        .map_err(|e| crate::error::Error::TaskJoin {
            reason: format!("{}", e),
        })?
    }

    fn render(result: crate::error::Result<Vec<OutputItem>>) -> String {
        let response = match result {
            Ok(items) => serde_json::json!({ "items": items }),
            Err(e) => {
                tracing::warn!(error = %e, "batch failed");
                serde_json::json!({ "error": e.to_string() })
            }
        };
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }
}

impl Default for PdfFormServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfFormServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF Form MCP Server extracts form fields from PDFs and fills and flattens \
                 named fields into new static PDFs."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server with default configuration
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = PdfFormServer::with_config(config);

    tracing::info!("PDF Form MCP Server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
