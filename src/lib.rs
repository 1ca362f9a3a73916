//! PDF Form MCP Server Library
//!
//! This crate provides MCP tools for PDF AcroForm processing:
//! - `extract_form_fields`: Describe every form field of a PDF
//! - `map_form_fields`: Fill named fields and flatten the form
//!
//! Both tools run over batches of items with optional continue-on-fail.

pub mod error;
pub mod pdf;
pub mod pipeline;
pub mod server;

pub use error::{Error, Result};
pub use pipeline::{FormParameters, FormPipeline, InputItem, Operation, OutputItem};
pub use server::{
    run_server, run_server_with_config, ExtractFormFieldsParams, MapFormFieldsParams,
    PdfFormServer, ServerConfig,
};
