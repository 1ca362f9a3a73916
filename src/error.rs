//! Error types for PDF Form MCP Server

use thiserror::Error;

/// Result type alias for PDF Form MCP Server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for PDF Form MCP Server
#[derive(Error, Debug)]
pub enum Error {
    /// Item carries no binary attachments at all
    #[error("No binary data exists on item!")]
    MissingBinaryCollection,

    /// Named binary property absent from the item's attachments
    #[error("No binary data property \"{name}\" exists on item!")]
    MissingBinaryProperty { name: String },

    /// Bytes do not parse as a PDF document
    #[error("Malformed PDF document: {reason}")]
    MalformedDocument { reason: String },

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Reading a single field's value failed
    #[error("Failed to read field \"{name}\": {reason}")]
    FieldRead { name: String, reason: String },

    /// Writing a single field's value failed
    #[error("Failed to set field \"{name}\": {reason}")]
    FieldWrite { name: String, reason: String },

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// qpdf error
    #[error("qpdf error: {reason}")]
    Qpdf { reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blocking task failed to complete
    #[error("Task join error: {reason}")]
    TaskJoin { reason: String },
}
