//! The tool surface a host agent runtime sees: a descriptor plus `execute`.
//!
//! A host discovers the tool through [`ToolDescriptor`] (name, description,
//! JSON Schema for arguments) and calls [`Tool::execute`] with a JSON argument
//! object. The result is the backend's trimmed output as a plain string.

use crate::config::BackendConfig;
use crate::error::PdfOcrError;
use crate::invoke::run_backend;
use crate::request::OcrRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

pub const TOOL_NAME: &str = "pdf-ocr";

pub const TOOL_DESCRIPTION: &str = "Extract text from PDF files using DeepSeek-OCR. \
Processes entire PDFs and returns markdown or plain text output. \
Use this when you need to transcribe PDF documents for analysis or processing.";

/// Declarative description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema (`type: object`) for the argument object.
    pub parameters: Value,
}

/// Arguments accepted by the PDF OCR tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolArgs {
    pub pdf_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl ToolArgs {
    /// Normalise into an [`OcrRequest`].
    pub fn into_request(self) -> Result<OcrRequest, PdfOcrError> {
        OcrRequest::new(self.pdf_path, self.output_format.as_deref())
    }
}

/// A tool callable by an agent runtime.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute with a JSON argument object, returning the tool's text result.
    async fn execute(&self, args: Value, cancel: CancellationToken) -> Result<String, PdfOcrError>;
}

/// PDF transcription through the external OCR backend.
#[derive(Debug, Clone, Default)]
pub struct PdfOcrTool {
    config: BackendConfig,
}

impl PdfOcrTool {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

#[async_trait]
impl Tool for PdfOcrTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "pdf_path": {
                        "type": "string",
                        "description": "Absolute path to PDF file"
                    },
                    "output_format": {
                        "type": "string",
                        "description": "Output format: 'markdown' or 'text' (defaults to 'markdown')"
                    }
                },
                "required": ["pdf_path"]
            }),
        }
    }

    async fn execute(&self, args: Value, cancel: CancellationToken) -> Result<String, PdfOcrError> {
        let args: ToolArgs = serde_json::from_value(args)
            .map_err(|e| PdfOcrError::InvalidArguments(e.to_string()))?;
        let request = args.into_request()?;
        let output = run_backend(&request, &self.config, &cancel)
            .await?
            .into_result()?;
        Ok(output.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_schema() {
        let d = PdfOcrTool::default().descriptor();
        assert_eq!(d.name, "pdf-ocr");
        assert!(d.description.starts_with("Extract text from PDF files"));
        assert_eq!(d.parameters["type"], "object");
        assert_eq!(d.parameters["properties"]["pdf_path"]["type"], "string");
        assert_eq!(d.parameters["properties"]["output_format"]["type"], "string");
        assert_eq!(d.parameters["required"], json!(["pdf_path"]));
    }

    #[test]
    fn args_with_null_format_mean_default() {
        let args: ToolArgs =
            serde_json::from_value(json!({ "pdf_path": "/tmp/doc.pdf", "output_format": null }))
                .unwrap();
        let req = args.into_request().unwrap();
        assert_eq!(req.output_format().as_str(), "markdown");
    }

    #[test]
    fn args_without_format_mean_default() {
        let args: ToolArgs = serde_json::from_value(json!({ "pdf_path": "/tmp/doc.pdf" })).unwrap();
        assert!(args.output_format.is_none());
    }

    #[test]
    fn missing_pdf_path_is_invalid_arguments() {
        let tool = PdfOcrTool::default();
        let err = tokio_test::block_on(tool.execute(json!({}), CancellationToken::new()))
            .unwrap_err();
        assert!(matches!(err, PdfOcrError::InvalidArguments(_)), "got {err:?}");
    }

    #[test]
    fn empty_pdf_path_is_rejected_before_spawn() {
        let tool = PdfOcrTool::new(
            BackendConfig::builder()
                .program("/nonexistent/ocr")
                .no_env_file()
                .build()
                .unwrap(),
        );
        let err = tokio_test::block_on(
            tool.execute(json!({ "pdf_path": "" }), CancellationToken::new()),
        )
        .unwrap_err();
        assert!(matches!(err, PdfOcrError::EmptyPdfPath));
    }

    #[test]
    fn tool_is_object_safe() {
        let tool: Box<dyn Tool> = Box::new(PdfOcrTool::default());
        assert_eq!(tool.descriptor().name, TOOL_NAME);
    }
}
