//! Request types: the two inputs the adapter forwards to the backend.

use crate::error::PdfOcrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Output format requested from the backend.
///
/// Only `markdown` and `text` are documented, but the adapter does not
/// enforce that: any other value is kept verbatim in [`OutputFormat::Other`]
/// and passed through, leaving the decision to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `"markdown"` (default).
    #[default]
    Markdown,
    /// `"text"`.
    Text,
    /// Anything else, forwarded unchanged.
    Other(String),
}

impl OutputFormat {
    /// Resolve an optional caller-supplied value. `None` and `""` both mean
    /// the default.
    pub fn resolve(value: Option<&str>) -> Self {
        match value {
            None | Some("") => OutputFormat::Markdown,
            Some(v) => OutputFormat::from(v),
        }
    }

    /// The exact string passed to the backend.
    pub fn as_str(&self) -> &str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Text => "text",
            OutputFormat::Other(s) => s,
        }
    }

    /// Whether this is one of the two documented values.
    pub fn is_known(&self) -> bool {
        !matches!(self, OutputFormat::Other(_))
    }
}

impl From<&str> for OutputFormat {
    fn from(v: &str) -> Self {
        match v {
            "markdown" => OutputFormat::Markdown,
            "text" => OutputFormat::Text,
            other => OutputFormat::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OutputFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(OutputFormat::resolve(Some(&s)))
    }
}

/// A single, normalised OCR request.
///
/// Deserialising goes through [`OcrRequest::new`], so a request read from
/// JSON is held to the same rules as one built in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOcrRequest")]
pub struct OcrRequest {
    pdf_path: PathBuf,
    output_format: OutputFormat,
}

impl OcrRequest {
    /// Build a request, rejecting an empty `pdf_path`.
    ///
    /// The path is not checked for existence or readability; the backend
    /// reports those problems itself.
    pub fn new(
        pdf_path: impl Into<PathBuf>,
        output_format: Option<&str>,
    ) -> Result<Self, PdfOcrError> {
        let pdf_path = pdf_path.into();
        if pdf_path.as_os_str().is_empty() {
            return Err(PdfOcrError::EmptyPdfPath);
        }
        Ok(Self {
            pdf_path,
            output_format: OutputFormat::resolve(output_format),
        })
    }

    /// Replace the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn pdf_path(&self) -> &Path {
        &self.pdf_path
    }

    pub fn output_format(&self) -> &OutputFormat {
        &self.output_format
    }
}

/// Unvalidated wire form of [`OcrRequest`].
#[derive(Deserialize)]
struct RawOcrRequest {
    pdf_path: PathBuf,
    #[serde(default)]
    output_format: Option<String>,
}

impl TryFrom<RawOcrRequest> for OcrRequest {
    type Error = PdfOcrError;

    fn try_from(raw: RawOcrRequest) -> Result<Self, Self::Error> {
        OcrRequest::new(raw.pdf_path, raw.output_format.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_format_defaults_to_markdown() {
        let req = OcrRequest::new("/tmp/doc.pdf", None).unwrap();
        assert_eq!(req.output_format().as_str(), "markdown");
    }

    #[test]
    fn empty_format_defaults_to_markdown() {
        let req = OcrRequest::new("/tmp/doc.pdf", Some("")).unwrap();
        assert_eq!(req.output_format(), &OutputFormat::Markdown);
    }

    #[test]
    fn text_format_is_kept() {
        let req = OcrRequest::new("/tmp/doc.pdf", Some("text")).unwrap();
        assert_eq!(req.output_format().as_str(), "text");
    }

    #[test]
    fn unknown_format_passes_through_verbatim() {
        let fmt = OutputFormat::resolve(Some("HTML"));
        assert_eq!(fmt, OutputFormat::Other("HTML".into()));
        assert_eq!(fmt.as_str(), "HTML");
        assert!(!fmt.is_known());
    }

    #[test]
    fn format_match_is_case_sensitive() {
        assert_eq!(
            OutputFormat::from("Markdown"),
            OutputFormat::Other("Markdown".into())
        );
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            OcrRequest::new("", None),
            Err(PdfOcrError::EmptyPdfPath)
        ));
    }

    #[test]
    fn whitespace_path_is_forwarded_as_is() {
        let req = OcrRequest::new(" ", None).unwrap();
        assert_eq!(req.pdf_path(), Path::new(" "));
    }

    #[test]
    fn deserialising_empty_path_is_rejected() {
        let err = serde_json::from_str::<OcrRequest>(r#"{"pdf_path":"","output_format":"text"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("pdf_path must not be empty"), "got: {err}");
    }

    #[test]
    fn deserialising_applies_format_default() {
        let req: OcrRequest = serde_json::from_str(r#"{"pdf_path":"/tmp/doc.pdf"}"#).unwrap();
        assert_eq!(req.output_format(), &OutputFormat::Markdown);

        let req: OcrRequest =
            serde_json::from_str(r#"{"pdf_path":"/tmp/doc.pdf","output_format":""}"#).unwrap();
        assert_eq!(req.output_format(), &OutputFormat::Markdown);

        let json = serde_json::to_string(&OcrRequest::new("/tmp/doc.pdf", Some("text")).unwrap())
            .unwrap();
        let back: OcrRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output_format(), &OutputFormat::Text);
    }

    #[test]
    fn relative_and_missing_paths_are_accepted() {
        let req = OcrRequest::new("does/not/exist.pdf", None).unwrap();
        assert_eq!(req.pdf_path(), Path::new("does/not/exist.pdf"));
    }

    #[test]
    fn format_serialises_as_plain_string() {
        let json = serde_json::to_string(&OutputFormat::Other("docx".into())).unwrap();
        assert_eq!(json, "\"docx\"");
        let back: OutputFormat = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(back, OutputFormat::Text);
    }
}
