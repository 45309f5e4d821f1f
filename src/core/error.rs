use std::fmt;

use thiserror::Error;

use super::codes::CodeList;
use crate::fields::FieldKind;

/// Errors that can occur while reading, editing, validating or writing a Factur-X document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FacturXError {
    /// The PDF or XML input is not of a supported kind.
    #[error("unsupported input: {0}")]
    InputType(String),

    /// The XML does not carry the namespace signature of any known flavor.
    #[error("unrecognized flavor: {0}")]
    UnrecognizedFlavor(String),

    /// The requested flavor or flavor/level combination is not registered.
    #[error("unknown flavor: {0}")]
    UnknownFlavor(String),

    /// The XML tree failed schema validation.
    #[error("schema validation failed: {0}")]
    SchemaInvalid(String),

    /// A required field is absent and has no registered default.
    #[error("missing required field `{0}`")]
    MissingRequiredField(String),

    /// A coded field holds a value outside its code list.
    #[error("invalid {code_type} code `{value}` in field `{field}`")]
    InvalidCode {
        field: String,
        value: String,
        code_type: CodeList,
    },

    /// The field name is not registered.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// The active flavor's XML does not carry this field.
    #[error("field `{field}` is not applicable to {flavor}")]
    FieldNotApplicable { field: String, flavor: String },

    /// The field path matched several nodes outside a repeating group.
    #[error("field `{field}` matched {matches} nodes, refusing to edit")]
    AmbiguousField { field: String, matches: usize },

    /// A date field holds text that is not `YYYYMMDD`, or was given a non-date value.
    #[error("malformed date in field `{field}`: `{text}`")]
    MalformedDate { field: String, text: String },

    /// An amount field holds text that is not a decimal number.
    #[error("malformed amount in field `{field}`: `{text}`")]
    MalformedAmount { field: String, text: String },

    /// The value kind does not fit the field kind.
    #[error("field `{field}` expects a {expected} value")]
    TypeMismatch { field: String, expected: FieldKind },

    /// One of the four fields used to derive PDF metadata is absent.
    #[error("cannot derive PDF metadata: field `{0}` is missing")]
    MissingBaseInfo(String),

    /// Building the embedded-file object graph failed.
    #[error("attachment build failed at {step}: {message}")]
    AttachmentBuild {
        step: AttachmentStep,
        message: String,
    },

    /// The PDF could not be loaded.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// XML parsing or serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// The XPath expression is not supported or malformed.
    #[error("XPath error: {0}")]
    XPath(String),

    /// JSON or YAML serialization error.
    #[error("export error: {0}")]
    Export(String),

    /// The export target has an extension with no known format.
    #[error("unsupported export format `{0}` (expected json, xml or yml)")]
    UnsupportedExportFormat(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FacturXError {
    pub(crate) fn attachment(step: AttachmentStep, message: impl Into<String>) -> Self {
        Self::AttachmentBuild {
            step,
            message: message.into(),
        }
    }
}

/// Sub-steps of the embedded-file assembly, reported by [`FacturXError::AttachmentBuild`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentStep {
    Load,
    StreamPackaging,
    Filespec,
    NameTree,
    Xmp,
    OutputIntents,
    Catalog,
    InfoDictionary,
    Serialize,
}

impl fmt::Display for AttachmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::StreamPackaging => "stream-packaging",
            Self::Filespec => "filespec",
            Self::NameTree => "name-tree",
            Self::Xmp => "xmp-metadata",
            Self::OutputIntents => "output-intents",
            Self::Catalog => "catalog",
            Self::InfoDictionary => "info-dictionary",
            Self::Serialize => "serialize",
        };
        f.write_str(name)
    }
}
