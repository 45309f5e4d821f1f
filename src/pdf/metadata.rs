use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::FacturXError;

/// Document type code of a credit note.
const CREDIT_NOTE_CODE: &str = "381";

/// Descriptive PDF metadata written to XMP and the info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
}

/// The four invoice fields metadata is derived from.
#[derive(Debug, Clone, Default)]
pub struct BaseInfo {
    pub number: Option<String>,
    pub date: Option<NaiveDate>,
    pub seller: Option<String>,
    pub doc_type: Option<String>,
}

impl PdfMetadata {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        subject: impl Into<String>,
        keywords: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            subject: subject.into(),
            keywords: keywords.into(),
        }
    }

    /// Derive title, author, subject and keywords from invoice data.
    pub fn derive(info: &BaseInfo) -> Result<Self, FacturXError> {
        let missing = |field: &str| FacturXError::MissingBaseInfo(field.to_string());
        let number = info.number.as_deref().ok_or_else(|| missing("number"))?;
        let date = info.date.ok_or_else(|| missing("date"))?;
        let seller = info.seller.as_deref().ok_or_else(|| missing("seller"))?;
        let doc_type = info.doc_type.as_deref().ok_or_else(|| missing("doc_type"))?;

        let label = if doc_type.trim() == CREDIT_NOTE_CODE {
            "Refund"
        } else {
            "Invoice"
        };
        Ok(Self {
            title: format!("{seller}: {label} {number}"),
            author: seller.to_string(),
            subject: format!(
                "Factur-X {label} {number} dated {} issued by {seller}",
                date.format("%Y-%m-%d")
            ),
            keywords: format!("{label}, Factur-X"),
        })
    }
}
