//! Semantic invoice fields and their typed values.
//!
//! A field name (`seller`, `tax_rate`, …) maps through the static
//! [registry](FIELDS) to a flavor-specific path; [`FieldKind`] decides how
//! the leaf text is parsed on read and serialized on write.

mod accessor;
mod registry;

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

pub(crate) use accessor::{get, get_all, set};
pub use accessor::{GroupRegistry, ResolvedNode, resolve};
pub use registry::{FIELDS, FieldSpec, lookup};

use crate::core::CodeList;
use crate::xml::format_decimal;

/// How a field's leaf text is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    Text,
    /// `YYYYMMDD` with a `format="102"` qualifier.
    Date,
    Amount,
    /// Text restricted to a code list.
    Code(CodeList),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Date => f.write_str("date"),
            Self::Amount => f.write_str("amount"),
            Self::Code(list) => write!(f, "{list} code"),
        }
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Amount(Decimal),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            Self::Amount(a) => Some(*a),
            _ => None,
        }
    }

    /// Leaf text as stored in the XML.
    pub(crate) fn to_xml_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Date(d) => d.format("%Y%m%d").to_string(),
            Self::Amount(a) => format_decimal(*a),
        }
    }
}

/// Dates display as ISO 8601, amounts with at least two decimals.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Amount(a) => f.write_str(&format_decimal(*a)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<Decimal> for FieldValue {
    fn from(a: Decimal) -> Self {
        Self::Amount(a)
    }
}
