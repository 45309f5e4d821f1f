//! # facturx
//!
//! Factur-X and ZUGFeRD hybrid invoices: read, edit, validate and embed
//! the invoice XML carried inside a PDF/A-3 document.
//!
//! A [`FacturXDocument`] owns the source PDF bytes and a mutable XML tree.
//! Fields are addressed by semantic name (`number`, `seller`,
//! `tax_rate`, …) and resolved through the active [`Flavor`]; writing the
//! PDF rebuilds the embedded file, `/AF`, XMP metadata and info dictionary
//! in memory and serializes once.
//!
//! All amounts use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use facturx::{FacturXDocument, FlavorKind, Level, WriteOptions};
//! use rust_decimal::Decimal;
//!
//! let mut doc = FacturXDocument::builder()
//!     .flavor(FlavorKind::FacturX)
//!     .level(Level::Basic)
//!     .open("visual-invoice.pdf")?;
//!
//! doc.set("number", "F-2024-001")?;
//! doc.set("date", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())?;
//! doc.set("seller", "ACME SARL")?;
//! doc.set("amount_total", Decimal::new(11900, 2))?;
//!
//! doc.write_pdf("facturx-invoice.pdf", &WriteOptions::default())?;
//! # Ok::<(), facturx::FacturXError>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | (default) | Library: flavors, fields, validation, PDF embed/extract, export |
//! | `cli` | `facturx` binary with `dump` and `validate` commands |

pub mod core;
pub mod fields;
pub mod flavor;
pub mod pdf;
pub mod validation;
pub mod xml;

mod document;
mod export;

pub use crate::core::{AttachmentStep, CodeList, FacturXError};
pub use document::{FacturXDocument, FacturXDocumentBuilder, PdfInput, WriteOptions, XmlInput};
pub use export::{ExportFormat, ExportValue};
pub use fields::{FieldKind, FieldValue};
pub use flavor::{Flavor, FlavorKind, Level, SchemaValidator, StructuralValidator};
pub use pdf::{Attachment, PdfMetadata, extract_xml};
pub use validation::ValidationReport;
