use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::core::FacturXError;
use crate::fields::{self, FieldValue, GroupRegistry};
use crate::flavor::{self, Flavor, FlavorKind, Level, SchemaValidator, StructuralValidator};
use crate::pdf::{self, Attachment, BaseInfo, EmbedRequest, PdfMetadata};
use crate::validation::{self, ValidationReport};
use crate::xml::XmlTree;

/// Where the source PDF comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfInput {
    /// A `.pdf` file on disk.
    Path(PathBuf),
    /// PDF bytes in memory; must start with `%PDF-`.
    Bytes(Vec<u8>),
}

impl PdfInput {
    fn load(self) -> Result<Vec<u8>, FacturXError> {
        match self {
            Self::Path(path) => {
                let is_pdf = path
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
                if !is_pdf {
                    return Err(FacturXError::InputType(format!(
                        "{} is not a .pdf file",
                        path.display()
                    )));
                }
                if !path.is_file() {
                    return Err(FacturXError::InputType(format!(
                        "{} does not exist",
                        path.display()
                    )));
                }
                Ok(std::fs::read(&path)?)
            }
            Self::Bytes(bytes) if bytes.starts_with(b"%PDF-") => Ok(bytes),
            Self::Bytes(_) => Err(FacturXError::InputType(
                "byte buffer does not start with %PDF-".into(),
            )),
        }
    }
}

impl From<PathBuf> for PdfInput {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<&Path> for PdfInput {
    fn from(p: &Path) -> Self {
        Self::Path(p.to_path_buf())
    }
}

impl From<&str> for PdfInput {
    fn from(p: &str) -> Self {
        Self::Path(PathBuf::from(p))
    }
}

impl From<Vec<u8>> for PdfInput {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for PdfInput {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

/// Invoice XML supplied by the caller instead of the embedded one.
#[derive(Debug, Clone)]
pub enum XmlInput {
    Bytes(Vec<u8>),
    Path(PathBuf),
    Tree(XmlTree),
}

impl XmlInput {
    fn into_tree(self) -> Result<XmlTree, FacturXError> {
        match self {
            Self::Bytes(bytes) => XmlTree::parse(&bytes),
            Self::Path(path) => XmlTree::parse(&std::fs::read(path)?),
            Self::Tree(tree) => Ok(tree),
        }
    }
}

impl From<Vec<u8>> for XmlInput {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for XmlInput {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<&str> for XmlInput {
    fn from(s: &str) -> Self {
        Self::Bytes(s.as_bytes().to_vec())
    }
}

impl From<PathBuf> for XmlInput {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<XmlTree> for XmlInput {
    fn from(t: XmlTree) -> Self {
        Self::Tree(t)
    }
}

/// Options for writing the PDF.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    metadata: Option<PdfMetadata>,
    attachments: Vec<Attachment>,
    timestamp: Option<DateTime<Utc>>,
    check_schema: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            metadata: None,
            attachments: Vec::new(),
            timestamp: None,
            check_schema: true,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit metadata instead of deriving it from the invoice.
    pub fn metadata(mut self, metadata: PdfMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    /// Fix every date written to the PDF (reproducible output).
    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Validate the document before writing (default: on).
    pub fn check_schema(mut self, check: bool) -> Self {
        self.check_schema = check;
        self
    }
}

/// Builder for [`FacturXDocument`].
///
/// ```no_run
/// use facturx::{FacturXDocument, FlavorKind, Level};
///
/// let doc = FacturXDocument::builder()
///     .flavor(FlavorKind::FacturX)
///     .level(Level::BasicWl)
///     .open("invoice.pdf")?;
/// assert_eq!(doc.flavor().level(), Level::BasicWl);
/// # Ok::<(), facturx::FacturXError>(())
/// ```
#[derive(Default)]
pub struct FacturXDocumentBuilder {
    kind: Option<FlavorKind>,
    level: Option<Level>,
    xml: Option<XmlInput>,
    schema: Option<Box<dyn SchemaValidator>>,
}

impl FacturXDocumentBuilder {
    /// Flavor of the blank template used when the PDF carries no XML.
    pub fn flavor(mut self, kind: FlavorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Level of the blank template, and fallback when the XML does not declare one.
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Seed the document with this XML instead of the embedded one.
    pub fn xml(mut self, xml: impl Into<XmlInput>) -> Self {
        self.xml = Some(xml.into());
        self
    }

    pub fn schema_validator(mut self, validator: Box<dyn SchemaValidator>) -> Self {
        self.schema = Some(validator);
        self
    }

    pub fn open(self, pdf: impl Into<PdfInput>) -> Result<FacturXDocument, FacturXError> {
        let pdf = pdf.into().load()?;
        let schema = self
            .schema
            .unwrap_or_else(|| Box::new(StructuralValidator));

        let (tree, flavor, embedded_filename) = match self.xml {
            Some(xml) => {
                let tree = xml.into_tree()?;
                let flavor = detect_requested(&tree, self.kind, self.level)?;
                (tree, flavor, None)
            }
            None => match pdf::extract_xml(&pdf)? {
                Some((name, bytes)) => {
                    let tree = XmlTree::parse(&bytes)?;
                    let flavor = detect_requested(&tree, self.kind, self.level)?;
                    (tree, flavor, Some(name))
                }
                None => {
                    let kind = self.kind.unwrap_or(FlavorKind::FacturX);
                    let level = match self.level {
                        Some(level) => level,
                        None => kind.levels().next().ok_or_else(|| {
                            FacturXError::UnknownFlavor(kind.name().to_string())
                        })?,
                    };
                    let (flavor, tree) = flavor::from_template(kind, level)?;
                    (tree, flavor, None)
                }
            },
        };

        schema.validate(&flavor, &tree)?;
        info!(%flavor, source = embedded_filename.as_deref().unwrap_or("-"), "document opened");

        Ok(FacturXDocument {
            pdf,
            tree,
            flavor,
            groups: GroupRegistry::new(),
            schema,
            embedded_filename,
        })
    }
}

fn detect_requested(
    tree: &XmlTree,
    kind: Option<FlavorKind>,
    level: Option<Level>,
) -> Result<Flavor, FacturXError> {
    let flavor = flavor::detect(tree, level)?;
    if let Some(kind) = kind.filter(|k| *k != flavor.kind()) {
        warn!(requested = %kind, detected = %flavor, "XML flavor differs from the requested one");
    }
    Ok(flavor)
}

/// A PDF plus the invoice XML it carries (or will carry).
///
/// The XML tree is the source of truth; PDF metadata is derived from it
/// on write. The source PDF bytes are never modified.
pub struct FacturXDocument {
    pdf: Vec<u8>,
    tree: XmlTree,
    flavor: Flavor,
    groups: GroupRegistry,
    schema: Box<dyn SchemaValidator>,
    embedded_filename: Option<String>,
}

impl fmt::Debug for FacturXDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacturXDocument")
            .field("flavor", &self.flavor)
            .field("pdf_len", &self.pdf.len())
            .field("embedded_filename", &self.embedded_filename)
            .finish_non_exhaustive()
    }
}

impl FacturXDocument {
    pub fn builder() -> FacturXDocumentBuilder {
        FacturXDocumentBuilder::default()
    }

    /// Open a PDF, reading its embedded XML or starting from a Factur-X MINIMUM template.
    pub fn open(pdf: impl Into<PdfInput>) -> Result<Self, FacturXError> {
        Self::builder().open(pdf)
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn xml(&self) -> &XmlTree {
        &self.tree
    }

    /// The source PDF as loaded.
    pub fn pdf_bytes(&self) -> &[u8] {
        &self.pdf
    }

    /// Name the XML was embedded under in the source PDF, if it had one.
    pub fn embedded_filename(&self) -> Option<&str> {
        self.embedded_filename.as_deref()
    }

    /// First value of a field; `None` when absent or empty.
    pub fn get(&self, field: &str) -> Result<Option<FieldValue>, FacturXError> {
        fields::get(&self.tree, &self.flavor, field)
    }

    /// Every value of a field, in document order.
    pub fn get_all(&self, field: &str) -> Result<Vec<FieldValue>, FacturXError> {
        fields::get_all(&self.tree, &self.flavor, field)
    }

    /// Write a field. Repeating-group fields written twice start a new
    /// group occurrence.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Result<(), FacturXError> {
        fields::set(
            &mut self.tree,
            &mut self.groups,
            &self.flavor,
            field,
            &value.into(),
        )
    }

    /// Validate, backfilling defaults of absent required fields.
    pub fn validate(&mut self) -> Result<ValidationReport, FacturXError> {
        validation::validate(
            &mut self.tree,
            &mut self.groups,
            &self.flavor,
            self.schema.as_ref(),
        )
    }

    pub fn is_valid(&mut self) -> bool {
        match self.validate() {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "document is not valid");
                false
            }
        }
    }

    /// Swap in new invoice XML. The tree is detected and schema-checked first;
    /// on error the current XML is kept.
    pub fn replace_xml(&mut self, xml: impl Into<XmlInput>) -> Result<(), FacturXError> {
        let tree = xml.into().into_tree()?;
        let flavor = flavor::detect(&tree, Some(self.flavor.level()))?;
        self.schema.validate(&flavor, &tree)?;
        info!(from = %self.flavor, to = %flavor, "invoice XML replaced");
        self.tree = tree;
        self.flavor = flavor;
        self.groups.reset();
        Ok(())
    }

    /// PDF metadata derived from number, date, seller and document type.
    pub fn metadata(&self) -> Result<PdfMetadata, FacturXError> {
        let text = |field: &str| -> Result<Option<String>, FacturXError> {
            Ok(self.get(field)?.map(|v| v.to_string()))
        };
        let info = BaseInfo {
            number: text("number")?,
            date: self.get("date")?.and_then(|v| v.as_date()),
            seller: text("seller")?,
            doc_type: text("doc_type")?,
        };
        PdfMetadata::derive(&info)
    }

    /// Serialized invoice XML.
    pub fn xml_bytes(&self) -> Result<Vec<u8>, FacturXError> {
        self.tree.to_bytes()
    }

    /// Build the output PDF in memory.
    pub fn to_pdf_bytes(&mut self, options: &WriteOptions) -> Result<Vec<u8>, FacturXError> {
        let started = Instant::now();
        if options.check_schema {
            self.validate()?;
        }
        let metadata = match &options.metadata {
            Some(m) => m.clone(),
            None => self.metadata()?,
        };
        let xml = self.xml_bytes()?;
        let request = EmbedRequest {
            flavor: &self.flavor,
            xml: &xml,
            metadata: &metadata,
            attachments: &options.attachments,
            timestamp: options.timestamp.unwrap_or_else(Utc::now),
        };
        let out = pdf::embed(&self.pdf, &request)?;
        info!(
            flavor = %self.flavor,
            bytes = out.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "PDF written"
        );
        Ok(out)
    }

    /// Write the output PDF to `path`.
    pub fn write_pdf(
        &mut self,
        path: impl AsRef<Path>,
        options: &WriteOptions,
    ) -> Result<(), FacturXError> {
        let bytes = self.to_pdf_bytes(options)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
