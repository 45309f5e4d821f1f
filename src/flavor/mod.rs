//! Invoice XML flavors (Factur-X, ZUGFeRD 1.0) and their conformance levels.
//!
//! | Flavor | Levels | Embedded file |
//! |--------|--------|---------------|
//! | Factur-X | minimum, basicwl, basic, en16931, extended | `factur-x.xml` |
//! | ZUGFeRD 1.0 | basic, comfort, extended | `ZUGFeRD-invoice.xml` |
//!
//! Everything flavor-specific (namespaces, schema signature, filenames,
//! XMP extension schema, templates) is reached through [`Flavor`]; other
//! modules never branch on flavor names.

mod detect;
mod schema;
mod templates;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub use detect::{detect, from_template};
pub use schema::{SchemaProfile, SchemaValidator, StructuralValidator};

use crate::core::{CodeList, FacturXError};
use crate::xml::{NamespaceMap, XmlTree};

/// Embedded filenames recognised on read, in addition to each flavor's canonical name.
pub const VALID_INVOICE_FILENAMES: &[&str] = &[
    "factur-x.xml",
    "ZUGFeRD-invoice.xml",
    "zugferd-invoice.xml",
    "xrechnung.xml",
];

/// Check whether an embedded file name denotes invoice XML (case-insensitive).
pub fn is_invoice_filename(name: &str) -> bool {
    VALID_INVOICE_FILENAMES
        .iter()
        .any(|valid| valid.eq_ignore_ascii_case(name))
}

/// The invoice XML standard family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FlavorKind {
    /// Factur-X 1.0 / ZUGFeRD 2.x (UN/CEFACT CII D16B).
    FacturX,
    /// ZUGFeRD 1.0 (CII D13B "CrossIndustryDocument").
    Zugferd,
}

impl FlavorKind {
    pub const ALL: [FlavorKind; 2] = [FlavorKind::FacturX, FlavorKind::Zugferd];

    pub fn name(&self) -> &'static str {
        self.profile().name
    }

    /// Levels this flavor defines, lowest first.
    pub fn levels(&self) -> impl Iterator<Item = Level> {
        self.profile().levels.iter().map(|(l, _)| *l)
    }

    fn profile(&self) -> &'static FlavorProfile {
        match self {
            Self::FacturX => &FACTURX,
            Self::Zugferd => &ZUGFERD,
        }
    }
}

impl FromStr for FlavorKind {
    type Err = FacturXError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "factur-x" | "facturx" => Ok(Self::FacturX),
            "zugferd" => Ok(Self::Zugferd),
            other => Err(FacturXError::UnknownFlavor(other.to_string())),
        }
    }
}

impl fmt::Display for FlavorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Conformance level: the subset of the standard a document declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Minimum,
    BasicWl,
    Basic,
    Comfort,
    En16931,
    Extended,
}

impl Level {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::BasicWl => "basicwl",
            Self::Basic => "basic",
            Self::Comfort => "comfort",
            Self::En16931 => "en16931",
            Self::Extended => "extended",
        }
    }

    /// The XMP `ConformanceLevel` value.
    pub fn conformance_label(&self) -> &'static str {
        match self {
            Self::Minimum => "MINIMUM",
            Self::BasicWl => "BASIC WL",
            Self::Basic => "BASIC",
            Self::Comfort => "COMFORT",
            Self::En16931 => "EN 16931",
            Self::Extended => "EXTENDED",
        }
    }

    /// Levels from BASIC WL upward carry header tax breakdown, notes and payment terms.
    pub(crate) fn has_breakdown(&self) -> bool {
        *self != Self::Minimum
    }

    /// Levels from BASIC upward carry invoice lines.
    pub(crate) fn has_lines(&self) -> bool {
        !matches!(self, Self::Minimum | Self::BasicWl)
    }
}

impl FromStr for Level {
    type Err = FacturXError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
            "minimum" => Ok(Self::Minimum),
            "basicwl" => Ok(Self::BasicWl),
            "basic" => Ok(Self::Basic),
            "comfort" => Ok(Self::Comfort),
            "en16931" => Ok(Self::En16931),
            "extended" => Ok(Self::Extended),
            _ => Err(FacturXError::UnknownFlavor(format!("unknown level `{s}`"))),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields of the XMP extension schema a flavor declares.
#[derive(Debug)]
pub struct XmpProfile {
    pub namespace: &'static str,
    pub prefix: &'static str,
    pub schema_name: &'static str,
    pub version: &'static str,
}

#[derive(Debug)]
struct FlavorProfile {
    name: &'static str,
    label: &'static str,
    namespaces: &'static [(&'static str, &'static str)],
    root: &'static str,
    guideline_path: &'static str,
    canonical_filename: &'static str,
    levels: &'static [(Level, &'static str)],
    xmp: XmpProfile,
    schema: SchemaProfile,
}

/// CII D16B namespace URIs (Factur-X).
pub mod cii_ns {
    pub const RSM: &str = "urn:un:unece:uncefact:data:standard:CrossIndustryInvoice:100";
    pub const RAM: &str =
        "urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:100";
    pub const QDT: &str = "urn:un:unece:uncefact:data:standard:QualifiedDataType:100";
    pub const UDT: &str = "urn:un:unece:uncefact:data:standard:UnqualifiedDataType:100";
}

/// ZUGFeRD 1.0 namespace URIs.
pub mod ferd_ns {
    pub const RSM: &str = "urn:ferd:CrossIndustryDocument:invoice:1p0";
    pub const RAM: &str =
        "urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:12";
    pub const UDT: &str = "urn:un:unece:uncefact:data:standard:UnqualifiedDataType:15";
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
}

static FACTURX: FlavorProfile = FlavorProfile {
    name: "factur-x",
    label: "Factur-X",
    namespaces: &[
        ("rsm", cii_ns::RSM),
        ("ram", cii_ns::RAM),
        ("qdt", cii_ns::QDT),
        ("udt", cii_ns::UDT),
    ],
    root: "rsm:CrossIndustryInvoice",
    guideline_path: "/rsm:CrossIndustryInvoice/rsm:ExchangedDocumentContext/ram:GuidelineSpecifiedDocumentContextParameter/ram:ID",
    canonical_filename: "factur-x.xml",
    levels: &[
        (Level::Minimum, "urn:factur-x.eu:1p0:minimum"),
        (Level::BasicWl, "urn:factur-x.eu:1p0:basicwl"),
        (
            Level::Basic,
            "urn:cen.eu:en16931:2017#compliant#urn:factur-x.eu:1p0:basic",
        ),
        (Level::En16931, "urn:cen.eu:en16931:2017"),
        (
            Level::Extended,
            "urn:cen.eu:en16931:2017#conformant#urn:factur-x.eu:1p0:extended",
        ),
    ],
    xmp: XmpProfile {
        namespace: "urn:factur-x:pdfa:CrossIndustryDocument:invoice:1p0#",
        prefix: "fx",
        schema_name: "Factur-X PDFA Extension Schema",
        version: "1.0",
    },
    schema: SchemaProfile {
        required_sections: &[
            "/rsm:CrossIndustryInvoice/rsm:ExchangedDocumentContext/ram:GuidelineSpecifiedDocumentContextParameter/ram:ID",
            "/rsm:CrossIndustryInvoice/rsm:ExchangedDocument",
            "/rsm:CrossIndustryInvoice/rsm:SupplyChainTradeTransaction/ram:ApplicableHeaderTradeAgreement",
            "/rsm:CrossIndustryInvoice/rsm:SupplyChainTradeTransaction/ram:ApplicableHeaderTradeDelivery",
            "/rsm:CrossIndustryInvoice/rsm:SupplyChainTradeTransaction/ram:ApplicableHeaderTradeSettlement",
        ],
        date_string: "udt:DateTimeString",
    },
};

static ZUGFERD: FlavorProfile = FlavorProfile {
    name: "zugferd",
    label: "ZUGFeRD",
    namespaces: &[
        ("rsm", ferd_ns::RSM),
        ("ram", ferd_ns::RAM),
        ("udt", ferd_ns::UDT),
        ("xsi", ferd_ns::XSI),
    ],
    root: "rsm:CrossIndustryDocument",
    guideline_path: "/rsm:CrossIndustryDocument/rsm:SpecifiedExchangedDocumentContext/ram:GuidelineSpecifiedDocumentContextParameter/ram:ID",
    canonical_filename: "ZUGFeRD-invoice.xml",
    levels: &[
        (Level::Basic, "urn:ferd:CrossIndustryDocument:invoice:1p0:basic"),
        (Level::Comfort, "urn:ferd:CrossIndustryDocument:invoice:1p0:comfort"),
        (Level::Extended, "urn:ferd:CrossIndustryDocument:invoice:1p0:extended"),
    ],
    xmp: XmpProfile {
        namespace: "urn:ferd:pdfa:CrossIndustryDocument:invoice:1p0#",
        prefix: "zf",
        schema_name: "ZUGFeRD PDFA Extension Schema",
        version: "1.0",
    },
    schema: SchemaProfile {
        required_sections: &[
            "/rsm:CrossIndustryDocument/rsm:SpecifiedExchangedDocumentContext/ram:GuidelineSpecifiedDocumentContextParameter/ram:ID",
            "/rsm:CrossIndustryDocument/rsm:HeaderExchangedDocument",
            "/rsm:CrossIndustryDocument/rsm:SpecifiedSupplyChainTradeTransaction/ram:ApplicableSupplyChainTradeAgreement",
            "/rsm:CrossIndustryDocument/rsm:SpecifiedSupplyChainTradeTransaction/ram:ApplicableSupplyChainTradeDelivery",
            "/rsm:CrossIndustryDocument/rsm:SpecifiedSupplyChainTradeTransaction/ram:ApplicableSupplyChainTradeSettlement",
        ],
        date_string: "udt:DateTimeString",
    },
};

/// An immutable flavor + conformance level descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Flavor {
    kind: FlavorKind,
    level: Level,
}

impl Flavor {
    /// Pair a flavor with a level it defines, or fail with `UnknownFlavor`.
    pub fn new(kind: FlavorKind, level: Level) -> Result<Self, FacturXError> {
        if kind.profile().levels.iter().any(|(l, _)| *l == level) {
            Ok(Self { kind, level })
        } else {
            Err(FacturXError::UnknownFlavor(format!(
                "{} has no `{}` level",
                kind.name(),
                level
            )))
        }
    }

    /// Resolve a flavor by name (`factur-x`, `zugferd`) and level name.
    pub fn from_names(flavor: &str, level: &str) -> Result<Self, FacturXError> {
        Self::new(flavor.parse()?, level.parse()?)
    }

    pub fn kind(&self) -> FlavorKind {
        self.kind
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn name(&self) -> &'static str {
        self.profile().name
    }

    /// Human-readable standard name (`Factur-X`, `ZUGFeRD`).
    pub fn label(&self) -> &'static str {
        self.profile().label
    }

    pub fn namespaces(&self) -> NamespaceMap {
        NamespaceMap::from_pairs(self.profile().namespaces)
    }

    /// Qualified name of the document root element.
    pub fn root_element(&self) -> &'static str {
        self.profile().root
    }

    /// Path of the guideline identifier that declares the level.
    pub fn guideline_path(&self) -> &'static str {
        self.profile().guideline_path
    }

    /// The guideline identifier written for this level.
    pub fn guideline_id(&self) -> &'static str {
        self.profile()
            .levels
            .iter()
            .find(|(l, _)| *l == self.level)
            .map(|(_, urn)| *urn)
            .unwrap_or_default()
    }

    /// Name under which the invoice XML is embedded on write.
    pub fn canonical_filename(&self) -> &'static str {
        self.profile().canonical_filename
    }

    pub fn code_list(&self, list: CodeList) -> &'static [&'static str] {
        list.codes()
    }

    pub fn schema(&self) -> &'static SchemaProfile {
        &self.profile().schema
    }

    pub fn xmp(&self) -> &'static XmpProfile {
        &self.profile().xmp
    }

    /// Instantiate a blank document for this flavor and level.
    pub fn template(&self) -> Result<XmlTree, FacturXError> {
        let xml = templates::render(*self)?;
        XmlTree::parse_str(&xml)
    }

    /// Map a guideline identifier to one of this flavor's levels.
    pub(crate) fn level_for_guideline(kind: FlavorKind, id: &str) -> Option<Level> {
        let profile = kind.profile();
        let id = id.trim();
        if let Some((level, _)) = profile.levels.iter().find(|(_, urn)| *urn == id) {
            return Some(*level);
        }
        let lower = id.to_ascii_lowercase();
        let guessed = if lower.contains("minimum") {
            Level::Minimum
        } else if lower.contains("basicwl") {
            Level::BasicWl
        } else if lower.contains("extended") {
            Level::Extended
        } else if lower.contains("comfort") {
            Level::Comfort
        } else if lower.ends_with(":basic") {
            Level::Basic
        } else if lower.starts_with("urn:cen.eu:en16931:2017") {
            Level::En16931
        } else {
            return None;
        };
        profile
            .levels
            .iter()
            .any(|(l, _)| *l == guessed)
            .then_some(guessed)
    }

    fn profile(&self) -> &'static FlavorProfile {
        self.kind.profile()
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.level)
    }
}
