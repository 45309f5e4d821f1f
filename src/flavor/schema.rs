use tracing::debug;

use super::Flavor;
use crate::core::FacturXError;
use crate::xml::{XPath, XmlTree};

/// Structural signature a flavor's documents must carry.
#[derive(Debug)]
pub struct SchemaProfile {
    /// Paths that must select at least one element.
    pub required_sections: &'static [&'static str],
    /// Qualified name of the CII date string leaf.
    pub date_string: &'static str,
}

/// Schema validation seam.
///
/// The built-in [`StructuralValidator`] checks the document skeleton.
/// Callers holding the official XSDs can plug in a full validator through
/// [`crate::FacturXDocumentBuilder::schema_validator`].
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, flavor: &Flavor, tree: &XmlTree) -> Result<(), FacturXError>;
}

/// Checks root element, mandatory sections, the declared guideline and
/// date qualifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl SchemaValidator for StructuralValidator {
    fn validate(&self, flavor: &Flavor, tree: &XmlTree) -> Result<(), FacturXError> {
        let ns = flavor.namespaces();
        let profile = flavor.schema();

        let (root_uri, root_local) = ns.resolve(flavor.root_element())?;
        let root = tree.root()?;
        if !tree.has_name(root, Some(root_uri), root_local) {
            return Err(FacturXError::SchemaInvalid(format!(
                "root element is <{}>, expected <{}>",
                tree.name(root),
                flavor.root_element()
            )));
        }

        for section in profile.required_sections {
            if XPath::compile(section)?.select(tree, &ns)?.is_empty() {
                return Err(FacturXError::SchemaInvalid(format!(
                    "missing required element {section}"
                )));
            }
        }

        let guideline = XPath::compile(flavor.guideline_path())?.select(tree, &ns)?;
        if let Some(id) = guideline.first() {
            let text = tree.text(*id);
            if !text.trim().is_empty() && Flavor::level_for_guideline(flavor.kind(), &text).is_none() {
                return Err(FacturXError::SchemaInvalid(format!(
                    "guideline `{}` is not a {} level",
                    text.trim(),
                    flavor.label()
                )));
            }
        }

        let dates = XPath::compile(&format!("//{}", profile.date_string))?.select(tree, &ns)?;
        for date in dates {
            if !tree.text(date).trim().is_empty() && tree.attribute(date, "format").is_none() {
                return Err(FacturXError::SchemaInvalid(format!(
                    "<{}> without format qualifier",
                    tree.name(date)
                )));
            }
        }

        debug!(flavor = %flavor, "structural validation passed");
        Ok(())
    }
}
