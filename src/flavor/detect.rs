use tracing::{debug, warn};

use super::{Flavor, FlavorKind, Level};
use crate::core::FacturXError;
use crate::xml::{NamespaceMap, XPath, XmlTree};

/// Identify the flavor and level of a parsed document.
///
/// The root element's expanded name selects the flavor. The level comes
/// from the guideline identifier, or `fallback_level` when that is empty.
pub fn detect(tree: &XmlTree, fallback_level: Option<Level>) -> Result<Flavor, FacturXError> {
    let root = tree.root()?;

    let mut kind = None;
    for candidate in FlavorKind::ALL {
        let profile = candidate.profile();
        let ns = NamespaceMap::from_pairs(profile.namespaces);
        let (uri, local) = ns.resolve(profile.root)?;
        if tree.has_name(root, Some(uri), local) {
            kind = Some(candidate);
            break;
        }
    }

    let Some(kind) = kind else {
        return Err(FacturXError::UnrecognizedFlavor(format!(
            "root element <{}> in namespace {}",
            tree.name(root),
            tree.namespace_uri(root).unwrap_or("(none)")
        )));
    };

    let profile = kind.profile();
    let ns = NamespaceMap::from_pairs(profile.namespaces);
    let guideline = XPath::compile(profile.guideline_path)?
        .select(tree, &ns)?
        .first()
        .map(|id| tree.text(*id).trim().to_string())
        .unwrap_or_default();

    let level = if guideline.is_empty() {
        let level = fallback_level
            .filter(|l| profile.levels.iter().any(|(p, _)| p == l))
            .or_else(|| profile.levels.first().map(|(l, _)| *l))
            .ok_or_else(|| FacturXError::UnrecognizedFlavor(kind.name().to_string()))?;
        warn!(flavor = kind.name(), %level, "no guideline identifier, assuming level");
        level
    } else {
        Flavor::level_for_guideline(kind, &guideline).ok_or_else(|| {
            FacturXError::UnrecognizedFlavor(format!(
                "guideline `{guideline}` is not a known {} level",
                profile.label
            ))
        })?
    };

    let flavor = Flavor::new(kind, level)?;
    debug!(%flavor, "detected flavor");
    Ok(flavor)
}

/// Build a blank document for `kind` at `level`.
pub fn from_template(kind: FlavorKind, level: Level) -> Result<(Flavor, XmlTree), FacturXError> {
    let flavor = Flavor::new(kind, level)?;
    let tree = flavor.template()?;
    debug!(%flavor, "instantiated template");
    Ok((flavor, tree))
}
