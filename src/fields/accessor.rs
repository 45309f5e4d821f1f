use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::{FieldKind, FieldSpec, FieldValue, lookup};
use crate::core::FacturXError;
use crate::flavor::Flavor;
use crate::xml::{Element, XPath, XmlTree};

/// Qualifier code for `YYYYMMDD` date strings.
const DATE_FORMAT_CODE: &str = "102";

/// Elements a field path matched, plus the repeating group its leaves live in.
#[derive(Clone)]
pub struct ResolvedNode<'d> {
    pub matches: Vec<Element<'d>>,
    pub group: Option<&'static str>,
}

/// Resolve `spec` against the tree. `None` means the flavor does not carry
/// the field; an empty match list means the document lacks the node.
pub fn resolve<'d>(
    tree: &'d XmlTree,
    flavor: &Flavor,
    spec: &FieldSpec,
) -> Result<Option<ResolvedNode<'d>>, FacturXError> {
    let Some(path) = spec.xpath(flavor) else {
        return Ok(None);
    };
    let matches = XPath::compile(path)?.select(tree, &flavor.namespaces())?;
    Ok(Some(ResolvedNode {
        matches,
        group: spec.group,
    }))
}

#[derive(Debug, Clone)]
struct GroupState {
    /// Position among the group's occurrences, in document order.
    index: usize,
    written: BTreeSet<&'static str>,
}

/// Per-document record of which repeating-group occurrence is being filled.
///
/// Keyed by group tag. Writing a field already written in the occurrence
/// in use starts a new occurrence after the last existing one.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: BTreeMap<&'static str, GroupState>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.groups.clear();
    }

    /// Occurrence currently receiving writes for `tag`.
    pub fn in_use(&self, tag: &str) -> Option<usize> {
        self.groups.get(tag).map(|g| g.index)
    }
}

/// First non-empty occurrence of the field, typed.
pub(crate) fn get(
    tree: &XmlTree,
    flavor: &Flavor,
    name: &str,
) -> Result<Option<FieldValue>, FacturXError> {
    let spec = lookup(name)?;
    let Some(resolved) = resolve(tree, flavor, spec)? else {
        return Ok(None);
    };
    match resolved.matches.first() {
        Some(id) => parse(spec, &tree.text(*id)),
        None => Ok(None),
    }
}

/// Every non-empty occurrence of the field in document order.
pub(crate) fn get_all(
    tree: &XmlTree,
    flavor: &Flavor,
    name: &str,
) -> Result<Vec<FieldValue>, FacturXError> {
    let spec = lookup(name)?;
    let Some(resolved) = resolve(tree, flavor, spec)? else {
        return Ok(Vec::new());
    };
    let mut values = Vec::new();
    for id in resolved.matches {
        if let Some(v) = parse(spec, &tree.text(id))? {
            values.push(v);
        }
    }
    Ok(values)
}

fn parse(spec: &FieldSpec, text: &str) -> Result<Option<FieldValue>, FacturXError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let value = match spec.kind {
        FieldKind::Text | FieldKind::Code(_) => FieldValue::Text(text.to_string()),
        FieldKind::Date => NaiveDate::parse_from_str(text, "%Y%m%d")
            .ok()
            .filter(|_| text.len() == 8)
            .map(FieldValue::Date)
            .ok_or_else(|| FacturXError::MalformedDate {
                field: spec.name.to_string(),
                text: text.to_string(),
            })?,
        FieldKind::Amount => Decimal::from_str(text)
            .map(FieldValue::Amount)
            .map_err(|_| FacturXError::MalformedAmount {
                field: spec.name.to_string(),
                text: text.to_string(),
            })?,
    };
    Ok(Some(value))
}

/// Check a value against the field kind and render its leaf text.
fn render(spec: &FieldSpec, value: &FieldValue) -> Result<String, FacturXError> {
    let mismatch = || FacturXError::TypeMismatch {
        field: spec.name.to_string(),
        expected: spec.kind,
    };
    match (spec.kind, value) {
        (FieldKind::Text | FieldKind::Code(_), FieldValue::Text(s)) => Ok(s.clone()),
        (FieldKind::Text | FieldKind::Code(_), _) => Err(mismatch()),
        (FieldKind::Date, FieldValue::Date(d)) => Ok(FieldValue::Date(*d).to_xml_text()),
        (FieldKind::Date, other) => Err(FacturXError::MalformedDate {
            field: spec.name.to_string(),
            text: other.to_string(),
        }),
        (FieldKind::Amount, FieldValue::Amount(a)) => Ok(FieldValue::Amount(*a).to_xml_text()),
        (FieldKind::Amount, FieldValue::Text(s)) => Decimal::from_str(s.trim())
            .map(|a| FieldValue::Amount(a).to_xml_text())
            .map_err(|_| FacturXError::MalformedAmount {
                field: spec.name.to_string(),
                text: s.clone(),
            }),
        (FieldKind::Amount, FieldValue::Date(_)) => Err(mismatch()),
    }
}

/// Write a field. Nothing is mutated when an error is returned.
pub(crate) fn set(
    tree: &mut XmlTree,
    groups: &mut GroupRegistry,
    flavor: &Flavor,
    name: &str,
    value: &FieldValue,
) -> Result<(), FacturXError> {
    let tree: &XmlTree = tree;
    let spec = lookup(name)?;
    let text = render(spec, value)?;
    let not_applicable = || FacturXError::FieldNotApplicable {
        field: spec.name.to_string(),
        flavor: flavor.to_string(),
    };
    let resolved = resolve(tree, flavor, spec)?.ok_or_else(not_applicable)?;
    if resolved.matches.is_empty() {
        return Err(not_applicable());
    }

    let target = match resolved.group {
        None if resolved.matches.len() > 1 => {
            return Err(FacturXError::AmbiguousField {
                field: spec.name.to_string(),
                matches: resolved.matches.len(),
            });
        }
        None => resolved.matches[0],
        Some(tag) => group_target(tree, groups, flavor, spec, tag, &resolved.matches)?
            .ok_or_else(not_applicable)?,
    };

    tree.set_text(target, &text);
    if spec.kind == FieldKind::Date {
        tree.set_attribute(target, "format", DATE_FORMAT_CODE);
    }
    debug!(field = spec.name, value = %text, "field written");
    Ok(())
}

/// Cut a field path right after its group element:
/// `…/ram:ApplicableTradeTax/ram:BasisAmount` → `…/ram:ApplicableTradeTax`.
fn group_path<'a>(path: &'a str, tag: &str) -> Option<&'a str> {
    let marker = format!("/{tag}/");
    path.find(&marker).map(|pos| &path[..pos + marker.len() - 1])
}

/// Pick (and if needed create) the leaf a grouped write lands on.
fn group_target<'d>(
    tree: &'d XmlTree,
    groups: &mut GroupRegistry,
    flavor: &Flavor,
    spec: &FieldSpec,
    tag: &'static str,
    matches: &[Element<'d>],
) -> Result<Option<Element<'d>>, FacturXError> {
    let Some(path) = spec.xpath(flavor).and_then(|p| group_path(p, tag)) else {
        return Ok(None);
    };
    let occurrences = XPath::compile(path)?.select(tree, &flavor.namespaces())?;
    let index_of = |leaf: Element<'d>| {
        tree.ancestors_or_self(leaf)
            .find_map(|a| occurrences.iter().position(|o| *o == a))
    };

    let in_use = groups
        .groups
        .get(tag)
        .filter(|s| matches.iter().any(|m| index_of(*m) == Some(s.index)))
        .cloned();
    let Some(state) = in_use else {
        // First write to this group in the session: fill its first occurrence.
        let leaf = matches[0];
        let Some(index) = index_of(leaf) else {
            return Ok(None);
        };
        groups.groups.insert(
            tag,
            GroupState {
                index,
                written: BTreeSet::from([spec.name]),
            },
        );
        return Ok(Some(leaf));
    };

    if !state.written.contains(spec.name) {
        let leaf = matches
            .iter()
            .copied()
            .find(|m| index_of(*m) == Some(state.index));
        if leaf.is_some() {
            if let Some(s) = groups.groups.get_mut(tag) {
                s.written.insert(spec.name);
            }
        }
        return Ok(leaf);
    }

    // Field already filled in the occurrence in use: start a new one
    // copied from the last existing occurrence.
    let Some(&last_leaf) = matches.last() else {
        return Ok(None);
    };
    let Some(index) = index_of(last_leaf) else {
        return Ok(None);
    };
    let last = occurrences[index];
    let Some(offset) = tree.descendants(last).iter().position(|d| *d == last_leaf) else {
        return Ok(None);
    };
    let copy = tree.deep_copy(last);
    tree.insert_after(last, copy)?;
    let Some(&leaf) = tree.descendants(copy).get(offset) else {
        return Ok(None);
    };
    debug!(group = tag, field = spec.name, "repeating group duplicated");

    groups.groups.insert(
        tag,
        GroupState {
            index: index + 1,
            written: BTreeSet::from([spec.name]),
        },
    );
    Ok(Some(leaf))
}
