//! XML document tree, namespace bindings and XPath evaluation.
//!
//! Parsing and path evaluation come from `sxd-document` and `sxd-xpath`;
//! this module adds the few tree edits field writes need (deep copy,
//! insert-after, text replacement) and pretty-printed serialization.

mod path;
mod tree;
mod writer;

use std::collections::BTreeMap;

pub use path::XPath;
pub use sxd_document::dom::Element;
pub use tree::XmlTree;
pub use writer::{XmlWriter, format_decimal};

use crate::core::FacturXError;

/// Prefix → namespace URI bindings used to evaluate paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap(BTreeMap<String, String>);

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(p, uri)| (p.to_string(), uri.to_string()))
                .collect(),
        )
    }

    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.0.insert(prefix.into(), uri.into());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Split a prefixed name and resolve its prefix: `ram:ID` → (`urn:…`, `ID`).
    pub fn resolve<'a>(&'a self, qname: &'a str) -> Result<(&'a str, &'a str), FacturXError> {
        let (prefix, local) = qname
            .split_once(':')
            .ok_or_else(|| FacturXError::XPath(format!("`{qname}` has no prefix")))?;
        let uri = self
            .get(prefix)
            .ok_or_else(|| FacturXError::XPath(format!("prefix `{prefix}` is not bound")))?;
        Ok((uri, local))
    }
}

impl From<BTreeMap<String, String>> for NamespaceMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
