use std::fmt;

use sxd_document::dom::Element;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};

use super::{NamespaceMap, XmlTree};
use crate::core::FacturXError;

/// A compiled XPath 1.0 expression that selects elements.
pub struct XPath {
    source: String,
    compiled: sxd_xpath::XPath,
}

impl fmt::Debug for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("XPath").field(&self.source).finish()
    }
}

impl XPath {
    pub fn compile(expr: &str) -> Result<Self, FacturXError> {
        let compiled = Factory::new()
            .build(expr)
            .map_err(|e| FacturXError::XPath(format!("`{expr}`: {e:?}")))?
            .ok_or_else(|| FacturXError::XPath("empty expression".into()))?;
        Ok(Self {
            source: expr.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate from the document node.
    pub fn select<'d>(
        &self,
        tree: &'d XmlTree,
        ns: &NamespaceMap,
    ) -> Result<Vec<Element<'d>>, FacturXError> {
        self.evaluate(tree.document().root(), ns)
    }

    /// Evaluate relative to `context`. Absolute paths ignore the context.
    pub fn select_from<'d>(
        &self,
        context: Element<'d>,
        ns: &NamespaceMap,
    ) -> Result<Vec<Element<'d>>, FacturXError> {
        self.evaluate(context, ns)
    }

    fn evaluate<'d>(
        &self,
        node: impl Into<Node<'d>>,
        ns: &NamespaceMap,
    ) -> Result<Vec<Element<'d>>, FacturXError> {
        let mut context = Context::new();
        for (prefix, uri) in ns.iter() {
            context.set_namespace(prefix, uri);
        }
        let value = self
            .compiled
            .evaluate(&context, node)
            .map_err(|e| FacturXError::XPath(format!("`{}`: {e:?}", self.source)))?;
        match value {
            Value::Nodeset(nodes) => Ok(nodes
                .document_order()
                .into_iter()
                .filter_map(|n| match n {
                    Node::Element(e) => Some(e),
                    _ => None,
                })
                .collect()),
            _ => Err(FacturXError::XPath(format!(
                "`{}` does not select nodes",
                self.source
            ))),
        }
    }
}
