use std::fmt;

use sxd_document::Package;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Document, Element, ParentOfChild};
use sxd_document::parser;

use super::writer::XmlWriter;
use crate::core::FacturXError;

/// An owned, mutable XML document.
///
/// Storage is an `sxd_document` package; elements are handed out as
/// [`Element`] handles borrowed from the tree. Prefixes are kept as
/// written and namespace declarations are re-emitted on the element that
/// declared them.
pub struct XmlTree {
    package: Package,
}

impl XmlTree {
    /// Parse UTF-8 XML bytes. A leading byte-order mark is skipped.
    pub fn parse(bytes: &[u8]) -> Result<Self, FacturXError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| FacturXError::Xml(format!("XML is not valid UTF-8: {e}")))?;
        Self::parse_str(text)
    }

    pub fn parse_str(xml: &str) -> Result<Self, FacturXError> {
        let xml = xml.strip_prefix('\u{FEFF}').unwrap_or(xml);
        let package = parser::parse(xml)
            .map_err(|e| FacturXError::Xml(format!("XML parse error: {e:?}")))?;
        let tree = Self { package };
        tree.root()?;
        Ok(tree)
    }

    pub fn document(&self) -> Document<'_> {
        self.package.as_document()
    }

    pub fn root(&self) -> Result<Element<'_>, FacturXError> {
        self.document()
            .root()
            .children()
            .into_iter()
            .find_map(|c| match c {
                ChildOfRoot::Element(e) => Some(e),
                _ => None,
            })
            .ok_or_else(|| FacturXError::Xml("document has no root element".into()))
    }

    /// Serialize with an XML declaration and two-space indentation.
    ///
    /// Whitespace-only text between elements is dropped; the writer
    /// re-indents.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FacturXError> {
        let mut w = XmlWriter::new()?;
        for child in self.document().root().children() {
            match child {
                ChildOfRoot::Element(e) => write_element(&mut w, e)?,
                ChildOfRoot::Comment(c) => {
                    w.comment(c.text())?;
                }
                ChildOfRoot::ProcessingInstruction(pi) => {
                    w.processing_instruction(&pi_content(pi.target(), pi.value()))?;
                }
            }
        }
        Ok(w.into_bytes())
    }

    pub fn to_string_pretty(&self) -> Result<String, FacturXError> {
        String::from_utf8(self.to_bytes()?)
            .map_err(|e| FacturXError::Xml(format!("XML UTF-8 error: {e}")))
    }

    /// Qualified name as written (`ram:ID`).
    pub fn name(&self, e: Element<'_>) -> String {
        qualified_name(e.preferred_prefix(), e.name().local_part())
    }

    pub fn local_name<'d>(&self, e: Element<'d>) -> &'d str {
        e.name().local_part()
    }

    pub fn namespace_uri<'d>(&self, e: Element<'d>) -> Option<&'d str> {
        e.name().namespace_uri()
    }

    /// Check an element's expanded name.
    pub fn has_name(&self, e: Element<'_>, namespace: Option<&str>, local: &str) -> bool {
        let name = e.name();
        name.local_part() == local && name.namespace_uri() == namespace
    }

    pub fn parent<'d>(&self, e: Element<'d>) -> Option<Element<'d>> {
        parent_element(e)
    }

    pub fn ancestors_or_self<'d>(&self, e: Element<'d>) -> impl Iterator<Item = Element<'d>> {
        std::iter::successors(Some(e), |n| parent_element(*n))
    }

    /// Element children in document order.
    pub fn children<'d>(&self, e: Element<'d>) -> Vec<Element<'d>> {
        child_elements(e)
    }

    /// Element descendants of `e` (excluding `e`) in document order.
    pub fn descendants<'d>(&self, e: Element<'d>) -> Vec<Element<'d>> {
        let mut out = Vec::new();
        let mut pending = child_elements(e);
        pending.reverse();
        while let Some(n) = pending.pop() {
            out.push(n);
            let mut kids = child_elements(n);
            kids.reverse();
            pending.extend(kids);
        }
        out
    }

    /// Text content directly under the element, concatenated.
    pub fn text(&self, e: Element<'_>) -> String {
        e.children()
            .into_iter()
            .filter_map(|c| match c {
                ChildOfElement::Text(t) => Some(t.text()),
                _ => None,
            })
            .collect()
    }

    /// Replace the element's text content, keeping its element children.
    pub fn set_text<'d>(&'d self, e: Element<'d>, text: &str) {
        let kept: Vec<_> = e
            .children()
            .into_iter()
            .filter(|c| !matches!(c, ChildOfElement::Text(_)))
            .collect();
        e.clear_children();
        if !text.is_empty() {
            e.append_child(self.document().create_text(text));
        }
        for child in kept {
            e.append_child(child);
        }
    }

    pub fn attribute<'d>(&self, e: Element<'d>, name: &str) -> Option<&'d str> {
        e.attribute_value(name)
    }

    pub fn set_attribute(&self, e: Element<'_>, name: &str, value: &str) {
        e.set_attribute_value(name, value);
    }

    /// Copy the subtree rooted at `e`. The copy is detached until inserted.
    pub fn deep_copy<'d>(&'d self, e: Element<'d>) -> Element<'d> {
        copy_element(self.document(), e)
    }

    /// Insert a detached element right after `anchor` among its parent's children.
    pub fn insert_after<'d>(
        &self,
        anchor: Element<'d>,
        node: Element<'d>,
    ) -> Result<(), FacturXError> {
        let parent = parent_element(anchor).ok_or_else(|| {
            FacturXError::Xml("cannot insert a sibling of the root element".into())
        })?;
        let mut children = parent.children();
        let pos = children
            .iter()
            .position(|c| matches!(c, ChildOfElement::Element(el) if *el == anchor))
            .map_or(children.len(), |p| p + 1);
        children.insert(pos, ChildOfElement::Element(node));
        parent.clear_children();
        for child in children {
            parent.append_child(child);
        }
        Ok(())
    }
}

impl Clone for XmlTree {
    fn clone(&self) -> Self {
        let package = Package::new();
        {
            let doc = package.as_document();
            for child in self.document().root().children() {
                match child {
                    ChildOfRoot::Element(e) => {
                        doc.root().append_child(copy_element(doc, e));
                    }
                    ChildOfRoot::Comment(c) => {
                        doc.root().append_child(doc.create_comment(c.text()));
                    }
                    ChildOfRoot::ProcessingInstruction(pi) => {
                        doc.root()
                            .append_child(doc.create_processing_instruction(pi.target(), pi.value()));
                    }
                }
            }
        }
        Self { package }
    }
}

impl fmt::Debug for XmlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.root().map(|r| self.name(r)).unwrap_or_default();
        f.debug_struct("XmlTree").field("root", &root).finish()
    }
}

fn parent_element(e: Element<'_>) -> Option<Element<'_>> {
    match e.parent()? {
        ParentOfChild::Element(p) => Some(p),
        ParentOfChild::Root(_) => None,
    }
}

fn child_elements(e: Element<'_>) -> Vec<Element<'_>> {
    e.children()
        .into_iter()
        .filter_map(|c| match c {
            ChildOfElement::Element(el) => Some(el),
            _ => None,
        })
        .collect()
}

fn qualified_name(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

fn pi_content(target: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!("{target} {v}"),
        None => target.to_string(),
    }
}

fn in_scope(e: Element<'_>) -> Vec<(String, String)> {
    e.namespaces_in_scope()
        .iter()
        .filter(|ns| !ns.prefix().is_empty() && ns.prefix() != "xml")
        .map(|ns| (ns.prefix().to_string(), ns.uri().to_string()))
        .collect()
}

/// Prefixed namespaces `e` declares itself, sorted by prefix.
fn declared_namespaces(e: Element<'_>) -> Vec<(String, String)> {
    let inherited = parent_element(e).map(in_scope).unwrap_or_default();
    let mut own: Vec<_> = in_scope(e)
        .into_iter()
        .filter(|ns| !inherited.contains(ns))
        .collect();
    own.sort();
    own
}

fn copy_element<'d>(doc: Document<'d>, source: Element<'_>) -> Element<'d> {
    let copy = doc.create_element(source.name());
    copy.set_preferred_prefix(source.preferred_prefix());
    copy.set_default_namespace_uri(source.default_namespace_uri());
    for (prefix, uri) in declared_namespaces(source) {
        copy.register_prefix(&prefix, &uri);
    }
    for attr in source.attributes() {
        let copied = copy.set_attribute_value(attr.name(), attr.value());
        copied.set_preferred_prefix(attr.preferred_prefix());
    }
    for child in source.children() {
        match child {
            ChildOfElement::Element(e) => {
                copy.append_child(copy_element(doc, e));
            }
            ChildOfElement::Text(t) => {
                copy.append_child(doc.create_text(t.text()));
            }
            ChildOfElement::Comment(c) => {
                copy.append_child(doc.create_comment(c.text()));
            }
            ChildOfElement::ProcessingInstruction(pi) => {
                copy.append_child(doc.create_processing_instruction(pi.target(), pi.value()));
            }
        }
    }
    copy
}

fn write_element(w: &mut XmlWriter, e: Element<'_>) -> Result<(), FacturXError> {
    let name = qualified_name(e.preferred_prefix(), e.name().local_part());

    let mut attrs: Vec<(String, String)> = Vec::new();
    if let Some(uri) = e.default_namespace_uri() {
        attrs.push(("xmlns".to_string(), uri.to_string()));
    }
    for (prefix, uri) in declared_namespaces(e) {
        attrs.push((format!("xmlns:{prefix}"), uri));
    }
    for attr in e.attributes() {
        attrs.push((
            qualified_name(attr.preferred_prefix(), attr.name().local_part()),
            attr.value().to_string(),
        ));
    }
    let attrs: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    let children: Vec<_> = e
        .children()
        .into_iter()
        .filter(|c| !matches!(c, ChildOfElement::Text(t) if t.text().trim().is_empty()))
        .collect();
    if children.is_empty() {
        w.empty_element_with_attrs(&name, &attrs)?;
        return Ok(());
    }

    w.start_element_with_attrs(&name, &attrs)?;
    for child in children {
        match child {
            ChildOfElement::Element(el) => write_element(w, el)?,
            ChildOfElement::Text(t) => {
                w.text(t.text())?;
            }
            ChildOfElement::Comment(c) => {
                w.comment(c.text())?;
            }
            ChildOfElement::ProcessingInstruction(pi) => {
                w.processing_instruction(&pi_content(pi.target(), pi.value()))?;
            }
        }
    }
    w.end_element(&name)?;
    Ok(())
}
