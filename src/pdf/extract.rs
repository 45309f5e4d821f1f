use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use super::{decode_text_string, resolve_dict, resolve_obj};
use crate::core::FacturXError;
use crate::flavor::is_invoice_filename;

/// Name-tree nesting deeper than this is treated as malformed.
const MAX_NAME_TREE_DEPTH: usize = 32;

/// Extract the embedded invoice XML from PDF bytes.
///
/// Searches `/Names/EmbeddedFiles` first, then the catalog `/AF` array.
/// Returns the embedded filename and raw XML bytes, or `None` when the PDF
/// carries no invoice XML.
pub fn extract_xml(pdf_bytes: &[u8]) -> Result<Option<(String, Vec<u8>)>, FacturXError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| FacturXError::Pdf(format!("failed to load PDF: {e}")))?;
    Ok(find_invoice(&doc))
}

/// Every embedded file reachable from the name tree, as `(filename, bytes)`.
pub fn list_attachments(pdf_bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>, FacturXError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| FacturXError::Pdf(format!("failed to load PDF: {e}")))?;
    Ok(name_tree_entries(&doc)
        .into_iter()
        .filter_map(|(name, spec)| {
            let dict = resolve_dict(&doc, &spec)?;
            Some((name, filespec_content(&doc, dict)?))
        })
        .collect())
}

pub(crate) fn find_invoice(doc: &Document) -> Option<(String, Vec<u8>)> {
    for (name, spec) in name_tree_entries(doc) {
        if !is_invoice_filename(&name) {
            continue;
        }
        if let Some(content) = resolve_dict(doc, &spec).and_then(|d| filespec_content(doc, d)) {
            debug!(filename = %name, "invoice XML found in name tree");
            return Some((name, content));
        }
    }

    for spec in af_entries(doc) {
        let Some(dict) = resolve_dict(doc, &spec) else {
            continue;
        };
        let Some(name) = filespec_name(dict) else {
            continue;
        };
        if is_invoice_filename(&name) {
            if let Some(content) = filespec_content(doc, dict) {
                debug!(filename = %name, "invoice XML found in /AF");
                return Some((name, content));
            }
        }
    }
    None
}

/// `(filename, filespec)` pairs of `/Names/EmbeddedFiles`, leaves in tree order.
pub(crate) fn name_tree_entries(doc: &Document) -> Vec<(String, Object)> {
    let mut out = Vec::new();
    let Ok(catalog) = doc.catalog() else {
        return out;
    };
    let root = catalog
        .get(b"Names")
        .ok()
        .and_then(|n| resolve_dict(doc, n))
        .and_then(|names| names.get(b"EmbeddedFiles").ok())
        .and_then(|ef| resolve_dict(doc, ef));
    if let Some(root) = root {
        collect_names(doc, root, 0, &mut out);
    }
    out
}

fn collect_names(doc: &Document, node: &Dictionary, depth: usize, out: &mut Vec<(String, Object)>) {
    if depth > MAX_NAME_TREE_DEPTH {
        return;
    }
    if let Ok(names) = node.get(b"Names").and_then(Object::as_array) {
        for pair in names.chunks_exact(2) {
            let Some(name) = resolve_obj(doc, &pair[0]).and_then(decode_text_string) else {
                continue;
            };
            out.push((name, pair[1].clone()));
        }
    }
    if let Ok(kids) = node.get(b"Kids").and_then(Object::as_array) {
        for kid in kids {
            if let Some(child) = resolve_dict(doc, kid) {
                collect_names(doc, child, depth + 1, out);
            }
        }
    }
}

/// Filespec references in the catalog `/AF` array.
pub(crate) fn af_entries(doc: &Document) -> Vec<Object> {
    doc.catalog()
        .ok()
        .and_then(|c| c.get(b"AF").ok())
        .and_then(|af| resolve_obj(doc, af))
        .and_then(|af| af.as_array().ok())
        .cloned()
        .unwrap_or_default()
}

pub(crate) fn filespec_name(dict: &Dictionary) -> Option<String> {
    dict.get(b"UF")
        .or_else(|_| dict.get(b"F"))
        .ok()
        .and_then(decode_text_string)
}

fn filespec_content(doc: &Document, dict: &Dictionary) -> Option<Vec<u8>> {
    let ef = dict.get(b"EF").ok().and_then(|ef| resolve_dict(doc, ef))?;
    let file = ef.get(b"F").or_else(|_| ef.get(b"UF")).ok()?;
    let stream = resolve_obj(doc, file)?.as_stream().ok()?;
    // decompressed_content() fails on unfiltered streams.
    Some(
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::text_string;
    use lopdf::{Stream, dictionary};

    fn doc_with_kids() -> Document {
        let mut doc = Document::with_version("1.7");
        let stream = doc.add_object(Stream::new(dictionary! {}, b"<x/>".to_vec()));
        let spec = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => text_string("factur-x.xml"),
            "EF" => dictionary! { "F" => Object::Reference(stream) },
        });
        let leaf = doc.add_object(dictionary! {
            "Names" => vec![text_string("factur-x.xml"), Object::Reference(spec)],
        });
        let root = doc.add_object(dictionary! {
            "Kids" => vec![Object::Reference(leaf)],
        });
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Names" => dictionary! { "EmbeddedFiles" => Object::Reference(root) },
        });
        doc.trailer.set("Root", catalog);
        doc
    }

    #[test]
    fn walks_nested_kids() {
        let doc = doc_with_kids();
        let entries = name_tree_entries(&doc);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            find_invoice(&doc),
            Some(("factur-x.xml".to_string(), b"<x/>".to_vec()))
        );
    }

    #[test]
    fn falls_back_to_af() {
        let mut doc = Document::with_version("1.7");
        let stream = doc.add_object(Stream::new(dictionary! {}, b"<y/>".to_vec()));
        let spec = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "UF" => text_string("ZUGFeRD-invoice.xml"),
            "EF" => dictionary! { "F" => Object::Reference(stream) },
        });
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "AF" => vec![Object::Reference(spec)],
        });
        doc.trailer.set("Root", catalog);
        assert_eq!(
            find_invoice(&doc).map(|(n, _)| n),
            Some("ZUGFeRD-invoice.xml".to_string())
        );
    }

    #[test]
    fn no_attachment_is_none() {
        let mut doc = Document::with_version("1.7");
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog" });
        doc.trailer.set("Root", catalog);
        assert_eq!(find_invoice(&doc), None);
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(extract_xml(b"not a pdf"), Err(FacturXError::Pdf(_))));
    }
}
