use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info};

use super::attachment::{file_stream, filespec, name_tree_array};
use super::extract::name_tree_entries;
use super::xmp::{PRODUCER, build_xmp};
use super::{
    Attachment, PdfMetadata, decode_text_string, pdf_date, resolve_dict, resolve_obj, text_string,
};
use crate::core::{AttachmentStep, FacturXError};
use crate::flavor::{Flavor, is_invoice_filename};

const INVOICE_MIME: &str = "text/xml";

/// Everything a write needs besides the source PDF.
#[derive(Debug, Clone, Copy)]
pub struct EmbedRequest<'a> {
    pub flavor: &'a Flavor,
    pub xml: &'a [u8],
    pub metadata: &'a PdfMetadata,
    pub attachments: &'a [Attachment],
    pub timestamp: DateTime<Utc>,
}

fn fail(step: AttachmentStep, message: impl Into<String>) -> FacturXError {
    FacturXError::attachment(step, message)
}

/// Embed invoice XML into a PDF, producing PDF/A-3 style output bytes.
///
/// The source bytes are never modified; the rewritten document is built
/// in memory and serialized once every step has succeeded.
pub fn embed(pdf_bytes: &[u8], req: &EmbedRequest<'_>) -> Result<Vec<u8>, FacturXError> {
    let mut doc = Document::load_mem(pdf_bytes)
        .map_err(|e| fail(AttachmentStep::Load, format!("failed to load PDF: {e}")))?;
    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(fail(AttachmentStep::Load, "encrypted PDFs are not supported"));
    }

    embed_into_document(&mut doc, req)?;

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| fail(AttachmentStep::Serialize, format!("failed to save PDF: {e}")))?;
    Ok(output)
}

fn embed_into_document(doc: &mut Document, req: &EmbedRequest<'_>) -> Result<(), FacturXError> {
    let flavor = req.flavor;
    let retained = retained_attachments(doc);

    // 1 + 2. Embedded-file streams and their Filespecs
    let xml_stream = doc.add_object(file_stream(req.xml, INVOICE_MIME, req.timestamp));
    let invoice_spec = doc.add_object(filespec(
        flavor.canonical_filename(),
        &format!("{} XML invoice", flavor.label()),
        "Data",
        xml_stream,
    ));
    let mut entries: Vec<(String, ObjectId)> =
        vec![(flavor.canonical_filename().to_string(), invoice_spec)];

    for extra in req.attachments {
        if extra.filename.is_empty() {
            return Err(fail(AttachmentStep::Filespec, "attachment without a filename"));
        }
        if is_invoice_filename(&extra.filename) {
            return Err(fail(
                AttachmentStep::Filespec,
                format!("`{}` is reserved for the invoice XML", extra.filename),
            ));
        }
        let mod_date = extra.mod_date.unwrap_or(req.timestamp);
        let stream = doc.add_object(file_stream(&extra.data, extra.resolved_mime(), mod_date));
        let spec = doc.add_object(filespec(
            &extra.filename,
            &extra.description,
            "Unspecified",
            stream,
        ));
        entries.push((extra.filename.clone(), spec));
    }

    for (name, spec) in retained {
        if entries.iter().all(|(n, _)| *n != name) {
            entries.push((name, spec));
        }
    }

    // 3. EmbeddedFiles name tree, merged into the existing /Names; /AF
    // follows the same sorted order.
    let names_array = name_tree_array(entries);
    let af: Vec<Object> = names_array.iter().skip(1).step_by(2).cloned().collect();
    let order: Vec<String> = names_array
        .iter()
        .step_by(2)
        .filter_map(decode_text_string)
        .collect();
    debug!(?order, "embedded files name tree");
    let ef_tree = doc.add_object(dictionary! { "Names" => names_array });
    let mut names = existing_names(doc);
    names.set("EmbeddedFiles", Object::Reference(ef_tree));
    let names_id = doc.add_object(names);

    // 4. XMP metadata, never compressed
    let xmp = build_xmp(flavor, req.metadata, req.timestamp);
    let metadata_stream = Stream::new(
        dictionary! {
            "Type" => "Metadata",
            "Subtype" => "XML",
        },
        xmp.into_bytes(),
    )
    .with_compression(false);
    let metadata_id = doc.add_object(metadata_stream);

    // 5. Output intents and catalog
    let intents = relink_output_intents(doc)?;
    let catalog = doc
        .catalog_mut()
        .map_err(|e| fail(AttachmentStep::Catalog, format!("failed to get catalog: {e}")))?;
    catalog.set("AF", Object::Array(af));
    catalog.set("Names", Object::Reference(names_id));
    catalog.set("Metadata", Object::Reference(metadata_id));
    catalog.set("PageMode", Object::Name(b"UseAttachments".to_vec()));
    catalog.set("MarkInfo", dictionary! { "Marked" => Object::Boolean(true) });
    if let Some(intents) = intents {
        catalog.set("OutputIntents", Object::Array(intents));
    }

    // 6. Info dictionary and trailer
    let info_id = write_info(doc, req.metadata, req.timestamp);
    let root = doc
        .trailer
        .get(b"Root")
        .cloned()
        .map_err(|e| fail(AttachmentStep::Catalog, format!("trailer has no /Root: {e}")))?;
    let mut trailer = Dictionary::new();
    trailer.set("Root", root);
    trailer.set("Info", Object::Reference(info_id));
    if let Ok(id) = doc.trailer.get(b"ID") {
        trailer.set("ID", id.clone());
        info!("document /ID preserved");
    }
    doc.trailer = trailer;

    let pruned = doc.prune_objects();
    debug!(pruned = pruned.len(), "orphaned objects removed");
    Ok(())
}

/// Filespecs of the source PDF that are not invoice XML.
fn retained_attachments(doc: &mut Document) -> Vec<(String, ObjectId)> {
    let mut kept = Vec::new();
    for (name, spec) in name_tree_entries(doc) {
        if is_invoice_filename(&name) {
            debug!(filename = %name, "replacing previous invoice XML");
            continue;
        }
        let id = match spec {
            Object::Reference(id) => id,
            Object::Dictionary(dict) => doc.add_object(dict),
            _ => continue,
        };
        debug!(filename = %name, "keeping existing attachment");
        kept.push((name, id));
    }
    kept
}

/// The catalog's `/Names` dictionary without its `/EmbeddedFiles` entry.
fn existing_names(doc: &Document) -> Dictionary {
    let mut names = doc
        .catalog()
        .ok()
        .and_then(|c| c.get(b"Names").ok())
        .and_then(|n| resolve_dict(doc, n))
        .cloned()
        .unwrap_or_else(Dictionary::new);
    names.remove(b"EmbeddedFiles");
    names
}

/// Copy each output intent and its destination profile into fresh objects.
fn relink_output_intents(doc: &mut Document) -> Result<Option<Vec<Object>>, FacturXError> {
    let intents = doc
        .catalog()
        .ok()
        .and_then(|c| c.get(b"OutputIntents").ok())
        .and_then(|o| resolve_obj(doc, o))
        .and_then(|o| o.as_array().ok())
        .cloned();
    let Some(intents) = intents else {
        return Ok(None);
    };

    let mut relinked = Vec::with_capacity(intents.len());
    for intent in &intents {
        let mut dict = resolve_dict(doc, intent).cloned().ok_or_else(|| {
            fail(AttachmentStep::OutputIntents, "output intent is not a dictionary")
        })?;
        if let Ok(profile_id) = dict.get(b"DestOutputProfile").and_then(Object::as_reference) {
            let profile = doc.get_object(profile_id).cloned().map_err(|e| {
                fail(
                    AttachmentStep::OutputIntents,
                    format!("missing output profile {profile_id:?}: {e}"),
                )
            })?;
            let copy = doc.add_object(profile);
            dict.set("DestOutputProfile", Object::Reference(copy));
        }
        relinked.push(Object::Reference(doc.add_object(dict)));
    }
    info!(count = relinked.len(), "output intents re-linked");
    Ok(Some(relinked))
}

fn write_info(doc: &mut Document, meta: &PdfMetadata, timestamp: DateTime<Utc>) -> ObjectId {
    let now = Object::string_literal(pdf_date(timestamp));
    let created = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|i| resolve_dict(doc, i))
        .and_then(|i| i.get(b"CreationDate").ok())
        .cloned()
        .unwrap_or_else(|| now.clone());
    doc.add_object(dictionary! {
        "Author" => text_string(&meta.author),
        "CreationDate" => created,
        "Creator" => text_string(PRODUCER),
        "Keywords" => text_string(&meta.keywords),
        "ModDate" => now,
        "Producer" => text_string(PRODUCER),
        "Subject" => text_string(&meta.subject),
        "Title" => text_string(&meta.title),
    })
}
