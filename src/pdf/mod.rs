//! PDF side: embedding the invoice XML as a PDF/A-3 associated file,
//! and extracting it again.
//!
//! ## Embed
//!
//! [`embed`] rewrites a PDF in memory: embedded-file stream with MD5
//! checksum, Filespec, sorted `/EmbeddedFiles` name tree, `/AF`, XMP
//! metadata, output intents and the info dictionary. The PDF is only
//! serialized once every step succeeded.
//!
//! ## Extract
//!
//! [`extract_xml`] looks the invoice up in the name tree, then in `/AF`.

mod attachment;
mod embed;
mod extract;
mod metadata;
mod xmp;

pub use attachment::{Attachment, guess_mime};
pub use embed::{EmbedRequest, embed};
pub use extract::{extract_xml, list_attachments};
pub use metadata::{BaseInfo, PdfMetadata};
pub use xmp::build_xmp;

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, StringFormat};

/// `D:YYYYMMDDHHMMSS+00'00'`
pub(crate) fn pdf_date(ts: DateTime<Utc>) -> String {
    ts.format("D:%Y%m%d%H%M%S+00'00'").to_string()
}

/// Encode a PDF text string: ASCII as a literal string, anything else as
/// UTF-16BE with a byte-order mark.
pub(crate) fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string written as PDFDocEncoding/ASCII or UTF-16BE.
pub(crate) fn decode_text_string(obj: &Object) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).ok();
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(s.to_string()),
        Err(_) => Some(bytes.iter().map(|b| char::from(*b)).collect()),
    }
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

pub(crate) fn resolve_obj<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}
