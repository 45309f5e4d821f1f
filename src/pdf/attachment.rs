use std::path::Path;

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};

use super::{pdf_date, text_string};

/// An extra file to embed next to the invoice XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
    pub description: String,
    /// Defaults to the write timestamp.
    pub mod_date: Option<DateTime<Utc>>,
    /// MIME type; guessed from the file extension when `None`.
    pub mime: Option<String>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
            description: String::new(),
            mod_date: None,
            mime: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn mod_date(mut self, ts: DateTime<Utc>) -> Self {
        self.mod_date = Some(ts);
        self
    }

    /// Read a file from disk, keeping its name and modification time.
    pub fn from_path(path: impl AsRef<Path>, description: impl Into<String>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mod_date = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Ok(Self {
            filename,
            data,
            description: description.into(),
            mod_date,
            mime: None,
        })
    }

    pub(crate) fn resolved_mime(&self) -> &str {
        self.mime
            .as_deref()
            .unwrap_or_else(|| guess_mime(&self.filename))
    }
}

/// MIME type for a filename, by extension.
pub fn guess_mime(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "xml" => "text/xml",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Embedded-file stream with `CheckSum` (MD5), `ModDate` and `Size` params.
pub(super) fn file_stream(data: &[u8], mime: &str, mod_date: DateTime<Utc>) -> Stream {
    let digest = md5::compute(data);
    Stream::new(
        dictionary! {
            "Type" => "EmbeddedFile",
            "Subtype" => Object::Name(mime.as_bytes().to_vec()),
            "Params" => dictionary! {
                "CheckSum" => Object::String(digest.0.to_vec(), StringFormat::Hexadecimal),
                "ModDate" => Object::string_literal(pdf_date(mod_date)),
                "Size" => Object::Integer(data.len() as i64),
            },
        },
        data.to_vec(),
    )
}

/// Filespec dictionary pointing at an embedded-file stream.
pub(super) fn filespec(
    filename: &str,
    description: &str,
    relationship: &str,
    stream_id: ObjectId,
) -> Dictionary {
    dictionary! {
        "Type" => "Filespec",
        "F" => text_string(filename),
        "UF" => text_string(filename),
        "Desc" => text_string(description),
        "AFRelationship" => Object::Name(relationship.as_bytes().to_vec()),
        "EF" => dictionary! {
            "F" => Object::Reference(stream_id),
            "UF" => Object::Reference(stream_id),
        },
    }
}

/// Flatten `(filename, filespec)` pairs into a name-tree `Names` array,
/// sorted by filename bytes.
pub(super) fn name_tree_array(mut entries: Vec<(String, ObjectId)>) -> Vec<Object> {
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    entries
        .into_iter()
        .flat_map(|(name, id)| [text_string(&name), Object::Reference(id)])
        .collect()
}
