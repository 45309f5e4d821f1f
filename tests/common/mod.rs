#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use facturx::{FacturXDocument, FlavorKind, Level, WriteOptions};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use rust_decimal_macros::dec;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

/// Build a one-page PDF in memory; `extra` may add objects and catalog entries.
pub fn pdf_with(extra: impl FnOnce(&mut Document, ObjectId)) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => Object::Reference(font_id),
        },
    });
    let content = Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 100 700 Td (Invoice) Tj ET".to_vec(),
    );
    let content_id = doc.add_object(content);
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => Object::Reference(resources_id),
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    extra(&mut doc, catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("save fixture PDF");
    output
}

pub fn minimal_pdf() -> Vec<u8> {
    pdf_with(|_, _| {})
}

/// PDF with an sRGB-style output intent and a trailer `/ID`.
pub fn pdf_with_intent_and_id() -> Vec<u8> {
    pdf_with(|doc, catalog_id| {
        let profile = doc.add_object(Stream::new(
            dictionary! { "N" => 3 },
            b"fake icc profile".to_vec(),
        ));
        let intent = doc.add_object(dictionary! {
            "Type" => "OutputIntent",
            "S" => "GTS_PDFA1",
            "OutputConditionIdentifier" => Object::string_literal("sRGB"),
            "DestOutputProfile" => Object::Reference(profile),
        });
        let catalog = doc.get_dictionary_mut(catalog_id).unwrap();
        catalog.set("OutputIntents", vec![Object::Reference(intent)]);
        let id = Object::String(b"0123456789abcdef".to_vec(), StringFormat::Hexadecimal);
        doc.trailer.set("ID", vec![id.clone(), id]);
    })
}

/// PDF already carrying a non-invoice attachment named `terms.txt`.
pub fn pdf_with_attachment() -> Vec<u8> {
    pdf_with(|doc, catalog_id| {
        let stream = doc.add_object(Stream::new(
            dictionary! { "Type" => "EmbeddedFile" },
            b"payment terms".to_vec(),
        ));
        let spec = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => Object::string_literal("terms.txt"),
            "UF" => Object::string_literal("terms.txt"),
            "EF" => dictionary! { "F" => Object::Reference(stream) },
        });
        let tree = doc.add_object(dictionary! {
            "Names" => vec![Object::string_literal("terms.txt"), Object::Reference(spec)],
        });
        let catalog = doc.get_dictionary_mut(catalog_id).unwrap();
        catalog.set("Names", dictionary! { "EmbeddedFiles" => Object::Reference(tree) });
    })
}

/// Fill the fields every level carries.
pub fn fill_header(doc: &mut FacturXDocument) {
    doc.set("number", "I100").unwrap();
    doc.set("date", date(2024, 1, 15)).unwrap();
    doc.set("seller", "Acme").unwrap();
    doc.set("seller_country", "FR").unwrap();
    doc.set("amount_untaxed", dec!(100)).unwrap();
    doc.set("amount_tax", dec!(20)).unwrap();
    doc.set("amount_total", dec!(120)).unwrap();
    doc.set("amount_due", dec!(120)).unwrap();
}

/// A freshly written Factur-X PDF at `level` with header fields filled.
pub fn facturx_pdf(level: Level) -> Vec<u8> {
    let mut doc = FacturXDocument::builder()
        .flavor(FlavorKind::FacturX)
        .level(level)
        .open(minimal_pdf())
        .unwrap();
    fill_header(&mut doc);
    doc.to_pdf_bytes(&WriteOptions::new().timestamp(fixed_time()))
        .unwrap()
}
