mod common;

use common::*;
use facturx::pdf::list_attachments;
use facturx::xml::{XPath, XmlTree};
use facturx::{
    Attachment, AttachmentStep, CodeList, FacturXDocument, FacturXError, FieldValue, Flavor,
    FlavorKind, Level, PdfInput, PdfMetadata, SchemaValidator, StructuralValidator,
    WriteOptions, extract_xml,
};
use lopdf::{Document, Object, dictionary};
use rust_decimal_macros::dec;

const REQUIRED: [&str; 6] = ["number", "doc_type", "date", "seller", "currency", "amount_total"];

fn template_doc(kind: FlavorKind, level: Level) -> FacturXDocument {
    FacturXDocument::builder()
        .flavor(kind)
        .level(level)
        .open(minimal_pdf())
        .unwrap()
}

fn options() -> WriteOptions {
    WriteOptions::new().timestamp(fixed_time())
}

fn output_catalog(pdf: &[u8]) -> (Document, lopdf::Dictionary) {
    let doc = Document::load_mem(pdf).unwrap();
    let catalog = doc.catalog().unwrap().clone();
    (doc, catalog)
}

fn literal(obj: &Object) -> String {
    match obj {
        Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
        other => panic!("expected a string, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Opening and flavor detection
// ---------------------------------------------------------------------------

#[test]
fn plain_pdf_opens_on_facturx_minimum_template() {
    let doc = FacturXDocument::open(minimal_pdf()).unwrap();
    assert_eq!(
        doc.flavor(),
        Flavor::new(FlavorKind::FacturX, Level::Minimum).unwrap()
    );
    assert_eq!(doc.embedded_filename(), None);
}

#[test]
fn templates_read_absent_and_pass_the_schema_check() {
    for kind in FlavorKind::ALL {
        for level in kind.levels() {
            let doc = template_doc(kind, level);
            assert_eq!(doc.flavor().level(), level);
            for field in REQUIRED {
                assert_eq!(doc.get(field).unwrap(), None, "{kind} {level}: {field}");
            }
            StructuralValidator
                .validate(&doc.flavor(), doc.xml())
                .unwrap();
        }
    }
}

#[test]
fn zugferd_without_level_uses_its_lowest_level() {
    let doc = FacturXDocument::builder()
        .flavor(FlavorKind::Zugferd)
        .open(minimal_pdf())
        .unwrap();
    assert_eq!(doc.flavor().kind(), FlavorKind::Zugferd);
    assert_eq!(doc.flavor().level(), Level::Basic);
}

#[test]
fn unsupported_flavor_level_pair_is_rejected() {
    let err = FacturXDocument::builder()
        .flavor(FlavorKind::Zugferd)
        .level(Level::Minimum)
        .open(minimal_pdf())
        .unwrap_err();
    assert!(matches!(err, FacturXError::UnknownFlavor(_)));
}

#[test]
fn embedded_xml_decides_the_flavor() {
    let pdf = facturx_pdf(Level::En16931);
    let doc = FacturXDocument::open(pdf).unwrap();
    assert_eq!(
        doc.flavor(),
        Flavor::new(FlavorKind::FacturX, Level::En16931).unwrap()
    );
    assert_eq!(doc.embedded_filename(), Some("factur-x.xml"));
    assert_eq!(doc.get("number").unwrap(), Some(FieldValue::from("I100")));
}

#[test]
fn detected_flavor_wins_over_the_requested_one() {
    let xml = template_doc(FlavorKind::FacturX, Level::Basic)
        .xml_bytes()
        .unwrap();
    let doc = FacturXDocument::builder()
        .flavor(FlavorKind::Zugferd)
        .xml(xml)
        .open(minimal_pdf())
        .unwrap();
    assert_eq!(doc.flavor().kind(), FlavorKind::FacturX);
    assert_eq!(doc.flavor().level(), Level::Basic);
}

#[test]
fn foreign_xml_is_unrecognized() {
    let err = FacturXDocument::builder()
        .xml("<Invoice xmlns=\"urn:oasis:names:specification:ubl:schema:xsd:Invoice-2\"/>")
        .open(minimal_pdf())
        .unwrap_err();
    assert!(matches!(err, FacturXError::UnrecognizedFlavor(_)));
}

// ---------------------------------------------------------------------------
// Input kinds
// ---------------------------------------------------------------------------

#[test]
fn bytes_must_look_like_a_pdf() {
    let err = FacturXDocument::open(b"hello world".as_slice()).unwrap_err();
    assert!(matches!(err, FacturXError::InputType(_)));
}

#[test]
fn paths_must_be_existing_pdf_files() {
    let dir = tempfile::tempdir().unwrap();

    let txt = dir.path().join("invoice.txt");
    std::fs::write(&txt, minimal_pdf()).unwrap();
    let err = FacturXDocument::open(PdfInput::Path(txt)).unwrap_err();
    assert!(matches!(err, FacturXError::InputType(_)));

    let missing = dir.path().join("missing.pdf");
    let err = FacturXDocument::open(missing).unwrap_err();
    assert!(matches!(err, FacturXError::InputType(_)));

    let upper = dir.path().join("INVOICE.PDF");
    std::fs::write(&upper, minimal_pdf()).unwrap();
    FacturXDocument::open(upper).unwrap();
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

#[test]
fn date_fields_reject_non_dates() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    assert!(matches!(
        doc.set("date", "2024-01-15"),
        Err(FacturXError::MalformedDate { .. })
    ));
    assert!(matches!(
        doc.set("due_date", dec!(5)),
        Err(FacturXError::FieldNotApplicable { .. }) | Err(FacturXError::MalformedDate { .. })
    ));
    assert_eq!(doc.get("date").unwrap(), None);
}

#[test]
fn malformed_date_text_fails_on_read() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    doc.set("date", date(2024, 1, 15)).unwrap();
    let xml = doc
        .xml()
        .to_string_pretty()
        .unwrap()
        .replace(">20240115<", ">2024-1-15<");
    doc.replace_xml(xml.as_str()).unwrap();
    assert!(matches!(
        doc.get("date"),
        Err(FacturXError::MalformedDate { text, .. }) if text == "2024-1-15"
    ));
}

#[test]
fn repeated_group_writes_create_sibling_elements() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::En16931);
    doc.set("tax_rate", dec!(20)).unwrap();
    doc.set("tax_rate", dec!(5.5)).unwrap();

    assert_eq!(
        doc.get_all("tax_rate").unwrap(),
        vec![
            FieldValue::Amount(dec!(20.00)),
            FieldValue::Amount(dec!(5.50))
        ]
    );
    let header_taxes = XPath::compile(
        "/rsm:CrossIndustryInvoice/rsm:SupplyChainTradeTransaction\
         /ram:ApplicableHeaderTradeSettlement/ram:ApplicableTradeTax",
    )
    .unwrap()
    .select(doc.xml(), &doc.flavor().namespaces())
    .unwrap();
    assert_eq!(header_taxes.len(), 2);
}

#[test]
fn fields_outside_the_level_are_not_applicable() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    assert!(matches!(
        doc.set("tax_rate", dec!(20)),
        Err(FacturXError::FieldNotApplicable { .. })
    ));

    let mut zf = template_doc(FlavorKind::Zugferd, Level::Comfort);
    assert!(matches!(
        zf.set("line_price", dec!(10)),
        Err(FacturXError::FieldNotApplicable { .. })
    ));
    assert_eq!(zf.get("line_price").unwrap(), None);
}

#[test]
fn unknown_fields_are_reported() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    assert!(matches!(doc.get("colour"), Err(FacturXError::UnknownField(_))));
    assert!(matches!(
        doc.set("colour", "blue"),
        Err(FacturXError::UnknownField(_))
    ));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn validation_backfills_defaults_once() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::BasicWl);
    fill_header(&mut doc);
    assert_eq!(doc.get("currency").unwrap(), None);

    let first = doc.validate().unwrap();
    assert_eq!(
        first.defaults_applied,
        vec![
            ("doc_type".to_string(), "380".to_string()),
            ("currency".to_string(), "EUR".to_string()),
        ]
    );
    assert_eq!(doc.get("currency").unwrap(), Some(FieldValue::from("EUR")));

    let xml = doc.xml_bytes().unwrap();
    let second = doc.validate().unwrap();
    assert!(second.is_clean());
    assert_eq!(doc.xml_bytes().unwrap(), xml);
}

#[test]
fn missing_required_field_without_default() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    let err = doc.validate().unwrap_err();
    assert!(matches!(err, FacturXError::MissingRequiredField(f) if f == "number"));
    assert!(!doc.is_valid());
}

#[test]
fn unknown_currency_is_an_invalid_code() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    fill_header(&mut doc);
    doc.set("currency", "ZZZ").unwrap();
    let err = doc.validate().unwrap_err();
    match err {
        FacturXError::InvalidCode {
            field,
            value,
            code_type,
        } => {
            assert_eq!(field, "currency");
            assert_eq!(value, "ZZZ");
            assert_eq!(code_type, CodeList::Currency);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn custom_schema_validator_is_consulted() {
    struct RejectAll;
    impl SchemaValidator for RejectAll {
        fn validate(&self, _: &Flavor, _: &XmlTree) -> Result<(), FacturXError> {
            Err(FacturXError::SchemaInvalid("rejected".into()))
        }
    }

    let err = FacturXDocument::builder()
        .schema_validator(Box::new(RejectAll))
        .open(minimal_pdf())
        .unwrap_err();
    assert!(matches!(err, FacturXError::SchemaInvalid(_)));
}

#[test]
fn replace_xml_keeps_the_old_tree_on_error() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Basic);
    let before = doc.xml_bytes().unwrap();
    assert!(doc.replace_xml("<not-an-invoice/>").is_err());
    assert_eq!(doc.xml_bytes().unwrap(), before);

    let zugferd = template_doc(FlavorKind::Zugferd, Level::Extended)
        .xml_bytes()
        .unwrap();
    doc.replace_xml(zugferd).unwrap();
    assert_eq!(
        doc.flavor(),
        Flavor::new(FlavorKind::Zugferd, Level::Extended).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[test]
fn credit_note_metadata_says_refund() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    fill_header(&mut doc);
    doc.set("doc_type", "381").unwrap();
    let meta = doc.metadata().unwrap();
    assert_eq!(meta.title, "Acme: Refund I100");
    assert_eq!(
        meta.subject,
        "Factur-X Refund I100 dated 2024-01-15 issued by Acme"
    );

    doc.set("doc_type", "380").unwrap();
    assert_eq!(doc.metadata().unwrap().title, "Acme: Invoice I100");
}

#[test]
fn metadata_needs_the_base_fields() {
    let doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    assert!(matches!(
        doc.metadata(),
        Err(FacturXError::MissingBaseInfo(f)) if f == "number"
    ));
}

// ---------------------------------------------------------------------------
// Writing the PDF
// ---------------------------------------------------------------------------

#[test]
fn written_xml_round_trips() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Basic);
    fill_header(&mut doc);
    doc.set("note", "first").unwrap();
    doc.set("note", "second").unwrap();
    let pdf = doc.to_pdf_bytes(&options()).unwrap();

    let reopened = FacturXDocument::open(pdf.clone()).unwrap();
    assert_eq!(reopened.xml_bytes().unwrap(), doc.xml_bytes().unwrap());
    assert_eq!(
        reopened.get_all("note").unwrap(),
        vec![FieldValue::from("first"), FieldValue::from("second")]
    );

    let (name, xml) = extract_xml(&pdf).unwrap().unwrap();
    assert_eq!(name, "factur-x.xml");
    assert_eq!(xml, doc.xml_bytes().unwrap());
}

#[test]
fn zugferd_round_trips_under_its_own_filename() {
    let mut doc = template_doc(FlavorKind::Zugferd, Level::Comfort);
    fill_header(&mut doc);
    let pdf = doc.to_pdf_bytes(&options()).unwrap();

    let names: Vec<String> = list_attachments(&pdf)
        .unwrap()
        .into_iter()
        .map(|(n, _)| n)
        .collect();
    assert_eq!(names, ["ZUGFeRD-invoice.xml"]);

    let reopened = FacturXDocument::open(pdf).unwrap();
    assert_eq!(
        reopened.flavor(),
        Flavor::new(FlavorKind::Zugferd, Level::Comfort).unwrap()
    );
    assert_eq!(reopened.get("seller").unwrap(), Some(FieldValue::from("Acme")));
}

#[test]
fn identical_inputs_give_identical_output() {
    let write = || {
        let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
        fill_header(&mut doc);
        doc.to_pdf_bytes(&options()).unwrap()
    };
    assert_eq!(write(), write());
}

#[test]
fn name_tree_is_sorted_by_filename() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    fill_header(&mut doc);
    let opts = options()
        .attachment(Attachment::new("invoice.xml", b"<other/>".to_vec()))
        .attachment(Attachment::new("appendix.pdf", b"%PDF-1.4".to_vec()));
    let pdf = doc.to_pdf_bytes(&opts).unwrap();

    let names: Vec<String> = list_attachments(&pdf)
        .unwrap()
        .into_iter()
        .map(|(n, _)| n)
        .collect();
    assert_eq!(names, ["appendix.pdf", "factur-x.xml", "invoice.xml"]);

    let (out, catalog) = output_catalog(&pdf);
    let af_names: Vec<String> = catalog
        .get(b"AF")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            let spec = out.get_dictionary(r.as_reference().unwrap()).unwrap();
            literal(spec.get(b"UF").unwrap())
        })
        .collect();
    assert_eq!(af_names, names);
}

#[test]
fn reserved_invoice_name_cannot_be_attached() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    fill_header(&mut doc);
    let opts = options().attachment(Attachment::new("ZUGFeRD-invoice.xml", b"<x/>".to_vec()));
    let err = doc.to_pdf_bytes(&opts).unwrap_err();
    assert!(matches!(
        err,
        FacturXError::AttachmentBuild {
            step: AttachmentStep::Filespec,
            ..
        }
    ));
}

#[test]
fn existing_attachments_are_kept() {
    let mut doc = FacturXDocument::open(pdf_with_attachment()).unwrap();
    fill_header(&mut doc);
    let pdf = doc.to_pdf_bytes(&options()).unwrap();

    let files = list_attachments(&pdf).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].0, "factur-x.xml");
    assert_eq!(files[1], ("terms.txt".to_string(), b"payment terms".to_vec()));
}

#[test]
fn rewriting_replaces_the_previous_invoice() {
    let mut doc = FacturXDocument::open(facturx_pdf(Level::Minimum)).unwrap();
    doc.set("number", "I200").unwrap();
    let pdf = doc.to_pdf_bytes(&options()).unwrap();

    let files = list_attachments(&pdf).unwrap();
    assert_eq!(files.len(), 1);
    let reopened = FacturXDocument::open(pdf).unwrap();
    assert_eq!(reopened.get("number").unwrap(), Some(FieldValue::from("I200")));
}

#[test]
fn catalog_info_and_xmp_are_written() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::BasicWl);
    fill_header(&mut doc);
    let pdf = doc.to_pdf_bytes(&options()).unwrap();
    let (out, catalog) = output_catalog(&pdf);

    assert_eq!(
        catalog.get(b"PageMode").unwrap(),
        &Object::Name(b"UseAttachments".to_vec())
    );
    let metadata_id = catalog.get(b"Metadata").unwrap().as_reference().unwrap();
    let stream = out.get_object(metadata_id).unwrap().as_stream().unwrap();
    let xmp = String::from_utf8(stream.content.clone()).unwrap();
    assert!(xmp.contains("<fx:ConformanceLevel>BASIC WL</fx:ConformanceLevel>"));
    assert!(xmp.contains("<fx:DocumentFileName>factur-x.xml</fx:DocumentFileName>"));
    assert!(xmp.contains("Acme: Invoice I100"));

    let info_id = out.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = out.get_dictionary(info_id).unwrap();
    assert_eq!(literal(info.get(b"Title").unwrap()), "Acme: Invoice I100");
    assert_eq!(literal(info.get(b"Author").unwrap()), "Acme");
    assert_eq!(
        literal(info.get(b"ModDate").unwrap()),
        "D:20240115120000+00'00'"
    );
}

#[test]
fn explicit_metadata_skips_derivation() {
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    let opts = options()
        .check_schema(false)
        .metadata(PdfMetadata::new("Custom", "Me", "Draft", "Invoice"));
    let pdf = doc.to_pdf_bytes(&opts).unwrap();

    let out = Document::load_mem(&pdf).unwrap();
    let info_id = out.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = out.get_dictionary(info_id).unwrap();
    assert_eq!(literal(info.get(b"Title").unwrap()), "Custom");
}

#[test]
fn output_intents_and_document_id_survive() {
    let mut doc = FacturXDocument::open(pdf_with_intent_and_id()).unwrap();
    fill_header(&mut doc);
    let pdf = doc.to_pdf_bytes(&options()).unwrap();
    let (out, catalog) = output_catalog(&pdf);

    assert!(out.trailer.get(b"ID").is_ok());
    let intents = catalog.get(b"OutputIntents").unwrap().as_array().unwrap();
    assert_eq!(intents.len(), 1);
    let intent = out
        .get_dictionary(intents[0].as_reference().unwrap())
        .unwrap();
    let profile_id = intent
        .get(b"DestOutputProfile")
        .unwrap()
        .as_reference()
        .unwrap();
    let profile = out.get_object(profile_id).unwrap().as_stream().unwrap();
    assert_eq!(profile.content, b"fake icc profile");
}

#[test]
fn encrypted_pdf_opens_but_refuses_to_write() {
    let pdf = pdf_with(|doc, _| {
        let encrypt = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
        });
        doc.trailer.set("Encrypt", Object::Reference(encrypt));
    });
    let mut doc = FacturXDocument::open(pdf).unwrap();
    fill_header(&mut doc);
    let err = doc.to_pdf_bytes(&options()).unwrap_err();
    assert!(
        matches!(
            err,
            FacturXError::AttachmentBuild {
                step: AttachmentStep::Load,
                ..
            }
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn write_pdf_to_disk_and_reopen_by_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let mut doc = template_doc(FlavorKind::FacturX, Level::Minimum);
    fill_header(&mut doc);
    doc.write_pdf(&path, &options()).unwrap();

    let reopened = FacturXDocument::open(path.as_path()).unwrap();
    assert_eq!(reopened.get("amount_total").unwrap(), Some(FieldValue::Amount(dec!(120))));
}
