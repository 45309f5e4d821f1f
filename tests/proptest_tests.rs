//! Property-based tests for field access and PDF embedding.
//!
//! Run with: `cargo test --test proptest_tests`

mod common;

use chrono::NaiveDate;
use common::*;
use facturx::pdf::list_attachments;
use facturx::{Attachment, FacturXDocument, FieldValue, FlavorKind, Level, WriteOptions};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn template(level: Level) -> FacturXDocument {
    FacturXDocument::builder()
        .flavor(FlavorKind::FacturX)
        .level(level)
        .open(minimal_pdf())
        .unwrap()
}

// ── Proptest Strategies ─────────────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1900i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| date(y, m, d))
}

/// 0.00 to 9999999.99 with two decimals.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Distinct attachment names, in arbitrary order.
fn arb_filenames() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,8}\\.(pdf|csv|txt)", 1..6)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A written date reads back unchanged.
    #[test]
    fn date_round_trip(d in arb_date()) {
        let mut doc = template(Level::Minimum);
        doc.set("date", d).unwrap();
        prop_assert_eq!(doc.get("date").unwrap(), Some(FieldValue::Date(d)));
    }

    /// A written amount reads back with the same value.
    #[test]
    fn amount_round_trip(a in arb_amount()) {
        let mut doc = template(Level::Minimum);
        doc.set("amount_total", a).unwrap();
        prop_assert_eq!(doc.get("amount_total").unwrap(), Some(FieldValue::Amount(a)));
    }

    /// Every write to a grouped field lands in its own occurrence, in write order.
    #[test]
    fn group_writes_keep_order(rates in prop::collection::vec(arb_amount(), 1..6)) {
        let mut doc = template(Level::En16931);
        for r in &rates {
            doc.set("tax_rate", *r).unwrap();
        }
        let read: Vec<Decimal> = doc
            .get_all("tax_rate")
            .unwrap()
            .iter()
            .filter_map(FieldValue::as_amount)
            .collect();
        prop_assert_eq!(read, rates);
    }

    /// Every level's template passes the construction-time schema check and validates once filled.
    #[test]
    fn filled_templates_validate(level in prop::sample::select(vec![
        Level::Minimum, Level::BasicWl, Level::Basic, Level::En16931, Level::Extended,
    ])) {
        let mut doc = template(level);
        fill_header(&mut doc);
        prop_assert!(doc.validate().is_ok());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// The embedded-files name tree is sorted no matter the insertion order.
    #[test]
    fn name_tree_sorted(names in arb_filenames()) {
        let mut doc = template(Level::Minimum);
        fill_header(&mut doc);
        let opts = WriteOptions::new()
            .timestamp(fixed_time())
            .attachments(names.iter().map(|n| Attachment::new(n.clone(), b"data".to_vec())));
        let pdf = doc.to_pdf_bytes(&opts).unwrap();

        let listed: Vec<String> = list_attachments(&pdf)
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        let mut expected = names.clone();
        expected.push("factur-x.xml".to_string());
        expected.sort();
        prop_assert_eq!(listed, expected);
    }

    /// Text with XML-special characters survives a write / re-open cycle.
    #[test]
    fn seller_text_survives_the_pdf(seller in "[A-Za-z0-9][A-Za-z0-9 &<>'\"]{0,20}[A-Za-z0-9]") {
        let mut doc = template(Level::Minimum);
        fill_header(&mut doc);
        doc.set("seller", seller.as_str()).unwrap();
        let pdf = doc
            .to_pdf_bytes(&WriteOptions::new().timestamp(fixed_time()))
            .unwrap();
        let reopened = FacturXDocument::open(pdf).unwrap();
        prop_assert_eq!(reopened.get("seller").unwrap(), Some(FieldValue::Text(seller)));
    }
}

// ── Edge Case Tests ─────────────────────────────────────────────────────────

#[test]
fn non_ascii_metadata_is_written_as_utf16() {
    let mut doc = template(Level::Minimum);
    fill_header(&mut doc);
    doc.set("seller", "Société Générale").unwrap();
    let pdf = doc
        .to_pdf_bytes(&WriteOptions::new().timestamp(fixed_time()))
        .unwrap();

    let out = lopdf::Document::load_mem(&pdf).unwrap();
    let info_id = out.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let author = out.get_dictionary(info_id).unwrap().get(b"Author").unwrap();
    match author {
        lopdf::Object::String(bytes, _) => assert_eq!(&bytes[..2], &[0xFE, 0xFF]),
        other => panic!("unexpected author object {other:?}"),
    }

    let reopened = FacturXDocument::open(pdf).unwrap();
    assert_eq!(
        reopened.get("seller").unwrap(),
        Some(FieldValue::from("Société Générale"))
    );
}

#[test]
fn whitespace_only_values_read_absent() {
    let mut doc = template(Level::Minimum);
    doc.set("number", "   ").unwrap();
    assert_eq!(doc.get("number").unwrap(), None);
}
