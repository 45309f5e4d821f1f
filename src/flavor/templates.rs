//! Blank documents per flavor and level.
//!
//! Templates carry the full element skeleton with empty leaves; every
//! registry field of the level resolves to exactly one leaf (or one
//! leaf in the first occurrence of its group).

use super::{Flavor, FlavorKind, cii_ns, ferd_ns};
use crate::core::FacturXError;
use crate::xml::XmlWriter;

pub(super) fn render(flavor: Flavor) -> Result<String, FacturXError> {
    match flavor.kind() {
        FlavorKind::FacturX => facturx(flavor),
        FlavorKind::Zugferd => zugferd(flavor),
    }
}

const DATE_STRING: &str = "udt:DateTimeString";

/// CII D16B skeleton (Factur-X / ZUGFeRD 2.x).
fn facturx(flavor: Flavor) -> Result<String, FacturXError> {
    let level = flavor.level();
    let mut w = XmlWriter::new()?;

    w.start_element_with_attrs(
        "rsm:CrossIndustryInvoice",
        &[
            ("xmlns:rsm", cii_ns::RSM),
            ("xmlns:ram", cii_ns::RAM),
            ("xmlns:qdt", cii_ns::QDT),
            ("xmlns:udt", cii_ns::UDT),
        ],
    )?;

    w.start_element("rsm:ExchangedDocumentContext")?;
    w.start_element("ram:GuidelineSpecifiedDocumentContextParameter")?;
    w.text_element("ram:ID", flavor.guideline_id())?;
    w.end_element("ram:GuidelineSpecifiedDocumentContextParameter")?;
    w.end_element("rsm:ExchangedDocumentContext")?;

    w.start_element("rsm:ExchangedDocument")?;
    w.empty_element("ram:ID")?;
    w.empty_element("ram:TypeCode")?;
    w.empty_date_element("ram:IssueDateTime", DATE_STRING)?;
    if level.has_breakdown() {
        w.start_element("ram:IncludedNote")?;
        w.empty_element("ram:Content")?;
        w.end_element("ram:IncludedNote")?;
    }
    w.end_element("rsm:ExchangedDocument")?;

    w.start_element("rsm:SupplyChainTradeTransaction")?;

    if level.has_lines() {
        w.start_element("ram:IncludedSupplyChainTradeLineItem")?;
        w.start_element("ram:AssociatedDocumentLineDocument")?;
        w.empty_element("ram:LineID")?;
        w.end_element("ram:AssociatedDocumentLineDocument")?;
        w.start_element("ram:SpecifiedTradeProduct")?;
        w.empty_element("ram:Name")?;
        w.end_element("ram:SpecifiedTradeProduct")?;
        w.start_element("ram:SpecifiedLineTradeAgreement")?;
        w.start_element("ram:NetPriceProductTradePrice")?;
        w.empty_element("ram:ChargeAmount")?;
        w.end_element("ram:NetPriceProductTradePrice")?;
        w.end_element("ram:SpecifiedLineTradeAgreement")?;
        w.start_element("ram:SpecifiedLineTradeDelivery")?;
        w.empty_element_with_attrs("ram:BilledQuantity", &[("unitCode", "C62")])?;
        w.end_element("ram:SpecifiedLineTradeDelivery")?;
        w.start_element("ram:SpecifiedLineTradeSettlement")?;
        w.start_element("ram:ApplicableTradeTax")?;
        w.text_element("ram:TypeCode", "VAT")?;
        w.empty_element("ram:CategoryCode")?;
        w.end_element("ram:ApplicableTradeTax")?;
        w.start_element("ram:SpecifiedTradeSettlementLineMonetarySummation")?;
        w.empty_element("ram:LineTotalAmount")?;
        w.end_element("ram:SpecifiedTradeSettlementLineMonetarySummation")?;
        w.end_element("ram:SpecifiedLineTradeSettlement")?;
        w.end_element("ram:IncludedSupplyChainTradeLineItem")?;
    }

    w.start_element("ram:ApplicableHeaderTradeAgreement")?;
    w.empty_element("ram:BuyerReference")?;
    w.start_element("ram:SellerTradeParty")?;
    w.empty_element("ram:Name")?;
    w.start_element("ram:PostalTradeAddress")?;
    w.empty_element("ram:CountryID")?;
    w.end_element("ram:PostalTradeAddress")?;
    w.start_element("ram:SpecifiedTaxRegistration")?;
    w.empty_element_with_attrs("ram:ID", &[("schemeID", "VA")])?;
    w.end_element("ram:SpecifiedTaxRegistration")?;
    w.end_element("ram:SellerTradeParty")?;
    w.start_element("ram:BuyerTradeParty")?;
    w.empty_element("ram:Name")?;
    if level.has_breakdown() {
        w.start_element("ram:PostalTradeAddress")?;
        w.empty_element("ram:CountryID")?;
        w.end_element("ram:PostalTradeAddress")?;
    }
    w.end_element("ram:BuyerTradeParty")?;
    w.end_element("ram:ApplicableHeaderTradeAgreement")?;

    w.start_element("ram:ApplicableHeaderTradeDelivery")?;
    w.end_element("ram:ApplicableHeaderTradeDelivery")?;

    w.start_element("ram:ApplicableHeaderTradeSettlement")?;
    w.empty_element("ram:InvoiceCurrencyCode")?;
    if level.has_breakdown() {
        w.start_element("ram:ApplicableTradeTax")?;
        w.empty_element("ram:CalculatedAmount")?;
        w.text_element("ram:TypeCode", "VAT")?;
        w.empty_element("ram:BasisAmount")?;
        w.empty_element("ram:CategoryCode")?;
        w.empty_element("ram:RateApplicablePercent")?;
        w.end_element("ram:ApplicableTradeTax")?;
        w.start_element("ram:SpecifiedTradePaymentTerms")?;
        w.empty_date_element("ram:DueDateDateTime", DATE_STRING)?;
        w.end_element("ram:SpecifiedTradePaymentTerms")?;
    }
    w.start_element("ram:SpecifiedTradeSettlementHeaderMonetarySummation")?;
    if level.has_breakdown() {
        w.empty_element("ram:LineTotalAmount")?;
    }
    w.empty_element("ram:TaxBasisTotalAmount")?;
    w.empty_element("ram:TaxTotalAmount")?;
    w.empty_element("ram:GrandTotalAmount")?;
    w.empty_element("ram:DuePayableAmount")?;
    w.end_element("ram:SpecifiedTradeSettlementHeaderMonetarySummation")?;
    w.end_element("ram:ApplicableHeaderTradeSettlement")?;

    w.end_element("rsm:SupplyChainTradeTransaction")?;
    w.end_element("rsm:CrossIndustryInvoice")?;

    w.into_string()
}

/// ZUGFeRD 1.0 "CrossIndustryDocument" skeleton. Line items follow the
/// header settlement in this schema.
fn zugferd(flavor: Flavor) -> Result<String, FacturXError> {
    let mut w = XmlWriter::new()?;

    w.start_element_with_attrs(
        "rsm:CrossIndustryDocument",
        &[
            ("xmlns:rsm", ferd_ns::RSM),
            ("xmlns:ram", ferd_ns::RAM),
            ("xmlns:udt", ferd_ns::UDT),
            ("xmlns:xsi", ferd_ns::XSI),
        ],
    )?;

    w.start_element("rsm:SpecifiedExchangedDocumentContext")?;
    w.start_element("ram:GuidelineSpecifiedDocumentContextParameter")?;
    w.text_element("ram:ID", flavor.guideline_id())?;
    w.end_element("ram:GuidelineSpecifiedDocumentContextParameter")?;
    w.end_element("rsm:SpecifiedExchangedDocumentContext")?;

    w.start_element("rsm:HeaderExchangedDocument")?;
    w.empty_element("ram:ID")?;
    w.empty_element("ram:TypeCode")?;
    w.empty_date_element("ram:IssueDateTime", DATE_STRING)?;
    w.start_element("ram:IncludedNote")?;
    w.empty_element("ram:Content")?;
    w.end_element("ram:IncludedNote")?;
    w.end_element("rsm:HeaderExchangedDocument")?;

    w.start_element("rsm:SpecifiedSupplyChainTradeTransaction")?;

    w.start_element("ram:ApplicableSupplyChainTradeAgreement")?;
    w.empty_element("ram:BuyerReference")?;
    for party in ["ram:SellerTradeParty", "ram:BuyerTradeParty"] {
        w.start_element(party)?;
        w.empty_element("ram:Name")?;
        w.start_element("ram:PostalTradeAddress")?;
        w.empty_element("ram:CountryID")?;
        w.end_element("ram:PostalTradeAddress")?;
        if party == "ram:SellerTradeParty" {
            w.start_element("ram:SpecifiedTaxRegistration")?;
            w.empty_element_with_attrs("ram:ID", &[("schemeID", "VA")])?;
            w.end_element("ram:SpecifiedTaxRegistration")?;
        }
        w.end_element(party)?;
    }
    w.end_element("ram:ApplicableSupplyChainTradeAgreement")?;

    w.start_element("ram:ApplicableSupplyChainTradeDelivery")?;
    w.end_element("ram:ApplicableSupplyChainTradeDelivery")?;

    w.start_element("ram:ApplicableSupplyChainTradeSettlement")?;
    w.empty_element("ram:InvoiceCurrencyCode")?;
    w.start_element("ram:ApplicableTradeTax")?;
    w.empty_element("ram:CalculatedAmount")?;
    w.text_element("ram:TypeCode", "VAT")?;
    w.empty_element("ram:BasisAmount")?;
    w.empty_element("ram:CategoryCode")?;
    w.empty_element("ram:ApplicablePercent")?;
    w.end_element("ram:ApplicableTradeTax")?;
    w.start_element("ram:SpecifiedTradePaymentTerms")?;
    w.empty_date_element("ram:DueDateDateTime", DATE_STRING)?;
    w.end_element("ram:SpecifiedTradePaymentTerms")?;
    w.start_element("ram:SpecifiedTradeSettlementMonetarySummation")?;
    w.empty_element("ram:LineTotalAmount")?;
    w.empty_element("ram:TaxBasisTotalAmount")?;
    w.empty_element("ram:TaxTotalAmount")?;
    w.empty_element("ram:GrandTotalAmount")?;
    w.empty_element("ram:DuePayableAmount")?;
    w.end_element("ram:SpecifiedTradeSettlementMonetarySummation")?;
    w.end_element("ram:ApplicableSupplyChainTradeSettlement")?;

    w.start_element("ram:IncludedSupplyChainTradeLineItem")?;
    w.start_element("ram:AssociatedDocumentLineDocument")?;
    w.empty_element("ram:LineID")?;
    w.end_element("ram:AssociatedDocumentLineDocument")?;
    w.start_element("ram:SpecifiedSupplyChainTradeDelivery")?;
    w.empty_element_with_attrs("ram:BilledQuantity", &[("unitCode", "C62")])?;
    w.end_element("ram:SpecifiedSupplyChainTradeDelivery")?;
    w.start_element("ram:SpecifiedSupplyChainTradeSettlement")?;
    w.start_element("ram:SpecifiedTradeSettlementMonetarySummation")?;
    w.empty_element("ram:LineTotalAmount")?;
    w.end_element("ram:SpecifiedTradeSettlementMonetarySummation")?;
    w.end_element("ram:SpecifiedSupplyChainTradeSettlement")?;
    w.start_element("ram:SpecifiedTradeProduct")?;
    w.empty_element("ram:Name")?;
    w.end_element("ram:SpecifiedTradeProduct")?;
    w.end_element("ram:IncludedSupplyChainTradeLineItem")?;

    w.end_element("rsm:SpecifiedSupplyChainTradeTransaction")?;
    w.end_element("rsm:CrossIndustryDocument")?;

    w.into_string()
}
