use super::FieldKind;
use crate::core::{CodeList, FacturXError};
use crate::flavor::{Flavor, FlavorKind};

/// One semantic field and where each flavor stores it.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub facturx: Option<&'static str>,
    pub zugferd: Option<&'static str>,
    pub required: bool,
    pub default: Option<&'static str>,
    pub kind: FieldKind,
    /// Qualified name of the repeating element the leaf lives in.
    pub group: Option<&'static str>,
}

impl FieldSpec {
    /// Path for `flavor`, or `None` when the flavor does not carry the field.
    pub fn xpath(&self, flavor: &Flavor) -> Option<&'static str> {
        match flavor.kind() {
            FlavorKind::FacturX => self.facturx,
            FlavorKind::Zugferd => self.zugferd,
        }
    }

    pub fn code_list(&self) -> Option<CodeList> {
        match self.kind {
            FieldKind::Code(list) => Some(list),
            _ => None,
        }
    }
}

/// Find a field by name.
pub fn lookup(name: &str) -> Result<&'static FieldSpec, FacturXError> {
    FIELDS
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| FacturXError::UnknownField(name.to_string()))
}

macro_rules! fx {
    (doc $tail:literal) => {
        concat!("/rsm:CrossIndustryInvoice/rsm:ExchangedDocument/", $tail)
    };
    (agreement $tail:literal) => {
        concat!(
            "/rsm:CrossIndustryInvoice/rsm:SupplyChainTradeTransaction/ram:ApplicableHeaderTradeAgreement/",
            $tail
        )
    };
    (settlement $tail:literal) => {
        concat!(
            "/rsm:CrossIndustryInvoice/rsm:SupplyChainTradeTransaction/ram:ApplicableHeaderTradeSettlement/",
            $tail
        )
    };
    (line $tail:literal) => {
        concat!(
            "/rsm:CrossIndustryInvoice/rsm:SupplyChainTradeTransaction/ram:IncludedSupplyChainTradeLineItem/",
            $tail
        )
    };
}

macro_rules! zf {
    (doc $tail:literal) => {
        concat!("/rsm:CrossIndustryDocument/rsm:HeaderExchangedDocument/", $tail)
    };
    (agreement $tail:literal) => {
        concat!(
            "/rsm:CrossIndustryDocument/rsm:SpecifiedSupplyChainTradeTransaction/ram:ApplicableSupplyChainTradeAgreement/",
            $tail
        )
    };
    (settlement $tail:literal) => {
        concat!(
            "/rsm:CrossIndustryDocument/rsm:SpecifiedSupplyChainTradeTransaction/ram:ApplicableSupplyChainTradeSettlement/",
            $tail
        )
    };
    (line $tail:literal) => {
        concat!(
            "/rsm:CrossIndustryDocument/rsm:SpecifiedSupplyChainTradeTransaction/ram:IncludedSupplyChainTradeLineItem/",
            $tail
        )
    };
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        facturx: None,
        zugferd: None,
        required: false,
        default: None,
        kind,
        group: None,
    }
}

const NOTE: &str = "ram:IncludedNote";
const TAX: &str = "ram:ApplicableTradeTax";
const LINE: &str = "ram:IncludedSupplyChainTradeLineItem";

/// All registered fields, in export order.
pub static FIELDS: &[FieldSpec] = &[
    FieldSpec {
        facturx: Some(fx!(doc "ram:ID")),
        zugferd: Some(zf!(doc "ram:ID")),
        required: true,
        ..field("number", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(doc "ram:TypeCode")),
        zugferd: Some(zf!(doc "ram:TypeCode")),
        required: true,
        default: Some("380"),
        ..field("doc_type", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(doc "ram:IssueDateTime/udt:DateTimeString")),
        zugferd: Some(zf!(doc "ram:IssueDateTime/udt:DateTimeString")),
        required: true,
        ..field("date", FieldKind::Date)
    },
    FieldSpec {
        facturx: Some(fx!(doc "ram:IncludedNote/ram:Content")),
        zugferd: Some(zf!(doc "ram:IncludedNote/ram:Content")),
        group: Some(NOTE),
        ..field("note", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(agreement "ram:SellerTradeParty/ram:Name")),
        zugferd: Some(zf!(agreement "ram:SellerTradeParty/ram:Name")),
        required: true,
        ..field("seller", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(agreement "ram:SellerTradeParty/ram:PostalTradeAddress/ram:CountryID")),
        zugferd: Some(zf!(agreement "ram:SellerTradeParty/ram:PostalTradeAddress/ram:CountryID")),
        ..field("seller_country", FieldKind::Code(CodeList::Country))
    },
    FieldSpec {
        facturx: Some(fx!(agreement "ram:SellerTradeParty/ram:SpecifiedTaxRegistration/ram:ID")),
        zugferd: Some(zf!(agreement "ram:SellerTradeParty/ram:SpecifiedTaxRegistration/ram:ID")),
        ..field("seller_vat_id", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(agreement "ram:BuyerTradeParty/ram:Name")),
        zugferd: Some(zf!(agreement "ram:BuyerTradeParty/ram:Name")),
        ..field("buyer", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(agreement "ram:BuyerTradeParty/ram:PostalTradeAddress/ram:CountryID")),
        zugferd: Some(zf!(agreement "ram:BuyerTradeParty/ram:PostalTradeAddress/ram:CountryID")),
        ..field("buyer_country", FieldKind::Code(CodeList::Country))
    },
    FieldSpec {
        facturx: Some(fx!(agreement "ram:BuyerReference")),
        zugferd: Some(zf!(agreement "ram:BuyerReference")),
        ..field("buyer_reference", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:InvoiceCurrencyCode")),
        zugferd: Some(zf!(settlement "ram:InvoiceCurrencyCode")),
        required: true,
        default: Some("EUR"),
        ..field("currency", FieldKind::Code(CodeList::Currency))
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:TaxBasisTotalAmount")),
        zugferd: Some(zf!(settlement "ram:SpecifiedTradeSettlementMonetarySummation/ram:TaxBasisTotalAmount")),
        ..field("amount_untaxed", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:TaxTotalAmount")),
        zugferd: Some(zf!(settlement "ram:SpecifiedTradeSettlementMonetarySummation/ram:TaxTotalAmount")),
        ..field("amount_tax", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:GrandTotalAmount")),
        zugferd: Some(zf!(settlement "ram:SpecifiedTradeSettlementMonetarySummation/ram:GrandTotalAmount")),
        required: true,
        ..field("amount_total", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:SpecifiedTradeSettlementHeaderMonetarySummation/ram:DuePayableAmount")),
        zugferd: Some(zf!(settlement "ram:SpecifiedTradeSettlementMonetarySummation/ram:DuePayableAmount")),
        ..field("amount_due", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:SpecifiedTradePaymentTerms/ram:DueDateDateTime/udt:DateTimeString")),
        zugferd: Some(zf!(settlement "ram:SpecifiedTradePaymentTerms/ram:DueDateDateTime/udt:DateTimeString")),
        ..field("due_date", FieldKind::Date)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:ApplicableTradeTax/ram:CalculatedAmount")),
        zugferd: Some(zf!(settlement "ram:ApplicableTradeTax/ram:CalculatedAmount")),
        group: Some(TAX),
        ..field("tax_amount", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:ApplicableTradeTax/ram:BasisAmount")),
        zugferd: Some(zf!(settlement "ram:ApplicableTradeTax/ram:BasisAmount")),
        group: Some(TAX),
        ..field("tax_base", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:ApplicableTradeTax/ram:CategoryCode")),
        zugferd: Some(zf!(settlement "ram:ApplicableTradeTax/ram:CategoryCode")),
        group: Some(TAX),
        ..field("tax_category", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(settlement "ram:ApplicableTradeTax/ram:RateApplicablePercent")),
        zugferd: Some(zf!(settlement "ram:ApplicableTradeTax/ram:ApplicablePercent")),
        group: Some(TAX),
        ..field("tax_rate", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(line "ram:AssociatedDocumentLineDocument/ram:LineID")),
        zugferd: Some(zf!(line "ram:AssociatedDocumentLineDocument/ram:LineID")),
        group: Some(LINE),
        ..field("line_id", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(line "ram:SpecifiedTradeProduct/ram:Name")),
        zugferd: Some(zf!(line "ram:SpecifiedTradeProduct/ram:Name")),
        group: Some(LINE),
        ..field("line_name", FieldKind::Text)
    },
    FieldSpec {
        facturx: Some(fx!(line "ram:SpecifiedLineTradeAgreement/ram:NetPriceProductTradePrice/ram:ChargeAmount")),
        group: Some(LINE),
        ..field("line_price", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(line "ram:SpecifiedLineTradeDelivery/ram:BilledQuantity")),
        zugferd: Some(zf!(line "ram:SpecifiedSupplyChainTradeDelivery/ram:BilledQuantity")),
        group: Some(LINE),
        ..field("line_quantity", FieldKind::Amount)
    },
    FieldSpec {
        facturx: Some(fx!(line "ram:SpecifiedLineTradeSettlement/ram:SpecifiedTradeSettlementLineMonetarySummation/ram:LineTotalAmount")),
        zugferd: Some(zf!(line "ram:SpecifiedSupplyChainTradeSettlement/ram:SpecifiedTradeSettlementMonetarySummation/ram:LineTotalAmount")),
        group: Some(LINE),
        ..field("line_amount", FieldKind::Amount)
    },
];
