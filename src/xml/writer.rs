use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::FacturXError;

fn xml_io(e: std::io::Error) -> FacturXError {
    FacturXError::Xml(format!("XML write error: {e}"))
}

/// Pretty-printing event writer used for templates and tree serialization.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, FacturXError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }

    pub fn into_string(self) -> Result<String, FacturXError> {
        String::from_utf8(self.into_bytes())
            .map_err(|e| FacturXError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, FacturXError> {
        self.start_element_with_attrs(name, &[])
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FacturXError> {
        let elem = with_attrs(name, attrs);
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, FacturXError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Write `<name/>`: an empty leaf a field can later be written into.
    pub fn empty_element(&mut self, name: &str) -> Result<&mut Self, FacturXError> {
        self.empty_element_with_attrs(name, &[])
    }

    pub fn empty_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FacturXError> {
        let elem = with_attrs(name, attrs);
        self.writer
            .write_event(Event::Empty(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, FacturXError> {
        self.start_element(name)?;
        self.text(text)?;
        self.end_element(name)
    }

    pub fn text(&mut self, text: &str) -> Result<&mut Self, FacturXError> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn comment(&mut self, content: &str) -> Result<&mut Self, FacturXError> {
        self.writer
            .write_event(Event::Comment(BytesText::from_escaped(content)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn processing_instruction(&mut self, content: &str) -> Result<&mut Self, FacturXError> {
        self.writer
            .write_event(Event::PI(BytesPI::new(content)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Write a CII date leaf: `<name><udt:DateTimeString format="102"/></name>`.
    pub fn empty_date_element(
        &mut self,
        name: &str,
        date_string: &str,
    ) -> Result<&mut Self, FacturXError> {
        self.start_element(name)?;
        self.empty_element_with_attrs(date_string, &[("format", "102")])?;
        self.end_element(name)
    }
}

fn with_attrs<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut elem = BytesStart::new(name);
    for (k, v) in attrs {
        elem.push_attribute((*k, *v));
    }
    elem
}

/// Format a Decimal for XML output — always include at least 2 decimal places,
/// strip trailing zeros beyond that.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_decimal_cases() {
        assert_eq!(format_decimal(dec!(100)), "100.00");
        assert_eq!(format_decimal(dec!(49.90)), "49.90");
        assert_eq!(format_decimal(dec!(0.005)), "0.005");
        assert_eq!(format_decimal(dec!(-12.5)), "-12.50");
    }

    #[test]
    fn writes_empty_leaves_and_escapes_text() {
        let mut w = XmlWriter::new().unwrap();
        w.start_element_with_attrs("a:Root", &[("xmlns:a", "urn:a")]).unwrap();
        w.empty_element("a:Leaf").unwrap();
        w.text_element("a:Name", "Smith & Sons").unwrap();
        w.end_element("a:Root").unwrap();
        let xml = w.into_string().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<a:Leaf/>"));
        assert!(xml.contains("<a:Name>Smith &amp; Sons</a:Name>"));
    }
}
