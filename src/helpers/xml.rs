//! XML writing utilities for Office Open XML (.xlsx) parts
//! Provides an XML writer wrapper that tracks open elements and sanitizes text content

use crate::error::TablefindError;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Write;
use thiserror::Error;

/// Errors specific to XML writing operations
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Close element '{found}' while '{expected}' is open")]
    UnbalancedEndTag { expected: String, found: String },

    #[error("Close element '{0}' without opening it")]
    UnexpectedEndTag(String),

    #[error("Element '{0}' is never closed")]
    UnclosedElement(String),
}

/// XML writer wrapper keeping track of the currently open elements
pub(crate) struct XmlWriter<W: Write> {
    writer: Writer<W>,
    open: Vec<String>,
}

impl<W: Write> XmlWriter<W> {
    /// Creates a new XML writer over the given sink
    pub(crate) fn new(inner: W) -> XmlWriter<W> {
        XmlWriter {
            writer: Writer::new(inner),
            open: Vec::with_capacity(8),
        }
    }

    /// Writes the standalone UTF-8 declaration expected by spreadsheet applications
    pub(crate) fn declaration(&mut self) -> Result<(), TablefindError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(())
    }

    /// Opens an element with the given attributes
    pub(crate) fn start(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), TablefindError> {
        self.writer.write_event(Event::Start(element(tag, attributes)))?;
        self.open.push(tag.to_owned());
        Ok(())
    }

    /// Closes the most recently opened element, which must be `tag`
    pub(crate) fn end(&mut self, tag: &str) -> Result<(), TablefindError> {
        match self.open.pop() {
            Some(expected) if expected == tag => (),
            Some(expected) => Err(XmlError::UnbalancedEndTag {
                expected,
                found: tag.to_owned(),
            })?,
            None => Err(XmlError::UnexpectedEndTag(tag.to_owned()))?,
        }
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    /// Writes a self-closing element
    pub(crate) fn empty(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), TablefindError> {
        self.writer.write_event(Event::Empty(element(tag, attributes)))?;
        Ok(())
    }

    /// Writes an element containing only escaped text
    pub(crate) fn text_element(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<(), TablefindError> {
        self.start(tag, attributes)?;
        self.writer
            .write_event(Event::Text(BytesText::new(&sanitize_text(text))))?;
        self.end(tag)
    }

    /// Returns the underlying sink after checking every element was closed
    pub(crate) fn finish(self) -> Result<W, TablefindError> {
        if let Some(tag) = self.open.last() {
            Err(XmlError::UnclosedElement(tag.to_owned()))?;
        }
        Ok(self.writer.into_inner())
    }
}

/// Builds a start tag; attribute values are sanitized like text content.
fn element<'a>(tag: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(tag);
    for (key, value) in attributes {
        element.push_attribute((*key, sanitize_text(value).as_ref()));
    }
    element
}

/// Removes characters that are not allowed in XML 1.0 documents.
/// PDF extraction regularly leaves form feeds and other control characters in cell text.
pub(crate) fn sanitize_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|character| is_xml_char(*character)).collect())
    }
}

fn is_xml_char(character: char) -> bool {
    matches!(character,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(f: F) -> Result<String, TablefindError>
    where
        F: FnOnce(&mut XmlWriter<Vec<u8>>) -> Result<(), TablefindError>,
    {
        let mut writer = XmlWriter::new(Vec::new());
        f(&mut writer)?;
        Ok(String::from_utf8(writer.finish()?).expect("utf-8"))
    }

    #[test]
    fn write_nested_elements() {
        let xml = render(|writer| {
            writer.start("row", &[("r", "1")])?;
            writer.text_element("t", &[], "a < b & c")?;
            writer.empty("col", &[("min", "1")])?;
            writer.end("row")
        })
        .unwrap();

        assert_eq!(xml, r#"<row r="1"><t>a &lt; b &amp; c</t><col min="1"/></row>"#);
    }

    #[test]
    fn unbalanced_end_tag_is_rejected() {
        let result = render(|writer| {
            writer.start("row", &[])?;
            writer.end("c")
        });

        assert!(matches!(
            result,
            Err(TablefindError::XmlHelperError(XmlError::UnbalancedEndTag { .. }))
        ));
    }

    #[test]
    fn unclosed_element_is_rejected() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.start("sheetData", &[]).unwrap();

        assert!(matches!(
            writer.finish(),
            Err(TablefindError::XmlHelperError(XmlError::UnclosedElement(tag)))
                if tag == "sheetData"
        ));
    }

    #[test]
    fn attribute_values_are_sanitized() {
        let xml = render(|writer| {
            writer.empty("sheet", &[("name", "Fin\u{1}ance & Co"), ("sheetId", "1")])?;
            writer.start("row", &[("r", "2\u{b}")])?;
            writer.end("row")
        })
        .unwrap();

        assert_eq!(
            xml,
            r#"<sheet name="Finance &amp; Co" sheetId="1"/><row r="2"></row>"#
        );
    }

    #[test]
    fn control_characters_are_removed() {
        assert_eq!(sanitize_text("Total\u{c}Revenue\u{0}"), "TotalRevenue");
        assert!(matches!(sanitize_text("plain\ttext"), Cow::Borrowed(_)));
    }
}
