//! Run element (w:r) - the minimal styled text unit

use crate::error::Result;
use crate::xml::{collect_attrs, get_w_val, parse_bool, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Run element (w:r)
#[derive(Clone, Debug, Default)]
pub struct Run {
    /// Explicit run-level style override (w:rPr)
    pub properties: Option<RunProperties>,
    /// Run content
    pub content: Vec<RunContent>,
    /// Unknown attributes (preserved for round-trip)
    pub unknown_attrs: Vec<(String, String)>,
}

/// Content within a run
#[derive(Clone, Debug)]
pub enum RunContent {
    /// Text (w:t)
    Text(String),
    /// Tab (w:tab)
    Tab,
    /// Break (w:br)
    Break,
    /// Carriage return (w:cr)
    CarriageReturn,
    /// Inline drawing (w:drawing), kept raw but recognized so images can
    /// be projected
    Drawing(RawXmlElement),
    /// Unknown (preserved)
    Unknown(RawXmlNode),
}

/// Run properties (w:rPr)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunProperties {
    /// Character style ID (w:rStyle)
    pub style: Option<String>,
    /// Bold
    pub bold: Option<bool>,
    /// Italic
    pub italic: Option<bool>,
    /// Underline type
    pub underline: Option<String>,
    /// Strike-through
    pub strike: Option<bool>,
    /// Font size in half-points (24 = 12pt)
    pub size: Option<u32>,
    /// Color (RGB hex)
    pub color: Option<String>,
    /// Highlight color name
    pub highlight: Option<String>,
    /// Font (ASCII range)
    pub font_ascii: Option<String>,
    /// Theme font slot reference (w:rFonts asciiTheme), e.g. "majorHAnsi"
    pub font_ascii_theme: Option<String>,
    /// Vertical alignment: superscript/subscript/baseline
    pub vertical_align: Option<String>,
    /// Unknown children (preserved)
    pub unknown_children: Vec<RawXmlNode>,
}

impl Run {
    /// Create a new run with text
    pub fn new(text: impl Into<String>) -> Self {
        Run {
            content: vec![RunContent::Text(text.into())],
            ..Default::default()
        }
    }

    /// Parse from reader (after the w:r start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut run = Run {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        };

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"rPr" => {
                            run.properties = Some(RunProperties::from_reader(reader)?);
                        }
                        b"t" => {
                            run.content.push(RunContent::Text(read_text(reader)?));
                        }
                        b"drawing" => {
                            let raw = RawXmlElement::from_reader(reader, &e)?;
                            run.content.push(RunContent::Drawing(raw));
                        }
                        _ => {
                            let raw = RawXmlElement::from_reader(reader, &e)?;
                            run.content.push(RunContent::Unknown(RawXmlNode::Element(raw)));
                        }
                    }
                }
                Event::Empty(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"t" => run.content.push(RunContent::Text(String::new())),
                        b"tab" => run.content.push(RunContent::Tab),
                        b"br" => run.content.push(RunContent::Break),
                        b"cr" => run.content.push(RunContent::CarriageReturn),
                        _ => run
                            .content
                            .push(RunContent::Unknown(RawXmlNode::Element(
                                RawXmlElement::from_empty(&e),
                            ))),
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"r" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(run)
    }

    /// Create from an empty (self-closing) w:r element
    pub fn from_empty(start: &BytesStart) -> Self {
        Run {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        }
    }

    /// All text in this run
    pub fn text(&self) -> String {
        let mut result = String::new();
        for content in &self.content {
            match content {
                RunContent::Text(t) => result.push_str(t),
                RunContent::Tab => result.push('\t'),
                RunContent::Break | RunContent::CarriageReturn => result.push('\n'),
                _ => {}
            }
        }
        result
    }

    /// First inline drawing, if the run carries one
    pub fn drawing(&self) -> Option<&RawXmlElement> {
        self.content.iter().find_map(|c| match c {
            RunContent::Drawing(d) => Some(d),
            _ => None,
        })
    }

    /// Set color on the explicit run override (RGB hex)
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.properties.get_or_insert_with(Default::default).color = Some(color.into());
    }

    /// Set bold on the explicit run override
    pub fn set_bold(&mut self, bold: bool) {
        self.properties.get_or_insert_with(Default::default).bold = Some(bold);
    }

    /// Set italic on the explicit run override
    pub fn set_italic(&mut self, italic: bool) {
        self.properties.get_or_insert_with(Default::default).italic = Some(italic);
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:r");
        for (key, value) in &self.unknown_attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.properties.is_none() && self.content.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }
        for content in &self.content {
            content.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:r")))?;
        Ok(())
    }
}

impl RunContent {
    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            RunContent::Text(text) => {
                let mut start = BytesStart::new("w:t");
                if text.starts_with(' ') || text.ends_with(' ') || text.contains("  ") {
                    start.push_attribute(("xml:space", "preserve"));
                }
                writer.write_event(Event::Start(start))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                writer.write_event(Event::End(BytesEnd::new("w:t")))?;
            }
            RunContent::Tab => {
                writer.write_event(Event::Empty(BytesStart::new("w:tab")))?;
            }
            RunContent::Break => {
                writer.write_event(Event::Empty(BytesStart::new("w:br")))?;
            }
            RunContent::CarriageReturn => {
                writer.write_event(Event::Empty(BytesStart::new("w:cr")))?;
            }
            RunContent::Drawing(d) => d.write_to(writer)?,
            RunContent::Unknown(node) => node.write_to(writer)?,
        }
        Ok(())
    }
}

impl RunProperties {
    /// Parse from reader (after the w:rPr start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut props = RunProperties::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let raw = RawXmlElement::from_reader(reader, &e)?;
                    props.unknown_children.push(RawXmlNode::Element(raw));
                }
                Event::Empty(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"rStyle" => props.style = get_w_val(&e),
                        b"b" => props.bold = Some(parse_bool(&e)),
                        b"i" => props.italic = Some(parse_bool(&e)),
                        b"u" => props.underline = get_w_val(&e).or(Some("single".into())),
                        b"strike" => props.strike = Some(parse_bool(&e)),
                        b"sz" => props.size = get_w_val(&e).and_then(|v| v.parse().ok()),
                        b"color" => props.color = get_w_val(&e),
                        b"highlight" => props.highlight = get_w_val(&e),
                        b"vertAlign" => props.vertical_align = get_w_val(&e),
                        b"rFonts" => {
                            props.font_ascii = crate::xml::get_attr(&e, "w:ascii")
                                .or_else(|| crate::xml::get_attr(&e, "ascii"));
                            props.font_ascii_theme = crate::xml::get_attr(&e, "w:asciiTheme")
                                .or_else(|| crate::xml::get_attr(&e, "asciiTheme"));
                        }
                        _ => props.unknown_children.push(RawXmlNode::Element(
                            RawXmlElement::from_empty(&e),
                        )),
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"rPr" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(props)
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let has_content = self.style.is_some()
            || self.bold.is_some()
            || self.italic.is_some()
            || self.underline.is_some()
            || self.strike.is_some()
            || self.size.is_some()
            || self.color.is_some()
            || self.highlight.is_some()
            || self.font_ascii.is_some()
            || self.font_ascii_theme.is_some()
            || self.vertical_align.is_some()
            || !self.unknown_children.is_empty();
        if !has_content {
            return Ok(());
        }

        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;

        if let Some(style) = &self.style {
            write_val(writer, "w:rStyle", style)?;
        }
        if self.font_ascii.is_some() || self.font_ascii_theme.is_some() {
            let mut elem = BytesStart::new("w:rFonts");
            if let Some(font) = &self.font_ascii {
                elem.push_attribute(("w:ascii", font.as_str()));
            }
            if let Some(theme) = &self.font_ascii_theme {
                elem.push_attribute(("w:asciiTheme", theme.as_str()));
            }
            writer.write_event(Event::Empty(elem))?;
        }
        if let Some(bold) = self.bold {
            write_toggle(writer, "w:b", bold)?;
        }
        if let Some(italic) = self.italic {
            write_toggle(writer, "w:i", italic)?;
        }
        if let Some(strike) = self.strike {
            write_toggle(writer, "w:strike", strike)?;
        }
        if let Some(underline) = &self.underline {
            write_val(writer, "w:u", underline)?;
        }
        if let Some(color) = &self.color {
            write_val(writer, "w:color", color)?;
        }
        if let Some(size) = self.size {
            write_val(writer, "w:sz", &size.to_string())?;
        }
        if let Some(highlight) = &self.highlight {
            write_val(writer, "w:highlight", highlight)?;
        }
        if let Some(valign) = &self.vertical_align {
            write_val(writer, "w:vertAlign", valign)?;
        }
        for child in &self.unknown_children {
            child.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
        Ok(())
    }
}

/// Write an empty element carrying a w:val attribute
pub(crate) fn write_val<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    val: &str,
) -> Result<()> {
    let mut elem = BytesStart::new(name);
    elem.push_attribute(("w:val", val));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Write an OOXML boolean toggle element
fn write_toggle<W: std::io::Write>(writer: &mut Writer<W>, name: &str, on: bool) -> Result<()> {
    let mut elem = BytesStart::new(name);
    if !on {
        elem.push_attribute(("w:val", "0"));
    }
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Read the text content of a w:t element
fn read_text<R: BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::End(e) => {
                if e.name().local_name().as_ref() == b"t" {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_run(xml: &str) -> Run {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) if e.name().local_name().as_ref() == b"r" => {
                    let e = e.to_owned();
                    return Run::from_reader(&mut reader, &e).unwrap();
                }
                Event::Eof => panic!("no run"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_parse_formatted_run() {
        let run = parse_run(
            r#"<w:r><w:rPr><w:b/><w:i/><w:sz w:val="28"/><w:color w:val="FF0000"/></w:rPr><w:t>Formatted</w:t></w:r>"#,
        );
        let props = run.properties.as_ref().unwrap();
        assert_eq!(props.bold, Some(true));
        assert_eq!(props.italic, Some(true));
        assert_eq!(props.size, Some(28));
        assert_eq!(props.color.as_deref(), Some("FF0000"));
        assert_eq!(run.text(), "Formatted");
    }

    #[test]
    fn test_parse_theme_font_reference() {
        let run = parse_run(
            r#"<w:r><w:rPr><w:rFonts w:asciiTheme="majorHAnsi"/></w:rPr><w:t>x</w:t></w:r>"#,
        );
        let props = run.properties.as_ref().unwrap();
        assert_eq!(props.font_ascii_theme.as_deref(), Some("majorHAnsi"));
        assert_eq!(props.font_ascii, None);
    }

    #[test]
    fn test_tab_and_break_extraction() {
        let run = parse_run(r#"<w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r>"#);
        assert_eq!(run.text(), "a\tb\nc");
    }

    #[test]
    fn test_drawing_recognized() {
        let run = parse_run(
            r#"<w:r><w:drawing><wp:inline><a:blip r:embed="rId4"/></wp:inline></w:drawing></w:r>"#,
        );
        let drawing = run.drawing().expect("drawing");
        assert_eq!(
            drawing.find_descendant("blip").unwrap().attr_local("embed"),
            Some("rId4")
        );
    }

    #[test]
    fn test_properties_compare_including_raw_children() {
        let xml = r#"<w:r><w:rPr><w:b/><w:shadow/></w:rPr><w:t>x</w:t></w:r>"#;
        let a = parse_run(xml);
        let b = parse_run(xml);
        assert_eq!(a.properties, b.properties);
        assert!(!a.properties.as_ref().unwrap().unknown_children.is_empty());
    }

    #[test]
    fn test_write_preserves_space_attr() {
        let run = Run::new(" leading space");
        let mut buf = Vec::new();
        run.write_to(&mut Writer::new(&mut buf)).unwrap();
        let xml = String::from_utf8(buf).unwrap();
        assert!(xml.contains(r#"xml:space="preserve""#));
    }
}
