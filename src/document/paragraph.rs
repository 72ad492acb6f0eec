//! Paragraph element (w:p)

use crate::document::run::{write_val, Run, RunProperties};
use crate::error::Result;
use crate::xml::{collect_attrs, get_w_val, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Paragraph element (w:p)
#[derive(Clone, Debug, Default)]
pub struct Paragraph {
    /// Paragraph properties (w:pPr)
    pub properties: Option<ParagraphProperties>,
    /// Paragraph content
    pub content: Vec<ParagraphContent>,
    /// Unknown attributes (preserved for round-trip)
    pub unknown_attrs: Vec<(String, String)>,
}

/// Content within a paragraph
#[derive(Clone, Debug)]
pub enum ParagraphContent {
    /// Run (w:r)
    Run(Run),
    /// Hyperlink (w:hyperlink)
    Hyperlink(Hyperlink),
    /// Unknown (preserved)
    Unknown(RawXmlNode),
}

/// Hyperlink element (w:hyperlink)
#[derive(Clone, Debug, Default)]
pub struct Hyperlink {
    /// Relationship ID for external targets (r:id)
    pub rel_id: Option<String>,
    /// Internal bookmark anchor (w:anchor)
    pub anchor: Option<String>,
    /// Runs within the hyperlink
    pub runs: Vec<Run>,
    /// Unknown attributes (preserved)
    pub unknown_attrs: Vec<(String, String)>,
}

/// Paragraph properties (w:pPr)
#[derive(Clone, Debug, Default)]
pub struct ParagraphProperties {
    /// Paragraph style ID (w:pStyle)
    pub style: Option<String>,
    /// Justification: left/center/right/both (w:jc)
    pub justification: Option<String>,
    /// Outline level, 0-8 (w:outlineLvl)
    pub outline_level: Option<u8>,
    /// Numbering instance ID (w:numPr > w:numId)
    pub num_id: Option<u32>,
    /// Numbering indent level (w:numPr > w:ilvl)
    pub num_level: Option<u8>,
    /// Run properties for the paragraph mark (w:pPr > w:rPr); participates
    /// in the formatting cascade below the named style
    pub run_properties: Option<RunProperties>,
    /// Unknown children (preserved)
    pub unknown_children: Vec<RawXmlNode>,
}

impl Paragraph {
    /// Create a new paragraph with a single text run
    pub fn new(text: impl Into<String>) -> Self {
        Paragraph {
            content: vec![ParagraphContent::Run(Run::new(text))],
            ..Default::default()
        }
    }

    /// Create an empty paragraph
    pub fn empty() -> Self {
        Paragraph::default()
    }

    /// Parse from reader (after the w:p start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut paragraph = Paragraph {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        };

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"pPr" => {
                            paragraph.properties =
                                Some(ParagraphProperties::from_reader(reader)?);
                        }
                        b"r" => {
                            let e = e.to_owned();
                            paragraph
                                .content
                                .push(ParagraphContent::Run(Run::from_reader(reader, &e)?));
                        }
                        b"hyperlink" => {
                            let e = e.to_owned();
                            paragraph.content.push(ParagraphContent::Hyperlink(
                                Hyperlink::from_reader(reader, &e)?,
                            ));
                        }
                        _ => {
                            let raw = RawXmlElement::from_reader(reader, &e)?;
                            paragraph
                                .content
                                .push(ParagraphContent::Unknown(RawXmlNode::Element(raw)));
                        }
                    }
                }
                Event::Empty(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"r" => paragraph
                            .content
                            .push(ParagraphContent::Run(Run::from_empty(&e))),
                        _ => paragraph.content.push(ParagraphContent::Unknown(
                            RawXmlNode::Element(RawXmlElement::from_empty(&e)),
                        )),
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"p" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(paragraph)
    }

    /// All text in this paragraph, including hyperlink text
    pub fn text(&self) -> String {
        let mut result = String::new();
        for content in &self.content {
            match content {
                ParagraphContent::Run(run) => result.push_str(&run.text()),
                ParagraphContent::Hyperlink(link) => {
                    for run in &link.runs {
                        result.push_str(&run.text());
                    }
                }
                ParagraphContent::Unknown(_) => {}
            }
        }
        result
    }

    /// Runs in document order (does not descend into hyperlinks)
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|c| match c {
            ParagraphContent::Run(run) => Some(run),
            _ => None,
        })
    }

    /// Mutable runs in document order (does not descend into hyperlinks)
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.content.iter_mut().filter_map(|c| match c {
            ParagraphContent::Run(run) => Some(run),
            _ => None,
        })
    }

    /// Style ID, if the paragraph names one
    pub fn style(&self) -> Option<&str> {
        self.properties.as_ref()?.style.as_deref()
    }

    /// Set the paragraph style ID
    pub fn set_style(&mut self, style_id: impl Into<String>) {
        self.properties.get_or_insert_with(Default::default).style = Some(style_id.into());
    }

    /// Replace all content with a single run carrying `text`.
    ///
    /// The first existing run's explicit properties are kept so the visible
    /// formatting survives the rewrite. Hyperlinks and preserved nodes are
    /// dropped.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let kept = self.runs().next().and_then(|r| r.properties.clone());
        let mut run = Run::new(text);
        run.properties = kept;
        self.content = vec![ParagraphContent::Run(run)];
    }

    /// Whether the paragraph carries an inline drawing in any run
    pub fn has_drawing(&self) -> bool {
        self.runs().any(|r| r.drawing().is_some())
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:p");
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
            match content {
                ParagraphContent::Run(run) => run.write_to(writer)?,
                ParagraphContent::Hyperlink(link) => link.write_to(writer)?,
                ParagraphContent::Unknown(node) => node.write_to(writer)?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new("w:p")))?;
        Ok(())
    }
}

impl Hyperlink {
    /// Parse from reader (after the w:hyperlink start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut link = Hyperlink::default();
        for (key, value) in collect_attrs(start) {
            match key.as_str() {
                "r:id" => link.rel_id = Some(value),
                "w:anchor" => link.anchor = Some(value),
                _ => link.unknown_attrs.push((key, value)),
            }
        }

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.name().local_name().as_ref() == b"r" => {
                    let e = e.to_owned();
                    link.runs.push(Run::from_reader(reader, &e)?);
                }
                Event::Start(e) => {
                    // skip unexpected nested content
                    RawXmlElement::from_reader(reader, &e)?;
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"hyperlink" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(link)
    }

    /// Text of all runs in the hyperlink
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text()).collect()
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:hyperlink");
        if let Some(id) = &self.rel_id {
            start.push_attribute(("r:id", id.as_str()));
        }
        if let Some(anchor) = &self.anchor {
            start.push_attribute(("w:anchor", anchor.as_str()));
        }
        for (key, value) in &self.unknown_attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;
        for run in &self.runs {
            run.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:hyperlink")))?;
        Ok(())
    }
}

impl ParagraphProperties {
    /// Parse from reader (after the w:pPr start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut props = ParagraphProperties::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"numPr" => props.read_num_pr(reader)?,
                        b"rPr" => {
                            props.run_properties = Some(RunProperties::from_reader(reader)?);
                        }
                        _ => {
                            let raw = RawXmlElement::from_reader(reader, &e)?;
                            props.unknown_children.push(RawXmlNode::Element(raw));
                        }
                    }
                }
                Event::Empty(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"pStyle" => props.style = get_w_val(&e),
                        b"jc" => props.justification = get_w_val(&e),
                        b"outlineLvl" => {
                            props.outline_level = get_w_val(&e).and_then(|v| v.parse().ok())
                        }
                        _ => props.unknown_children.push(RawXmlNode::Element(
                            RawXmlElement::from_empty(&e),
                        )),
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"pPr" {
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

    fn read_num_pr<R: BufRead>(&mut self, reader: &mut Reader<R>) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"ilvl" => self.num_level = get_w_val(&e).and_then(|v| v.parse().ok()),
                        b"numId" => self.num_id = get_w_val(&e).and_then(|v| v.parse().ok()),
                        _ => {}
                    }
                }
                Event::Start(e) => {
                    RawXmlElement::from_reader(reader, &e)?;
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"numPr" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;

        if let Some(style) = &self.style {
            write_val(writer, "w:pStyle", style)?;
        }
        if self.num_id.is_some() || self.num_level.is_some() {
            writer.write_event(Event::Start(BytesStart::new("w:numPr")))?;
            if let Some(level) = self.num_level {
                write_val(writer, "w:ilvl", &level.to_string())?;
            }
            if let Some(id) = self.num_id {
                write_val(writer, "w:numId", &id.to_string())?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:numPr")))?;
        }
        if let Some(jc) = &self.justification {
            write_val(writer, "w:jc", jc)?;
        }
        if let Some(level) = self.outline_level {
            write_val(writer, "w:outlineLvl", &level.to_string())?;
        }
        for child in &self.unknown_children {
            child.write_to(writer)?;
        }
        if let Some(rpr) = &self.run_properties {
            rpr.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_paragraph(xml: &str) -> Paragraph {
        // match the production parse path: text is not trimmed
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) if e.name().local_name().as_ref() == b"p" => {
                    let e = e.to_owned();
                    return Paragraph::from_reader(&mut reader, &e).unwrap();
                }
                Event::Eof => panic!("no paragraph"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_parse_styled_paragraph() {
        let p = parse_paragraph(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>"#,
        );
        assert_eq!(p.style(), Some("Heading1"));
        assert_eq!(
            p.properties.as_ref().unwrap().justification.as_deref(),
            Some("center")
        );
        assert_eq!(p.text(), "Title");
    }

    #[test]
    fn test_parse_numbering_reference() {
        let p = parse_paragraph(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr></w:pPr><w:r><w:t>item</w:t></w:r></w:p>"#,
        );
        let props = p.properties.as_ref().unwrap();
        assert_eq!(props.num_id, Some(3));
        assert_eq!(props.num_level, Some(1));
    }

    #[test]
    fn test_parse_paragraph_mark_run_properties() {
        let p = parse_paragraph(
            r#"<w:p><w:pPr><w:rPr><w:b/><w:color w:val="00FF00"/></w:rPr></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#,
        );
        let rpr = p.properties.as_ref().unwrap().run_properties.as_ref().unwrap();
        assert_eq!(rpr.bold, Some(true));
        assert_eq!(rpr.color.as_deref(), Some("00FF00"));
    }

    #[test]
    fn test_hyperlink_text_included() {
        let p = parse_paragraph(
            r#"<w:p><w:r><w:t>see </w:t></w:r><w:hyperlink r:id="rId5"><w:r><w:t>here</w:t></w:r></w:hyperlink></w:p>"#,
        );
        assert_eq!(p.text(), "see here");
        match &p.content[1] {
            ParagraphContent::Hyperlink(link) => {
                assert_eq!(link.rel_id.as_deref(), Some("rId5"));
            }
            other => panic!("expected hyperlink, got {other:?}"),
        }
    }

    #[test]
    fn test_set_text_keeps_first_run_formatting() {
        let mut p = parse_paragraph(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>old</w:t></w:r><w:r><w:t> tail</w:t></w:r></w:p>"#,
        );
        p.set_text("new");
        assert_eq!(p.text(), "new");
        assert_eq!(p.runs().count(), 1);
        assert_eq!(
            p.runs().next().unwrap().properties.as_ref().unwrap().bold,
            Some(true)
        );
    }
}
