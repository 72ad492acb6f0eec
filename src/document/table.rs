//! Table element (w:tbl) with rows and cells

use crate::document::paragraph::Paragraph;
use crate::error::Result;
use crate::xml::{collect_attrs, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Table element (w:tbl)
#[derive(Clone, Debug, Default)]
pub struct Table {
    /// Table properties (w:tblPr), kept raw
    pub properties: Option<RawXmlElement>,
    /// Grid column widths in twips (w:tblGrid > w:gridCol)
    pub grid: Vec<Option<u32>>,
    /// Rows
    pub rows: Vec<TableRow>,
    /// Unknown attributes (preserved for round-trip)
    pub unknown_attrs: Vec<(String, String)>,
}

/// Table row (w:tr)
#[derive(Clone, Debug, Default)]
pub struct TableRow {
    /// Row properties (w:trPr), kept raw
    pub properties: Option<RawXmlElement>,
    /// Cells
    pub cells: Vec<TableCell>,
    /// Unknown attributes (preserved)
    pub unknown_attrs: Vec<(String, String)>,
}

/// Table cell (w:tc)
#[derive(Clone, Debug, Default)]
pub struct TableCell {
    /// Cell properties (w:tcPr), kept raw
    pub properties: Option<RawXmlElement>,
    /// Paragraphs in the cell
    pub paragraphs: Vec<Paragraph>,
    /// Unknown children other than paragraphs (preserved)
    pub unknown_children: Vec<RawXmlNode>,
    /// Unknown attributes (preserved)
    pub unknown_attrs: Vec<(String, String)>,
}

impl Table {
    /// Build a table from header labels and body rows.
    ///
    /// Column count is taken from the header. Each body row is padded or
    /// truncated to that width. `col_widths` (twips) and `style` are
    /// optional.
    pub fn from_rows(
        headers: &[String],
        body: &[Vec<String>],
        col_widths: Option<&[u32]>,
        style: Option<&str>,
    ) -> Self {
        let cols = headers.len();
        let mut table = Table::default();

        if let Some(style_id) = style {
            table.properties = Some(
                RawXmlElement::new("w:tblPr").with_child(
                    RawXmlElement::new("w:tblStyle")
                        .with_attr("w:val", style_id)
                        .empty(),
                ),
            );
        }

        table.grid = (0..cols)
            .map(|i| col_widths.and_then(|w| w.get(i).copied()))
            .collect();

        let mut header_row = TableRow::default();
        for text in headers {
            header_row.cells.push(TableCell::with_text(text.clone()));
        }
        table.rows.push(header_row);

        for source in body {
            let mut row = TableRow::default();
            for i in 0..cols {
                let text = source.get(i).cloned().unwrap_or_default();
                row.cells.push(TableCell::with_text(text));
            }
            table.rows.push(row);
        }

        table
    }

    /// Parse from reader (after the w:tbl start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut table = Table {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        };

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"tblPr" => {
                            table.properties = Some(RawXmlElement::from_reader(reader, &e)?);
                        }
                        b"tblGrid" => table.read_grid(reader)?,
                        b"tr" => {
                            let e = e.to_owned();
                            table.rows.push(TableRow::from_reader(reader, &e)?);
                        }
                        _ => {
                            RawXmlElement::from_reader(reader, &e)?;
                        }
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"tbl" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(table)
    }

    fn read_grid<R: BufRead>(&mut self, reader: &mut Reader<R>) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) if e.name().local_name().as_ref() == b"gridCol" => {
                    let width = crate::xml::get_attr(&e, "w:w")
                        .or_else(|| crate::xml::get_attr(&e, "w"))
                        .and_then(|v| v.parse().ok());
                    self.grid.push(width);
                }
                Event::Start(e) => {
                    RawXmlElement::from_reader(reader, &e)?;
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"tblGrid" {
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

    /// Cell at (row, col), if present
    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row)?.cells.get(col)
    }

    /// Mutable cell at (row, col), if present
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row)?.cells.get_mut(col)
    }

    /// Number of columns, taken from the widest row
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:tbl");
        for (key, value) in &self.unknown_attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }
        if !self.grid.is_empty() {
            writer.write_event(Event::Start(BytesStart::new("w:tblGrid")))?;
            for width in &self.grid {
                let mut col = BytesStart::new("w:gridCol");
                if let Some(w) = width {
                    col.push_attribute(("w:w", w.to_string().as_str()));
                }
                writer.write_event(Event::Empty(col))?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:tblGrid")))?;
        }
        for row in &self.rows {
            row.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:tbl")))?;
        Ok(())
    }
}

impl TableRow {
    /// Parse from reader (after the w:tr start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut row = TableRow {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        };

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"trPr" => {
                            row.properties = Some(RawXmlElement::from_reader(reader, &e)?);
                        }
                        b"tc" => {
                            let e = e.to_owned();
                            row.cells.push(TableCell::from_reader(reader, &e)?);
                        }
                        _ => {
                            RawXmlElement::from_reader(reader, &e)?;
                        }
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"tr" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(row)
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:tr");
        for (key, value) in &self.unknown_attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;
        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }
        for cell in &self.cells {
            cell.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tr")))?;
        Ok(())
    }
}

impl TableCell {
    /// Create a cell with a single paragraph
    pub fn with_text(text: impl Into<String>) -> Self {
        TableCell {
            paragraphs: vec![Paragraph::new(text)],
            ..Default::default()
        }
    }

    /// Parse from reader (after the w:tc start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut cell = TableCell {
            unknown_attrs: collect_attrs(start),
            ..Default::default()
        };

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"tcPr" => {
                            cell.properties = Some(RawXmlElement::from_reader(reader, &e)?);
                        }
                        b"p" => {
                            let e = e.to_owned();
                            cell.paragraphs.push(Paragraph::from_reader(reader, &e)?);
                        }
                        _ => {
                            let raw = RawXmlElement::from_reader(reader, &e)?;
                            cell.unknown_children.push(RawXmlNode::Element(raw));
                        }
                    }
                }
                Event::Empty(e) => {
                    if e.name().local_name().as_ref() == b"p" {
                        cell.paragraphs.push(Paragraph::empty());
                    } else {
                        cell.unknown_children.push(RawXmlNode::Element(
                            RawXmlElement::from_empty(&e),
                        ));
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"tc" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(cell)
    }

    /// All text in the cell, paragraphs joined with newlines
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace cell content with a single paragraph of `text`, keeping the
    /// first paragraph's style and run formatting
    pub fn set_text(&mut self, text: impl Into<String>) {
        if let Some(first) = self.paragraphs.first_mut() {
            first.set_text(text);
            self.paragraphs.truncate(1);
        } else {
            self.paragraphs.push(Paragraph::new(text));
        }
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:tc");
        for (key, value) in &self.unknown_attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;
        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }
        for child in &self.unknown_children {
            child.write_to(writer)?;
        }
        // a cell must end with a paragraph; an empty cell still gets one
        if self.paragraphs.is_empty() {
            Paragraph::empty().write_to(writer)?;
        }
        for paragraph in &self.paragraphs {
            paragraph.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tc")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_table(xml: &str) -> Table {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) if e.name().local_name().as_ref() == b"tbl" => {
                    let e = e.to_owned();
                    return Table::from_reader(&mut reader, &e).unwrap();
                }
                Event::Eof => panic!("no table"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_parse_two_by_two() {
        let table = parse_table(
            r#"<w:tbl><w:tblGrid><w:gridCol w:w="2400"/><w:gridCol w:w="2400"/></w:tblGrid>
               <w:tr><w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr>
               <w:tr><w:tc><w:p><w:r><w:t>C</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>D</w:t></w:r></w:p></w:tc></w:tr>
               </w:tbl>"#,
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.grid, vec![Some(2400), Some(2400)]);
        assert_eq!(table.cell(1, 0).unwrap().text(), "C");
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let table = Table::from_rows(
            &["H1".into(), "H2".into(), "H3".into()],
            &[vec!["a".into()]],
            None,
            Some("TableGrid"),
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].cells.len(), 3);
        assert_eq!(table.cell(1, 1).unwrap().text(), "");
        let props = table.properties.as_ref().unwrap();
        assert_eq!(
            props.find_descendant("tblStyle").unwrap().attr_local("val"),
            Some("TableGrid")
        );
    }

    #[test]
    fn test_set_cell_text_keeps_style() {
        let mut table = parse_table(
            r#"<w:tbl><w:tr><w:tc><w:p><w:pPr><w:pStyle w:val="CellHead"/></w:pPr><w:r><w:t>old</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        table.cell_mut(0, 0).unwrap().set_text("new");
        let cell = table.cell(0, 0).unwrap();
        assert_eq!(cell.text(), "new");
        assert_eq!(cell.paragraphs[0].style(), Some("CellHead"));
    }

    #[test]
    fn test_empty_cell_serializes_with_paragraph() {
        let cell = TableCell::default();
        let mut buf = Vec::new();
        cell.write_to(&mut Writer::new(&mut buf)).unwrap();
        let xml = String::from_utf8(buf).unwrap();
        assert!(xml.contains("<w:p/>"));
    }
}
