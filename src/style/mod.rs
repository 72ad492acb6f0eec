//! Style cascade resolution
//!
//! Effective run formatting in WordprocessingML is layered: document
//! defaults, then the paragraph's named style, then the paragraph-mark
//! run properties, then the run's character style, then the run's own
//! override. Later layers win field by field. Theme font references are
//! resolved to concrete typefaces before merging so a later concrete
//! font can still override an earlier theme one.

use crate::document::{
    Document, Numbering, Paragraph, Run, RunProperties, StyleDef, Styles, ThemeFonts,
};
use crate::error::Result;

/// Everything needed to resolve formatting: styles, numbering, theme
pub struct StyleContext {
    styles: Styles,
    numbering: Numbering,
    theme: ThemeFonts,
}

/// Fully resolved run formatting after the cascade
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedRunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// Half-points
    pub size: Option<u32>,
    /// RGB hex, "auto" filtered out
    pub color: Option<String>,
    pub highlight: Option<String>,
    /// Concrete typeface after theme resolution
    pub font: Option<String>,
    /// "superscript" or "subscript"
    pub vertical_align: Option<String>,
}

/// Structural role of a paragraph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParagraphRole {
    /// Heading with level 1..=9
    Heading(u8),
    /// Ordinary body text
    Body,
}

/// How a paragraph participates in a list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListBinding {
    /// Numbering instance the paragraph belongs to
    pub num_id: u32,
    /// Numbered (true) vs bulleted (false)
    pub ordered: bool,
    /// Indent level, 0-based
    pub level: u8,
}

impl StyleContext {
    /// Build from a document's satellite parts
    pub fn from_document(doc: &Document) -> Result<Self> {
        Ok(StyleContext {
            styles: doc.styles()?,
            numbering: doc.numbering()?,
            theme: doc.theme_fonts()?,
        })
    }

    /// Build from already-parsed parts
    pub fn new(styles: Styles, numbering: Numbering, theme: ThemeFonts) -> Self {
        StyleContext { styles, numbering, theme }
    }

    /// The style a paragraph resolves to: its named style, else Normal
    fn paragraph_style(&self, paragraph: &Paragraph) -> Option<&StyleDef> {
        match paragraph.style() {
            Some(id) => self.styles.get(id),
            None => self.styles.normal(),
        }
    }

    /// The document's ambient formatting: defaults plus the Normal style.
    /// Everything a reader perceives as "plain text" resolves to this.
    pub fn ambient_baseline(&self) -> ResolvedRunStyle {
        self.resolve_run(&Paragraph::empty(), &Run::default())
    }

    /// Resolve the effective formatting of a run within its paragraph
    pub fn resolve_run(&self, paragraph: &Paragraph, run: &Run) -> ResolvedRunStyle {
        let mut resolved = ResolvedRunStyle::default();

        if let Some(defaults) = &self.styles.doc_defaults {
            self.merge(&mut resolved, defaults);
        }
        if let Some(style) = self.paragraph_style(paragraph) {
            if let Some(run_props) = &style.run {
                self.merge(&mut resolved, run_props);
            }
        }
        if let Some(mark) = paragraph
            .properties
            .as_ref()
            .and_then(|p| p.run_properties.as_ref())
        {
            self.merge(&mut resolved, mark);
        }
        if let Some(props) = &run.properties {
            if let Some(char_style) = props.style.as_deref().and_then(|id| self.styles.get(id)) {
                if let Some(run_props) = &char_style.run {
                    self.merge(&mut resolved, run_props);
                }
            }
            self.merge(&mut resolved, props);
        }

        resolved
    }

    fn merge(&self, resolved: &mut ResolvedRunStyle, layer: &RunProperties) {
        if let Some(b) = layer.bold {
            resolved.bold = b;
        }
        if let Some(i) = layer.italic {
            resolved.italic = i;
        }
        if let Some(u) = &layer.underline {
            resolved.underline = u != "none";
        }
        if let Some(s) = layer.strike {
            resolved.strike = s;
        }
        if let Some(sz) = layer.size {
            resolved.size = Some(sz);
        }
        if let Some(c) = &layer.color {
            if c.eq_ignore_ascii_case("auto") {
                resolved.color = None;
            } else {
                resolved.color = Some(c.clone());
            }
        }
        if let Some(h) = &layer.highlight {
            resolved.highlight = Some(h.clone());
        }
        // a concrete font wins over a theme slot within the same layer
        if let Some(slot) = &layer.font_ascii_theme {
            if let Some(face) = self.theme.resolve(slot) {
                resolved.font = Some(face.to_string());
            }
        }
        if let Some(f) = &layer.font_ascii {
            resolved.font = Some(f.clone());
        }
        if let Some(v) = &layer.vertical_align {
            if v == "baseline" {
                resolved.vertical_align = None;
            } else {
                resolved.vertical_align = Some(v.clone());
            }
        }
    }

    /// Paragraph role: heading when an outline level is set directly or by
    /// the named style. Outline level 0 is heading 1.
    pub fn paragraph_role(&self, paragraph: &Paragraph) -> ParagraphRole {
        let direct = paragraph
            .properties
            .as_ref()
            .and_then(|p| p.outline_level);
        let styled = self
            .paragraph_style(paragraph)
            .and_then(|s| s.outline_level);
        match direct.or(styled) {
            Some(level) if level < 9 => ParagraphRole::Heading(level + 1),
            _ => ParagraphRole::Body,
        }
    }

    /// Effective alignment: the paragraph's own jc, else the style's
    pub fn alignment(&self, paragraph: &Paragraph) -> Option<String> {
        paragraph
            .properties
            .as_ref()
            .and_then(|p| p.justification.clone())
            .or_else(|| {
                self.paragraph_style(paragraph)
                    .and_then(|s| s.justification.clone())
            })
    }

    /// List binding for a paragraph, or None when it is not a list item.
    ///
    /// numId 0 explicitly opts the paragraph out of its list. A numId that
    /// cannot be resolved through the numbering part is treated as an
    /// unordered item so the content still projects as a list.
    pub fn list_binding(&self, paragraph: &Paragraph) -> Option<ListBinding> {
        let props = paragraph.properties.as_ref()?;
        let num_id = props.num_id?;
        if num_id == 0 {
            return None;
        }
        let level = props.num_level.unwrap_or(0);
        let ordered = match self.numbering.format(num_id, level) {
            Some(fmt) => !fmt.is_unordered(),
            None => false,
        };
        Some(ListBinding { num_id, ordered, level })
    }
}
