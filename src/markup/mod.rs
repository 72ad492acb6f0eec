//! Projection of a document into styled markup
//!
//! The output is markdown with explicit HTML list containers so nesting
//! and ordered/unordered switches stay observable. Inline formatting is
//! emitted where a run differs from the document's ambient look, so a
//! paragraph whose named style carries color or italics keeps it in the
//! projection; headings diff against their own style instead, so bold
//! coming from the heading style is not re-marked under the # prefix.

use crate::document::{
    BlockNode, Document, Hyperlink, Paragraph, ParagraphContent, Run, Table,
};
use crate::error::Result;
use crate::opc::{rel_types, TargetMode};
use crate::style::{ParagraphRole, ResolvedRunStyle, StyleContext};

/// Project the whole document body into markup
pub fn project(doc: &Document, ctx: &StyleContext) -> Result<String> {
    let mut out = String::new();
    let mut lists = ListStack::default();
    let links = LinkResolver::new(doc);

    for node in &doc.body.content {
        match node {
            BlockNode::Paragraph(p) => project_paragraph(p, ctx, &links, &mut lists, &mut out),
            BlockNode::Table(t) => {
                lists.close_all(&mut out);
                project_table(t, &mut out);
            }
            BlockNode::Unknown(_) => {}
        }
    }
    lists.close_all(&mut out);

    Ok(out)
}

/// Tracks open list containers, one entry per nesting level
#[derive(Default)]
struct ListStack {
    open: Vec<ListLevel>,
    /// Numbering instance the open containers belong to
    num_id: Option<u32>,
}

/// One open container. Its last `<li>` stays open until the next sibling
/// item or the container close, so a deeper container nests inside it.
struct ListLevel {
    ordered: bool,
    item_open: bool,
}

impl ListStack {
    /// Bring the stack to `depth` levels with the given ordering at the
    /// innermost level, closing and reopening containers as needed. A
    /// change of numbering instance closes everything first.
    fn adjust(&mut self, num_id: u32, depth: usize, ordered: bool, out: &mut String) {
        if self.num_id.is_some() && self.num_id != Some(num_id) {
            self.close_all(out);
        }
        self.num_id = Some(num_id);
        while self.open.len() > depth {
            self.pop(out);
        }
        // same depth but the marker kind changed: replace the container
        if self.open.len() == depth && depth > 0 && self.open[depth - 1].ordered != ordered {
            self.pop(out);
        }
        while self.open.len() < depth {
            let kind = if self.open.len() + 1 == depth { ordered } else { false };
            if self.open.last().is_some_and(|l| l.item_open) {
                out.push('\n');
            }
            out.push_str(if kind { "<ol>\n" } else { "<ul>\n" });
            self.open.push(ListLevel { ordered: kind, item_open: false });
        }
    }

    /// Emit an item at the current depth
    fn item(&mut self, text: &str, out: &mut String) {
        if let Some(level) = self.open.last_mut() {
            if level.item_open {
                out.push_str("</li>\n");
            }
            out.push_str("<li>");
            out.push_str(text);
            level.item_open = true;
        }
    }

    fn pop(&mut self, out: &mut String) {
        if let Some(level) = self.open.pop() {
            if level.item_open {
                out.push_str("</li>\n");
            }
            out.push_str(if level.ordered { "</ol>\n" } else { "</ul>\n" });
        }
    }

    fn close_all(&mut self, out: &mut String) {
        while !self.open.is_empty() {
            self.pop(out);
        }
        self.num_id = None;
    }
}

fn project_paragraph(
    p: &Paragraph,
    ctx: &StyleContext,
    links: &LinkResolver<'_>,
    lists: &mut ListStack,
    out: &mut String,
) {
    if let Some(binding) = ctx.list_binding(p) {
        lists.adjust(binding.num_id, binding.level as usize + 1, binding.ordered, out);
        lists.item(&inline_content(p, ctx, links), out);
        return;
    }

    lists.close_all(out);

    let inline = inline_content(p, ctx, links);
    match ctx.paragraph_role(p) {
        ParagraphRole::Heading(level) => {
            if !inline.is_empty() {
                for _ in 0..level {
                    out.push('#');
                }
                out.push(' ');
                out.push_str(&inline);
                out.push_str("\n\n");
            }
        }
        ParagraphRole::Body => {
            if inline.is_empty() {
                return;
            }
            let align = match ctx.alignment(p).as_deref() {
                Some("center") => Some("center"),
                Some("right") => Some("right"),
                Some("both") | Some("distribute") => Some("justify"),
                _ => None,
            };
            match align {
                Some(align) => {
                    out.push_str(&format!("<div align=\"{align}\">{inline}</div>\n\n"));
                }
                None => {
                    out.push_str(&inline);
                    out.push_str("\n\n");
                }
            }
        }
    }
}

fn project_table(table: &Table, out: &mut String) {
    let cols = table.column_count();
    if cols == 0 || table.rows.is_empty() {
        return;
    }

    for (i, row) in table.rows.iter().enumerate() {
        out.push('|');
        for c in 0..cols {
            let text = row
                .cells
                .get(c)
                .map(|cell| cell_text(cell.text().as_str()))
                .unwrap_or_default();
            out.push(' ');
            out.push_str(&text);
            out.push_str(" |");
        }
        out.push('\n');
        if i == 0 {
            out.push('|');
            for _ in 0..cols {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out.push('\n');
}

fn cell_text(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}

/// Resolves relationship IDs on the main document part to link targets
struct LinkResolver<'a> {
    doc: &'a Document,
}

impl<'a> LinkResolver<'a> {
    fn new(doc: &'a Document) -> Self {
        LinkResolver { doc }
    }

    /// External hyperlink URL for a relationship ID
    fn hyperlink_url(&self, rel_id: &str) -> Option<String> {
        let part = self.doc.package().part(self.doc.uri())?;
        let rel = part.relationships()?.get(rel_id)?;
        if rel.rel_type == rel_types::HYPERLINK || rel.target_mode == TargetMode::External {
            Some(rel.target.clone())
        } else {
            None
        }
    }

    /// Image target for an r:embed relationship ID; None when the
    /// relationship or the media part itself is missing
    fn image_target(&self, rel_id: &str) -> Option<String> {
        let part = self.doc.package().part(self.doc.uri())?;
        let rel = part.relationships()?.get(rel_id)?;
        if rel.rel_type != rel_types::IMAGE {
            return None;
        }
        let resolved = self.doc.uri().resolve(&rel.target).ok()?;
        if self.doc.package().contains(&resolved) {
            Some(rel.target.clone())
        } else {
            None
        }
    }
}

fn inline_content(p: &Paragraph, ctx: &StyleContext, links: &LinkResolver<'_>) -> String {
    // headings diff against their own paragraph baseline so the style's
    // boldness is not re-marked under the # prefix; everything else diffs
    // against the document ambient so named-style formatting still shows
    let baseline = match ctx.paragraph_role(p) {
        ParagraphRole::Heading(_) => ctx.resolve_run(p, &Run::default()),
        ParagraphRole::Body => ctx.ambient_baseline(),
    };
    let mut out = String::new();

    for content in &p.content {
        match content {
            ParagraphContent::Run(run) => {
                out.push_str(&inline_run(run, p, ctx, links, &baseline));
            }
            ParagraphContent::Hyperlink(link) => {
                out.push_str(&inline_hyperlink(link, links));
            }
            ParagraphContent::Unknown(_) => {}
        }
    }

    out.trim().to_string()
}

fn inline_hyperlink(link: &Hyperlink, links: &LinkResolver<'_>) -> String {
    let text = link.text();
    if let Some(rel_id) = &link.rel_id {
        if let Some(url) = links.hyperlink_url(rel_id) {
            return format!("[{text}]({url})");
        }
    }
    if let Some(anchor) = &link.anchor {
        return format!("[{text}](#{anchor})");
    }
    // dangling relationship: degrade to plain text
    text
}

fn inline_run(
    run: &Run,
    p: &Paragraph,
    ctx: &StyleContext,
    links: &LinkResolver<'_>,
    baseline: &ResolvedRunStyle,
) -> String {
    if let Some(drawing) = run.drawing() {
        let target = drawing
            .find_descendant("blip")
            .and_then(|blip| blip.attr_local("embed"))
            .and_then(|rel_id| links.image_target(rel_id));
        return match target {
            Some(target) => format!("![image]({target})"),
            None => String::new(),
        };
    }

    let text = run.text();
    if text.is_empty() {
        return text;
    }

    let style = ctx.resolve_run(p, run);
    let mut wrapped = text;

    // innermost to outermost: span, underline, strike, italic, bold,
    // vertical alignment
    let mut css = Vec::new();
    if style.color != baseline.color {
        if let Some(color) = &style.color {
            css.push(format!("color:#{color}"));
        }
    }
    if style.size != baseline.size {
        if let Some(size) = style.size {
            // half-points to points
            css.push(format!("font-size:{}pt", size / 2));
        }
    }
    if style.font != baseline.font {
        if let Some(font) = &style.font {
            css.push(format!("font-family:{font}"));
        }
    }
    if style.highlight != baseline.highlight {
        if let Some(highlight) = &style.highlight {
            css.push(format!("background-color:{highlight}"));
        }
    }
    if !css.is_empty() {
        wrapped = format!("<span style=\"{}\">{wrapped}</span>", css.join(";"));
    }
    if style.underline && !baseline.underline {
        wrapped = format!("<u>{wrapped}</u>");
    }
    if style.strike && !baseline.strike {
        wrapped = format!("~~{wrapped}~~");
    }
    if style.italic && !baseline.italic {
        wrapped = format!("*{wrapped}*");
    }
    if style.bold && !baseline.bold {
        wrapped = format!("**{wrapped}**");
    }
    if style.vertical_align != baseline.vertical_align {
        match style.vertical_align.as_deref() {
            Some("superscript") => wrapped = format!("<sup>{wrapped}</sup>"),
            Some("subscript") => wrapped = format!("<sub>{wrapped}</sub>"),
            _ => {}
        }
    }

    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Numbering, Styles, ThemeFonts};

    fn bare_context() -> StyleContext {
        StyleContext::new(
            Styles::default(),
            Numbering::default(),
            ThemeFonts::default(),
        )
    }

    #[test]
    fn test_list_stack_switches_kind() {
        let mut lists = ListStack::default();
        let mut out = String::new();
        lists.adjust(1, 1, false, &mut out);
        lists.adjust(1, 2, true, &mut out);
        lists.adjust(1, 1, true, &mut out);
        lists.close_all(&mut out);
        assert_eq!(out, "<ul>\n<ol>\n</ol>\n</ul>\n<ol>\n</ol>\n");
    }

    #[test]
    fn test_list_stack_closes_on_new_list_id() {
        let mut lists = ListStack::default();
        let mut out = String::new();
        lists.adjust(1, 2, false, &mut out);
        lists.adjust(7, 1, false, &mut out);
        lists.close_all(&mut out);
        assert_eq!(out, "<ul>\n<ul>\n</ul>\n</ul>\n<ul>\n</ul>\n");
    }

    #[test]
    fn test_nested_container_opens_inside_item() {
        let mut lists = ListStack::default();
        let mut out = String::new();
        lists.adjust(1, 1, false, &mut out);
        lists.item("alpha", &mut out);
        lists.adjust(1, 2, false, &mut out);
        lists.item("nested", &mut out);
        lists.adjust(1, 1, false, &mut out);
        lists.item("beta", &mut out);
        lists.close_all(&mut out);
        assert_eq!(
            out,
            "<ul>\n<li>alpha\n<ul>\n<li>nested</li>\n</ul>\n</li>\n<li>beta</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_cell_text_escapes() {
        assert_eq!(cell_text("a|b\nc"), "a\\|b<br>c");
    }

    #[test]
    fn test_heading_not_double_bolded() {
        // a bold run under a plain baseline is marked; identical baseline
        // formatting is not repeated
        let ctx = bare_context();
        let mut p = Paragraph::new("strong");
        if let ParagraphContent::Run(run) = &mut p.content[0] {
            run.set_bold(true);
        }
        let baseline = ctx.resolve_run(&p, &Run::default());
        assert!(!baseline.bold);
    }
}
