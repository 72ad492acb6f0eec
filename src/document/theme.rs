//! Theme font scheme (word/theme/theme1.xml)
//!
//! Only the major and minor latin typefaces are read; they back the
//! asciiTheme indirection in run fonts.

use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Major and minor latin fonts from a:fontScheme
#[derive(Clone, Debug, Default)]
pub struct ThemeFonts {
    /// a:majorFont > a:latin typeface
    pub major: Option<String>,
    /// a:minorFont > a:latin typeface
    pub minor: Option<String>,
}

impl ThemeFonts {
    /// Parse from the bytes of the theme part
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)?;
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut fonts = ThemeFonts::default();
        let mut buf = Vec::new();
        // which slot an a:latin belongs to depends on the enclosing element
        let mut slot: Option<bool> = None; // true = major

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().local_name().as_ref() {
                    b"majorFont" => slot = Some(true),
                    b"minorFont" => slot = Some(false),
                    _ => {}
                },
                Event::Empty(e) => {
                    if e.name().local_name().as_ref() == b"latin" {
                        let typeface = crate::xml::get_attr(&e, "typeface");
                        match slot {
                            Some(true) => fonts.major = typeface,
                            Some(false) => fonts.minor = typeface,
                            None => {}
                        }
                    }
                }
                Event::End(e) => match e.name().local_name().as_ref() {
                    b"majorFont" | b"minorFont" => slot = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(fonts)
    }

    /// Resolve a theme slot name ("majorHAnsi", "minorHAnsi", ...) to a
    /// concrete typeface
    pub fn resolve(&self, slot: &str) -> Option<&str> {
        if slot.starts_with("major") {
            self.major.as_deref()
        } else if slot.starts_with("minor") {
            self.minor.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THEME: &str = r#"<?xml version="1.0"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <a:themeElements>
    <a:fontScheme name="Office">
      <a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/></a:majorFont>
      <a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/></a:minorFont>
    </a:fontScheme>
  </a:themeElements>
</a:theme>"#;

    #[test]
    fn test_parse_font_scheme() {
        let fonts = ThemeFonts::from_bytes(THEME.as_bytes()).unwrap();
        assert_eq!(fonts.major.as_deref(), Some("Calibri Light"));
        assert_eq!(fonts.minor.as_deref(), Some("Calibri"));
    }

    #[test]
    fn test_resolve_slots() {
        let fonts = ThemeFonts::from_bytes(THEME.as_bytes()).unwrap();
        assert_eq!(fonts.resolve("majorHAnsi"), Some("Calibri Light"));
        assert_eq!(fonts.resolve("minorHAnsi"), Some("Calibri"));
        assert_eq!(fonts.resolve("weird"), None);
    }
}
