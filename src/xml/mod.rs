//! XML utilities and raw element preservation for round-trip support

pub mod namespace;
mod raw;

pub use raw::{RawXmlElement, RawXmlNode};

pub(crate) use raw::collect_attrs;

use quick_xml::events::BytesStart;

/// Helper to get an attribute value from a start tag by exact name
pub fn get_attr(element: &BytesStart, name: &str) -> Option<String> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Helper to get the w:val attribute (common in OOXML)
pub fn get_w_val(element: &BytesStart) -> Option<String> {
    get_attr(element, "w:val").or_else(|| get_attr(element, "val"))
}

/// Parse an OOXML boolean toggle ("1", "true", "on", or no val at all)
pub fn parse_bool(element: &BytesStart) -> bool {
    match get_w_val(element) {
        None => true, // bare <w:b/> means true
        Some(v) => matches!(v.as_str(), "1" | "true" | "on"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn first_start(xml: &str) -> BytesStart<'static> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) | Event::Empty(e) => return e.to_owned(),
                Event::Eof => panic!("no element"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_get_w_val() {
        let e = first_start(r#"<w:pStyle w:val="Heading1"/>"#);
        assert_eq!(get_w_val(&e), Some("Heading1".to_string()));
    }

    #[test]
    fn test_parse_bool_variants() {
        assert!(parse_bool(&first_start(r#"<w:b/>"#)));
        assert!(parse_bool(&first_start(r#"<w:b w:val="true"/>"#)));
        assert!(!parse_bool(&first_start(r#"<w:b w:val="0"/>"#)));
        assert!(!parse_bool(&first_start(r#"<w:b w:val="false"/>"#)));
    }

    #[test]
    fn test_namespace_constants() {
        assert!(namespace::W.contains("wordprocessingml"));
        assert!(namespace::R.contains("relationships"));
    }
}
