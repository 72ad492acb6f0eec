//! End-to-end patch session tests over in-memory packages

use docx_patch::{
    apply_patch, Anchor, Error, OpStatus, OutlineEntry, PatchOp, PatchSession, SkipReason,
};
use pretty_assertions::assert_eq;
use std::io::Write;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Report</w:t></w:r></w:p>
<w:p><w:r><w:t>Status: draft</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Key</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Value</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:p><w:r><w:t>Owner</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>unassigned</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p><w:r><w:t>Closing note</w:t></w:r></w:p>
<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>
</w:body>
</w:document>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/></w:rPr></w:style>
</w:styles>"#;

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:p><w:r><w:t>Company Confidential</w:t></w:r></w:p>
</w:hdr>"#;

fn build_docx(extra_parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    let mut zip = zip::ZipWriter::new(&mut buf);
    let options = zip::write::SimpleFileOptions::default();

    let mut parts: Vec<(&str, &str)> = vec![
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", DOCUMENT),
        ("word/styles.xml", STYLES),
    ];
    parts.extend_from_slice(extra_parts);

    for (name, data) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    buf.into_inner()
}

fn session() -> PatchSession {
    PatchSession::from_bytes(&build_docx(&[])).unwrap()
}

#[test]
fn replace_paragraph_text_by_content() {
    let mut session = session();
    let reports = session
        .apply(&[PatchOp::ReplaceParagraphText {
            from: "Status: draft".into(),
            to: "Status: final".into(),
        }])
        .unwrap();
    assert_eq!(reports[0].status, OpStatus::Applied);
    assert_eq!(reports[0].matched, 1);
    assert_eq!(session.document().body.paragraphs().nth(1).unwrap().text(), "Status: final");
}

#[test]
fn missing_text_skips_with_no_match() {
    let mut session = session();
    let reports = session
        .apply(&[PatchOp::ReplaceParagraphText {
            from: "not present anywhere".into(),
            to: "x".into(),
        }])
        .unwrap();
    assert_eq!(reports[0].status, OpStatus::Skipped);
    assert_eq!(reports[0].reason, Some(SkipReason::NoMatch));
}

#[test]
fn empty_batch_is_rejected_upfront() {
    let mut session = session();
    assert!(matches!(session.apply(&[]), Err(Error::EmptyBatch)));
}

#[test]
fn zero_image_dimensions_rejected_before_any_op_runs() {
    let mut session = session();
    let before = session.document().body.signature();
    let result = session.apply(&[
        PatchOp::ReplaceParagraphText {
            from: "Status: draft".into(),
            to: "changed".into(),
        },
        PatchOp::InsertImage {
            anchor: Some(Anchor::After("Report".into())),
            image_path: "logo.png".into(),
            width_px: Some(0),
            height_px: None,
            alt_text: None,
        },
    ]);
    assert!(matches!(result, Err(Error::InvalidDimensions { width: 0, .. })));
    // nothing ran, not even the first op
    assert_eq!(session.document().body.signature(), before);
    assert_eq!(session.document().body.paragraphs().nth(1).unwrap().text(), "Status: draft");
}

#[test]
fn delete_and_insert_update_structure_counts() {
    let mut session = session();
    let reports = session
        .apply(&[
            PatchOp::DeleteAtIndex { index: 3 },
            PatchOp::InsertParagraphAfterText {
                after: "Report".into(),
                text: "Subtitle".into(),
                style: Some("Heading1".into()),
            },
        ])
        .unwrap();
    assert!(reports.iter().all(|r| r.is_applied()));

    let stats = session.stats().unwrap();
    assert_eq!(stats.before.body_children, 5);
    assert_eq!(stats.after.body_children, 5);
    assert_eq!(stats.after.signature, "p p p tbl sectPr");
}

#[test]
fn delete_out_of_range_skips() {
    let mut session = session();
    let reports = session
        .apply(&[PatchOp::DeleteAtIndex { index: 40 }])
        .unwrap();
    assert_eq!(reports[0].reason, Some(SkipReason::IndexOutOfRange));
}

#[test]
fn insert_table_requires_anchor() {
    let mut session = session();
    let reports = session
        .apply(&[
            PatchOp::InsertTable {
                anchor: None,
                headers: vec!["A".into()],
                rows: vec![],
                col_widths: None,
                style: None,
            },
            PatchOp::InsertTable {
                anchor: Some(Anchor::Before("Closing note".into())),
                headers: vec!["Col1".into(), "Col2".into()],
                rows: vec![vec!["a".into(), "b".into()]],
                col_widths: Some(vec![2400, 2400]),
                style: Some("TableGrid".into()),
            },
        ])
        .unwrap();
    assert_eq!(reports[0].reason, Some(SkipReason::NoAnchor));
    assert!(reports[1].is_applied());

    let body = &session.document().body;
    assert_eq!(body.table_count(), 2);
    assert_eq!(body.signature(), "p p tbl tbl p sectPr");
}

#[test]
fn anchor_text_not_found_skips() {
    let mut session = session();
    let reports = session
        .apply(&[PatchOp::InsertTable {
            anchor: Some(Anchor::After("no such paragraph".into())),
            headers: vec!["A".into()],
            rows: vec![],
            col_widths: None,
            style: None,
        }])
        .unwrap();
    assert_eq!(reports[0].reason, Some(SkipReason::AnchorNotFound));
}

#[test]
fn table_cell_edits() {
    let mut session = session();
    let reports = session
        .apply(&[
            PatchOp::TableSetCellText {
                table_index: 0,
                row: 1,
                col: 1,
                text: "alice".into(),
            },
            PatchOp::TableSetCellText {
                table_index: 0,
                row: 9,
                col: 0,
                text: "x".into(),
            },
            PatchOp::ReplaceTableCellText {
                from: "Key".into(),
                to: "Field".into(),
            },
        ])
        .unwrap();
    assert!(reports[0].is_applied());
    assert_eq!(reports[1].reason, Some(SkipReason::CellOutOfRange));
    assert!(reports[2].is_applied());

    let table = session.document().body.tables().next().unwrap();
    assert_eq!(table.cell(1, 1).unwrap().text(), "alice");
    assert_eq!(table.cell(0, 0).unwrap().text(), "Field");
}

#[test]
fn set_color_for_style_touches_only_matching_paragraphs() {
    let mut session = session();
    let reports = session
        .apply(&[PatchOp::SetColorForStyle {
            style: "Heading1".into(),
            color: "FF0000".into(),
        }])
        .unwrap();
    assert!(reports[0].is_applied());
    assert_eq!(reports[0].matched, 1);

    let heading = session.document().body.paragraphs().next().unwrap();
    let run = heading.runs().next().unwrap();
    assert_eq!(
        run.properties.as_ref().unwrap().color.as_deref(),
        Some("FF0000")
    );
    let plain = session.document().body.paragraphs().nth(1).unwrap();
    assert!(plain.runs().next().unwrap().properties.is_none());
}

#[test]
fn header_replace_text_across_header_parts() {
    let bytes = build_docx(&[("word/header1.xml", HEADER)]);
    let mut session = PatchSession::from_bytes(&bytes).unwrap();
    let reports = session
        .apply(&[PatchOp::HeaderReplaceText {
            from: "Company Confidential".into(),
            to: "Public".into(),
        }])
        .unwrap();
    assert!(reports[0].is_applied());
    assert_eq!(reports[0].matched, 1);

    let out = session.to_bytes().unwrap();
    let mut session = PatchSession::from_bytes(&out).unwrap();
    let reports = session
        .apply(&[PatchOp::HeaderReplaceText {
            from: "Public".into(),
            to: "Internal".into(),
        }])
        .unwrap();
    assert!(reports[0].is_applied());
}

#[test]
fn untouched_parts_round_trip_byte_for_byte() {
    let mut session = session();
    session
        .apply(&[PatchOp::ReplaceParagraphText {
            from: "Closing note".into(),
            to: "Closing remark".into(),
        }])
        .unwrap();
    let out = session.to_bytes().unwrap();

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(out)).unwrap();
    let mut styles = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("word/styles.xml").unwrap(),
        &mut styles,
    )
    .unwrap();
    assert_eq!(styles, STYLES);
}

#[test]
fn insert_image_embeds_media_and_relationship() {
    let dir = std::env::temp_dir().join("docx_patch_test_media");
    std::fs::create_dir_all(&dir).unwrap();
    let image_path = dir.join("pixel.png");
    std::fs::write(&image_path, b"\x89PNG\r\n\x1a\nfake").unwrap();

    let mut session = session();
    let reports = session
        .apply(&[PatchOp::InsertImage {
            anchor: Some(Anchor::After("Report".into())),
            image_path: image_path.clone(),
            width_px: Some(120),
            height_px: None,
            alt_text: Some("logo".into()),
        }])
        .unwrap();
    assert!(reports[0].is_applied());

    let entries = session.outline();
    match &entries[1] {
        OutlineEntry::Image { target, alt_text, rel_id, .. } => {
            assert_eq!(target.as_deref(), Some("media/image1.png"));
            assert_eq!(alt_text.as_deref(), Some("logo"));
            assert!(rel_id.as_deref().unwrap().starts_with("rId"));
        }
        other => panic!("expected image entry, got {other:?}"),
    }

    let out = session.to_bytes().unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(out)).unwrap();
    assert!(archive.by_name("word/media/image1.png").is_ok());
}

#[test]
fn insert_image_with_missing_file_skips() {
    let mut session = session();
    let reports = session
        .apply(&[PatchOp::InsertImage {
            anchor: Some(Anchor::After("Report".into())),
            image_path: "/nonexistent/logo.png".into(),
            width_px: None,
            height_px: None,
            alt_text: None,
        }])
        .unwrap();
    assert_eq!(reports[0].reason, Some(SkipReason::SourceFileMissing));
}

#[test]
fn all_skipped_batch_is_a_valid_noop() {
    let mut session = session();
    let before = session.document().body.signature();
    let reports = session
        .apply(&[
            PatchOp::DeleteAtIndex { index: 99 },
            PatchOp::ReplaceParagraphText {
                from: "missing".into(),
                to: "x".into(),
            },
        ])
        .unwrap();
    assert!(reports.iter().all(|r| !r.is_applied()));
    assert_eq!(session.document().body.signature(), before);
}

#[test]
fn apply_patch_writes_output_and_collects_warnings() {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = std::env::temp_dir().join("docx_patch_test_e2e");
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("input.docx");
    let output = dir.join("output.docx");
    std::fs::write(&input, build_docx(&[])).unwrap();

    let report = apply_patch(
        &input,
        &output,
        &[
            PatchOp::ReplaceParagraphText {
                from: "Status: draft".into(),
                to: "Status: shipped".into(),
            },
            PatchOp::ReplaceParagraphText {
                from: "missing".into(),
                to: "x".into(),
            },
        ],
    )
    .unwrap();

    assert_eq!(report.output_path, output);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("no_match"));
    assert_eq!(report.stats.before.signature, report.stats.after.signature);

    let written = std::fs::read(&output).unwrap();
    let session = PatchSession::from_bytes(&written).unwrap();
    assert_eq!(
        session.document().body.paragraphs().nth(1).unwrap().text(),
        "Status: shipped"
    );
}

#[test]
fn split_runs_match_and_keep_their_spaces() {
    // Word habitually splits a sentence across runs at a space boundary
    let document = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t xml:space="preserve">Status: </w:t></w:r><w:r><w:t>Draft</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
</w:body>
</w:document>"#;

    let mut buf = std::io::Cursor::new(Vec::new());
    let mut zip = zip::ZipWriter::new(&mut buf);
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();

    let mut session = PatchSession::from_bytes(&buf.into_inner()).unwrap();
    assert_eq!(
        session.document().body.paragraphs().next().unwrap().text(),
        "Status: Draft"
    );

    let reports = session
        .apply(&[PatchOp::ReplaceParagraphText {
            from: "Status: Draft".into(),
            to: "Status: Final".into(),
        }])
        .unwrap();
    assert!(reports[0].is_applied());

    // the untouched paragraph keeps its inter-run space through a save
    let out = session.to_bytes().unwrap();
    let session = PatchSession::from_bytes(&out).unwrap();
    assert_eq!(
        session.document().body.paragraphs().nth(1).unwrap().text(),
        "Hello world"
    );
}

#[test]
fn replace_paragraph_at_index_type_checks() {
    let mut session = session();
    let reports = session
        .apply(&[
            PatchOp::ReplaceParagraphAtIndex { index: 2, to: "x".into() }, // a table
            PatchOp::SetStyleAtIndex { index: 3, style: "Heading1".into() },
        ])
        .unwrap();
    assert_eq!(reports[0].reason, Some(SkipReason::NoMatch));
    assert!(reports[1].is_applied());
    assert_eq!(
        session.document().body.paragraphs().nth(2).unwrap().style(),
        Some("Heading1")
    );
}
