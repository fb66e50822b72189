use ragkit_chunk::{segment, BoundaryMarker, SegmentKind, Segmenter};

fn kinds(text: &str, markers: &[BoundaryMarker]) -> Vec<(SegmentKind, String)> {
    segment(text, markers).into_iter().map(|s| (s.kind, s.text.to_string())).collect()
}

#[test]
fn empty_text_has_no_segments() {
    assert!(segment("", &[BoundaryMarker::html_table()]).is_empty());
}

#[test]
fn table_is_cut_out_as_block() {
    let text = "intro\n<table><tr><td>a</td></tr></table>\noutro";
    let got = kinds(text, &[BoundaryMarker::html_table()]);
    assert_eq!(
        got,
        vec![
            (SegmentKind::Text, "intro\n".to_string()),
            (SegmentKind::Block, "<table><tr><td>a</td></tr></table>".to_string()),
            (SegmentKind::Text, "\noutro".to_string()),
        ]
    );
}

#[test]
fn nested_tables_form_one_block() {
    let table = "<TABLE><tr><td><table><tr><td>x</td></tr></table></td></tr></TABLE>";
    let text = format!("{table} tail");
    let got = kinds(&text, &[BoundaryMarker::html_table()]);
    assert_eq!(got[0], (SegmentKind::Block, table.to_string()));
    assert_eq!(got[1], (SegmentKind::Text, " tail".to_string()));
}

#[test]
fn unterminated_block_degrades_to_text() {
    let text = "a <table><tr> b";
    let got = kinds(text, &[BoundaryMarker::html_table()]);
    assert_eq!(got, vec![(SegmentKind::Text, text.to_string())]);
}

#[test]
fn code_fence_is_protected() {
    let text = "before\n```rust\nlet x = 1;\n```\nafter";
    let got = kinds(text, &Segmenter::protected_blocks().markers().to_vec());
    assert_eq!(got[1], (SegmentKind::Block, "```rust\nlet x = 1;\n```".to_string()));
    assert_eq!(got[2], (SegmentKind::Text, "\nafter".to_string()));
}

#[test]
fn delimiters_start_labelled_units() {
    let text = "deck title\n## Slide 1\nfirst\n## Slide 2\nsecond";
    let segs = segment(text, &[BoundaryMarker::slide(), BoundaryMarker::html_table()]);
    assert_eq!(segs.len(), 3);
    assert_eq!(segs[0].kind, SegmentKind::Text);
    assert_eq!(segs[0].text, "deck title\n");
    assert_eq!(segs[1].kind, SegmentKind::Unit);
    assert_eq!(segs[1].label, Some("1"));
    assert_eq!(segs[1].text, "## Slide 1\nfirst\n");
    assert_eq!(segs[2].label, Some("2"));
    assert_eq!(segs[2].offset, text.find("## Slide 2").unwrap());
    assert!(segs[1].is_protected());
}

#[test]
fn custom_markers_validate_patterns() {
    assert!(BoundaryMarker::delimiter("(?m)^=== (\\w+)").is_ok());
    assert!(BoundaryMarker::delimiter("(unclosed").is_err());
    assert!(BoundaryMarker::block("<aside>", "</aside>", false).is_ok());
}
