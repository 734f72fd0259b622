//! End-to-end tests against the in-memory mock backend, covering the same
//! shapes of scenario as the reference tool's fixture-based test suite.

use pdflayout::{
    extract_pages, merge, Config, ExtractOptions, MockBackend, MockPage, RawAnnotation, RawChar,
};

fn char(unicode: char, x: f64, y0: f64, y1: f64) -> RawChar {
    RawChar {
        unicode,
        rotation: 0.0,
        font_size: 12.0,
        font_weight: 400.0,
        font_name: "Helvetica".into(),
        font_flags: 0,
        bbox: (x, y0, x + 8.0, y1),
    }
}

fn text_page(text: &str, y0: f64, y1: f64) -> MockPage {
    let chars = text
        .chars()
        .enumerate()
        .map(|(i, c)| char(c, i as f64 * 8.0, y0, y1))
        .collect();
    MockPage {
        media_bbox: (0.0, 0.0, 300.0, 300.0),
        rotation: 0,
        chars,
        annotations: vec![],
    }
}

#[test]
fn multi_page_extraction_preserves_requested_order() {
    let mut backend = MockBackend::new(vec![
        text_page("first page", 250.0, 260.0),
        text_page("second page", 250.0, 260.0),
        text_page("third page", 250.0, 260.0),
    ]);
    let opts = ExtractOptions {
        page_range: Some(vec![2, 0]),
        ..ExtractOptions::default()
    };
    let pages = extract_pages(&mut backend, &[2, 0], &opts, &Config::default()).unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].page, 2);
    assert_eq!(pages[1].page, 0);

    let rendered_first = merge(&pages[0], false, true);
    assert!(rendered_first.contains("third"));
    let rendered_second = merge(&pages[1], false, true);
    assert!(rendered_second.contains("first"));
}

#[test]
fn link_rectangle_splits_span_and_carries_url() {
    let mut chars = Vec::new();
    for (i, c) in "see docs here".chars().enumerate() {
        chars.push(char(c, i as f64 * 8.0, 250.0, 260.0));
    }
    // "docs" starts at index 4 ("see " is 4 chars), spans 4 chars.
    let link_start = 4.0 * 8.0;
    let link_end = link_start + 4.0 * 8.0;
    let page = MockPage {
        media_bbox: (0.0, 0.0, 300.0, 300.0),
        rotation: 0,
        chars,
        annotations: vec![RawAnnotation {
            rect: (link_start, 250.0, link_end, 260.0),
            uri: Some("https://docs.example/".into()),
            dest: None,
        }],
    };
    let mut backend = MockBackend::new(vec![page]);
    let opts = ExtractOptions::default();
    let pages = extract_pages(&mut backend, &[0], &opts, &Config::default()).unwrap();

    let spans: Vec<_> = pages[0]
        .blocks
        .iter()
        .flat_map(|b| &b.lines)
        .flat_map(|l| &l.spans)
        .collect();
    let linked: Vec<_> = spans.iter().filter(|s| !s.url.is_empty()).collect();
    assert!(!linked.is_empty());
    for s in &linked {
        assert_eq!(s.url, "https://docs.example/");
    }
    // Text outside the link rectangle must not carry the URL.
    assert!(spans.iter().any(|s| s.url.is_empty()));
}

#[test]
fn out_of_range_page_is_rejected() {
    let mut backend = MockBackend::new(vec![text_page("only page", 250.0, 260.0)]);
    let opts = ExtractOptions::default();
    let err = extract_pages(&mut backend, &[5], &opts, &Config::default());
    assert!(err.is_err());
}
