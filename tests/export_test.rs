//! End-to-end export scenarios: collection, capture, and dispatch against
//! in-memory and directory-backed hosts.

use std::time::Duration;

use svgsnap::{
    Document, Error, MemoryHost, NodeData, Rect, StyleRule, StyleSheet, collect_styles, download,
    serialize,
};

/// A chart node with two element children, one applicable rule and one
/// excluded child-combinator rule.
fn chart_document() -> (Document, svgsnap::NodeId) {
    let mut doc = Document::new();
    let svg = doc
        .append_markup(
            doc.document(),
            r#"<svg class="chart" id="g1"><g></g><rect width="4" height="4"></rect></svg>"#,
        )
        .unwrap();
    doc.register_stylesheet(StyleSheet::new(vec![
        StyleRule::declaration(".chart", "fill:red"),
        StyleRule::declaration(".chart > .bar", "fill:blue"),
    ]));
    (doc, svg)
}

fn find_link(doc: &Document) -> Option<svgsnap::NodeId> {
    doc.find(|node| {
        matches!(&node.data, NodeData::Element { name, classes, .. }
            if name == "a" && classes.iter().any(|c| c == "svg-crowbar"))
    })
}

#[test]
fn chart_snapshot_inlines_only_applicable_styles() {
    let (mut doc, svg) = chart_document();
    doc.set_rendered_bounds(
        svg,
        Rect {
            top: 10.0,
            left: 20.0,
            width: 640.0,
            height: 480.0,
        },
    );

    let styles = collect_styles(&doc);
    let snapshot = serialize(&mut doc, svg, &styles).unwrap();
    let markup = snapshot.markup();

    assert!(
        markup
            .contains("<style type=\"text/css\"><![CDATA[\n.chart{fill:red}]]></style>"),
        "style block missing or wrong: {markup}"
    );
    assert!(!markup.contains("fill:blue"));

    assert_eq!(snapshot.child_element_count, 3);
    assert_eq!(snapshot.class.as_deref(), Some("chart"));
    assert_eq!(snapshot.id.as_deref(), Some("g1"));
    assert_eq!(snapshot.top, 10.0);
    assert_eq!(snapshot.left, 20.0);
    assert_eq!(snapshot.width, 640.0);
    assert_eq!(snapshot.height, 480.0);
}

#[test]
fn download_dispatches_exactly_one_save() {
    let (mut doc, _) = chart_document();
    let mut host = MemoryHost::new();

    download(&mut doc, &mut host, "#g1", "report").unwrap();

    assert_eq!(host.saves().len(), 1);
    let save = &host.saves()[0];
    assert_eq!(save.filename, "report.svg");
    assert_eq!(save.media_type, "text/xml");

    let text = String::from_utf8(save.data.clone()).unwrap();
    assert!(text.starts_with(r#"<?xml version="1.0" standalone="no"?>"#));
    assert!(text.contains(r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN""#));
    assert!(text.contains(".chart{fill:red}"));
}

#[test]
fn handle_released_no_earlier_than_grace_delay() {
    let (mut doc, _) = chart_document();
    let mut host = MemoryHost::new();

    download(&mut doc, &mut host, "#g1", "report").unwrap();
    assert_eq!(host.object_count(), 1);
    assert_eq!(host.pending_revocations(), 1);

    host.advance(Duration::from_millis(9));
    assert_eq!(host.object_count(), 1, "handle released too early");

    host.advance(Duration::from_millis(1));
    assert_eq!(host.object_count(), 0);
    assert_eq!(host.pending_revocations(), 0);
}

#[test]
fn link_element_left_attached_with_save_target() {
    let (mut doc, _) = chart_document();
    let mut host = MemoryHost::new();

    download(&mut doc, &mut host, "#g1", "report").unwrap();

    let link = find_link(&doc).expect("link element should remain in the document");
    assert_eq!(doc.get_attr(link, "download"), Some("report.svg"));
    assert_eq!(doc.get_attr(link, "style"), Some("display: none"));
    let href = doc.get_attr(link, "href").unwrap();
    assert_eq!(href, host.saves()[0].url.as_str());

    // A second export accumulates a second link; nothing removes them.
    download(&mut doc, &mut host, "#g1", "again").unwrap();
    let links = doc
        .children(doc.document())
        .filter(|&c| {
            matches!(&doc.get(c).unwrap().data, NodeData::Element { name, .. } if name == "a")
        })
        .count();
    assert_eq!(links, 2);
}

#[test]
fn missing_node_fails_without_side_effects() {
    let mut doc = Document::new();
    doc.register_css(".chart { fill: red }");
    let mut host = MemoryHost::new();

    let err = download(&mut doc, &mut host, "#missing-node", "x").unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(_)));

    assert_eq!(host.object_count(), 0);
    assert!(host.saves().is_empty());
    assert!(find_link(&doc).is_none());
}

#[test]
fn handle_creation_failure_leaves_no_link() {
    let (mut doc, _) = chart_document();
    let mut host = MemoryHost::with_capacity(0);

    let err = download(&mut doc, &mut host, "#g1", "report").unwrap_err();
    assert!(matches!(err, Error::HandleCreation(_)));
    assert!(host.saves().is_empty());
    assert!(find_link(&doc).is_none());
}

#[test]
fn empty_style_set_is_not_an_error() {
    let mut doc = Document::new();
    doc.append_markup(doc.document(), r#"<svg id="bare"></svg>"#)
        .unwrap();
    let mut host = MemoryHost::new();

    download(&mut doc, &mut host, "#bare", "plain").unwrap();

    let text = String::from_utf8(host.saves()[0].data.clone()).unwrap();
    assert!(text.contains("<style type=\"text/css\"><![CDATA[]]></style>"));
}

#[test]
fn parsed_css_registration_feeds_collection() {
    let mut doc = Document::new();
    doc.append_markup(doc.document(), r#"<svg id="p"></svg>"#)
        .unwrap();
    doc.register_css(
        ".chart{fill:red} .chart > .bar{fill:blue} @media print { .axis{stroke:black} }",
    );

    let styles = collect_styles(&doc);
    assert_eq!(styles, "\n.chart{fill:red}\n.axis{stroke:black}");
}

#[test]
fn directory_host_saves_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let (mut doc, _) = chart_document();
    let mut host = svgsnap::DirectoryHost::new(dir.path());

    download(&mut doc, &mut host, "#g1", "report").unwrap();

    let contents = std::fs::read_to_string(dir.path().join("report.svg")).unwrap();
    assert!(contents.starts_with(r#"<?xml version="1.0" standalone="no"?>"#));
    assert!(contents.contains("<![CDATA[\n.chart{fill:red}]]>"));
}

#[test]
fn directory_host_rejects_escaping_filenames() {
    let dir = tempfile::tempdir().unwrap();
    let (mut doc, _) = chart_document();
    let mut host = svgsnap::DirectoryHost::new(dir.path());

    let err = download(&mut doc, &mut host, "#g1", "../escape").unwrap_err();
    assert!(matches!(err, Error::Activation(_)));
}
