//! Edit sequences through several handles of one document, checking the
//! registry after every step.

use pretty_assertions::assert_eq;
use wikispan_engine::{Document, Error, NodeKind, WikiNode, snapshot};

#[test]
fn mixed_edit_sequence_keeps_spans_consistent() {
    let doc = Document::parse("{{a|b={{{p}}}}} <ref>x ''y''</ref> [[l]]");
    let param = doc.parameters().expect("query").remove(0);
    let tag = doc.tags(Some("ref")).expect("query").remove(0);
    let italic = doc.italics().expect("query").remove(0);
    let link = doc.wikilinks().expect("query").remove(0);
    snapshot::invariants(&doc);

    param.set_default("d").expect("edit");
    snapshot::invariants(&doc);
    assert_eq!(doc.text(), "{{a|b={{{p|d}}}}} <ref>x ''y''</ref> [[l]]");

    tag.set_contents("z").expect("edit");
    snapshot::invariants(&doc);
    assert!(!italic.is_alive());
    assert_eq!(tag.string().as_deref(), Ok("<ref>z</ref>"));

    link.set_text("label").expect("edit");
    snapshot::invariants(&doc);
    assert_eq!(doc.text(), "{{a|b={{{p|d}}}}} <ref>z</ref> [[l|label]]");
    assert_eq!(param.string().as_deref(), Ok("{{{p|d}}}"));
}

#[test]
fn deleting_a_node_kills_it_and_its_children() {
    let doc = Document::parse("x {{a|[[b]]}} y");
    let template = doc.templates().expect("query").remove(0);
    let link = template.wikilinks().expect("query").remove(0);

    template.delete().expect("edit");

    assert_eq!(doc.text(), "x  y");
    assert_eq!(template.string(), Err(Error::DeadAccess { kind: NodeKind::Template }));
    assert!(!link.is_alive());
    assert!(doc.templates().expect("query").is_empty());
    snapshot::invariants(&doc);
}

#[test]
fn siblings_shift_after_a_growing_edit() {
    let doc = Document::parse("{{a}}{{b}}{{c}}");
    let templates = doc.templates().expect("query");

    templates[0].set_name("alpha").expect("edit");
    templates[2].set_name("gamma").expect("edit");

    let names: Vec<_> = templates.iter().map(|t| t.name().expect("live")).collect();
    assert_eq!(names, ["alpha", "b", "gamma"]);
    assert_eq!(templates[1].string().as_deref(), Ok("{{b}}"));
    assert_eq!(doc.text(), "{{alpha}}{{b}}{{gamma}}");
    snapshot::invariants(&doc);
}

#[test]
fn rediscovery_returns_the_same_handles() {
    let doc = Document::parse("{{a|{{b}}}} {{c}}");
    let first = doc.templates().expect("query");
    let live = doc.live_spans();
    let second = doc.templates().expect("query");
    assert_eq!(first, second);
    assert_eq!(doc.live_spans(), live);
}

#[test]
fn list_conversion_then_table_edit() {
    let doc = Document::parse("* a\n** b\n{|\n|c\n|}");
    let list = doc.lists(None).expect("query").remove(0);
    let table = doc.tables().expect("query").remove(0);
    let cell = table.cells().expect("live").remove(0).remove(0);

    list.convert("#").expect("edit");
    snapshot::invariants(&doc);
    cell.set_value("changed").expect("edit");
    snapshot::invariants(&doc);

    assert_eq!(doc.text(), "# a\n#* b\n{|\n|changed\n|}");
    assert_eq!(table.data(Default::default()), Ok(vec![vec!["changed".to_string()]]));
}
