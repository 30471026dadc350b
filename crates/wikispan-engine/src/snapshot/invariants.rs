use crate::document::Document;

/// Validates the span registry of a document.
///
/// Asserts that:
/// - Every live span lies within the buffer
/// - No two live spans partially overlap
/// - The root spans the whole buffer
///
/// # Panics
/// Panics with a descriptive message if any invariant is violated.
pub fn check(doc: &Document) {
    let n = doc.buffer_len();
    let records = doc.live_records();
    for (id, r) in &records {
        assert!(
            r.span.start <= r.span.end && r.span.end <= n,
            "span out of bounds: {:?} {:?} (buffer len: {n})",
            id.kind(),
            r.span
        );
        for (other_id, other) in &records {
            assert!(
                !r.span.straddles(other.span),
                "spans partially overlap: {:?} {:?} and {:?} {:?}",
                id.kind(),
                r.span,
                other_id.kind(),
                other.span
            );
        }
    }
    let root = records.iter().find(|(id, _)| *id == doc.node.id());
    assert!(
        root.is_some_and(|(_, r)| r.span.start == 0 && r.span.end == n),
        "root does not span the buffer: {root:?} (buffer len: {n})"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WikiNode;

    #[test]
    fn holds_after_edits() {
        let doc = Document::parse("{{a|b={{c|d}}}} ''e'' [[f|g]]");
        let templates = doc.templates().expect("query");
        templates[1].set_name("cc").expect("edit");
        check(&doc);
        templates[0].set_string("{{x}}").expect("edit");
        doc.wikilinks().expect("query")[0].set_text("h").expect("edit");
        check(&doc);
        assert_eq!(doc.text(), "{{x}} ''e'' [[f|h]]");
    }
}
