//! Whitespace-aware splice points for synthesized siblings.
//!
//! Synthesized nodes must land inside untouched surroundings without
//! reflowing them, so insertion points hug the last existing child and
//! indentation is copied from a sibling rather than computed.

use sch_sexpr::{PatchError, PatchSet, Sexpr, Span};

/// Indentation for a new child of `list`: the leading whitespace of the
/// first existing child that starts a line, else a single tab.
pub(crate) fn child_indent(source: &str, list: &Sexpr) -> String {
    if let Some(items) = list.as_list() {
        for child in items.iter().skip(1) {
            let start = child.span.start;
            let Some(line_start) = source[..start].rfind('\n').map(|i| i + 1) else {
                continue;
            };
            let prefix = &source[line_start..start];
            if !prefix.is_empty() && prefix.bytes().all(|b| b == b' ' || b == b'\t') {
                return prefix.to_string();
            }
        }
    }
    "\t".to_string()
}

/// Queue `payload` as the last child of `list`.
///
/// The insertion point sits just after the last child, before any whitespace
/// that precedes the closing paren. Lists whose children span lines get a
/// newline plus sibling indent; single-line lists get a space separator.
pub(crate) fn insert_last_child(
    source: &str,
    patches: &mut PatchSet,
    list: &Sexpr,
    payload: &str,
) -> Result<(), PatchError> {
    let close = list.span.end - 1;
    let bytes = source.as_bytes();
    let mut point = close;
    while point > list.span.start + 1 && matches!(bytes[point - 1], b' ' | b'\t' | b'\n' | b'\r') {
        point -= 1;
    }

    let text = if source[point..close].contains('\n') {
        format!("\n{}{}", child_indent(source, list), payload)
    } else {
        format!(" {payload}")
    };
    patches.insert(point, text)
}

/// The byte range to remove when deleting `node`: its span widened across
/// leading spaces and tabs, and through one preceding newline so the line it
/// occupied alone does not survive as a blank.
pub(crate) fn deletion_span(source: &str, node: &Sexpr) -> Span {
    let bytes = source.as_bytes();
    let mut start = node.span.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] == b'\n' {
        start -= 1;
        if start > 0 && bytes[start - 1] == b'\r' {
            start -= 1;
        }
    }
    Span::new(start, node.span.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sch_sexpr::parse;

    #[test]
    fn test_child_indent_from_first_line_starting_child() {
        let source = "(symbol (lib_id \"Device:R\")\n    (unit 1)\n  )";
        let root = parse(source).unwrap();
        // lib_id is inline with the head; unit is the first child on its
        // own line and donates the indent.
        assert_eq!(child_indent(source, &root), "    ");
    }

    #[test]
    fn test_child_indent_tab_fallback() {
        let source = "(effects (font (size 1.27 1.27)))";
        let root = parse(source).unwrap();
        assert_eq!(child_indent(source, &root), "\t");
    }

    #[test]
    fn test_insert_last_child_multiline() {
        let source = "(symbol\n\t(lib_id \"Device:R\")\n\t(unit 1)\n)";
        let root = parse(source).unwrap();
        let mut patches = PatchSet::new();
        insert_last_child(source, &mut patches, &root, "(dnp no)").unwrap();
        assert_eq!(
            patches.apply(source),
            "(symbol\n\t(lib_id \"Device:R\")\n\t(unit 1)\n\t(dnp no)\n)"
        );
    }

    #[test]
    fn test_insert_last_child_inline() {
        let source = "(effects (font (size 1.27 1.27)))";
        let root = parse(source).unwrap();
        let mut patches = PatchSet::new();
        insert_last_child(source, &mut patches, &root, "hide").unwrap();
        assert_eq!(
            patches.apply(source),
            "(effects (font (size 1.27 1.27)) hide)"
        );
    }

    #[test]
    fn test_deletion_span_consumes_own_line() {
        let source = "(symbol\n\t(unit 1)\n\t(dnp yes)\n)";
        let root = parse(source).unwrap();
        let dnp = root.find_list("dnp").unwrap();
        let mut patches = PatchSet::new();
        patches.delete(deletion_span(source, dnp)).unwrap();
        assert_eq!(patches.apply(source), "(symbol\n\t(unit 1)\n)");
    }

    #[test]
    fn test_deletion_span_inline_takes_leading_space() {
        let source = "(effects (font (size 1 1)) hide)";
        let root = parse(source).unwrap();
        let items = root.as_list().unwrap();
        let hide = &items[2];
        let mut patches = PatchSet::new();
        patches.delete(deletion_span(source, hide)).unwrap();
        assert_eq!(patches.apply(source), "(effects (font (size 1 1)))");
    }
}
