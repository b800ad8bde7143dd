//! Structural queries over a parsed schematic tree.
//!
//! All queries are pure reads over the immutable tree and return node
//! references, so both decoded values and source spans stay available for
//! edit planning.

use sch_sexpr::Sexpr;

/// Label heads that participate in net naming.
pub const NET_LABEL_KINDS: &[&str] = &["label", "global_label", "hierarchical_label"];

/// All label-like heads, including net class directives.
pub const ALL_LABEL_KINDS: &[&str] = &[
    "label",
    "global_label",
    "hierarchical_label",
    "netclass_flag",
];

/// Iterate the placed symbol instances of a schematic root.
///
/// Placed symbols carry a `lib_id`; the filter keeps library definitions out
/// even if one ever shows up at the root level.
pub fn placed_symbols(root: &Sexpr) -> impl Iterator<Item = &Sexpr> {
    root.find_all_lists("symbol")
        .into_iter()
        .filter(|sym| sym.find_list("lib_id").is_some())
}

/// Find a placed symbol by the value of its `Reference` property.
pub fn find_symbol<'a>(root: &'a Sexpr, reference: &str) -> Option<&'a Sexpr> {
    placed_symbols(root).find(|sym| property_value(sym, "Reference") == Some(reference))
}

/// Find a `(property "Name" "Value" ...)` child of a symbol by name.
pub fn property<'a>(symbol: &'a Sexpr, name: &str) -> Option<&'a Sexpr> {
    symbol.find_all_lists("property").into_iter().find(|prop| {
        prop.as_list().and_then(|items| items.get(1)?.as_str()) == Some(name)
    })
}

/// Read a property's value string.
pub fn property_value<'a>(symbol: &'a Sexpr, name: &str) -> Option<&'a str> {
    property(symbol, name)?.as_list()?.get(2)?.as_str()
}

/// The value atom of a property node (its third element), for span edits.
pub fn property_value_atom(prop: &Sexpr) -> Option<&Sexpr> {
    prop.as_list()?.get(2).filter(|v| v.as_str().is_some())
}

/// Find root-level label nodes of the given kinds, optionally restricted to
/// those whose text equals `text`.
pub fn labels<'a>(root: &'a Sexpr, kinds: &[&str], text: Option<&str>) -> Vec<&'a Sexpr> {
    let Some(items) = root.as_list() else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|node| node.head().is_some_and(|head| kinds.contains(&head)))
        .filter(|node| match text {
            Some(text) => label_text(node) == Some(text),
            None => true,
        })
        .collect()
}

/// A label's net name: its first positional quoted string.
pub fn label_text(label: &Sexpr) -> Option<&str> {
    label.as_list()?.get(1)?.as_str()
}

/// Find the `title_block` child of the root.
pub fn title_block(root: &Sexpr) -> Option<&Sexpr> {
    root.find_list("title_block")
}

/// Find a single-valued title block field like `title`, `rev`, or `date`.
pub fn title_block_field<'a>(block: &'a Sexpr, head: &str) -> Option<&'a Sexpr> {
    block.find_list(head)
}

/// Find the `(comment N "...")` title block entry with the given number.
pub fn title_block_comment(block: &Sexpr, index: i64) -> Option<&Sexpr> {
    block
        .find_all_lists("comment")
        .into_iter()
        .find(|c| c.as_list().and_then(|items| items.get(1)?.as_int()) == Some(index))
}
