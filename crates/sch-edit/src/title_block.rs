//! Title block metadata updates.

use std::collections::BTreeMap;

use sch_sexpr::value::quote_string;
use sch_sexpr::{PatchSet, Sexpr};
use serde::{Deserialize, Serialize};

use crate::query;
use crate::splice::{child_indent, insert_last_child};
use crate::{Document, SchError};

/// Title block fields accepted by [`Document::update_schematic_info`].
///
/// `None` leaves a field unchanged. `comments` entries are keyed by KiCad's
/// 1-based comment number; by convention comment 1 carries the author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleBlockFields {
    pub title: Option<String>,
    pub date: Option<String>,
    pub rev: Option<String>,
    pub company: Option<String>,
    pub comments: BTreeMap<i64, String>,
}

impl TitleBlockFields {
    fn singles(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("title", self.title.as_deref()),
            ("date", self.date.as_deref()),
            ("rev", self.rev.as_deref()),
            ("company", self.company.as_deref()),
        ]
        .into_iter()
        .filter_map(|(head, value)| value.map(|value| (head, value)))
    }
}

impl Document {
    /// Update title block metadata. Fields already present are edited in
    /// place; missing fields (or a wholly missing block) are synthesized.
    /// Returns the number of fields written.
    pub fn update_schematic_info(&mut self, fields: &TitleBlockFields) -> Result<usize, SchError> {
        let source = &self.source;
        let patches = &mut self.patches;

        let Some(block) = query::title_block(&self.root) else {
            return synthesize_title_block(source, patches, &self.root, fields);
        };

        let mut written = 0;
        for (head, value) in fields.singles() {
            match query::title_block_field(block, head) {
                Some(field) => replace_field_value(source, patches, field, 1, value)?,
                None => {
                    let payload = format!("({head} {})", quote_string(value));
                    insert_last_child(source, patches, block, &payload)?;
                }
            }
            written += 1;
        }
        for (&index, value) in &fields.comments {
            match query::title_block_comment(block, index) {
                Some(field) => replace_field_value(source, patches, field, 2, value)?,
                None => {
                    let payload = format!("(comment {index} {})", quote_string(value));
                    insert_last_child(source, patches, block, &payload)?;
                }
            }
            written += 1;
        }
        log::debug!("update_schematic_info: {written} field(s) written");
        Ok(written)
    }
}

/// Replace the value atom at `index` within a field list, or append one if
/// the field is degenerate and has none.
fn replace_field_value(
    source: &str,
    patches: &mut PatchSet,
    field: &Sexpr,
    index: usize,
    value: &str,
) -> Result<(), SchError> {
    match field.as_list().and_then(|items| items.get(index)) {
        Some(atom) => patches.replace_string(atom.span, value)?,
        None => insert_last_child(source, patches, field, &quote_string(value))?,
    }
    Ok(())
}

/// Build a whole `(title_block ...)` as a new root child when the schematic
/// has none yet.
fn synthesize_title_block(
    source: &str,
    patches: &mut PatchSet,
    root: &Sexpr,
    fields: &TitleBlockFields,
) -> Result<usize, SchError> {
    let indent = child_indent(source, root);
    let inner = format!("{indent}{indent}");

    let mut written = 0;
    let mut payload = String::from("(title_block");
    for (head, value) in fields.singles() {
        payload.push_str(&format!("\n{inner}({head} {})", quote_string(value)));
        written += 1;
    }
    for (&index, value) in &fields.comments {
        payload.push_str(&format!("\n{inner}(comment {index} {})", quote_string(value)));
        written += 1;
    }
    if written == 0 {
        return Ok(0);
    }
    payload.push_str(&format!("\n{indent})"));

    insert_last_child(source, patches, root, &payload)?;
    Ok(written)
}
