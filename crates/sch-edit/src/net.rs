//! Net label renames.

use sch_sexpr::{Span, WalkCtx};

use crate::{Document, SchError};

/// Check if node is the net name of a root-level label:
/// `(label "NAME" ...)`, `(global_label "NAME" ...)`, or
/// `(hierarchical_label "NAME" ...)` directly under `kicad_sch`.
fn is_net_label_text(ctx: &WalkCtx<'_>) -> bool {
    ctx.index_in_parent == Some(1)
        && matches!(
            ctx.parent_tag(),
            Some("label" | "global_label" | "hierarchical_label")
        )
        && ctx.grandparent_tag() == Some("kicad_sch")
}

impl Document {
    /// Rename every net label whose text equals `old` to `new`.
    /// Returns the number of labels renamed; zero matches is not an error.
    pub fn rename_net(&mut self, old: &str, new: &str) -> Result<usize, SchError> {
        let mut spans: Vec<Span> = Vec::new();
        self.root.walk_strings(|value, span, ctx| {
            if value == old && is_net_label_text(&ctx) {
                spans.push(span);
            }
        });

        for span in &spans {
            self.patches.replace_string(*span, new)?;
        }
        log::debug!("rename_net '{old}' -> '{new}': {} label(s)", spans.len());
        Ok(spans.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    const SCH: &str = r#"(kicad_sch (version 20211123)
  (label "SPI_SCK" (at 104.14 73.66 0))
  (global_label "SPI_SCK" (shape input) (at 121.92 73.66 0))
  (hierarchical_label "EN" (shape input))
  (symbol (lib_id "Device:R")
    (property "Reference" "R1" (at 0 0 0))
    (property "Value" "SPI_SCK" (at 0 0 0))
  )
)
"#;

    #[test]
    fn test_rename_counts_all_label_kinds() {
        let mut doc = Document::from_string(SCH).unwrap();
        let renamed = doc.rename_net("SPI_SCK", "SPI1_SCK").unwrap();
        assert_eq!(renamed, 2);

        let output = doc.commit_to_string();
        assert!(output.contains(r#"(label "SPI1_SCK" (at 104.14 73.66 0))"#));
        assert!(output.contains(r#"(global_label "SPI1_SCK" (shape input)"#));
        // A property that merely shares the text is not a label
        assert!(output.contains(r#"(property "Value" "SPI_SCK" (at 0 0 0))"#));
    }

    #[test]
    fn test_rename_no_matches() {
        let mut doc = Document::from_string(SCH).unwrap();
        assert_eq!(doc.rename_net("MISO", "MISO1").unwrap(), 0);
        assert_eq!(doc.commit_to_string(), SCH);
    }
}
