//! A queue of byte-range edits expressed in original-source offsets.
//!
//! Edits accumulate against the offsets of the unmodified buffer and are
//! spliced in a single [`PatchSet::apply`] pass, highest offset first, so no
//! queued span is ever invalidated by an earlier splice. Overlap is rejected
//! at enqueue time; the queue stays usable after a rejected edit.

use crate::value::{quote_string, Value};
use crate::Span;

use thiserror::Error;

/// Errors raised while queuing edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The new edit's byte range intersects an already-queued edit.
    #[error("edit [{start}, {end}) overlaps queued edit [{queued_start}, {queued_end})")]
    OverlappingEdit {
        start: usize,
        end: usize,
        queued_start: usize,
        queued_end: usize,
    },
}

/// A single patch to apply to source text.
#[derive(Debug, Clone)]
pub struct Patch {
    /// Byte span to replace (empty span = insertion)
    pub span: Span,
    /// New text to insert
    pub new_text: String,
}

/// A collection of patches to apply to source text.
///
/// Insertions are zero-width patches; two insertions at the same offset are
/// legal and come out in enqueue order. Any other intersection of ranges is
/// rejected with [`PatchError::OverlappingEdit`].
#[derive(Debug, Default)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Queue a replacement of a string token.
    /// The new value should NOT include quotes - they are added, with escapes.
    pub fn replace_string(&mut self, span: Span, new_value: &str) -> Result<(), PatchError> {
        self.push(span, quote_string(new_value))
    }

    /// Queue a replacement of an atom with a formatted scalar.
    pub fn replace_value(&mut self, span: Span, value: &Value) -> Result<(), PatchError> {
        self.push(span, value.encode())
    }

    /// Queue a raw replacement (caller provides exact replacement text).
    pub fn replace_raw(&mut self, span: Span, new_text: String) -> Result<(), PatchError> {
        self.push(span, new_text)
    }

    /// Queue an insertion at a byte offset.
    pub fn insert(&mut self, offset: usize, new_text: String) -> Result<(), PatchError> {
        self.push(Span::new(offset, offset), new_text)
    }

    /// Queue a deletion of a byte range.
    pub fn delete(&mut self, span: Span) -> Result<(), PatchError> {
        self.push(span, String::new())
    }

    fn push(&mut self, span: Span, new_text: String) -> Result<(), PatchError> {
        for queued in &self.patches {
            // Half-open intersection test; equal-offset zero-width
            // insertions fall through on both comparisons.
            if queued.span.start < span.end && span.start < queued.span.end {
                return Err(PatchError::OverlappingEdit {
                    start: span.start,
                    end: span.end,
                    queued_start: queued.span.start,
                    queued_end: queued.span.end,
                });
            }
        }
        self.patches.push(Patch { span, new_text });
        Ok(())
    }

    /// Splice all queued patches into `source` and return the result.
    ///
    /// Patches are applied from the highest offset downward so that every
    /// queued span remains valid in original-source coordinates throughout
    /// the pass. Same-start ties splice the wider span first, so a zero-width
    /// insertion at a replacement's start edge lands before the replacement
    /// text; equal spans splice in reverse enqueue order, which leaves
    /// same-offset insertions in enqueue order in the output.
    pub fn apply(&self, source: &str) -> String {
        if self.patches.is_empty() {
            return source.to_string();
        }

        let mut order: Vec<usize> = (0..self.patches.len()).collect();
        order.sort_by_key(|&i| (self.patches[i].span.start, self.patches[i].span.end, i));

        let mut out = source.to_string();
        for &i in order.iter().rev() {
            let patch = &self.patches[i];
            out.replace_range(patch.span.start..patch.span.end, &patch.new_text);
        }
        out
    }
}
