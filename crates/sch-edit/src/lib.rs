//! Surgical editor for KiCad schematic files (`.kicad_sch`).
//!
//! A [`Document`] parses a schematic once into a span-annotated tree, then
//! accumulates targeted byte-range edits against the original buffer. On
//! [`Document::commit`] the queued edits are spliced in and the target file
//! is replaced atomically. Every byte outside the edited spans survives
//! bit-exact - mirror flags, dnp state, justification entries, and whatever
//! future KiCad fields the tree does not model.
//!
//! - [`Document::list_components`] / [`Document::get_component`] - read
//!   component properties, including sheet visibility
//! - [`Document::update_component`] - set, hide, add, or remove properties
//! - [`Document::rename_net`] - rename matching net labels
//! - [`Document::update_schematic_info`] - edit title block metadata
//! - [`query`] - structural queries for callers with bespoke needs

pub mod query;

mod component;
mod net;
mod splice;
mod title_block;

pub use component::{Component, ComponentSummary, PropertyEdit, PropertyView};
pub use title_block::TitleBlockFields;

use std::io::Write;
use std::path::Path;

use sch_sexpr::{parse, ParseError, PatchError, PatchSet, Sexpr};
use thiserror::Error;

/// Errors surfaced by document loading and editing.
#[derive(Debug, Error)]
pub enum SchError {
    /// The file is not well-formed; no document is created.
    #[error("failed to parse schematic: {0}")]
    Parse(#[from] ParseError),
    /// A queued edit intersects an earlier one; the edit is not queued,
    /// the document stays usable.
    #[error(transparent)]
    Edit(#[from] PatchError),
    /// No placed symbol has the requested reference designator.
    #[error("component '{0}' not found")]
    ComponentNotFound(String),
    /// A property edit needs an existing target that is absent or malformed.
    #[error("property '{0}' not found")]
    PropertyNotFound(String),
    /// The top-level expression is an atom, not a `(kicad_sch ...)` list.
    #[error("schematic root is not a list")]
    NotASchematic,
    /// Filesystem failure on load or commit; the target file is unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Which generation of the KiCad text format a file uses.
///
/// Detected from the root `(version N)` form. Only consulted when a *new*
/// visibility form has to be synthesized; existing forms are always edited
/// in whatever style they already use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatGeneration {
    /// KiCad 6/7 era: bare `hide` atom at the tail of `(effects ...)`
    Legacy,
    /// KiCad 8/9 era: `(hide yes)` boolean lists
    Modern,
}

impl FormatGeneration {
    fn detect(root: &Sexpr) -> Self {
        let version = root
            .find_list("version")
            .and_then(|v| v.as_list()?.get(1)?.as_int());
        match version {
            Some(v) if v < 20240000 => FormatGeneration::Legacy,
            _ => FormatGeneration::Modern,
        }
    }

    /// The hide form to synthesize inside an `(effects ...)` list.
    pub(crate) fn hide_form(self) -> &'static str {
        match self {
            FormatGeneration::Legacy => "hide",
            FormatGeneration::Modern => "(hide yes)",
        }
    }
}

/// A loaded schematic with its pending edits.
///
/// The source buffer and tree are immutable for the document's lifetime;
/// edits accumulate in a queue of byte-range patches against the original
/// offsets. [`Document::commit`] consumes the document - callers that need
/// to keep editing reload the written file, which re-anchors all spans.
pub struct Document {
    pub(crate) source: String,
    pub(crate) root: Sexpr,
    pub(crate) patches: PatchSet,
    pub(crate) generation: FormatGeneration,
}

impl Document {
    /// Load and parse a schematic file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let source = String::from_utf8(bytes)
            .map_err(|e| ParseError::InvalidUtf8(e.utf8_error().valid_up_to()))?;
        log::debug!("loaded {} bytes from {}", source.len(), path.display());
        Self::from_string(source)
    }

    /// Parse a schematic held in memory.
    pub fn from_string(source: impl Into<String>) -> Result<Self, SchError> {
        let source = source.into();
        let root = parse(&source)?;
        if !root.is_list() {
            return Err(SchError::NotASchematic);
        }
        let generation = FormatGeneration::detect(&root);
        log::debug!("parsed schematic, format generation {generation:?}");
        Ok(Self {
            source,
            root,
            patches: PatchSet::new(),
            generation,
        })
    }

    /// The original source text. Valid until commit; queued edits do not
    /// show up here.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed tree, rooted at the `kicad_sch` form.
    pub fn root(&self) -> &Sexpr {
        &self.root
    }

    /// The detected format generation.
    pub fn generation(&self) -> FormatGeneration {
        self.generation
    }

    /// Number of edits queued so far.
    pub fn pending_edits(&self) -> usize {
        self.patches.len()
    }

    /// Apply the queued edits and return the resulting text without
    /// touching disk.
    pub fn commit_to_string(self) -> String {
        self.patches.apply(&self.source)
    }

    /// Apply the queued edits and atomically replace `path`.
    ///
    /// The output is written to a temp file in the target's directory,
    /// synced, then renamed over the target, so readers observe either the
    /// old or the new content in full. On any failure the temp file is
    /// removed by its Drop and the target is left untouched.
    pub fn commit(self, path: impl AsRef<Path>) -> Result<(), SchError> {
        let path = path.as_ref();
        let output = self.patches.apply(&self.source);

        // Temp file lives next to the target so the rename cannot cross
        // filesystems.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(output.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| SchError::Io(e.error))?;

        log::debug!("committed {} bytes to {}", output.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_edit_commit_is_identity() {
        let source = "(kicad_sch (version 20211123)\n  (paper \"A4\")\n)\n";
        let doc = Document::from_string(source).unwrap();
        assert_eq!(doc.commit_to_string(), source);
    }

    #[test]
    fn test_generation_detection() {
        let v6 = Document::from_string("(kicad_sch (version 20211123))").unwrap();
        assert_eq!(v6.generation(), FormatGeneration::Legacy);

        let v9 = Document::from_string("(kicad_sch (version 20250114))").unwrap();
        assert_eq!(v9.generation(), FormatGeneration::Modern);

        // No version form reads as current-generation output
        let bare = Document::from_string("(kicad_sch)").unwrap();
        assert_eq!(bare.generation(), FormatGeneration::Modern);
    }

    #[test]
    fn test_atom_root_rejected() {
        assert!(matches!(
            Document::from_string("kicad_sch"),
            Err(SchError::NotASchematic)
        ));
    }

    #[test]
    fn test_parse_error_propagates() {
        assert!(matches!(
            Document::from_string("(kicad_sch (paper \"A4\")"),
            Err(SchError::Parse(ParseError::UnmatchedOpen(0)))
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected_with_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.kicad_sch");
        std::fs::write(&path, b"(kicad_sch \xff)").unwrap();
        assert!(matches!(
            Document::load(&path),
            Err(SchError::Parse(ParseError::InvalidUtf8(11)))
        ));
    }
}
