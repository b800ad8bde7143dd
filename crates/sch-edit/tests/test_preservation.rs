//! Preservation guarantees: zero-edit round-trips are byte-identical, and
//! constructs the tree does not model (mirror flags, dnp state, justify
//! entries, autoplaced fields) survive unrelated edits untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use sch_edit::{Document, PropertyEdit};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).unwrap()
}

#[test]
fn zero_edit_roundtrip_v6() {
    let source = fixture("basic_v6.kicad_sch");
    let doc = Document::from_string(source.clone()).unwrap();
    assert_eq!(doc.source(), source);
    assert_eq!(doc.commit_to_string(), source);
}

#[test]
fn zero_edit_roundtrip_v9() {
    let source = fixture("basic_v9.kicad_sch");
    let doc = Document::from_string(source.clone()).unwrap();
    assert_eq!(doc.commit_to_string(), source);
}

#[test]
fn zero_edit_commit_to_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("copy.kicad_sch");
    fs::copy(fixture_path("basic_v6.kicad_sch"), &path).unwrap();

    let doc = Document::load(&path).unwrap();
    doc.commit(&path).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        fixture("basic_v6.kicad_sch")
    );
}

#[test]
fn mirror_and_dnp_survive_property_updates() {
    let source = fixture("basic_v9.kicad_sch");
    let mut doc = Document::from_string(source).unwrap();

    let mut edits = BTreeMap::new();
    edits.insert("Value".to_string(), PropertyEdit::Set("4k7".to_string()));
    assert_eq!(doc.update_component("R1", &edits).unwrap(), 1);

    let output = doc.commit_to_string();
    assert!(output.contains("(dnp yes)"));
    assert!(!output.contains("(dnp no)"));
    // Mirror flag still sits right after the placement form
    assert!(output.contains("(at 129.54 64.77 0)\n\t\t(mirror x)"));
}

#[test]
fn unmodeled_forms_survive_renames() {
    let source = fixture("basic_v6.kicad_sch");
    let mut doc = Document::from_string(source).unwrap();
    doc.rename_net("SPI_SCK", "CLK").unwrap();

    let output = doc.commit_to_string();
    assert!(output.contains("(fields_autoplaced)"));
    assert!(output.contains("(justify left bottom)"));
    assert!(output.contains("(sheet_instances\n    (path \"/\" (page \"1\"))\n  )"));
}

#[test]
fn escape_fidelity_write_back() {
    let source = fixture("basic_v6.kicad_sch");
    let mut doc = Document::from_string(source.clone()).unwrap();

    let component = doc.get_component("R1").unwrap();
    let note = component
        .properties
        .iter()
        .find(|p| p.name == "Note")
        .unwrap();
    assert_eq!(note.value, "path with \"quotes\"");

    // Writing the same logical value back must reproduce identical bytes
    let mut edits = BTreeMap::new();
    edits.insert("Note".to_string(), PropertyEdit::Set(note.value.clone()));
    assert_eq!(doc.update_component("R1", &edits).unwrap(), 1);
    assert_eq!(doc.commit_to_string(), source);
}
