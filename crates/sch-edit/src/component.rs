//! Component adapters: list, inspect, and update schematic symbols.

use std::collections::BTreeMap;

use sch_sexpr::value::quote_string;
use sch_sexpr::{PatchSet, Sexpr, Value};
use serde::{Deserialize, Serialize};

use crate::query;
use crate::splice::{deletion_span, insert_last_child};
use crate::{Document, FormatGeneration, SchError};

/// One row of [`Document::list_components`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub reference: String,
    pub value: String,
    pub footprint: String,
}

/// A property of a component, with its visibility on the schematic sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyView {
    pub name: String,
    pub value: String,
    pub visible: bool,
}

/// A component and its full property set, from [`Document::get_component`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub reference: String,
    pub properties: Vec<PropertyView>,
}

/// One entry of the update map passed to [`Document::update_component`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyEdit {
    /// Set the value, preserving current visibility.
    Set(String),
    /// Set value and/or visibility; `None` leaves that aspect unchanged.
    Entry {
        value: Option<String>,
        visible: Option<bool>,
    },
    /// Delete the property node.
    Remove,
}

impl Document {
    /// List all placed components with their `Reference`, `Value` and
    /// `Footprint` properties, in sheet order. A missing property reads as
    /// an empty string.
    pub fn list_components(&self) -> Vec<ComponentSummary> {
        query::placed_symbols(&self.root)
            .map(|sym| ComponentSummary {
                reference: read_property(sym, "Reference"),
                value: read_property(sym, "Value"),
                footprint: read_property(sym, "Footprint"),
            })
            .collect()
    }

    /// Like [`Self::list_components`], restricted to references starting
    /// with the given designator prefix (e.g. `"C"` for capacitors).
    pub fn list_components_matching(&self, prefix: &str) -> Vec<ComponentSummary> {
        self.list_components()
            .into_iter()
            .filter(|c| c.reference.starts_with(prefix))
            .collect()
    }

    /// Get a single component's properties by reference designator.
    pub fn get_component(&self, reference: &str) -> Result<Component, SchError> {
        let symbol = query::find_symbol(&self.root, reference)
            .ok_or_else(|| SchError::ComponentNotFound(reference.to_string()))?;

        let properties = symbol
            .find_all_lists("property")
            .into_iter()
            .filter_map(|prop| {
                let items = prop.as_list()?;
                Some(PropertyView {
                    name: items.get(1)?.as_str()?.to_string(),
                    value: items
                        .get(2)
                        .and_then(Sexpr::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    visible: !is_hidden(prop),
                })
            })
            .collect();

        Ok(Component {
            reference: reference.to_string(),
            properties,
        })
    }

    /// Apply property edits to a component.
    ///
    /// Returns the number of properties a queued edit actually touched;
    /// setting visibility to its current state, or removing a property that
    /// is not there, counts as untouched.
    pub fn update_component(
        &mut self,
        reference: &str,
        edits: &BTreeMap<String, PropertyEdit>,
    ) -> Result<usize, SchError> {
        let symbol = query::find_symbol(&self.root, reference)
            .ok_or_else(|| SchError::ComponentNotFound(reference.to_string()))?;
        let source = &self.source;
        let patches = &mut self.patches;
        let generation = self.generation;

        let mut affected = 0;
        for (name, edit) in edits {
            if apply_property_edit(source, patches, generation, symbol, name, edit)? {
                affected += 1;
            }
        }
        log::debug!("update_component {reference}: {affected} properties affected");
        Ok(affected)
    }
}

fn read_property(symbol: &Sexpr, name: &str) -> String {
    query::property_value(symbol, name)
        .unwrap_or_default()
        .to_string()
}

/// How a property's hide flag is spelled in the source, if at all.
enum HideForm<'a> {
    /// `(hide yes)` / `(hide no)`: holds the yes/no atom and the state
    YesNo(&'a Sexpr, bool),
    /// A `(hide)` list with no argument
    BareList(&'a Sexpr),
    /// KiCad 6 bare `hide` atom at the tail of the effects list
    BareAtom(&'a Sexpr),
}

fn hide_form(effects: &Sexpr) -> Option<HideForm<'_>> {
    for child in effects.as_list()?.iter().skip(1) {
        if child.as_sym() == Some("hide") {
            return Some(HideForm::BareAtom(child));
        }
        let Some(items) = child.as_list() else {
            continue;
        };
        if items.first().and_then(Sexpr::as_sym) != Some("hide") {
            continue;
        }
        return Some(match items.get(1).and_then(Sexpr::as_sym) {
            Some("yes") => HideForm::YesNo(&items[1], true),
            Some("no") => HideForm::YesNo(&items[1], false),
            _ => HideForm::BareList(child),
        });
    }
    None
}

fn is_hidden(prop: &Sexpr) -> bool {
    let Some(effects) = prop.find_list("effects") else {
        return false;
    };
    match hide_form(effects) {
        Some(HideForm::YesNo(_, hidden)) => hidden,
        Some(HideForm::BareList(_) | HideForm::BareAtom(_)) => true,
        None => false,
    }
}

fn apply_property_edit(
    source: &str,
    patches: &mut PatchSet,
    generation: FormatGeneration,
    symbol: &Sexpr,
    name: &str,
    edit: &PropertyEdit,
) -> Result<bool, SchError> {
    let prop = query::property(symbol, name);

    match edit {
        PropertyEdit::Remove => {
            let Some(prop) = prop else {
                return Ok(false);
            };
            patches.delete(deletion_span(source, prop))?;
            Ok(true)
        }
        PropertyEdit::Set(value) => match prop {
            Some(prop) => {
                replace_value(patches, prop, name, value)?;
                Ok(true)
            }
            None => {
                insert_property(source, patches, generation, symbol, name, value, None)?;
                Ok(true)
            }
        },
        PropertyEdit::Entry { value, visible } => match prop {
            Some(prop) => {
                let mut touched = false;
                if let Some(value) = value {
                    replace_value(patches, prop, name, value)?;
                    touched = true;
                }
                if let Some(visible) = visible {
                    touched |= set_visibility(source, patches, generation, prop, *visible)?;
                }
                Ok(touched)
            }
            None => {
                let Some(value) = value else {
                    return Err(SchError::PropertyNotFound(name.to_string()));
                };
                insert_property(source, patches, generation, symbol, name, value, *visible)?;
                Ok(true)
            }
        },
    }
}

/// Replace just the value atom of an existing property.
fn replace_value(
    patches: &mut PatchSet,
    prop: &Sexpr,
    name: &str,
    value: &str,
) -> Result<(), SchError> {
    let atom = query::property_value_atom(prop)
        .ok_or_else(|| SchError::PropertyNotFound(name.to_string()))?;
    patches.replace_string(atom.span, value)?;
    Ok(())
}

/// Toggle a property's hide state, touching only the hide form itself.
/// Returns whether an edit was queued.
fn set_visibility(
    source: &str,
    patches: &mut PatchSet,
    generation: FormatGeneration,
    prop: &Sexpr,
    visible: bool,
) -> Result<bool, SchError> {
    let Some(effects) = prop.find_list("effects") else {
        if visible {
            // No effects list means the property is already visible
            return Ok(false);
        }
        let payload = format!("(effects {})", generation.hide_form());
        insert_last_child(source, patches, prop, &payload)?;
        return Ok(true);
    };

    match hide_form(effects) {
        Some(HideForm::YesNo(atom, hidden)) => {
            if hidden != visible {
                return Ok(false);
            }
            patches.replace_value(atom.span, &Value::Bool(!visible))?;
            Ok(true)
        }
        Some(HideForm::BareList(node) | HideForm::BareAtom(node)) => {
            if !visible {
                return Ok(false);
            }
            patches.delete(deletion_span(source, node))?;
            Ok(true)
        }
        None => {
            if visible {
                return Ok(false);
            }
            insert_last_child(source, patches, effects, generation.hide_form())?;
            Ok(true)
        }
    }
}

/// Synthesize a new property as the symbol's last child, with sibling
/// indentation. Minimal skeleton: name and value, plus a hide form only when
/// the caller explicitly asked for an invisible property.
fn insert_property(
    source: &str,
    patches: &mut PatchSet,
    generation: FormatGeneration,
    symbol: &Sexpr,
    name: &str,
    value: &str,
    visible: Option<bool>,
) -> Result<(), SchError> {
    let mut payload = format!("(property {} {}", quote_string(name), quote_string(value));
    if visible == Some(false) {
        payload.push_str(&format!(" (effects {})", generation.hide_form()));
    }
    payload.push(')');
    insert_last_child(source, patches, symbol, &payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sch_sexpr::parse;

    #[test]
    fn test_hide_form_detection() {
        let v9 = parse("(effects (font (size 1.27 1.27)) (hide yes))").unwrap();
        assert!(matches!(hide_form(&v9), Some(HideForm::YesNo(_, true))));

        let v9_no = parse("(effects (hide no))").unwrap();
        assert!(matches!(hide_form(&v9_no), Some(HideForm::YesNo(_, false))));

        let bare_list = parse("(effects (hide))").unwrap();
        assert!(matches!(hide_form(&bare_list), Some(HideForm::BareList(_))));

        let v6 = parse("(effects (font (size 1.27 1.27)) hide)").unwrap();
        assert!(matches!(hide_form(&v6), Some(HideForm::BareAtom(_))));

        let none = parse("(effects (font (size 1.27 1.27)))").unwrap();
        assert!(hide_form(&none).is_none());
    }

    #[test]
    fn test_is_hidden_across_encodings() {
        let hidden = [
            r#"(property "Footprint" "R_0603" (effects (font (size 1 1)) hide))"#,
            r#"(property "Footprint" "R_0603" (effects (hide)))"#,
            r#"(property "Footprint" "R_0603" (effects (hide yes)))"#,
        ];
        for input in hidden {
            assert!(is_hidden(&parse(input).unwrap()), "{input}");
        }

        let visible = [
            r#"(property "Value" "10k")"#,
            r#"(property "Value" "10k" (effects (font (size 1 1))))"#,
            r#"(property "Value" "10k" (effects (hide no)))"#,
        ];
        for input in visible {
            assert!(!is_hidden(&parse(input).unwrap()), "{input}");
        }
    }
}
