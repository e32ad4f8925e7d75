#![forbid(unsafe_code)]

//! Data-entry fields owned by a repeated instance.
//!
//! A [`Field`] remembers the static id/name it was declared with and the
//! effective id/name it carries after the last rename. All model traffic uses
//! the effective name, so a field that has not been renamed since it shifted
//! still reads and writes its old slot; the broadcast order in
//! [`crate::edit`] relies on that.
//!
//! | Signal | Text / Hidden | Checkbox | Radio |
//! |--------|---------------|----------|-------|
//! | persist | value | value if checked, else `""` | value if checked, else no write |
//! | change | value | value if checked, else `""` | value |
//! | sync-to-view | value ← model | checked ← (value == model) | checked ← (value == model) |
//! | clear | `""` | `""` | `""` |

use crate::model::ModelStore;
use crate::signal::Signal;
use crate::surface::{FieldDecl, FieldState, Surface, ViewId};

/// Kind of input behind a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum FieldKind {
    /// Free text (also covers selects, numbers, textareas).
    #[default]
    Text,
    /// Boolean toggle carrying a value when checked.
    Checkbox,
    /// One option of a same-named radio set.
    Radio,
    /// Invisible value holder.
    Hidden,
}

impl FieldKind {
    /// Whether the field's checked state, not its value, is what changes.
    #[must_use]
    pub const fn is_checkable(self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio)
    }
}

/// A leaf data-entry point owned directly by one repeated instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    view: ViewId,
    kind: FieldKind,
    base_id: Option<String>,
    base_name: String,
    id: Option<String>,
    name: String,
}

impl Field {
    /// Create a field from its static declaration.
    #[must_use]
    pub fn new(view: ViewId, kind: FieldKind, base_id: Option<String>, base_name: String) -> Self {
        Self {
            view,
            kind,
            id: base_id.clone(),
            name: base_name.clone(),
            base_id,
            base_name,
        }
    }

    /// The input element on the surface.
    #[must_use]
    pub fn view(&self) -> ViewId {
        self.view
    }

    /// Input kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Static name from the markup.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Static id from the markup, if any.
    #[must_use]
    pub fn base_id(&self) -> Option<&str> {
        self.base_id.as_deref()
    }

    /// Effective name after the last rename.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective id after the last rename.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Re-derive id and name from `suffix` and push them to the surface.
    pub(crate) fn rename<S: Surface + ?Sized>(&mut self, suffix: &str, surface: &mut S) {
        self.name = format!("{}{suffix}", self.base_name);
        self.id = self.base_id.as_ref().map(|id| format!("{id}{suffix}"));
        surface.set_field_attrs(self.view, self.id.as_deref(), &self.name);
    }

    /// Apply one model-touching signal.
    pub(crate) fn apply<S, M>(&self, signal: Signal, surface: &mut S, model: &mut M)
    where
        S: Surface + ?Sized,
        M: ModelStore + ?Sized,
    {
        match signal {
            Signal::Rename => {}
            Signal::SyncToView => {
                let stored = model.get_value(&self.name).unwrap_or_default();
                if self.kind.is_checkable() {
                    let own = surface.field_state(self.view).value;
                    surface.set_field_checked(self.view, own == stored);
                } else {
                    surface.set_field_value(self.view, &stored);
                }
            }
            Signal::Persist | Signal::Change => {
                let state = surface.field_state(self.view);
                if let Some(value) = outgoing_value(self.kind, signal, &state) {
                    model.set_value(&self.name, &value);
                }
            }
            Signal::Clear => model.set_value(&self.name, ""),
        }
    }
}

impl From<FieldDecl> for Field {
    fn from(decl: FieldDecl) -> Self {
        Field::new(decl.view, decl.kind, decl.id, decl.name)
    }
}

/// The value a persist or change writes for a field in `state`, or `None`
/// when nothing should be written.
#[must_use]
pub fn outgoing_value(kind: FieldKind, signal: Signal, state: &FieldState) -> Option<String> {
    match (kind, signal) {
        (FieldKind::Checkbox, Signal::Persist | Signal::Change) => Some(if state.checked {
            state.value.clone()
        } else {
            String::new()
        }),
        // An unchecked radio must not clobber the checked option of its set.
        (FieldKind::Radio, Signal::Persist) => state.checked.then(|| state.value.clone()),
        (_, Signal::Persist | Signal::Change) => Some(state.value.clone()),
        _ => None,
    }
}
