#![forbid(unsafe_code)]

//! The visual surface the engine mirrors its tree onto.
//!
//! The engine never owns visual nodes. It holds [`ViewId`] handles and asks a
//! [`Surface`] to clone, place and remove them, to find repeatable roots and
//! fields under a scope, and to read or write field state. Any document
//! model can sit behind the trait; [`MemorySurface`] is an arena-backed one
//! used by tests and the harness.
//!
//! # Discovery contract
//!
//! Both queries are depth-scoped: they look at descendants of `scope` but do
//! not descend into a repeatable root. [`Surface::repeat_roots`] therefore
//! returns only the next nesting level, and [`Surface::fields`] returns only
//! the fields owned by the scope's own level.

mod markup;
mod memory;

pub use markup::{Markup, MarkupError};
pub use memory::MemorySurface;

use crate::field::FieldKind;

/// Opaque handle to a node on the visual surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u32);

impl ViewId {
    /// Wrap a raw surface index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw surface index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A field as declared in markup, reported by [`Surface::fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub view: ViewId,
    pub kind: FieldKind,
    /// Static id, if the element has one.
    pub id: Option<String>,
    /// Static name. Unnamed inputs are not fields.
    pub name: String,
}

/// What the user currently sees in a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub checked: bool,
}

/// Visual surface collaborator.
///
/// Handles passed in are always ones the surface produced. Operations on a
/// handle that has since been removed should be ignored rather than panic.
pub trait Surface {
    /// Deep-copy `view` into a new detached node.
    fn clone_view(&mut self, view: ViewId) -> ViewId;

    /// Place `view` directly after `anchor` under `anchor`'s parent.
    fn insert_after(&mut self, anchor: ViewId, view: ViewId);

    /// Put `new` where `old` is and drop `old`.
    fn replace(&mut self, old: ViewId, new: ViewId);

    /// Detach `view` and drop it.
    fn remove(&mut self, view: ViewId);

    /// Repeatable roots one nesting level below `scope`, with their group keys.
    fn repeat_roots(&self, scope: ViewId) -> Vec<(ViewId, String)>;

    /// Named, input-capable fields owned by `scope`'s own level.
    fn fields(&self, scope: ViewId) -> Vec<FieldDecl>;

    /// Current value and checked state of a field.
    fn field_state(&self, view: ViewId) -> FieldState;

    /// Set a field's value.
    fn set_field_value(&mut self, view: ViewId, value: &str);

    /// Set a field's checked state.
    fn set_field_checked(&mut self, view: ViewId, checked: bool);

    /// Set a field's effective id and name.
    fn set_field_attrs(&mut self, view: ViewId, id: Option<&str>, name: &str);

    /// Create a hidden count element named `name` in `anchor`'s parent scope.
    fn attach_count(&mut self, anchor: ViewId, name: &str) -> ViewId;
}
