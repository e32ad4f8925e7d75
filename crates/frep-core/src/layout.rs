#![forbid(unsafe_code)]

//! Layout collaborator.

/// Notified when the visible structure changed: after a user-initiated add
/// and once population finishes.
pub trait LayoutHook {
    /// Instances were added or populated; re-run whatever layout depends on
    /// the document's shape.
    fn structure_changed(&mut self);
}

impl<F: FnMut()> LayoutHook for F {
    fn structure_changed(&mut self) {
        self();
    }
}
