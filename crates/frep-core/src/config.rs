#![forbid(unsafe_code)]

//! Engine configuration.

/// Direction in which a user-initiated add renames and re-persists the
/// shifted siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddTraversal {
    /// Front to back, starting at the new instance.
    #[default]
    Forward,
    /// Back to front, ending at the new instance. No sibling ever takes a
    /// name still held by a sibling that has not been renamed yet, which
    /// matters for surfaces that enforce exclusivity on same-named radios.
    Reverse,
}

impl AddTraversal {
    /// Whether the traversal runs back to front.
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        matches!(self, AddTraversal::Reverse)
    }

    /// Parse `forward` / `reverse` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "forward" => Some(AddTraversal::Forward),
            "reverse" => Some(AddTraversal::Reverse),
            _ => None,
        }
    }
}

/// Default for [`RepeaterConfig::max_populate_count`].
pub const DEFAULT_MAX_POPULATE_COUNT: usize = 10_000;

/// Configuration for a [`RepeaterTree`](crate::RepeaterTree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeaterConfig {
    /// Rename/persist direction after a user-initiated add.
    /// Default: [`AddTraversal::Forward`].
    pub add_traversal: AddTraversal,

    /// Clear the last sibling's model entries before removing any other
    /// sibling. The last slot is vacated by the shift, so its entries would
    /// otherwise linger. Default: true.
    pub clear_last_on_remove: bool,

    /// Call the layout hook once population finishes. Default: true.
    pub notify_layout_on_populate: bool,

    /// Upper bound on the instances population creates for one group. A
    /// larger persisted count is clamped and logged. Default: 10 000.
    pub max_populate_count: usize,
}

impl Default for RepeaterConfig {
    fn default() -> Self {
        Self {
            add_traversal: AddTraversal::Forward,
            clear_last_on_remove: true,
            notify_layout_on_populate: true,
            max_populate_count: DEFAULT_MAX_POPULATE_COUNT,
        }
    }
}

impl RepeaterConfig {
    /// Set the add traversal direction.
    #[must_use]
    pub fn with_add_traversal(mut self, traversal: AddTraversal) -> Self {
        self.add_traversal = traversal;
        self
    }

    /// Set whether removal clears the last sibling first.
    #[must_use]
    pub fn with_clear_last_on_remove(mut self, clear: bool) -> Self {
        self.clear_last_on_remove = clear;
        self
    }

    /// Set whether population notifies the layout hook.
    #[must_use]
    pub fn with_notify_layout_on_populate(mut self, notify: bool) -> Self {
        self.notify_layout_on_populate = notify;
        self
    }

    /// Set the per-group population limit.
    #[must_use]
    pub fn with_max_populate_count(mut self, max: usize) -> Self {
        self.max_populate_count = max;
        self
    }
}
