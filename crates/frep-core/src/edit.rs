#![forbid(unsafe_code)]

//! Adding and removing instances.
//!
//! Both operations shift sibling indices, so both end with a rename+persist
//! broadcast over every sibling whose position changed. Ordering matters
//! because a field reads and writes the model under its *current* effective
//! name until it is renamed:
//!
//! | Step | Add (user-initiated) | Remove |
//! |------|----------------------|--------|
//! | 1 | stamp template after `after` | refuse if only one instance |
//! | 2 | place view, resync count | clear last sibling (configurable) |
//! | 3 | rename+persist from new index | detach, resync count |
//! | 4 | clear new instance | clear removed instance |
//! | 5 | notify layout | rename+persist from former index |
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `add` on a stale node | returns `None`, nothing changes |
//! | `remove` of the only instance | returns `false`, no signals, no writes |
//! | callback replaced during its own run | the replacement wins |

use crate::broadcast::Selection;
use crate::model::ModelStore;
use crate::signal::Signals;
use crate::surface::Surface;
use crate::tree::{NodeId, RepeaterTree};

/// Called after a click-driven add with the new instance.
pub type AddCallback<S, M> = Box<dyn FnMut(&mut RepeaterTree<S, M>, NodeId)>;

/// Called after a click-driven removal.
pub type RemoveCallback<S, M> = Box<dyn FnMut(&mut RepeaterTree<S, M>, &RemovedInstance)>;

/// What a successful removal took out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedInstance {
    /// Group key of the removed instance.
    pub key: String,
    /// Its index before removal.
    pub index: usize,
    /// Its suffix before removal, e.g. `[1][0]`.
    pub suffix: String,
}

impl<S: Surface, M: ModelStore> RepeaterTree<S, M> {
    /// Insert a new instance directly after `after`, stamped from the group
    /// template.
    ///
    /// A user-initiated add renames and re-persists every shifted sibling,
    /// clears the new instance and notifies the layout hook. A programmatic
    /// add leaves naming to the caller. Returns the new node, or `None` if
    /// `after` is not a live node.
    pub fn add(&mut self, after: NodeId, user_initiated: bool) -> Option<NodeId> {
        let (gid, anchor) = self.node(after).map(|n| (n.group, n.view))?;
        let index = self.index(after)? + 1;
        let template = self.group(gid)?.template;

        let added = self.build_node(template, gid, index);
        let view = self.node(added)?.view;
        self.surface.insert_after(anchor, view);
        self.sync_count(gid);
        crate::debug!(
            node = ?added,
            index,
            user_initiated,
            "added instance"
        );

        if user_initiated {
            let reverse = self.config.add_traversal.is_reverse();
            self.broadcast_group(gid, index, Signals::RENAME | Signals::PERSIST, reverse);
            self.broadcast(added, Selection::Itself, Signals::CLEAR, false);
            self.notify_layout();
        }
        Some(added)
    }

    /// Remove `node` and renumber the siblings after it.
    ///
    /// Refused (returns `false`) when `node` is the group's only instance or
    /// is not live.
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.remove_instance(node).is_some()
    }

    fn remove_instance(&mut self, node: NodeId) -> Option<RemovedInstance> {
        let (gid, view, key) = self.node(node).map(|n| (n.group, n.view, n.key.clone()))?;
        let group = self.group(gid)?;
        if group.instances.len() <= 1 {
            crate::debug!(node = ?node, key = %key, "refused removal of last instance");
            return None;
        }
        let last = *group.instances.last()?;
        let index = self.index(node)?;
        let suffix = self.id_suffix(node);

        if node != last && self.config.clear_last_on_remove {
            self.broadcast(last, Selection::Itself, Signals::CLEAR, false);
        }

        if let Some(group) = self.group_mut(gid) {
            group.instances.remove(index);
        }
        self.surface.remove(view);
        self.sync_count(gid);

        // Still carries its pre-removal names, so this clears its old slots.
        self.broadcast(node, Selection::Itself, Signals::CLEAR, false);
        self.broadcast_group(gid, index, Signals::RENAME | Signals::PERSIST, false);
        self.release(node);

        crate::debug!(key = %key, index, suffix = %suffix, "removed instance");
        Some(RemovedInstance { key, index, suffix })
    }

    /// Register the add callback for group `key`, replacing any previous one.
    pub fn on_add<F>(&mut self, key: impl Into<String>, callback: F)
    where
        F: FnMut(&mut RepeaterTree<S, M>, NodeId) + 'static,
    {
        self.add_callbacks.insert(key.into(), Box::new(callback));
    }

    /// Register the remove callback for group `key`, replacing any previous
    /// one.
    pub fn on_remove<F>(&mut self, key: impl Into<String>, callback: F)
    where
        F: FnMut(&mut RepeaterTree<S, M>, &RemovedInstance) + 'static,
    {
        self.remove_callbacks.insert(key.into(), Box::new(callback));
    }

    /// The add control of `after` was clicked: user-initiated add, then the
    /// group's add callback.
    pub fn click_add(&mut self, after: NodeId) -> Option<NodeId> {
        let added = self.add(after, true)?;
        let key = self.node(added)?.key.clone();
        if let Some(mut callback) = self.add_callbacks.remove(&key) {
            callback(self, added);
            self.add_callbacks.entry(key).or_insert(callback);
        }
        Some(added)
    }

    /// The remove control of `node` was clicked: remove, then the group's
    /// remove callback if the removal went through.
    pub fn click_remove(&mut self, node: NodeId) -> Option<RemovedInstance> {
        let removed = self.remove_instance(node)?;
        if let Some(mut callback) = self.remove_callbacks.remove(&removed.key) {
            callback(self, &removed);
            self.remove_callbacks
                .entry(removed.key.clone())
                .or_insert(callback);
        }
        Some(removed)
    }
}
