#![forbid(unsafe_code)]

//! Building the tree from static markup and expanding it to persisted counts.
//!
//! Mounting walks outermost-first: a node has to exist before its subtree is
//! parsed, so each group is created, its first instance stamped, and only
//! then are the groups nested inside that instance discovered. Every
//! discovered repeatable root is swapped for its built instance in place.
//!
//! Population then grows every group to the count stored in the model. A
//! nested group's count name depends on its owner's suffix, so each instance
//! is renamed before its nested groups are read.

use crate::field::Field;
use crate::model::ModelStore;
use crate::signal::Signals;
use crate::surface::{Surface, ViewId};
use crate::tree::{GroupId, NodeId, RepeaterGroup, RepeaterNode, RepeaterTree};

impl<S: Surface, M: ModelStore> RepeaterTree<S, M> {
    /// Build one group per repeatable root under `document`, each with a
    /// single seed instance. Returns the number of top-level groups found.
    pub fn mount(&mut self, document: ViewId) -> usize {
        let span = crate::debug_span!("mount");
        let _guard = span.enter();

        let mut mounted = 0;
        for (raw, key) in self.surface.repeat_roots(document) {
            let gid = self.new_group(key, None, raw);
            let node = self.build_node(raw, gid, 0);
            if let Some(view) = self.node(node).map(|n| n.view) {
                self.surface.replace(raw, view);
                self.ensure_count(gid, view);
            }
            self.roots.push(gid);
            mounted += 1;
        }
        crate::debug!(groups = mounted, nodes = self.node_count(), "mounted");
        mounted
    }

    /// Grow every group to its persisted count, then rename and sync each
    /// instance from the model, outermost first.
    pub fn populate(&mut self) {
        let span = crate::debug_span!("populate");
        let _guard = span.enter();

        for gid in self.roots.clone() {
            self.populate_group(gid);
        }
        crate::debug!(nodes = self.node_count(), "populated");
        if self.config.notify_layout_on_populate {
            self.notify_layout();
        }
    }

    /// [`mount`](Self::mount) then [`populate`](Self::populate).
    pub fn attach(&mut self, document: ViewId) -> usize {
        let mounted = self.mount(document);
        self.populate();
        mounted
    }

    /// Instance count stored in the model for `gid`, or 0 when there is no
    /// model, no record or no usable number.
    #[must_use]
    pub fn persisted_count(&self, gid: GroupId) -> usize {
        let Some(count) = self.group(gid).and_then(|group| group.count.as_ref()) else {
            return 0;
        };
        self.model
            .as_ref()
            .and_then(|model| model.get_value(&count.name))
            .map_or(0, |raw| parse_count(&raw))
    }

    fn populate_group(&mut self, gid: GroupId) {
        let Some(seed) = self.group(gid).and_then(|group| group.instances.first().copied()) else {
            return;
        };
        let stored = self.persisted_count(gid);
        let limit = self.config.max_populate_count.max(1);
        if stored > limit {
            crate::warn!(group = ?gid, stored, limit, "persisted count clamped");
        }
        let target = stored.clamp(1, limit);
        crate::trace!(group = ?gid, target, "expanding group");

        let mut last = seed;
        for _ in 1..target {
            match self.add(last, false) {
                Some(added) => last = added,
                None => break,
            }
        }

        let instances = self
            .group(gid)
            .map(|group| group.instances.clone())
            .unwrap_or_default();
        for node in instances {
            self.dispatch(node, Signals::RENAME | Signals::SYNC_TO_VIEW);
            let nested = self.node(node).map(|n| n.groups.clone()).unwrap_or_default();
            for child in nested {
                self.populate_group(child);
            }
        }
    }

    fn new_group(&mut self, key: String, owner: Option<NodeId>, raw: ViewId) -> GroupId {
        let template = self.surface.clone_view(raw);
        self.alloc_group(RepeaterGroup {
            key,
            owner,
            template,
            instances: Vec::new(),
            count: None,
        })
    }

    /// Stamp `source` into a new instance of `gid` at `index`, then build
    /// the groups nested one level inside it. The caller places the view.
    pub(crate) fn build_node(&mut self, source: ViewId, gid: GroupId, index: usize) -> NodeId {
        let view = self.surface.clone_view(source);
        let key = self.group(gid).map(|g| g.key.clone()).unwrap_or_default();
        let fields = self
            .surface
            .fields(view)
            .into_iter()
            .map(Field::from)
            .collect();
        let node = self.alloc_node(RepeaterNode {
            key,
            group: gid,
            view,
            groups: Vec::new(),
            fields,
        });
        if let Some(group) = self.group_mut(gid) {
            let at = index.min(group.instances.len());
            group.instances.insert(at, node);
        }

        for (raw, key) in self.surface.repeat_roots(view) {
            let child_gid = self.new_group(key, Some(node), raw);
            let child = self.build_node(raw, child_gid, 0);
            if let Some(child_view) = self.node(child).map(|n| n.view) {
                self.surface.replace(raw, child_view);
                self.ensure_count(child_gid, child_view);
            }
            if let Some(n) = self.node_mut(node) {
                n.groups.push(child_gid);
            }
        }
        node
    }
}

/// Leading decimal digits of `raw`, after optional whitespace and `+`.
/// Anything else, including negatives, counts as 0.
fn parse_count(raw: &str) -> usize {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().unwrap_or(0)
}
