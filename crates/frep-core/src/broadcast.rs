#![forbid(unsafe_code)]

//! Depth-first propagation of lifecycle signals.
//!
//! A broadcast selects a run of siblings and visits each one subtree first:
//! every instance of every nested group (recursively) before the node's own
//! fields. With `reverse` both the sibling run and each nested run are walked
//! back to front.
//!
//! ```text
//! selection [n1, n2]                 visit order (forward)
//!   n1 ─ addr [a0, a1]               a0, a1, n1,
//!   n2 ─ addr [a0]                   a0, n2
//! ```
//!
//! Sibling lists are copied before iteration. A visitor may add or remove
//! instances; the walk continues over the copy and skips nodes that no longer
//! exist when their turn comes.

use crate::field::{Field, FieldKind};
use crate::model::ModelStore;
use crate::signal::{Signal, Signals};
use crate::surface::{Surface, ViewId};
use crate::tree::{GroupId, NodeId, RepeaterTree};

/// Which siblings a broadcast starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Only the node itself.
    Itself,
    /// The node's siblings from this index to the end.
    From(usize),
}

impl<S: Surface, M: ModelStore> RepeaterTree<S, M> {
    /// Dispatch `signals` over the selection.
    pub fn broadcast(
        &mut self,
        node: NodeId,
        selection: Selection,
        signals: Signals,
        reverse: bool,
    ) {
        let targets = self.select(node, selection);
        self.walk(targets, reverse, &mut |tree: &mut Self, id| tree.dispatch(id, signals));
    }

    /// Call `visit` once per node over the selection, in broadcast order.
    pub fn broadcast_with<F>(
        &mut self,
        node: NodeId,
        selection: Selection,
        reverse: bool,
        mut visit: F,
    ) where
        F: FnMut(&mut Self, NodeId),
    {
        let targets = self.select(node, selection);
        self.walk(targets, reverse, &mut visit);
    }

    /// Dispatch `signals` over a group's instances from `from` onward.
    pub(crate) fn broadcast_group(
        &mut self,
        gid: GroupId,
        from: usize,
        signals: Signals,
        reverse: bool,
    ) {
        let targets = self
            .group(gid)
            .map(|group| group.instances.get(from..).unwrap_or_default().to_vec())
            .unwrap_or_default();
        self.walk(targets, reverse, &mut |tree: &mut Self, id| tree.dispatch(id, signals));
    }

    fn select(&self, node: NodeId, selection: Selection) -> Vec<NodeId> {
        match selection {
            Selection::Itself => self.node(node).map(|_| vec![node]).unwrap_or_default(),
            Selection::From(from) => self
                .node(node)
                .and_then(|n| self.group(n.group))
                .map(|group| group.instances.get(from..).unwrap_or_default().to_vec())
                .unwrap_or_default(),
        }
    }

    fn walk(
        &mut self,
        mut targets: Vec<NodeId>,
        reverse: bool,
        visit: &mut dyn FnMut(&mut Self, NodeId),
    ) {
        if reverse {
            targets.reverse();
        }
        for id in targets {
            let Some(node) = self.node(id) else {
                continue;
            };
            let mut nested = node.groups.clone();
            if reverse {
                nested.reverse();
            }
            for gid in nested {
                let instances = self
                    .group(gid)
                    .map(|group| group.instances.clone())
                    .unwrap_or_default();
                self.walk(instances, reverse, visit);
            }
            if self.node(id).is_some() {
                visit(self, id);
            }
        }
    }

    /// Apply `signals` to one node's own fields and the count records of its
    /// nested groups. Does not recurse.
    pub fn dispatch(&mut self, node: NodeId, signals: Signals) {
        for signal in signals.signals() {
            crate::trace!(node = ?node, signal = signal.name(), "dispatch");
            if signal.touches_model() {
                self.apply_model_signal(node, signal);
            } else {
                self.rename(node);
            }
        }
    }

    fn rename(&mut self, node: NodeId) {
        let suffix = self.id_suffix(node);
        let Some(n) = self.nodes.get_mut(node.slot()).and_then(Option::as_mut) else {
            return;
        };
        for field in &mut n.fields {
            field.rename(&suffix, &mut self.surface);
        }
        for &gid in &n.groups {
            let Some(group) = self.groups.get_mut(gid.slot()).and_then(Option::as_mut) else {
                continue;
            };
            let name = format!("{}{suffix}", group.key);
            if let Some(count) = group.count.as_mut() {
                self.surface.set_field_attrs(count.view, None, &name);
                count.name = name;
            }
        }
    }

    fn apply_model_signal(&mut self, node: NodeId, signal: Signal) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let Some(n) = self.nodes.get(node.slot()).and_then(Option::as_ref) else {
            return;
        };
        for field in &n.fields {
            field.apply(signal, &mut self.surface, model);
        }
        for &gid in &n.groups {
            let Some(count) = self
                .groups
                .get(gid.slot())
                .and_then(Option::as_ref)
                .and_then(|group| group.count.as_ref())
            else {
                continue;
            };
            match signal {
                Signal::Persist | Signal::Change => {
                    model.set_value(&count.name, &count.value.to_string());
                }
                Signal::Clear => model.set_value(&count.name, ""),
                Signal::Rename | Signal::SyncToView => {}
            }
        }
    }

    /// The user edited the field behind `view`: write it to the model with
    /// change semantics. Returns `false` if no live node owns that field.
    pub fn field_changed(&mut self, view: ViewId) -> bool {
        let Some(model) = self.model.as_mut() else {
            return self.owner_of_field(view).is_some();
        };
        let Some(field) = self
            .nodes
            .iter()
            .flatten()
            .flat_map(|node| node.fields.iter())
            .find(|field| field.view() == view)
        else {
            return false;
        };
        field.apply(Signal::Change, &mut self.surface, model);
        true
    }

    /// The node owning the field behind `view`.
    #[must_use]
    pub fn owner_of_field(&self, view: ViewId) -> Option<NodeId> {
        self.iter_nodes()
            .find(|(_, node)| node.fields.iter().any(|field| field.view() == view))
            .map(|(id, _)| id)
    }

    /// Set a field's value on the surface as a user would, then fire change.
    ///
    /// A checkbox is toggled on when `value` equals its own value and off
    /// otherwise. A radio selects the option of its same-named set (within
    /// the owning node) whose own value equals `value`: that option is
    /// checked, every other option unchecked, and change fires for the
    /// selected option only. When no option matches, the set is cleared and
    /// the model entry blanked.
    pub fn input(&mut self, view: ViewId, value: &str) -> bool {
        let Some((owner, field)) = self.iter_nodes().find_map(|(id, node)| {
            node.fields
                .iter()
                .find(|field| field.view() == view)
                .map(|field| (id, field.clone()))
        }) else {
            return false;
        };
        crate::debug!(view = view.raw(), "field input");
        match field.kind() {
            FieldKind::Radio => self.select_radio(owner, &field, value),
            FieldKind::Checkbox => {
                let own = self.surface.field_state(view).value;
                self.surface.set_field_checked(view, own == value);
                self.field_changed(view)
            }
            FieldKind::Text | FieldKind::Hidden => {
                self.surface.set_field_value(view, value);
                self.field_changed(view)
            }
        }
    }

    fn select_radio(&mut self, owner: NodeId, field: &Field, value: &str) -> bool {
        let set: Vec<ViewId> = self
            .node(owner)
            .map(|node| {
                node.fields
                    .iter()
                    .filter(|other| {
                        other.kind() == FieldKind::Radio && other.base_name() == field.base_name()
                    })
                    .map(Field::view)
                    .collect()
            })
            .unwrap_or_default();

        let mut selected = None;
        for option in set {
            let on = selected.is_none() && self.surface.field_state(option).value == value;
            self.surface.set_field_checked(option, on);
            if on {
                selected = Some(option);
            }
        }

        match selected {
            Some(option) => self.field_changed(option),
            None => {
                if let Some(model) = self.model.as_mut() {
                    model.set_value(field.name(), "");
                }
                true
            }
        }
    }
}
