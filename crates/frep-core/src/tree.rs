#![forbid(unsafe_code)]

//! The repeater tree: groups of sibling instances, nested arbitrarily deep.
//!
//! # Structure
//!
//! ```text
//! (synthetic root)
//!   ├─ group "item"      instances: [n0, n1]       count "item" = 2
//!   │    n0 ─ group "addr"  instances: [a0]        count "addr[0]" = 1
//!   │    n1 ─ group "addr"  instances: [a0, a1]    count "addr[1]" = 2
//!   └─ group "note"      instances: [n0]           count "note" = 1
//! ```
//!
//! Nodes and groups live in two arenas indexed by [`NodeId`] and [`GroupId`].
//! Slots are never reused within a session, so an id held across a removal
//! resolves to `None` instead of aliasing a newer instance.
//!
//! # Invariants
//!
//! 1. A group's `instances` is never empty once built; removal of the only
//!    instance is refused.
//! 2. Every live node appears in its group's `instances` exactly once; that
//!    position is its index.
//! 3. `count.value == instances.len()` after every add/remove.
//! 4. A node's suffix is derived from current positions on every call.

use std::collections::HashMap;
use std::fmt;

use crate::config::RepeaterConfig;
use crate::edit::{AddCallback, RemoveCallback};
use crate::field::Field;
use crate::layout::LayoutHook;
use crate::model::{MemoryModel, ModelStore};
use crate::surface::{Surface, ViewId};

/// Handle to a repeated instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a group of sibling instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u32);

impl GroupId {
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

/// One repeated instance.
#[derive(Debug, Clone)]
pub struct RepeaterNode {
    pub(crate) key: String,
    pub(crate) group: GroupId,
    pub(crate) view: ViewId,
    pub(crate) groups: Vec<GroupId>,
    pub(crate) fields: Vec<Field>,
}

impl RepeaterNode {
    /// Key of the group this node instantiates.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owning group.
    #[must_use]
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// The node's visual representation.
    #[must_use]
    pub fn view(&self) -> ViewId {
        self.view
    }

    /// Nested groups, in markup order.
    #[must_use]
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// Fields owned directly by this node.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field by static name.
    #[must_use]
    pub fn field(&self, base_name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.base_name() == base_name)
    }
}

/// The persistent count record of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRecord {
    pub(crate) view: ViewId,
    pub(crate) name: String,
    pub(crate) value: usize,
}

impl CountRecord {
    /// The hidden count element.
    #[must_use]
    pub fn view(&self) -> ViewId {
        self.view
    }

    /// Effective model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance count at the last resynchronization.
    #[must_use]
    pub fn value(&self) -> usize {
        self.value
    }
}

/// All sibling instances of one template at one tree position.
#[derive(Debug, Clone)]
pub struct RepeaterGroup {
    pub(crate) key: String,
    pub(crate) owner: Option<NodeId>,
    pub(crate) template: ViewId,
    pub(crate) instances: Vec<NodeId>,
    pub(crate) count: Option<CountRecord>,
}

impl RepeaterGroup {
    /// Group key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Enclosing instance, or `None` for a top-level group.
    #[must_use]
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Detached snapshot new instances are stamped from.
    #[must_use]
    pub fn template(&self) -> ViewId {
        self.template
    }

    /// Instances in display order.
    #[must_use]
    pub fn instances(&self) -> &[NodeId] {
        &self.instances
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the group has no instances (only during construction).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The count record, once the group has had an instance placed.
    #[must_use]
    pub fn count(&self) -> Option<&CountRecord> {
        self.count.as_ref()
    }
}

/// A tree of repeatable groups mirrored onto a [`Surface`] and synchronized
/// with an optional [`ModelStore`].
///
/// Built with [`mount`](Self::mount) and expanded with
/// [`populate`](Self::populate), or both at once with
/// [`attach`](Self::attach). The caller owns the tree; there is no global
/// registry.
pub struct RepeaterTree<S, M = MemoryModel> {
    pub(crate) surface: S,
    pub(crate) model: Option<M>,
    pub(crate) layout: Option<Box<dyn LayoutHook>>,
    pub(crate) config: RepeaterConfig,
    pub(crate) nodes: Vec<Option<RepeaterNode>>,
    pub(crate) groups: Vec<Option<RepeaterGroup>>,
    pub(crate) roots: Vec<GroupId>,
    pub(crate) add_callbacks: HashMap<String, AddCallback<S, M>>,
    pub(crate) remove_callbacks: HashMap<String, RemoveCallback<S, M>>,
}

impl<S: Surface, M: ModelStore> RepeaterTree<S, M> {
    /// Create an empty tree over `surface` with no model attached.
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            model: None,
            layout: None,
            config: RepeaterConfig::default(),
            nodes: Vec::new(),
            groups: Vec::new(),
            roots: Vec::new(),
            add_callbacks: HashMap::new(),
            remove_callbacks: HashMap::new(),
        }
    }

    /// Attach a model store.
    #[must_use]
    pub fn with_model(mut self, model: M) -> Self {
        self.model = Some(model);
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RepeaterConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a layout hook.
    #[must_use]
    pub fn with_layout(mut self, hook: impl LayoutHook + 'static) -> Self {
        self.layout = Some(Box::new(hook));
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &RepeaterConfig {
        &self.config
    }

    /// The visual surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the visual surface, e.g. to simulate user input.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The model store, if attached.
    #[must_use]
    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    /// Mutable access to the model store, if attached.
    pub fn model_mut(&mut self) -> Option<&mut M> {
        self.model.as_mut()
    }

    /// Tear the tree down, handing back its collaborators.
    pub fn into_parts(self) -> (S, Option<M>) {
        (self.surface, self.model)
    }

    /// Top-level groups in document order.
    #[must_use]
    pub fn roots(&self) -> &[GroupId] {
        &self.roots
    }

    /// A live node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&RepeaterNode> {
        self.nodes.get(id.slot()).and_then(Option::as_ref)
    }

    /// A live group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&RepeaterGroup> {
        self.groups.get(id.slot()).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut RepeaterNode> {
        self.nodes.get_mut(id.slot()).and_then(Option::as_mut)
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Option<&mut RepeaterGroup> {
        self.groups.get_mut(id.slot()).and_then(Option::as_mut)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Iterate live nodes.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &RepeaterNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(slot, node)| Some((NodeId(slot as u32), node.as_ref()?)))
    }

    /// Iterate live groups.
    pub fn iter_groups(&self) -> impl Iterator<Item = (GroupId, &RepeaterGroup)> {
        self.groups
            .iter()
            .enumerate()
            .filter_map(|(slot, group)| Some((GroupId(slot as u32), group.as_ref()?)))
    }

    /// Position of `node` among its siblings, or `None` once detached.
    #[must_use]
    pub fn index(&self, node: NodeId) -> Option<usize> {
        let group = self.group(self.node(node)?.group)?;
        group.instances.iter().position(|&id| id == node)
    }

    /// Bracketed index path from the outermost ancestor down to `node`,
    /// e.g. `[2][0]`. Recomputed on every call.
    #[must_use]
    pub fn id_suffix(&self, node: NodeId) -> String {
        let mut indices = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(index) = self.index(id) else {
                break;
            };
            indices.push(index);
            current = self
                .node(id)
                .and_then(|n| self.group(n.group))
                .and_then(|g| g.owner);
        }
        indices.iter().rev().map(|index| format!("[{index}]")).collect()
    }

    /// Effective name a field with static name `base` would carry in `node`.
    #[must_use]
    pub fn effective_name(&self, node: NodeId, base: &str) -> String {
        format!("{base}{}", self.id_suffix(node))
    }

    /// Resolve a path like `item[1].addr[0]`. A segment without an index
    /// means index 0.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut candidates: &[GroupId] = &self.roots;
        let mut found = None;
        for segment in path.split('.') {
            let (key, index) = parse_segment(segment)?;
            let group = candidates
                .iter()
                .filter_map(|&gid| self.group(gid))
                .find(|group| group.key == key)?;
            let node = *group.instances.get(index)?;
            candidates = &self.node(node)?.groups;
            found = Some(node);
        }
        found
    }

    /// Instances of the first top-level group keyed `key`.
    #[must_use]
    pub fn root_instances(&self, key: &str) -> &[NodeId] {
        self.roots
            .iter()
            .filter_map(|&gid| self.group(gid))
            .find(|group| group.key == key)
            .map(|group| group.instances.as_slice())
            .unwrap_or_default()
    }

    /// Nested group keyed `key` inside `node`.
    #[must_use]
    pub fn nested(&self, node: NodeId, key: &str) -> Option<GroupId> {
        self.node(node)?
            .groups
            .iter()
            .copied()
            .find(|&gid| self.group(gid).is_some_and(|group| group.key == key))
    }

    pub(crate) fn alloc_node(&mut self, node: RepeaterNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    pub(crate) fn alloc_group(&mut self, group: RepeaterGroup) -> GroupId {
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(Some(group));
        id
    }

    /// Create the group's count record on first placement. Idempotent.
    pub(crate) fn ensure_count(&mut self, gid: GroupId, anchor: ViewId) {
        let Some(group) = self.group(gid) else {
            return;
        };
        if group.count.is_some() {
            return;
        }
        let name = match group.owner {
            Some(owner) => format!("{}{}", group.key, self.id_suffix(owner)),
            None => group.key.clone(),
        };
        let value = group.instances.len();
        let view = self.surface.attach_count(anchor, &name);
        self.surface.set_field_value(view, &value.to_string());
        if let Some(group) = self.group_mut(gid) {
            group.count = Some(CountRecord { view, name, value });
        }
    }

    /// Resynchronize the count record to `instances.len()` and tell the model.
    pub(crate) fn sync_count(&mut self, gid: GroupId) {
        let Some(group) = self.groups.get_mut(gid.slot()).and_then(Option::as_mut) else {
            return;
        };
        let len = group.instances.len();
        let Some(count) = group.count.as_mut() else {
            return;
        };
        count.value = len;
        let value = len.to_string();
        self.surface.set_field_value(count.view, &value);
        if let Some(model) = self.model.as_mut() {
            model.set_value(&count.name, &value);
        }
    }

    pub(crate) fn notify_layout(&mut self) {
        if let Some(layout) = self.layout.as_mut() {
            layout.structure_changed();
        }
    }

    /// Drop `node` and everything nested in it from the arenas.
    pub(crate) fn release(&mut self, node: NodeId) {
        let Some(released) = self.nodes.get_mut(node.slot()).and_then(Option::take) else {
            return;
        };
        for gid in released.groups {
            let Some(group) = self.groups.get_mut(gid.slot()).and_then(Option::take) else {
                continue;
            };
            self.surface.remove(group.template);
            for child in group.instances {
                self.release(child);
            }
        }
    }
}

/// Split `addr[3]` into `("addr", 3)`; a bare key means index 0.
fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    let segment = segment.trim();
    match segment.split_once('[') {
        Some((key, rest)) => {
            let index = rest.strip_suffix(']')?.trim().parse().ok()?;
            (!key.is_empty()).then_some((key, index))
        }
        None => (!segment.is_empty()).then_some((segment, 0)),
    }
}

impl<S: fmt::Debug, M: fmt::Debug> fmt::Debug for RepeaterTree<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeaterTree")
            .field("surface", &self.surface)
            .field("model", &self.model)
            .field("config", &self.config)
            .field("roots", &self.roots)
            .field("nodes", &self.nodes.iter().flatten().count())
            .field("groups", &self.groups.iter().flatten().count())
            .field("add_callbacks", &self.add_callbacks.len())
            .field("remove_callbacks", &self.remove_callbacks.len())
            .finish()
    }
}
