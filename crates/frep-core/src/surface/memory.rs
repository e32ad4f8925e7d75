#![forbid(unsafe_code)]

//! Arena-backed in-memory document implementing [`Surface`].

use std::fmt::Write as _;

use super::{FieldDecl, FieldState, Markup, MarkupError, Surface, ViewId};
use crate::field::FieldKind;

#[derive(Debug, Clone)]
enum ElementKind {
    Block {
        repeat: Option<String>,
    },
    Input {
        kind: FieldKind,
        id: Option<String>,
        name: Option<String>,
        state: FieldState,
    },
    Button {
        label: String,
    },
}

#[derive(Debug, Clone)]
struct Element {
    kind: ElementKind,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
    alive: bool,
}

/// In-memory document tree.
///
/// Elements live in an append-only arena; removal marks a subtree dead and
/// detaches it, so stale handles stay valid indices and are simply ignored.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    elements: Vec<Element>,
}

impl MemorySurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `markup` and load it as a new document.
    ///
    /// Returns the surface and the document root.
    pub fn from_markup(markup: &Markup) -> Result<(Self, ViewId), MarkupError> {
        let mut surface = Self::new();
        let root = surface.load(markup)?;
        Ok((surface, root))
    }

    /// Validate `markup` and load it as a detached tree.
    pub fn load(&mut self, markup: &Markup) -> Result<ViewId, MarkupError> {
        markup.validate()?;
        Ok(self.load_unchecked(markup, None))
    }

    fn load_unchecked(&mut self, markup: &Markup, parent: Option<ViewId>) -> ViewId {
        let (kind, children) = match markup {
            Markup::Block { repeat, children } => (
                ElementKind::Block {
                    repeat: repeat.clone(),
                },
                children.as_slice(),
            ),
            Markup::Field {
                kind,
                id,
                name,
                value,
                checked,
            } => (
                ElementKind::Input {
                    kind: *kind,
                    id: id.clone(),
                    name: name.clone(),
                    state: FieldState {
                        value: value.clone(),
                        checked: *checked,
                    },
                },
                &[][..],
            ),
            Markup::Button { label } => (
                ElementKind::Button {
                    label: label.clone(),
                },
                &[][..],
            ),
        };
        let view = self.push(kind, parent);
        for child in children {
            let child = self.load_unchecked(child, Some(view));
            self.elements[view.raw() as usize].children.push(child);
        }
        view
    }

    fn push(&mut self, kind: ElementKind, parent: Option<ViewId>) -> ViewId {
        let view = ViewId::new(self.elements.len() as u32);
        self.elements.push(Element {
            kind,
            parent,
            children: Vec::new(),
            alive: true,
        });
        view
    }

    fn get(&self, view: ViewId) -> Option<&Element> {
        self.elements
            .get(view.raw() as usize)
            .filter(|element| element.alive)
    }

    fn get_mut(&mut self, view: ViewId) -> Option<&mut Element> {
        self.elements
            .get_mut(view.raw() as usize)
            .filter(|element| element.alive)
    }

    /// Whether `view` has not been removed.
    #[must_use]
    pub fn is_alive(&self, view: ViewId) -> bool {
        self.get(view).is_some()
    }

    /// Parent of `view`, if attached.
    #[must_use]
    pub fn parent(&self, view: ViewId) -> Option<ViewId> {
        self.get(view).and_then(|element| element.parent)
    }

    /// Children of `view`, in order.
    #[must_use]
    pub fn children(&self, view: ViewId) -> &[ViewId] {
        self.get(view)
            .map(|element| element.children.as_slice())
            .unwrap_or_default()
    }

    /// Group key of a repeatable block.
    #[must_use]
    pub fn repeat_key(&self, view: ViewId) -> Option<&str> {
        match &self.get(view)?.kind {
            ElementKind::Block { repeat } => repeat.as_deref(),
            _ => None,
        }
    }

    /// Effective name of an input.
    #[must_use]
    pub fn field_name(&self, view: ViewId) -> Option<&str> {
        match &self.get(view)?.kind {
            ElementKind::Input { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Effective id of an input.
    #[must_use]
    pub fn field_id(&self, view: ViewId) -> Option<&str> {
        match &self.get(view)?.kind {
            ElementKind::Input { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    /// First input under `root` (document order) whose effective name is `name`.
    #[must_use]
    pub fn find_field(&self, root: ViewId, name: &str) -> Option<ViewId> {
        if self.field_name(root) == Some(name) {
            return Some(root);
        }
        self.children(root)
            .iter()
            .find_map(|&child| self.find_field(child, name))
    }

    /// Every input name under `root`, in document order.
    #[must_use]
    pub fn field_names(&self, root: ViewId) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_names(root, &mut out);
        out
    }

    fn collect_names(&self, view: ViewId, out: &mut Vec<String>) {
        if let Some(name) = self.field_name(view) {
            out.push(name.to_string());
        }
        for &child in self.children(view) {
            self.collect_names(child, out);
        }
    }

    /// Indented text dump of the subtree at `root`.
    #[must_use]
    pub fn render(&self, root: ViewId) -> String {
        let mut out = String::new();
        self.render_into(root, 0, &mut out);
        out
    }

    fn render_into(&self, view: ViewId, depth: usize, out: &mut String) {
        let Some(element) = self.get(view) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let _ = match &element.kind {
            ElementKind::Block { repeat: Some(key) } => writeln!(out, "{indent}[{key}]"),
            ElementKind::Block { repeat: None } => writeln!(out, "{indent}block"),
            ElementKind::Input {
                kind, name, state, ..
            } => {
                let name = name.as_deref().unwrap_or("-");
                if kind.is_checkable() {
                    let mark = if state.checked { "x" } else { " " };
                    writeln!(out, "{indent}{name} [{mark}] {:?}", state.value)
                } else {
                    writeln!(out, "{indent}{name} = {:?}", state.value)
                }
            }
            ElementKind::Button { label } => writeln!(out, "{indent}({label})"),
        };
        for &child in &element.children {
            self.render_into(child, depth + 1, out);
        }
    }

    fn detach(&mut self, view: ViewId) {
        let Some(parent) = self.get(view).and_then(|element| element.parent) else {
            return;
        };
        if let Some(parent) = self.get_mut(parent) {
            parent.children.retain(|&child| child != view);
        }
        if let Some(element) = self.get_mut(view) {
            element.parent = None;
        }
    }

    fn kill(&mut self, view: ViewId) {
        let children = self.children(view).to_vec();
        for child in children {
            self.kill(child);
        }
        if let Some(element) = self.get_mut(view) {
            element.alive = false;
        }
    }

    fn deep_clone(&mut self, view: ViewId, parent: Option<ViewId>) -> Option<ViewId> {
        let element = self.get(view)?;
        let kind = element.kind.clone();
        let children = element.children.clone();
        let copy = self.push(kind, parent);
        for child in children {
            if let Some(child_copy) = self.deep_clone(child, Some(copy)) {
                self.elements[copy.raw() as usize].children.push(child_copy);
            }
        }
        Some(copy)
    }

    #[allow(clippy::type_complexity)]
    fn input_mut(
        &mut self,
        view: ViewId,
    ) -> Option<(&mut Option<String>, &mut Option<String>, &mut FieldState)> {
        match &mut self.get_mut(view)?.kind {
            ElementKind::Input { id, name, state, .. } => Some((id, name, state)),
            _ => None,
        }
    }

    fn walk_scope<F>(&self, scope: ViewId, visit: &mut F)
    where
        F: FnMut(ViewId, &Element) -> bool,
    {
        for &child in self.children(scope) {
            if let Some(element) = self.get(child)
                && visit(child, element)
            {
                self.walk_scope(child, visit);
            }
        }
    }
}

impl Surface for MemorySurface {
    fn clone_view(&mut self, view: ViewId) -> ViewId {
        // Cloning a dead handle yields a fresh empty block rather than panicking.
        match self.deep_clone(view, None) {
            Some(copy) => copy,
            None => self.push(ElementKind::Block { repeat: None }, None),
        }
    }

    fn insert_after(&mut self, anchor: ViewId, view: ViewId) {
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        self.detach(view);
        if let Some(element) = self.get_mut(parent) {
            let at = element
                .children
                .iter()
                .position(|&child| child == anchor)
                .map_or(element.children.len(), |pos| pos + 1);
            element.children.insert(at, view);
        }
        if let Some(element) = self.get_mut(view) {
            element.parent = Some(parent);
        }
    }

    fn replace(&mut self, old: ViewId, new: ViewId) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        self.detach(new);
        if let Some(element) = self.get_mut(parent)
            && let Some(slot) = element.children.iter_mut().find(|child| **child == old)
        {
            *slot = new;
        }
        if let Some(element) = self.get_mut(new) {
            element.parent = Some(parent);
        }
        if let Some(element) = self.get_mut(old) {
            element.parent = None;
        }
        self.kill(old);
    }

    fn remove(&mut self, view: ViewId) {
        self.detach(view);
        self.kill(view);
    }

    fn repeat_roots(&self, scope: ViewId) -> Vec<(ViewId, String)> {
        let mut roots = Vec::new();
        self.walk_scope(scope, &mut |view, element| match &element.kind {
            ElementKind::Block { repeat: Some(key) } => {
                roots.push((view, key.clone()));
                false
            }
            _ => true,
        });
        roots
    }

    fn fields(&self, scope: ViewId) -> Vec<FieldDecl> {
        let mut fields = Vec::new();
        self.walk_scope(scope, &mut |view, element| match &element.kind {
            ElementKind::Block { repeat } => repeat.is_none(),
            ElementKind::Input {
                kind,
                id,
                name: Some(name),
                ..
            } => {
                fields.push(FieldDecl {
                    view,
                    kind: *kind,
                    id: id.clone(),
                    name: name.clone(),
                });
                false
            }
            ElementKind::Input { name: None, .. } | ElementKind::Button { .. } => false,
        });
        fields
    }

    fn field_state(&self, view: ViewId) -> FieldState {
        match self.get(view).map(|element| &element.kind) {
            Some(ElementKind::Input { state, .. }) => state.clone(),
            _ => FieldState::default(),
        }
    }

    fn set_field_value(&mut self, view: ViewId, value: &str) {
        if let Some((_, _, state)) = self.input_mut(view) {
            state.value = value.to_string();
        }
    }

    fn set_field_checked(&mut self, view: ViewId, checked: bool) {
        if let Some((_, _, state)) = self.input_mut(view) {
            state.checked = checked;
        }
    }

    fn set_field_attrs(&mut self, view: ViewId, new_id: Option<&str>, new_name: &str) {
        if let Some((id, name, _)) = self.input_mut(view) {
            *id = new_id.map(str::to_string);
            *name = Some(new_name.to_string());
        }
    }

    fn attach_count(&mut self, anchor: ViewId, name: &str) -> ViewId {
        let parent = self.parent(anchor);
        let count = self.push(
            ElementKind::Input {
                kind: FieldKind::Hidden,
                id: None,
                name: Some(name.to_string()),
                state: FieldState::default(),
            },
            parent,
        );
        if let Some(parent) = parent
            && let Some(element) = self.get_mut(parent)
        {
            element.children.push(count);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> (MemorySurface, ViewId) {
        MemorySurface::from_markup(&Markup::block(vec![Markup::repeat("item", vec![
            Markup::text("name").with_id("n"),
            Markup::button("item_add"),
            Markup::Field {
                kind: FieldKind::Text,
                id: None,
                name: None,
                value: String::new(),
                checked: false,
            },
            Markup::block(vec![Markup::repeat("addr", vec![Markup::text("street")])]),
        ])]))
        .unwrap()
    }

    #[test]
    fn repeat_roots_are_one_level_deep() {
        let (surface, root) = doc();
        let roots = surface.repeat_roots(root);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].1, "item");

        let nested = surface.repeat_roots(roots[0].0);
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].1, "addr");
    }

    #[test]
    fn fields_skip_nested_groups_buttons_and_unnamed() {
        let (surface, root) = doc();
        let item = surface.repeat_roots(root)[0].0;
        let fields = surface.fields(item);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "name");
        assert_eq!(fields[0].id.as_deref(), Some("n"));
    }

    #[test]
    fn clone_is_detached_and_independent() {
        let (mut surface, root) = doc();
        let item = surface.repeat_roots(root)[0].0;
        let copy = surface.clone_view(item);
        assert_eq!(surface.parent(copy), None);

        let field = surface.fields(copy)[0].view;
        surface.set_field_value(field, "changed");
        let original = surface.fields(item)[0].view;
        assert_eq!(surface.field_state(original).value, "");
    }

    #[test]
    fn insert_after_and_remove() {
        let (mut surface, root) = doc();
        let item = surface.repeat_roots(root)[0].0;
        let copy = surface.clone_view(item);
        surface.insert_after(item, copy);
        assert_eq!(surface.children(root), &[item, copy]);

        surface.remove(item);
        assert_eq!(surface.children(root), &[copy]);
        assert!(!surface.is_alive(item));
    }

    #[test]
    fn replace_swaps_in_place() {
        let (mut surface, root) = doc();
        let item = surface.repeat_roots(root)[0].0;
        let copy = surface.clone_view(item);
        surface.replace(item, copy);
        assert_eq!(surface.children(root), &[copy]);
        assert_eq!(surface.parent(copy), Some(root));
        assert!(!surface.is_alive(item));
    }

    #[test]
    fn count_attaches_to_parent_scope() {
        let (mut surface, root) = doc();
        let item = surface.repeat_roots(root)[0].0;
        let count = surface.attach_count(item, "item");
        assert_eq!(surface.parent(count), Some(root));
        assert_eq!(surface.find_field(root, "item"), Some(count));
    }

    #[test]
    fn attrs_and_render() {
        let (mut surface, root) = doc();
        let item = surface.repeat_roots(root)[0].0;
        let field = surface.fields(item)[0].view;
        surface.set_field_attrs(field, Some("n[0]"), "name[0]");
        surface.set_field_value(field, "Ada");
        assert_eq!(surface.field_name(field), Some("name[0]"));
        assert_eq!(surface.field_id(field), Some("n[0]"));

        let dump = surface.render(root);
        assert!(dump.contains("[item]"));
        assert!(dump.contains("name[0] = \"Ada\""));
        assert!(dump.contains("(item_add)"));
    }

    #[test]
    fn dead_handles_are_ignored() {
        let (mut surface, root) = doc();
        let item = surface.repeat_roots(root)[0].0;
        let field = surface.fields(item)[0].view;
        surface.remove(item);

        surface.set_field_value(field, "x");
        assert_eq!(surface.field_state(field), FieldState::default());
        assert!(surface.repeat_roots(item).is_empty());
    }
}
