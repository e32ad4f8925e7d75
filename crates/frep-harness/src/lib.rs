#![forbid(unsafe_code)]

//! Harness for the repeater engine.
//!
//! Loads a [`Markup`] document and an optional model file, mounts and
//! populates a [`RepeaterTree`], applies scripted [`Op`]s, and reports the
//! resulting tree, surface and model.

pub mod cli;
pub mod error;
pub mod ops;

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use frep_core::{
    FileModel, GroupId, Markup, MemoryModel, MemorySurface, ModelStore, RepeaterTree, Surface,
};
use serde::Serialize;

pub use cli::{Dump, Invocation, Opts};
pub use error::HarnessError;
pub use ops::Op;

/// Model behind a harness run.
#[derive(Debug)]
pub enum HarnessModel {
    /// Values live only for the run.
    Memory(MemoryModel),
    /// Values loaded from, and optionally saved to, a JSON file.
    File(FileModel),
}

impl HarnessModel {
    fn memory(&self) -> &MemoryModel {
        match self {
            HarnessModel::Memory(model) => model,
            HarnessModel::File(model) => model.memory(),
        }
    }
}

impl ModelStore for HarnessModel {
    fn get_value(&self, name: &str) -> Option<String> {
        match self {
            HarnessModel::Memory(model) => model.get_value(name),
            HarnessModel::File(model) => model.get_value(name),
        }
    }

    fn set_value(&mut self, name: &str, value: &str) {
        match self {
            HarnessModel::Memory(model) => model.set_value(name, value),
            HarnessModel::File(model) => model.set_value(name, value),
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Indented outline of groups and instances.
    pub tree: String,
    /// Text dump of the document.
    pub surface: String,
    /// Final model values, or `None` when running without a model.
    pub model: Option<BTreeMap<String, String>>,
    /// How many times the layout hook fired.
    pub layout_notifications: usize,
    /// Whether the model file was written.
    pub saved: bool,
}

impl Report {
    /// Render the sections selected by `dump` as text.
    #[must_use]
    pub fn render(&self, dump: Dump) -> String {
        let mut out = String::new();
        if matches!(dump, Dump::Tree | Dump::All) {
            let _ = writeln!(out, "# tree");
            out.push_str(&self.tree);
        }
        if matches!(dump, Dump::Surface | Dump::All) {
            let _ = writeln!(out, "# surface");
            out.push_str(&self.surface);
        }
        if matches!(dump, Dump::Model | Dump::All) {
            let _ = writeln!(out, "# model");
            match &self.model {
                Some(values) => {
                    for (name, value) in values {
                        let _ = writeln!(out, "{name} = {value:?}");
                    }
                }
                None => {
                    let _ = writeln!(out, "(none)");
                }
            }
        }
        out
    }

    /// Render the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Load the markup document at `path`.
pub fn load_markup(path: &Path) -> Result<Markup, HarnessError> {
    let raw = fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| HarnessError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Execute `opts`.
pub fn run(opts: &Opts) -> Result<Report, HarnessError> {
    let markup_path = opts
        .markup
        .as_deref()
        .ok_or_else(|| HarnessError::Usage("Missing --markup=FILE".into()))?;
    let markup = load_markup(markup_path)?;
    let (surface, root) = MemorySurface::from_markup(&markup)?;

    let model = if opts.no_model {
        None
    } else if let Some(path) = &opts.model {
        Some(HarnessModel::File(FileModel::open(path)?))
    } else {
        Some(HarnessModel::Memory(MemoryModel::new()))
    };

    let notifications = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&notifications);
    let mut tree = RepeaterTree::new(surface)
        .with_config(opts.config.clone())
        .with_layout(move || counter.set(counter.get() + 1));
    if let Some(model) = model {
        tree = tree.with_model(model);
    }

    let groups = tree.attach(root);
    tracing::info!(groups, nodes = tree.node_count(), "attached");

    for op in &opts.ops {
        op.apply(&mut tree)?;
    }

    let tree_outline = outline(&tree);
    let surface_dump = tree.surface().render(root);
    let (_, mut model) = tree.into_parts();

    let mut saved = false;
    if opts.save
        && let Some(HarnessModel::File(file)) = model.as_mut()
    {
        saved = file.save()?;
        tracing::info!(path = %file.path().display(), saved, "model saved");
    }

    Ok(Report {
        tree: tree_outline,
        surface: surface_dump,
        model: model.as_ref().map(|m| m.memory().sorted()),
        layout_notifications: notifications.get(),
        saved,
    })
}

/// Indented outline: one line per group with its count, one per instance
/// with its suffix and effective field names.
#[must_use]
pub fn outline<S: Surface, M: ModelStore>(tree: &RepeaterTree<S, M>) -> String {
    let mut out = String::new();
    for &gid in tree.roots() {
        outline_group(tree, gid, 0, &mut out);
    }
    out
}

fn outline_group<S: Surface, M: ModelStore>(
    tree: &RepeaterTree<S, M>,
    gid: GroupId,
    depth: usize,
    out: &mut String,
) {
    let Some(group) = tree.group(gid) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let count = group.count().map_or_else(String::new, |count| {
        format!(" ({} = {})", count.name(), count.value())
    });
    let _ = writeln!(out, "{indent}{}{count}", group.key());
    for &node in group.instances() {
        let Some(n) = tree.node(node) else {
            continue;
        };
        let names: Vec<&str> = n.fields().iter().map(|field| field.name()).collect();
        let _ = writeln!(
            out,
            "{indent}  {}{}: {}",
            n.key(),
            tree.id_suffix(node),
            names.join(", ")
        );
        for &nested in n.groups() {
            outline_group(tree, nested, depth + 2, out);
        }
    }
}
