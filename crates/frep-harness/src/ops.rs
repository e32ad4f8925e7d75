#![forbid(unsafe_code)]

//! Scripted operations.
//!
//! One operation per `--op` flag, applied in order:
//!
//! | Syntax | Effect |
//! |--------|--------|
//! | `add:PATH` | click the add control of the instance at `PATH` |
//! | `remove:PATH` | click its remove control |
//! | `set:PATH:FIELD=VALUE` | type `VALUE` into field `FIELD` of that instance, or pick the option `VALUE` of a checkable set |
//!
//! `PATH` uses the tree's path syntax, e.g. `item[1].addr[0]`.

use std::fmt;

use frep_core::{ModelStore, NodeId, RepeaterTree, Surface, ViewId};

use crate::error::HarnessError;

/// A scripted user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Add { path: String },
    Remove { path: String },
    Set {
        path: String,
        field: String,
        value: String,
    },
}

impl Op {
    /// Parse one operation.
    pub fn parse(raw: &str) -> Result<Self, HarnessError> {
        let bad = || HarnessError::BadOp(raw.to_string());
        let (verb, rest) = raw.split_once(':').ok_or_else(bad)?;
        let op = match verb.trim() {
            "add" => Op::Add {
                path: non_empty(rest).ok_or_else(bad)?,
            },
            "remove" | "rem" => Op::Remove {
                path: non_empty(rest).ok_or_else(bad)?,
            },
            "set" => {
                let (path, assignment) = rest.split_once(':').ok_or_else(bad)?;
                let (field, value) = assignment.split_once('=').ok_or_else(bad)?;
                Op::Set {
                    path: non_empty(path).ok_or_else(bad)?,
                    field: non_empty(field).ok_or_else(bad)?,
                    value: value.to_string(),
                }
            }
            _ => return Err(bad()),
        };
        Ok(op)
    }

    /// The instance path the operation targets.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Op::Add { path } | Op::Remove { path } | Op::Set { path, .. } => path,
        }
    }

    /// Apply to `tree`.
    pub fn apply<S, M>(&self, tree: &mut RepeaterTree<S, M>) -> Result<(), HarnessError>
    where
        S: Surface,
        M: ModelStore,
    {
        let node = resolve(tree, self.path())?;
        match self {
            Op::Add { .. } => {
                let added = tree.click_add(node);
                tracing::info!(op = %self, added = added.is_some(), "applied");
            }
            Op::Remove { .. } => {
                let removed = tree.click_remove(node);
                tracing::info!(op = %self, removed = removed.is_some(), "applied");
            }
            Op::Set { path, field, value } => {
                let view =
                    target_field(tree, node, field, value).ok_or_else(|| {
                        HarnessError::UnknownField {
                            path: path.clone(),
                            field: field.clone(),
                        }
                    })?;
                tree.input(view, value);
                tracing::info!(op = %self, "applied");
            }
        }
        Ok(())
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Add { path } => write!(f, "add:{path}"),
            Op::Remove { path } => write!(f, "remove:{path}"),
            Op::Set { path, field, value } => write!(f, "set:{path}:{field}={value}"),
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The field of `node` named `name` that `value` should go to: for a
/// checkable set, the option whose own value is `value`, otherwise the first
/// field with that name.
fn target_field<S, M>(
    tree: &RepeaterTree<S, M>,
    node: NodeId,
    name: &str,
    value: &str,
) -> Option<ViewId>
where
    S: Surface,
    M: ModelStore,
{
    let fields = tree.node(node)?.fields();
    let named = || fields.iter().filter(|field| field.base_name() == name);
    named()
        .find(|field| {
            field.kind().is_checkable() && tree.surface().field_state(field.view()).value == value
        })
        .or_else(|| named().next())
        .map(|field| field.view())
}

fn resolve<S, M>(tree: &RepeaterTree<S, M>, path: &str) -> Result<NodeId, HarnessError>
where
    S: Surface,
    M: ModelStore,
{
    tree.find(path)
        .ok_or_else(|| HarnessError::UnknownPath(path.to_string()))
}
