#![forbid(unsafe_code)]

//! Nested repeatable form groups.
//!
//! A [`RepeaterTree`] mirrors the repeatable blocks of a document: each block
//! becomes a group of sibling instances that the user can duplicate or
//! remove, and blocks nested inside a block repeat independently. The engine
//! keeps every instance's field names in step with its position
//! (`street[1][0]`) and keeps a backing [`ModelStore`] in step with the
//! fields as instances shift.
//!
//! # Key Components
//!
//! - [`RepeaterTree`] - instance tree, add/remove, suffix derivation
//! - [`Signals`] - lifecycle signals broadcast through a subtree
//! - [`Surface`] - visual document collaborator; [`MemorySurface`] in memory
//! - [`ModelStore`] - name/value model collaborator; [`MemoryModel`] in memory
//! - [`LayoutHook`] - told when the visible structure changed
//!
//! # Example
//!
//! ```
//! use frep_core::{Markup, MemoryModel, MemorySurface, RepeaterTree};
//!
//! let markup = Markup::block(vec![Markup::repeat("item", vec![Markup::text("name")])]);
//! let (surface, root) = MemorySurface::from_markup(&markup).unwrap();
//! let mut tree = RepeaterTree::new(surface).with_model(MemoryModel::new());
//! tree.attach(root);
//!
//! let first = tree.root_instances("item")[0];
//! let second = tree.add(first, true).unwrap();
//! assert_eq!(tree.effective_name(second, "name"), "name[1]");
//! assert_eq!(tree.model().unwrap().get("item"), Some("2"));
//! ```

pub mod broadcast;
mod builder;
pub mod config;
pub mod edit;
pub mod field;
pub mod layout;
pub mod logging;
pub mod model;
pub mod signal;
pub mod surface;
pub mod tree;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, warn};

pub use broadcast::Selection;
pub use config::{AddTraversal, DEFAULT_MAX_POPULATE_COUNT, RepeaterConfig};
pub use edit::{AddCallback, RemoveCallback, RemovedInstance};
pub use field::{Field, FieldKind};
pub use layout::LayoutHook;
#[cfg(feature = "json")]
pub use model::FileModel;
pub use model::{MemoryModel, ModelError, ModelResult, ModelStore};
pub use signal::{Signal, Signals};
pub use surface::{FieldDecl, FieldState, Markup, MarkupError, MemorySurface, Surface, ViewId};
pub use tree::{CountRecord, GroupId, NodeId, RepeaterGroup, RepeaterNode, RepeaterTree};
