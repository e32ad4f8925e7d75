#![forbid(unsafe_code)]

//! Declarative markup for building a [`MemorySurface`](super::MemorySurface).

use std::fmt;

use crate::field::FieldKind;

/// A document fragment.
///
/// With the `serde` feature this deserializes from tagged JSON:
///
/// ```json
/// { "type": "block", "repeat": "item", "children": [
///     { "type": "field", "name": "name" },
///     { "type": "button", "label": "item_add" }
/// ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum Markup {
    /// A container; repeatable when `repeat` names a group key.
    Block {
        #[cfg_attr(feature = "serde", serde(default))]
        repeat: Option<String>,
        #[cfg_attr(feature = "serde", serde(default))]
        children: Vec<Markup>,
    },
    /// An input.
    Field {
        #[cfg_attr(feature = "serde", serde(default))]
        kind: FieldKind,
        #[cfg_attr(feature = "serde", serde(default))]
        id: Option<String>,
        #[cfg_attr(feature = "serde", serde(default))]
        name: Option<String>,
        #[cfg_attr(feature = "serde", serde(default))]
        value: String,
        #[cfg_attr(feature = "serde", serde(default))]
        checked: bool,
    },
    /// A button. Never a field.
    Button { label: String },
}

impl Markup {
    /// A plain container.
    #[must_use]
    pub fn block(children: Vec<Markup>) -> Self {
        Self::Block {
            repeat: None,
            children,
        }
    }

    /// A repeatable container for group `key`.
    #[must_use]
    pub fn repeat(key: impl Into<String>, children: Vec<Markup>) -> Self {
        Self::Block {
            repeat: Some(key.into()),
            children,
        }
    }

    /// An empty named text field.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::input(FieldKind::Text, name, "", false)
    }

    /// A checkbox carrying `value` when checked.
    #[must_use]
    pub fn checkbox(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self::input(FieldKind::Checkbox, name, value, checked)
    }

    /// One option of a radio set.
    #[must_use]
    pub fn radio(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self::input(FieldKind::Radio, name, value, checked)
    }

    /// A button.
    #[must_use]
    pub fn button(label: impl Into<String>) -> Self {
        Self::Button {
            label: label.into(),
        }
    }

    fn input(
        kind: FieldKind,
        name: impl Into<String>,
        value: impl Into<String>,
        checked: bool,
    ) -> Self {
        Self::Field {
            kind,
            id: None,
            name: Some(name.into()),
            value: value.into(),
            checked,
        }
    }

    /// Set the static id of a field. No effect on other variants.
    #[must_use]
    pub fn with_id(mut self, new_id: impl Into<String>) -> Self {
        if let Self::Field { id, .. } = &mut self {
            *id = Some(new_id.into());
        }
        self
    }

    /// Set the initial value of a field. No effect on other variants.
    #[must_use]
    pub fn with_value(mut self, new_value: impl Into<String>) -> Self {
        if let Self::Field { value, .. } = &mut self {
            *value = new_value.into();
        }
        self
    }

    /// Check the markup for declarations the engine cannot handle.
    pub fn validate(&self) -> Result<(), MarkupError> {
        match self {
            Self::Block { repeat, children } => {
                if repeat.as_deref().is_some_and(|key| key.trim().is_empty()) {
                    return Err(MarkupError::EmptyGroupKey);
                }
                children.iter().try_for_each(Markup::validate)
            }
            Self::Field { name, .. } => {
                if name.as_deref().is_some_and(str::is_empty) {
                    return Err(MarkupError::EmptyFieldName);
                }
                Ok(())
            }
            Self::Button { .. } => Ok(()),
        }
    }
}

/// Malformed markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// A repeatable block declared an empty group key.
    EmptyGroupKey,
    /// A field declared an empty name.
    EmptyFieldName,
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupError::EmptyGroupKey => write!(f, "repeatable block has an empty group key"),
            MarkupError::EmptyFieldName => write!(f, "field has an empty name"),
        }
    }
}

impl std::error::Error for MarkupError {}
