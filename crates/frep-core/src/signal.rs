#![forbid(unsafe_code)]

//! Lifecycle signals dispatched to the fields of a repeated instance.
//!
//! A [`Signals`] value is a batch. Dispatch walks the batch in a fixed order
//! ([`Signal::ALL`]), and within one signal visits every owned field before
//! moving on, so `RENAME | PERSIST` renames all fields of a node first and
//! only then writes them to the model under their new names.

use bitflags::bitflags;

bitflags! {
    /// A batch of lifecycle signals.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Signals: u8 {
        /// Re-derive field ids/names from the current index suffix.
        const RENAME       = 0b0_0001;
        /// Copy model values onto the view.
        const SYNC_TO_VIEW = 0b0_0010;
        /// Write view values into the model.
        const PERSIST      = 0b0_0100;
        /// Write a single edited value into the model.
        const CHANGE       = 0b0_1000;
        /// Blank the model entries under the current names.
        const CLEAR        = 0b1_0000;
    }
}

/// A single lifecycle signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Rename,
    SyncToView,
    Persist,
    Change,
    Clear,
}

impl Signal {
    /// Every signal, in dispatch order.
    pub const ALL: [Signal; 5] = [
        Signal::Rename,
        Signal::SyncToView,
        Signal::Persist,
        Signal::Change,
        Signal::Clear,
    ];

    /// The flag for this signal.
    #[must_use]
    pub const fn flag(self) -> Signals {
        match self {
            Signal::Rename => Signals::RENAME,
            Signal::SyncToView => Signals::SYNC_TO_VIEW,
            Signal::Persist => Signals::PERSIST,
            Signal::Change => Signals::CHANGE,
            Signal::Clear => Signals::CLEAR,
        }
    }

    /// Stable lowercase name, used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Signal::Rename => "rename",
            Signal::SyncToView => "sync-to-view",
            Signal::Persist => "persist",
            Signal::Change => "change",
            Signal::Clear => "clear",
        }
    }

    /// Whether this signal reads or writes the model.
    #[must_use]
    pub const fn touches_model(self) -> bool {
        !matches!(self, Signal::Rename)
    }
}

impl Signals {
    /// Iterate the contained signals in dispatch order.
    pub fn signals(self) -> impl Iterator<Item = Signal> {
        Signal::ALL
            .into_iter()
            .filter(move |signal| self.contains(signal.flag()))
    }
}

impl From<Signal> for Signals {
    fn from(signal: Signal) -> Self {
        signal.flag()
    }
}
