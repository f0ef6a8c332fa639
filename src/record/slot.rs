//! Slot storage - plain values, accessors and their attributes.

use std::rc::Rc;

use crate::reflector::ReflectorId;
use crate::types::Value;

// =============================================================================
// Slot Attributes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Slot attributes.
    ///
    /// Combine with bitwise OR: `SlotFlags::ENUMERABLE | SlotFlags::CONFIGURABLE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SlotFlags: u8 {
        /// Listed by `Record::keys()`.
        const ENUMERABLE = 1 << 0;
        /// May be removed or replaced by an accessor.
        const CONFIGURABLE = 1 << 1;
    }
}

impl SlotFlags {
    /// Attributes of a slot created by plain assignment.
    pub const PLAIN: Self = Self::ENUMERABLE.union(Self::CONFIGURABLE);
}

// =============================================================================
// Accessor
// =============================================================================

/// Computed slot behavior.
///
/// A slot holding an accessor routes every read and write through it
/// instead of storing a value. Accessors are free to touch other records
/// (or the same one): the record holds no borrow while they run.
pub trait Accessor {
    /// Produce the slot's current value.
    fn get(&self) -> Value;

    /// Handle an assignment to the slot.
    fn set(&self, value: Value);

    /// The reflector that installed this accessor, if any.
    ///
    /// Reflectors only tear down accessors they own.
    fn owner(&self) -> Option<ReflectorId> {
        None
    }
}

// =============================================================================
// Slot
// =============================================================================

#[derive(Clone)]
pub(crate) enum SlotContent {
    Plain(Value),
    Accessor(Rc<dyn Accessor>),
}

#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) content: SlotContent,
    pub(crate) flags: SlotFlags,
}

impl Slot {
    pub(crate) fn plain(value: Value) -> Self {
        Self {
            content: SlotContent::Plain(value),
            flags: SlotFlags::PLAIN,
        }
    }

    #[inline]
    pub(crate) fn is_configurable(&self) -> bool {
        self.flags.contains(SlotFlags::CONFIGURABLE)
    }

    pub(crate) fn accessor(&self) -> Option<&Rc<dyn Accessor>> {
        match &self.content {
            SlotContent::Accessor(accessor) => Some(accessor),
            SlotContent::Plain(_) => None,
        }
    }
}
