//! Record - caller-owned key/value storage with instrumentable slots.
//!
//! A [`Record`] is a shared handle: cloning it yields the *same* record, and
//! [`Record::ptr_eq`] is the identity test the reflector registry relies on.
//!
//! Each key maps to a slot that holds either a plain [`Value`] or an
//! [`Accessor`]. Reads and writes go through [`Record::get`] and
//! [`Record::set`]; when the slot holds an accessor the call is routed to it,
//! which is how a reflector intercepts field access on records it does not
//! own.
//!
//! # Example
//!
//! ```
//! use object_reflector::{Record, Value};
//!
//! let record = Record::from_pairs([("x", 1)]);
//! record.set("y", "two");
//! assert_eq!(record.get("x"), Value::from(1));
//! assert_eq!(record.keys(), vec!["x".to_string(), "y".to_string()]);
//! assert!(record.get("missing").is_undefined());
//! ```

mod slot;

pub use slot::{Accessor, SlotFlags};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::reflector::ReflectorId;
use crate::types::Value;
use slot::{Slot, SlotContent};

// =============================================================================
// Record State
// =============================================================================

#[derive(Default)]
struct RecordInner {
    /// Slots in insertion order. Records are small; lookup is a linear scan.
    slots: Vec<(String, Slot)>,
}

impl RecordInner {
    fn position(&self, key: &str) -> Option<usize> {
        self.slots.iter().position(|(k, _)| k == key)
    }

    fn slot(&self, key: &str) -> Option<&Slot> {
        self.slots.iter().find(|(k, _)| k == key).map(|(_, slot)| slot)
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|(k, _)| k == key).map(|(_, slot)| slot)
    }
}

/// What a read or write resolved to once the borrow is released.
enum Resolved {
    Done(Value),
    Route(Rc<dyn Accessor>),
}

// =============================================================================
// Record
// =============================================================================

/// Shared, mutable key/value record.
#[derive(Clone, Default)]
pub struct Record {
    inner: Rc<RefCell<RecordInner>>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from key/value pairs (plain slots, insertion order).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let record = Self::new();
        for (key, value) in pairs {
            record.set(key, value);
        }
        record
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the underlying storage (for diagnostics).
    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.inner) as *const ()
    }

    // =========================================================================
    // Reads and writes
    // =========================================================================

    /// Read a key. Missing keys read as [`Value::Undefined`].
    pub fn get(&self, key: &str) -> Value {
        let resolved = {
            let inner = self.inner.borrow();
            match inner.slot(key).map(|slot| &slot.content) {
                None => Resolved::Done(Value::Undefined),
                Some(SlotContent::Plain(value)) => Resolved::Done(value.clone()),
                Some(SlotContent::Accessor(accessor)) => Resolved::Route(accessor.clone()),
            }
        };
        match resolved {
            Resolved::Done(value) => value,
            Resolved::Route(accessor) => accessor.get(),
        }
    }

    /// Assign a key.
    ///
    /// Accessor slots receive the value through [`Accessor::set`]. Plain
    /// slots are overwritten, keeping their attributes. Missing keys are
    /// created as enumerable, configurable plain slots.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let accessor = {
            let mut inner = self.inner.borrow_mut();
            match inner.position(&key) {
                Some(index) => {
                    let slot = &mut inner.slots[index].1;
                    match slot.accessor() {
                        Some(accessor) => Some(accessor.clone()),
                        None => {
                            slot.content = SlotContent::Plain(value.clone());
                            None
                        }
                    }
                }
                None => {
                    inner.slots.push((key, Slot::plain(value.clone())));
                    None
                }
            }
        };
        if let Some(accessor) = accessor {
            accessor.set(value);
        }
    }

    /// Whether the key exists (plain or accessor, enumerable or not).
    pub fn has(&self, key: &str) -> bool {
        self.inner.borrow().position(key).is_some()
    }

    /// Remove a key.
    ///
    /// Returns false when the key is missing or not configurable.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.position(key) {
            Some(index) if inner.slots[index].1.is_configurable() => {
                inner.slots.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Enumerable keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|(_, slot)| slot.flags.contains(SlotFlags::ENUMERABLE))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Enumerable keys with their current values (accessors are evaluated).
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key);
                (key, value)
            })
            .collect()
    }

    /// Number of slots, including non-enumerable ones.
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Slot definition
    // =========================================================================

    /// Attributes of a key, if present.
    pub fn flags(&self, key: &str) -> Option<SlotFlags> {
        self.inner.borrow().slot(key).map(|slot| slot.flags)
    }

    /// Whether the key may be removed or redefined. Missing keys are.
    pub fn is_configurable(&self, key: &str) -> bool {
        self.inner.borrow().slot(key).is_none_or(Slot::is_configurable)
    }

    /// Whether the key currently holds an accessor.
    pub fn is_instrumented(&self, key: &str) -> bool {
        self.inner
            .borrow()
            .slot(key)
            .is_some_and(|slot| slot.accessor().is_some())
    }

    /// Owner of the accessor at `key`, if the slot holds an owned accessor.
    pub fn accessor_owner(&self, key: &str) -> Option<ReflectorId> {
        let accessor = self.inner.borrow().slot(key)?.accessor()?.clone();
        accessor.owner()
    }

    /// Define a plain slot with explicit attributes.
    ///
    /// Returns false (and changes nothing) if the existing slot is not
    /// configurable.
    pub fn define_value(&self, key: impl Into<String>, value: impl Into<Value>, flags: SlotFlags) -> bool {
        self.define(key.into(), Slot {
            content: SlotContent::Plain(value.into()),
            flags,
        })
    }

    /// Install an accessor on a slot, replacing whatever it held.
    ///
    /// Returns false (and changes nothing) if the existing slot is not
    /// configurable.
    pub fn define_accessor(&self, key: impl Into<String>, accessor: Rc<dyn Accessor>, flags: SlotFlags) -> bool {
        self.define(key.into(), Slot {
            content: SlotContent::Accessor(accessor),
            flags,
        })
    }

    fn define(&self, key: String, slot: Slot) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.position(&key) {
            Some(index) => {
                if !inner.slots[index].1.is_configurable() {
                    return false;
                }
                inner.slots[index].1 = slot;
            }
            None => inner.slots.push((key, slot)),
        }
        true
    }

    /// Replace an accessor owned by `owner` with a plain slot holding the
    /// value the accessor currently reports.
    ///
    /// Slots that are plain, missing, or instrumented by someone else are
    /// left alone. Returns whether a slot was restored.
    pub fn restore_plain(&self, key: &str, owner: ReflectorId) -> bool {
        let accessor = {
            let inner = self.inner.borrow();
            match inner.slot(key).and_then(Slot::accessor) {
                Some(accessor) if accessor.owner() == Some(owner) => accessor.clone(),
                _ => return false,
            }
        };

        let value = accessor.get();

        let mut inner = self.inner.borrow_mut();
        match inner.slot_mut(key) {
            // The accessor may have been swapped while it ran.
            Some(slot) if slot.accessor().is_some_and(|current| Rc::ptr_eq(current, &accessor)) => {
                *slot = Slot::plain(value);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("ptr", &self.as_ptr())
            .field("keys", &self.keys())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
