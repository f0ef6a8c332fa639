//! Reflector - mirrors named properties of a parent record onto children.
//!
//! Linking a property moves its authoritative value into a shadow signal
//! owned by the reflector and replaces the parent's slot with an accessor:
//!
//! ```text
//!            read ──► shadow signal
//! parent.p
//!           write ──► shadow signal ──► plain children (fan-out)
//!
//!            read ──► parent.p                     (reflect-back only)
//! child.p
//!           write ──► shadow signal ──► plain children
//! ```
//!
//! Without reflect-back a child's slot is a plain value: it diverges when
//! written locally and is overwritten by the next write on the parent. With
//! reflect-back every child reads through the parent, so one write from any
//! side is visible everywhere.
//!
//! Everything is synchronous and single-threaded. A write returns after the
//! shadow and every child have been updated.

mod accessors;
mod config;

pub use config::ReflectorConfig;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::{debug, trace, warn};

use crate::error::{ConfigError, Result};
use crate::record::{Record, SlotFlags};
use crate::types::Value;
use accessors::{ChildAccessor, ParentAccessor};

// =============================================================================
// Reflector Id
// =============================================================================

thread_local! {
    /// Counter for generating reflector ids.
    static ID_COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// Identity of a reflector, unique per thread.
///
/// Stamped on every accessor a reflector installs so teardown never touches
/// instrumentation that belongs to someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReflectorId(u64);

impl ReflectorId {
    pub(crate) fn next() -> Self {
        ID_COUNTER.with(|counter| {
            let id = counter.get();
            counter.set(id + 1);
            Self(id)
        })
    }
}

impl fmt::Display for ReflectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reflector-{}", self.0)
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// State shared between the reflector handle and its accessors.
///
/// Borrows are never held across a record read or write: those may run
/// accessors that come straight back here.
pub(crate) struct ReflectorState {
    id: ReflectorId,
    parent: Record,
    reflect_back: bool,
    /// Configured names, in configuration order. Kept across `clear()`.
    properties: RefCell<Vec<String>>,
    /// Active links: one shadow signal per linked name.
    shadows: RefCell<HashMap<String, Signal<Value>>>,
    /// Registered children in registration order.
    children: RefCell<Vec<Record>>,
}

impl ReflectorState {
    fn shadow(&self, name: &str) -> Option<Signal<Value>> {
        self.shadows.borrow().get(name).cloned()
    }

    pub(crate) fn read_shadow(&self, name: &str) -> Value {
        self.shadow(name).map(|shadow| shadow.get()).unwrap_or_default()
    }

    pub(crate) fn write_shadow(&self, name: &str, value: Value) {
        if let Some(shadow) = self.shadow(name) {
            shadow.set(value);
        }
    }

    /// Write to the shadow, then push to every child that holds a plain
    /// value. Delegating children already read the new value through the
    /// parent, so neither a parent write nor a reflected child write ever
    /// re-enters a child accessor.
    pub(crate) fn fan_out(&self, name: &str, value: Value) {
        self.write_shadow(name, value.clone());
        let pushed = self.push_to_plain_children(name, &value);
        trace!(reflector = %self.id, property = name, pushed, "fan-out");
    }

    /// Assign `value` on every child whose slot is not one of our delegates.
    fn push_to_plain_children(&self, name: &str, value: &Value) -> usize {
        let mut pushed = 0;
        for child in &self.children() {
            if child.accessor_owner(name) != Some(self.id) {
                child.set(name, value.clone());
                pushed += 1;
            }
        }
        pushed
    }

    fn children(&self) -> Vec<Record> {
        self.children.borrow().clone()
    }

    fn is_linked(&self, name: &str) -> bool {
        self.shadows.borrow().contains_key(name)
    }

    /// Configured names that are currently linked, in configuration order.
    fn linked_names(&self) -> Vec<String> {
        let shadows = self.shadows.borrow();
        self.properties
            .borrow()
            .iter()
            .filter(|name| shadows.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    fn child_index(&self, child: &Record) -> Option<usize> {
        self.children.borrow().iter().position(|c| c.ptr_eq(child))
    }
}

// =============================================================================
// Reflector
// =============================================================================

/// Synchronization controller for one parent record and its children.
///
/// # Example
///
/// ```
/// use object_reflector::{Record, Reflector, ReflectorConfig, Value};
///
/// let parent = Record::from_pairs([("x", 1)]);
/// let child = Record::new();
///
/// let reflector = Reflector::create(ReflectorConfig::new(&parent).with_properties(["x"])).unwrap();
/// reflector.create_reflection(&child);
/// assert_eq!(child.get("x"), Value::from(1));
///
/// parent.set("x", 42);
/// assert_eq!(child.get("x"), Value::from(42));
///
/// // Reflect-back is off: local writes stay local until the parent changes.
/// child.set("x", 7);
/// assert_eq!(parent.get("x"), Value::from(42));
/// parent.set("x", 100);
/// assert_eq!(child.get("x"), Value::from(100));
/// ```
pub struct Reflector {
    state: Rc<ReflectorState>,
}

impl Reflector {
    /// Build a reflector and link the configured properties.
    ///
    /// All validation happens before the parent is touched; on error no
    /// record has been modified.
    pub fn create(config: ReflectorConfig) -> Result<Self> {
        let (parent, names) = config.validate()?;
        let reflector = Self {
            state: Rc::new(ReflectorState {
                id: ReflectorId::next(),
                parent,
                reflect_back: config.reflect_back,
                properties: RefCell::new(Vec::new()),
                shadows: RefCell::new(HashMap::new()),
                children: RefCell::new(Vec::new()),
            }),
        };
        debug!(reflector = %reflector.id(), reflect_back = config.reflect_back, "created");
        if let Some(names) = names {
            reflector.link(names)?;
        }
        Ok(reflector)
    }

    /// Build a reflector from a dynamic options record.
    ///
    /// See [`ReflectorConfig::from_value`] for the accepted fields.
    pub fn from_options(options: Option<&Value>) -> Result<Self> {
        Self::create(ReflectorConfig::from_value(options))
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn id(&self) -> ReflectorId {
        self.state.id
    }

    /// The parent record (same identity as the one configured).
    pub fn parent(&self) -> &Record {
        &self.state.parent
    }

    /// Configured property names.
    pub fn properties(&self) -> Vec<String> {
        self.state.properties.borrow().clone()
    }

    /// Whether `name` is currently linked on the parent.
    pub fn is_linked(&self, name: &str) -> bool {
        self.state.is_linked(name)
    }

    pub fn reflects_back(&self) -> bool {
        self.state.reflect_back
    }

    /// Registered children in registration order.
    pub fn children(&self) -> Vec<Record> {
        self.state.children()
    }

    pub fn child_count(&self) -> usize {
        self.state.children.borrow().len()
    }

    /// Whether this exact record (by identity) is registered.
    pub fn is_child_registered(&self, child: &Record) -> bool {
        self.state.child_index(child).is_some()
    }

    /// Shadow signal of a linked property.
    ///
    /// Reads through the parent (or a reflect-back child) are tracked reads
    /// of this signal, so effects and deriveds built on either re-run when
    /// the value changes from any side.
    pub fn signal(&self, name: &str) -> Option<Signal<Value>> {
        self.state.shadow(name)
    }

    // =========================================================================
    // Linking
    // =========================================================================

    /// Replace the mirrored property set.
    ///
    /// Names already linked keep their current value. New names are linked
    /// on the parent with the parent's value at this moment and pushed to
    /// registered children. Names no longer listed are unlinked, leaving
    /// plain values behind.
    pub fn link_properties<I, S>(&self, names: I) -> Result<&Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.link(names.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    /// [`link_properties`](Self::link_properties) for a dynamic list.
    ///
    /// Fails if `names` is not an array of strings.
    pub fn link_properties_value(&self, names: &Value) -> Result<&Self> {
        self.link(config::property_names(names)?)?;
        Ok(self)
    }

    fn link(&self, names: Vec<String>) -> Result<()> {
        let state = &self.state;

        let mut wanted: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !wanted.contains(&name) {
                wanted.push(name);
            }
        }

        if let Some(name) = wanted
            .iter()
            .find(|name| !state.is_linked(name) && !state.parent.is_configurable(name))
        {
            return Err(ConfigError::NotConfigurable { key: name.clone() });
        }

        let dropped: Vec<String> = state
            .linked_names()
            .into_iter()
            .filter(|name| !wanted.contains(name))
            .collect();
        for name in &dropped {
            self.unlink_property(name);
        }

        let added: Vec<String> = wanted.iter().filter(|name| !state.is_linked(name)).cloned().collect();
        *state.properties.borrow_mut() = wanted;
        for name in &added {
            self.link_property(name);
        }

        debug!(
            reflector = %state.id,
            linked = added.len(),
            unlinked = dropped.len(),
            "properties linked"
        );
        Ok(())
    }

    /// Install the shadow/accessor pair for one name and bring existing
    /// children up to date.
    fn link_property(&self, name: &str) {
        let state = &self.state;
        let initial = state.parent.get(name);
        state.shadows.borrow_mut().insert(name.to_string(), signal(initial));

        let accessor = Rc::new(ParentAccessor {
            id: state.id,
            state: Rc::downgrade(&self.state),
            name: name.to_string(),
        });
        if !state.parent.define_accessor(name, accessor, SlotFlags::PLAIN) {
            // Checked by the caller; only reachable if an accessor froze the slot.
            state.shadows.borrow_mut().remove(name);
            warn!(reflector = %state.id, property = name, "parent slot became non-configurable, not linked");
            return;
        }

        let value = state.parent.get(name);
        for child in &state.children() {
            child.set(name, value.clone());
            if state.reflect_back {
                self.install_child_accessor(child, name);
            }
        }
    }

    /// Restore plain values for one name on the parent and on children.
    fn unlink_property(&self, name: &str) {
        let state = &self.state;
        if state.reflect_back {
            for child in &state.children() {
                child.restore_plain(name, state.id);
            }
        }
        state.parent.restore_plain(name, state.id);
        state.shadows.borrow_mut().remove(name);
    }

    /// Relink configured names after a `clear()`.
    fn reactivate(&self) {
        let state = &self.state;
        let names = state.properties.borrow().clone();
        for name in names.iter().filter(|name| !state.is_linked(name)) {
            if state.parent.is_configurable(name) {
                self.link_property(name);
            } else {
                warn!(reflector = %state.id, property = %name, "parent slot is not configurable, not relinked");
            }
        }
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Register a child and synchronize it with the parent.
    ///
    /// Every linked property is copied onto the child. With reflect-back the
    /// child's slots are then replaced by accessors that read from and write
    /// to the parent.
    ///
    /// Registering an already registered child, or the parent itself, does
    /// nothing. On a cleared reflector this first relinks the configured
    /// properties.
    pub fn create_reflection(&self, child: &Record) {
        let state = &self.state;
        if child.ptr_eq(&state.parent) {
            warn!(reflector = %state.id, "parent cannot be reflected onto itself, ignored");
            return;
        }
        if self.is_child_registered(child) {
            trace!(reflector = %state.id, "child already registered");
            return;
        }

        if state.shadows.borrow().is_empty() {
            self.reactivate();
        }

        state.children.borrow_mut().push(child.clone());

        let names = state.linked_names();
        for name in &names {
            child.set(name.as_str(), state.parent.get(name));
        }
        if state.reflect_back {
            for name in &names {
                self.install_child_accessor(child, name);
            }
        }

        debug!(
            reflector = %state.id,
            children = self.child_count(),
            properties = names.len(),
            "child registered"
        );
    }

    fn install_child_accessor(&self, child: &Record, name: &str) {
        let state = &self.state;
        let accessor = Rc::new(ChildAccessor {
            id: state.id,
            state: Rc::downgrade(&self.state),
            parent: state.parent.clone(),
            name: name.to_string(),
        });
        if !child.define_accessor(name, accessor, SlotFlags::CONFIGURABLE) {
            warn!(
                reflector = %state.id,
                property = name,
                "child slot is not configurable, left as a plain value"
            );
        }
    }

    /// Unregister a child.
    ///
    /// With reflect-back the child's accessors are replaced by plain values
    /// equal to what it last observed. Unknown children are ignored.
    pub fn unreflect_child(&self, child: &Record) {
        let state = &self.state;
        if state.reflect_back {
            for name in state.linked_names() {
                child.restore_plain(&name, state.id);
            }
        }

        let removed = state
            .child_index(child)
            .map(|index| state.children.borrow_mut().remove(index))
            .is_some();
        debug!(reflector = %state.id, removed, children = self.child_count(), "child unregistered");
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Undo all instrumentation and forget every child.
    ///
    /// Mirrored parent properties become plain values equal to their shadow.
    /// With reflect-back every child is unregistered first, keeping its last
    /// observed values. The configured names are kept, so registering a child
    /// or calling `link_properties` again reactivates the reflector.
    pub fn clear(&self) {
        let state = &self.state;
        if state.reflect_back {
            for child in &state.children() {
                self.unreflect_child(child);
            }
        }

        let names = state.linked_names();
        for name in &names {
            state.parent.restore_plain(name, state.id);
        }
        state.shadows.borrow_mut().clear();
        state.children.borrow_mut().clear();

        debug!(reflector = %state.id, properties = names.len(), "cleared");
    }
}

impl Drop for Reflector {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("id", &self.state.id)
            .field("parent", &self.state.parent)
            .field("properties", &self.state.properties.borrow())
            .field("reflect_back", &self.state.reflect_back)
            .field("children", &self.state.children.borrow().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
