//! Accessors installed by a reflector.
//!
//! The parent gets a [`ParentAccessor`] per mirrored property: reads come
//! from the shadow signal, writes fan out to the children. With reflect-back
//! enabled each child gets a [`ChildAccessor`] per property: reads delegate
//! to the parent, writes go straight to the same fan-out. Fan-out skips
//! children holding one of these delegates, so a write never loops back into
//! the child that made it.
//!
//! Both hold the reflector state weakly. The state owns the parent and the
//! children, so a strong reference here would keep the whole group alive.

use std::rc::Weak;

use crate::record::{Accessor, Record};
use crate::types::Value;

use super::{ReflectorId, ReflectorState};

// =============================================================================
// Parent side
// =============================================================================

pub(super) struct ParentAccessor {
    pub(super) id: ReflectorId,
    pub(super) state: Weak<ReflectorState>,
    pub(super) name: String,
}

impl Accessor for ParentAccessor {
    fn get(&self) -> Value {
        self.state
            .upgrade()
            .map(|state| state.read_shadow(&self.name))
            .unwrap_or_default()
    }

    fn set(&self, value: Value) {
        match self.state.upgrade() {
            Some(state) => state.fan_out(&self.name, value),
            None => tracing::warn!(
                reflector = %self.id,
                property = %self.name,
                "write to a property of a dropped reflector ignored"
            ),
        }
    }

    fn owner(&self) -> Option<ReflectorId> {
        Some(self.id)
    }
}

// =============================================================================
// Child side (reflect-back)
// =============================================================================

pub(super) struct ChildAccessor {
    pub(super) id: ReflectorId,
    pub(super) state: Weak<ReflectorState>,
    pub(super) parent: Record,
    pub(super) name: String,
}

impl Accessor for ChildAccessor {
    fn get(&self) -> Value {
        self.parent.get(&self.name)
    }

    fn set(&self, value: Value) {
        match self.state.upgrade() {
            Some(state) => state.fan_out(&self.name, value),
            None => tracing::warn!(
                reflector = %self.id,
                property = %self.name,
                "reflected write from a child of a dropped reflector ignored"
            ),
        }
    }

    fn owner(&self) -> Option<ReflectorId> {
        Some(self.id)
    }
}
