//! An editing session: arena mutations broadcast as change events.
//!
//! Whoever re-triggers evaluation subscribes to the session's bus and
//! drains it at its own pace; a slow subscriber loses the newest events,
//! not the oldest, and re-analyzes from the model either way.

use arbor_events::{Event, EventBus, Subscription};
use arbor_model::{ModelError, NodeArena, NodeId, NodeKind, PropertyValue};

use crate::{analyze, Analysis, LangError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    NodeAdded { node: NodeId, kind: NodeKind },
    PropertySet { node: NodeId, name: String },
    ReferenceSet { node: NodeId, slot: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEventKind {
    NodeAdded,
    PropertySet,
    ReferenceSet,
}

impl Event for ModelEvent {
    type Kind = ModelEventKind;

    fn kind(&self) -> ModelEventKind {
        match self {
            ModelEvent::NodeAdded { .. } => ModelEventKind::NodeAdded,
            ModelEvent::PropertySet { .. } => ModelEventKind::PropertySet,
            ModelEvent::ReferenceSet { .. } => ModelEventKind::ReferenceSet,
        }
    }
}

/// Owns a program tree and notifies subscribers of every mutation.
#[derive(Default)]
pub struct Session {
    arena: NodeArena,
    bus: EventBus<ModelEvent>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn subscribe(&mut self, capacity: usize) -> Subscription<ModelEvent> {
        self.bus.subscribe_all(capacity)
    }

    pub fn subscribe_kinds(
        &mut self,
        capacity: usize,
        kinds: impl IntoIterator<Item = ModelEventKind>,
    ) -> Subscription<ModelEvent> {
        self.bus.subscribe(capacity, kinds)
    }

    pub fn add_root(&mut self, kind: impl Into<NodeKind>) -> NodeId {
        let kind = kind.into();
        let node = self.arena.add_root(kind.clone());
        self.bus.publish(ModelEvent::NodeAdded { node, kind });
        node
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        slot: &str,
        kind: impl Into<NodeKind>,
    ) -> Result<NodeId, ModelError> {
        let kind = kind.into();
        let node = self.arena.add_child(parent, slot, kind.clone())?;
        self.bus.publish(ModelEvent::NodeAdded { node, kind });
        Ok(node)
    }

    pub fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), ModelError> {
        self.arena.set_property(node, name, value)?;
        self.bus.publish(ModelEvent::PropertySet {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn set_reference(
        &mut self,
        node: NodeId,
        slot: &str,
        target: &str,
    ) -> Result<(), ModelError> {
        self.arena.set_reference(node, slot, target)?;
        self.bus.publish(ModelEvent::ReferenceSet {
            node,
            slot: slot.to_string(),
        });
        Ok(())
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Runs a full evaluation over the current tree. Each evaluation starts
    /// from a fresh world; there is no incremental invalidation.
    pub fn analyze(&self) -> Result<Analysis, LangError> {
        analyze(self.arena.clone())
    }
}
