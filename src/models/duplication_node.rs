//! Duplication bookkeeping for a single retrigger.
//!
//! A [`NodeMap`] is created empty at the start of one retrigger, filled by a
//! duplicator, and dropped once the duplicates have been submitted. It holds
//! exactly one [`DuplicationNode`] per original task id; [`NodeMap::reserve`]
//! is the only way in, so "already visited" and "insert" are a single step.

use std::collections::HashMap;

use super::TaskDefinition;

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicationNode {
    pub old_id: String,
    pub new_id: String,
    /// Duplicated definition; empty until the original has been fetched
    pub task: TaskDefinition,
    /// New ids of duplicated parents that reached this node, in discovery order
    pub requires: Vec<String>,
    /// Legacy graph rerun budget, carried through unchanged
    pub reruns: u32,
}

impl DuplicationNode {
    fn pending(old_id: &str, new_id: String) -> Self {
        Self {
            old_id: old_id.to_string(),
            new_id,
            task: TaskDefinition::default(),
            requires: Vec::new(),
            reruns: 0,
        }
    }

    fn add_parent(&mut self, parent_new_id: &str) {
        if !self.requires.iter().any(|r| r == parent_new_id) {
            self.requires.push(parent_new_id.to_string());
        }
    }
}

/// Outcome of [`NodeMap::reserve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    /// First visit; a node with this new id now exists and must be filled in
    Created(String),
    /// Already in the map; only the parent back-reference was recorded
    Revisited(String),
}

impl Reservation {
    pub fn new_id(&self) -> &str {
        match self {
            Reservation::Created(id) | Reservation::Revisited(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Reservation::Created(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    order: Vec<String>,
    nodes: HashMap<String, DuplicationNode>,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `old_id`, creating a pending node with a fresh id from
    /// `generate` if it has not been seen. `parent_new_id`, when given, is
    /// recorded in the node's `requires` either way.
    pub fn reserve(
        &mut self,
        old_id: &str,
        parent_new_id: Option<&str>,
        generate: impl FnOnce() -> String,
    ) -> Reservation {
        if let Some(node) = self.nodes.get_mut(old_id) {
            if let Some(parent) = parent_new_id {
                node.add_parent(parent);
            }
            return Reservation::Revisited(node.new_id.clone());
        }

        let mut node = DuplicationNode::pending(old_id, generate());
        if let Some(parent) = parent_new_id {
            node.add_parent(parent);
        }
        let new_id = node.new_id.clone();
        self.order.push(old_id.to_string());
        self.nodes.insert(old_id.to_string(), node);
        Reservation::Created(new_id)
    }

    pub fn get(&self, old_id: &str) -> Option<&DuplicationNode> {
        self.nodes.get(old_id)
    }

    pub fn get_mut(&mut self, old_id: &str) -> Option<&mut DuplicationNode> {
        self.nodes.get_mut(old_id)
    }

    pub fn contains(&self, old_id: &str) -> bool {
        self.nodes.contains_key(old_id)
    }

    pub fn new_id_of(&self, old_id: &str) -> Option<&str> {
        self.nodes.get(old_id).map(|n| n.new_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &DuplicationNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DuplicationNode> {
        self.nodes.values_mut()
    }

    /// Derived old→new identifier map
    pub fn id_mapping(&self) -> HashMap<String, String> {
        self.nodes
            .iter()
            .map(|(old, node)| (old.clone(), node.new_id.clone()))
            .collect()
    }

    /// Consume the map, yielding nodes in discovery order
    pub fn into_nodes(mut self) -> Vec<DuplicationNode> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.remove(id))
            .collect()
    }
}
