use std::{
    collections::HashMap,
    hash::{
        Hash,
        Hasher,
    },
};

use bevy::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};


#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Reflect,
    Serialize,
    Deserialize,
)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}


/// Monotonic node id source. Ids are never handed out twice, including across
/// aggregate resets.
#[derive(Clone, Debug, Default)]
pub struct NodeIdAllocator {
    next: u32,
}

impl NodeIdAllocator {
    pub fn peek(&self) -> Option<NodeId> {
        (self.next < u32::MAX).then_some(NodeId(self.next))
    }

    pub fn allocate(&mut self) -> Option<NodeId> {
        let id = self.peek()?;
        self.next += 1;
        Some(id)
    }

    pub fn allocated(&self) -> u32 {
        self.next
    }
}


/// Addresses one merged asset inside an aggregator.
///
/// Equality and hashing only consider the node id. Ids are not reused, so a
/// handle issued before a reset never equals one issued after it; the aggregator
/// also checks the generation and rejects the stale handle.
#[derive(Clone, Copy, Debug, Reflect)]
pub struct NodeHandle {
    node: NodeId,
    generation: u32,
}

impl NodeHandle {
    pub(crate) fn new(node: NodeId, generation: u32) -> Self {
        Self { node, generation }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for NodeHandle {}

impl Hash for NodeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeTransformEntry {
    pub node: NodeId,
    pub matrix: Mat4,
}

/// World transform per node id. Missing entries read as identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<NodeTransformEntry>", into = "Vec<NodeTransformEntry>")]
pub struct NodeTransforms(HashMap<NodeId, Mat4>);

impl NodeTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&Mat4> {
        self.0.get(&node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Mat4> {
        self.0.get_mut(&node)
    }

    pub fn get_or_identity(&self, node: NodeId) -> Mat4 {
        self.0.get(&node).copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn insert(&mut self, node: NodeId, transform: Mat4) -> Option<Mat4> {
        self.0.insert(node, transform)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Mat4)> + '_ {
        self.0.iter().map(|(node, transform)| (*node, transform))
    }

    pub fn try_clone(&self) -> Result<Self, std::collections::TryReserveError> {
        let mut table = HashMap::new();
        table.try_reserve(self.0.len() + 1)?;
        table.extend(self.0.iter().map(|(node, transform)| (*node, *transform)));
        Ok(Self(table))
    }
}

impl FromIterator<(NodeId, Mat4)> for NodeTransforms {
    fn from_iter<I: IntoIterator<Item = (NodeId, Mat4)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<NodeTransformEntry>> for NodeTransforms {
    fn from(entries: Vec<NodeTransformEntry>) -> Self {
        entries
            .into_iter()
            .map(|entry| (entry.node, entry.matrix))
            .collect()
    }
}

impl From<NodeTransforms> for Vec<NodeTransformEntry> {
    fn from(transforms: NodeTransforms) -> Self {
        let mut entries = transforms.0
            .into_iter()
            .map(|(node, matrix)| NodeTransformEntry { node, matrix })
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.node);
        entries
    }
}
