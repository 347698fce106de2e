use std::sync::Arc;

use bevy::prelude::*;

use crate::{
    error::SplatError,
    node::{
        NodeHandle,
        NodeId,
        NodeIdAllocator,
        NodeTransforms,
    },
    splat::{
        buffer::SplatBuffer,
        packed::ATTRIBUTE_STRIDE,
    },
};

pub mod merge;
pub mod proxy;
pub mod settings;

pub use settings::{
    AggregateSettings,
    ShMergePolicy,
};


/// Contiguous run of aggregate splats owned by one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub struct NodeRange {
    pub node: NodeId,
    pub start: u32,
    pub count: u32,
}

impl NodeRange {
    pub fn end(&self) -> u32 {
        self.start + self.count
    }

    pub fn contains(&self, index: u32) -> bool {
        index >= self.start && index < self.end()
    }
}


/// The merged buffer plus the live node transform table.
///
/// The buffer is shared immutably and replaced wholesale by every merge. Its
/// own `node_transforms` stay empty; the live table is `transforms`.
#[derive(Clone, Debug, Default)]
pub struct AggregateSplatSet {
    buffer: Arc<SplatBuffer>,
    transforms: NodeTransforms,
    ranges: Vec<NodeRange>,
}

impl AggregateSplatSet {
    pub(crate) fn from_parts(
        buffer: Arc<SplatBuffer>,
        transforms: NodeTransforms,
        ranges: Vec<NodeRange>,
    ) -> Self {
        Self {
            buffer,
            transforms,
            ranges,
        }
    }

    pub fn buffer(&self) -> &Arc<SplatBuffer> {
        &self.buffer
    }

    pub fn transforms(&self) -> &NodeTransforms {
        &self.transforms
    }

    pub fn node_ranges(&self) -> &[NodeRange] {
        &self.ranges
    }
}


#[derive(Resource, Debug, Default)]
pub struct SplatAggregator {
    settings: AggregateSettings,
    allocator: NodeIdAllocator,
    aggregate: AggregateSplatSet,
    generation: u32,
    revision: u64,
}

impl SplatAggregator {
    pub fn new(settings: AggregateSettings) -> Self {
        Self {
            settings,
            ..default()
        }
    }

    pub fn settings(&self) -> &AggregateSettings {
        &self.settings
    }

    /// Merges one freshly loaded single-node asset and returns the handle of its new node.
    ///
    /// Runs to completion; on error the aggregate, revision and node ids are untouched.
    pub fn add_asset(&mut self, buffer: SplatBuffer) -> Result<NodeHandle, SplatError> {
        buffer.single_node()?;

        let total = self.aggregate.buffer.len() as u64 + buffer.len() as u64;
        if total > self.settings.max_splats as u64 {
            return Err(SplatError::AllocationFailure {
                bytes: (total as usize).saturating_mul(ATTRIBUTE_STRIDE),
            });
        }

        let Some(node) = self.allocator.peek() else {
            return Err(SplatError::AllocationFailure { bytes: 0 });
        };

        let merged = merge::merge(&self.aggregate, buffer, node, self.settings.sh_policy)?;

        self.aggregate = merged;
        self.allocator.allocate();
        self.revision += 1;

        Ok(NodeHandle::new(node, self.generation))
    }

    /// O(1) update of one node's world transform; the buffer is not touched.
    pub fn set_node_transform(
        &mut self,
        handle: NodeHandle,
        transform: Mat4,
    ) -> Result<(), SplatError> {
        let entry = self.entry_mut(handle)?;
        *entry = transform;
        Ok(())
    }

    pub fn node_transform(&self, handle: NodeHandle) -> Result<Mat4, SplatError> {
        if handle.generation() != self.generation {
            return Err(unknown(handle));
        }

        self.aggregate
            .transforms
            .get(handle.node())
            .copied()
            .ok_or_else(|| unknown(handle))
    }

    fn entry_mut(&mut self, handle: NodeHandle) -> Result<&mut Mat4, SplatError> {
        if handle.generation() != self.generation {
            return Err(unknown(handle));
        }

        self.aggregate
            .transforms
            .get_mut(handle.node())
            .ok_or_else(|| unknown(handle))
    }

    /// Drops every merged asset. Handles issued before the reset stop resolving
    /// and node ids keep counting up from where they were.
    pub fn reset(&mut self) {
        info!(
            generation = self.generation,
            nodes = self.aggregate.transforms.len(),
            "resetting splat aggregate"
        );

        self.aggregate = AggregateSplatSet::default();
        self.generation = self.generation.wrapping_add(1);
        self.revision += 1;
    }

    pub fn aggregate(&self) -> &AggregateSplatSet {
        &self.aggregate
    }

    /// Current merged buffer. Fetch it again after every merge.
    pub fn buffer(&self) -> &Arc<SplatBuffer> {
        self.aggregate.buffer()
    }

    pub fn transforms(&self) -> &NodeTransforms {
        self.aggregate.transforms()
    }

    pub fn node_ranges(&self) -> &[NodeRange] {
        self.aggregate.node_ranges()
    }

    pub fn node_count(&self) -> usize {
        self.aggregate.transforms.len()
    }

    pub fn splat_count(&self) -> u32 {
        self.aggregate.buffer.splat_count
    }

    pub fn splat_node(&self, index: usize) -> Option<NodeId> {
        self.aggregate.buffer.node_of(index).map(NodeId)
    }

    pub fn splat_transform(&self, index: usize) -> Option<Mat4> {
        self.splat_node(index)
            .map(|node| self.aggregate.transforms.get_or_identity(node))
    }

    /// Bumped by every merge and reset; unchanged by transform updates.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn next_node(&self) -> u32 {
        self.allocator.allocated()
    }

    /// Self-contained copy of the aggregate carrying the live transform table.
    pub fn to_buffer(&self) -> SplatBuffer {
        SplatBuffer {
            node_transforms: self.aggregate.transforms.clone(),
            ..self.aggregate.buffer.as_ref().clone()
        }
    }
}

fn unknown(handle: NodeHandle) -> SplatError {
    SplatError::UnknownNodeHandle {
        node: handle.node(),
        generation: handle.generation(),
    }
}
