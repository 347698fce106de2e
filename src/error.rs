use thiserror::Error;

use crate::node::NodeId;


#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SplatError {
    #[error("invalid splat asset shape: {0}")]
    InvalidAssetShape(#[from] ShapeError),

    #[error("unknown node handle {node} (generation {generation})")]
    UnknownNodeHandle {
        node: NodeId,
        generation: u32,
    },

    #[error("failed to allocate {bytes} bytes for the merged splat buffer")]
    AllocationFailure {
        bytes: usize,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("attribute data is {actual} bytes, expected {expected}")]
    StrideMismatch {
        expected: usize,
        actual: usize,
    },

    #[error("{actual} node indices for {expected} splats")]
    NodeIndexCount {
        expected: usize,
        actual: usize,
    },

    #[error("asset references more than one node ({first} and {other})")]
    MultipleNodes {
        first: u32,
        other: u32,
    },

    #[error("sh texture {level} is {actual} bytes, level 0 is {expected}")]
    ShTextureMismatch {
        level: usize,
        expected: usize,
        actual: usize,
    },

    #[error("sh texture {level} of {bytes} bytes is not a square texel grid")]
    ShTextureNotSquare {
        level: usize,
        bytes: usize,
    },

    #[error("sh grid holds {texels} texels, fewer than {splats} splats")]
    ShGridTooSmall {
        texels: usize,
        splats: usize,
    },

    #[error("transform for {node} which no splat references")]
    UnreferencedNodeTransform {
        node: NodeId,
    },
}
