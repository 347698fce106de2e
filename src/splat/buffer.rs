use bevy::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    error::ShapeError,
    node::{
        NodeId,
        NodeTransforms,
    },
    splat::{
        harmonics::{
            SH_TEXEL_BYTES,
            texture_side_of,
        },
        packed::{
            ATTRIBUTE_STRIDE,
            PackedSplat,
            pack_attributes,
        },
    },
};


/// Engine-ready splat data of one loaded asset, or of the whole aggregate.
///
/// Splat `i` owns bytes `i * ATTRIBUTE_STRIDE ..` of `attribute_data`, texel
/// `i` of every SH texture and entry `i` of `node_indices`.
#[derive(
    Asset,
    Clone,
    Debug,
    Default,
    PartialEq,
    TypePath,
    Serialize,
    Deserialize,
)]
pub struct SplatBuffer {
    pub splat_count: u32,
    pub attribute_data: Vec<u8>,

    /// `None` carries no SH at all, which is not the same as an empty texture list.
    #[serde(default)]
    pub sh_data: Option<Vec<Vec<u8>>>,

    /// `None` puts every splat on node 0.
    #[serde(default)]
    pub node_indices: Option<Vec<u32>>,

    #[serde(default)]
    pub node_transforms: NodeTransforms,
}

impl SplatBuffer {
    pub fn from_splats(splats: &[PackedSplat]) -> Self {
        Self {
            splat_count: splats.len() as u32,
            attribute_data: pack_attributes(splats),
            ..default()
        }
    }

    pub fn with_sh_data(mut self, sh_data: Vec<Vec<u8>>) -> Self {
        self.sh_data = Some(sh_data);
        self
    }

    /// Sets the transform of the node the splats belong to.
    pub fn with_world_transform(mut self, transform: Mat4) -> Self {
        let node = NodeId(self.first_node());
        self.node_transforms.insert(node, transform);
        self
    }

    pub fn len(&self) -> usize {
        self.splat_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.splat_count == 0
    }

    pub fn attributes(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(ATTRIBUTE_STRIDE)?;
        self.attribute_data.get(start..start + ATTRIBUTE_STRIDE)
    }

    pub fn splat(&self, index: usize) -> Option<PackedSplat> {
        self.attributes(index).map(bytemuck::pod_read_unaligned)
    }

    pub fn node_of(&self, index: usize) -> Option<u32> {
        if index >= self.len() {
            return None;
        }

        match &self.node_indices {
            Some(indices) => indices.get(index).copied(),
            None => Some(0),
        }
    }

    pub fn sh_texel(&self, level: usize, index: usize) -> Option<&[u8]> {
        let texture = self.sh_data.as_ref()?.get(level)?;
        let start = index * SH_TEXEL_BYTES;
        texture.get(start..start + SH_TEXEL_BYTES)
    }

    /// Texel grid side shared by all SH textures.
    pub fn sh_side(&self) -> Option<usize> {
        self.sh_data
            .as_ref()?
            .first()
            .and_then(|texture| texture_side_of(texture))
    }

    /// World transform of the asset's node, identity when none was baked in.
    pub fn world_transform(&self) -> Mat4 {
        self.node_transforms.get_or_identity(NodeId(self.first_node()))
    }

    fn first_node(&self) -> u32 {
        self.node_indices
            .as_ref()
            .and_then(|indices| indices.first().copied())
            .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        let count = self.len();

        let expected = count * ATTRIBUTE_STRIDE;
        if self.attribute_data.len() != expected {
            return Err(ShapeError::StrideMismatch {
                expected,
                actual: self.attribute_data.len(),
            });
        }

        if let Some(indices) = &self.node_indices {
            if indices.len() != count {
                return Err(ShapeError::NodeIndexCount {
                    expected: count,
                    actual: indices.len(),
                });
            }
        }

        if let Some(textures) = &self.sh_data {
            validate_sh_textures(textures, count)?;
        }

        for node in self.node_transforms.nodes() {
            if !self.references_node(node.0) {
                return Err(ShapeError::UnreferencedNodeTransform { node });
            }
        }

        Ok(())
    }

    /// Validates the buffer and returns the one local node every splat belongs to.
    pub fn single_node(&self) -> Result<u32, ShapeError> {
        self.validate()?;

        let first = self.first_node();
        if let Some(indices) = &self.node_indices {
            if let Some(&other) = indices.iter().find(|&&node| node != first) {
                return Err(ShapeError::MultipleNodes { first, other });
            }
        }

        Ok(first)
    }

    fn references_node(&self, node: u32) -> bool {
        match &self.node_indices {
            Some(indices) if !indices.is_empty() => indices.contains(&node),
            _ => node == 0,
        }
    }

    pub fn test_model() -> Self {
        let mut splats = Vec::new();

        for &x in [-0.5, 0.5].iter() {
            for &y in [-0.5, 0.5].iter() {
                for &z in [-0.5, 0.5].iter() {
                    splats.push(PackedSplat::new(
                        Vec3::new(x, y, z),
                        Vec3::splat(0.125),
                        Quat::IDENTITY,
                        Vec3::new(x + 0.5, y + 0.5, z + 0.5),
                        0.8,
                    ));
                }
            }
        }

        Self::from_splats(&splats)
    }
}

fn validate_sh_textures(textures: &[Vec<u8>], splats: usize) -> Result<(), ShapeError> {
    let Some(first) = textures.first() else {
        return Ok(());
    };

    for (level, texture) in textures.iter().enumerate() {
        if texture.len() != first.len() {
            return Err(ShapeError::ShTextureMismatch {
                level,
                expected: first.len(),
                actual: texture.len(),
            });
        }
    }

    let Some(side) = texture_side_of(first) else {
        return Err(ShapeError::ShTextureNotSquare {
            level: 0,
            bytes: first.len(),
        });
    };

    let texels = side * side;
    if texels < splats {
        return Err(ShapeError::ShGridTooSmall { texels, splats });
    }

    Ok(())
}
