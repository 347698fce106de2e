use std::sync::Arc;

use bevy::prelude::*;

use crate::{
    aggregate::{
        AggregateSplatSet,
        NodeRange,
        settings::ShMergePolicy,
    },
    error::SplatError,
    node::{
        NodeId,
        NodeTransforms,
    },
    splat::{
        buffer::SplatBuffer,
        harmonics::{
            SH_TEXEL_BYTES,
            texture_bytes,
            texture_side,
            texture_side_of,
        },
        packed::ATTRIBUTE_STRIDE,
    },
};


/// Builds the aggregate that results from appending `incoming` as `node`.
///
/// `incoming` must already be validated as a single-node buffer. The
/// previous aggregate is only read; on error nothing observable changed.
pub fn merge(
    aggregate: &AggregateSplatSet,
    incoming: SplatBuffer,
    node: NodeId,
    sh_policy: ShMergePolicy,
) -> Result<AggregateSplatSet, SplatError> {
    let current = aggregate.buffer();
    let count_a = current.len();
    let count_b = incoming.len();

    let world_transform = incoming.world_transform();

    let mut transforms = aggregate
        .transforms()
        .try_clone()
        .map_err(|_| allocation_failure::<(NodeId, Mat4)>(aggregate.transforms().len() + 1))?;
    transforms.insert(node, world_transform);

    let mut ranges = try_with_capacity::<NodeRange>(aggregate.node_ranges().len() + 1)?;
    ranges.extend_from_slice(aggregate.node_ranges());
    ranges.push(NodeRange {
        node,
        start: count_a as u32,
        count: count_b as u32,
    });

    let buffer = if count_b == 0 {
        Arc::clone(current)
    } else if count_a == 0 {
        Arc::new(adopt(incoming, node, sh_policy)?)
    } else {
        Arc::new(concatenate(current, incoming, node, sh_policy)?)
    };

    debug!(
        node = node.0,
        previous_splats = count_a,
        incoming_splats = count_b,
        sh = buffer.sh_data.is_some(),
        "merged splat asset into aggregate"
    );

    Ok(AggregateSplatSet::from_parts(buffer, transforms, ranges))
}


/// First real asset of an empty aggregate: its data moves in without copying.
fn adopt(
    incoming: SplatBuffer,
    node: NodeId,
    sh_policy: ShMergePolicy,
) -> Result<SplatBuffer, SplatError> {
    let count = incoming.len();

    let mut node_indices = try_with_capacity::<u32>(count)?;
    node_indices.extend(std::iter::repeat_n(node.0, count));

    let sh_data = match sh_policy {
        ShMergePolicy::Merge => incoming.sh_data,
        ShMergePolicy::Discard => None,
    };

    Ok(SplatBuffer {
        splat_count: incoming.splat_count,
        attribute_data: incoming.attribute_data,
        sh_data,
        node_indices: Some(node_indices),
        node_transforms: NodeTransforms::default(),
    })
}

fn concatenate(
    current: &SplatBuffer,
    incoming: SplatBuffer,
    node: NodeId,
    sh_policy: ShMergePolicy,
) -> Result<SplatBuffer, SplatError> {
    let count_a = current.len();
    let count_b = incoming.len();
    let total = count_a + count_b;

    let mut attribute_data = try_with_capacity::<u8>(total * ATTRIBUTE_STRIDE)?;
    attribute_data.extend_from_slice(&current.attribute_data);
    attribute_data.extend_from_slice(&incoming.attribute_data);

    let sh_data = match (sh_policy, &current.sh_data, &incoming.sh_data) {
        (ShMergePolicy::Merge, Some(textures_a), Some(textures_b)) => {
            Some(merge_sh_textures(textures_a, count_a, textures_b, count_b)?)
        }
        (ShMergePolicy::Merge, Some(_), None) | (ShMergePolicy::Merge, None, Some(_)) => {
            warn!(
                node = node.0,
                "only one side of the merge carries spherical harmonics, dropping sh for the aggregate"
            );
            None
        }
        _ => None,
    };

    let mut node_indices = try_with_capacity::<u32>(total)?;
    match &current.node_indices {
        Some(indices) => node_indices.extend_from_slice(indices),
        None => node_indices.extend(std::iter::repeat_n(0, count_a)),
    }
    node_indices.extend(std::iter::repeat_n(node.0, count_b));

    Ok(SplatBuffer {
        splat_count: total as u32,
        attribute_data,
        sh_data,
        node_indices: Some(node_indices),
        node_transforms: NodeTransforms::default(),
    })
}


/// Level-by-level SH merge.
///
/// B's texels start at texel `count_a`, not after A's full grid, so A's
/// padding slots are reused. A level missing on one side reads as zeros.
pub fn merge_sh_textures(
    textures_a: &[Vec<u8>],
    count_a: usize,
    textures_b: &[Vec<u8>],
    count_b: usize,
) -> Result<Vec<Vec<u8>>, SplatError> {
    let levels = textures_a.len().max(textures_b.len());

    let side = grid_side(textures_a)
        .max(grid_side(textures_b))
        .max(texture_side(count_a + count_b));
    let bytes = texture_bytes(side);

    let payload_a = count_a * SH_TEXEL_BYTES;
    let payload_b = count_b * SH_TEXEL_BYTES;

    let mut merged = try_with_capacity::<Vec<u8>>(levels)?;
    for level in 0..levels {
        let mut texture = try_zeroed(bytes)?;

        if let Some(source) = textures_a.get(level) {
            let len = payload_a.min(source.len());
            texture[..len].copy_from_slice(&source[..len]);
        }

        if let Some(source) = textures_b.get(level) {
            let len = payload_b.min(source.len());
            texture[payload_a..payload_a + len].copy_from_slice(&source[..len]);
        }

        merged.push(texture);
    }

    Ok(merged)
}

fn grid_side(textures: &[Vec<u8>]) -> usize {
    textures
        .first()
        .and_then(|texture| texture_side_of(texture))
        .unwrap_or(0)
}


fn allocation_failure<T>(len: usize) -> SplatError {
    SplatError::AllocationFailure {
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    }
}

fn try_with_capacity<T>(len: usize) -> Result<Vec<T>, SplatError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| allocation_failure::<T>(len))?;
    Ok(data)
}

fn try_zeroed(len: usize) -> Result<Vec<u8>, SplatError> {
    let mut data = try_with_capacity::<u8>(len)?;
    data.resize(len, 0);
    Ok(data)
}
