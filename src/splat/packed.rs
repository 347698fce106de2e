use std::marker::Copy;

use bevy::prelude::*;
use bytemuck::{
    Pod,
    Zeroable,
};
use serde::{
    Deserialize,
    Serialize,
};
use static_assertions::const_assert_eq;


/// Byte length of one packed splat in `SplatBuffer::attribute_data`.
pub const ATTRIBUTE_STRIDE: usize = 32;

/// Zeroth order spherical harmonic basis constant, maps `f_dc_*` to linear color.
pub const SH_C0: f32 = 0.282_094_8;


#[derive(
    Clone,
    Debug,
    Default,
    Copy,
    PartialEq,
    Reflect,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct PackedSplat {
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub color: [u8; 4],
    pub rotation: [u8; 4],
}

const_assert_eq!(std::mem::size_of::<PackedSplat>(), ATTRIBUTE_STRIDE);

impl PackedSplat {
    pub fn new(
        position: Vec3,
        scale: Vec3,
        rotation: Quat,
        color: Vec3,
        opacity: f32,
    ) -> Self {
        Self {
            position: position.to_array(),
            scale: scale.to_array(),
            color: [
                quantize_unorm(color.x),
                quantize_unorm(color.y),
                quantize_unorm(color.z),
                quantize_unorm(opacity),
            ],
            rotation: quantize_rotation(rotation),
        }
    }

    pub fn opacity(&self) -> f32 {
        self.color[3] as f32 / 255.0
    }

    /// Rotation stored as (w, x, y, z), each component mapped from [-1, 1] to [0, 255].
    pub fn rotation(&self) -> Quat {
        let [w, x, y, z] = self.rotation.map(|v| (v as f32 - 128.0) / 128.0);
        Quat::from_xyzw(x, y, z, w).normalize()
    }
}

fn quantize_unorm(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn quantize_rotation(rotation: Quat) -> [u8; 4] {
    let rotation = if rotation.is_normalized() {
        rotation
    } else {
        rotation.normalize()
    };

    [rotation.w, rotation.x, rotation.y, rotation.z]
        .map(|v| (v * 128.0 + 128.0).round().clamp(0.0, 255.0) as u8)
}


pub fn pack_attributes(splats: &[PackedSplat]) -> Vec<u8> {
    bytemuck::cast_slice(splats).to_vec()
}

/// Copies out the records of a packed attribute stream; `None` if the length is not a whole number of records.
pub fn unpack_attributes(attribute_data: &[u8]) -> Option<Vec<PackedSplat>> {
    if attribute_data.len() % ATTRIBUTE_STRIDE != 0 {
        return None;
    }

    Some(
        attribute_data
            .chunks_exact(ATTRIBUTE_STRIDE)
            .map(bytemuck::pod_read_unaligned::<PackedSplat>)
            .collect()
    )
}
