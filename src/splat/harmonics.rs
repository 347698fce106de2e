use half::f16;


/// Byte size of one SH texel: four 32-bit channels.
pub const SH_TEXEL_BYTES: usize = 16;
pub const SH_TEXEL_CHANNELS: usize = 4;
/// Every channel carries two half precision coefficients.
pub const SH_COEFFICIENTS_PER_TEXEL: usize = SH_TEXEL_CHANNELS * 2;

pub const SH_CHANNELS: usize = 3;
pub const MAX_SH_DEGREE: usize = 3;


/// Coefficient count above the DC band, summed over all color channels.
pub const fn rest_coefficient_count(degree: usize) -> usize {
    ((degree + 1) * (degree + 1) - 1) * SH_CHANNELS
}

pub const fn sh_texture_count(degree: usize) -> usize {
    rest_coefficient_count(degree).div_ceil(SH_COEFFICIENTS_PER_TEXEL)
}

pub fn degree_from_rest_count(rest_count: usize) -> Option<usize> {
    (1..=MAX_SH_DEGREE).find(|&degree| rest_coefficient_count(degree) == rest_count)
}


/// Side length of the smallest square texel grid holding `count` texels.
pub fn texture_side(count: usize) -> usize {
    let mut side = (count as f64).sqrt() as usize;
    while side * side < count {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= count {
        side -= 1;
    }
    side
}

pub fn texture_bytes(side: usize) -> usize {
    side * side * SH_TEXEL_BYTES
}

/// Grid side of an SH texture, `None` unless its byte length forms a square grid of whole texels.
pub fn texture_side_of(texture: &[u8]) -> Option<usize> {
    if texture.len() % SH_TEXEL_BYTES != 0 {
        return None;
    }

    let texels = texture.len() / SH_TEXEL_BYTES;
    let side = texture_side(texels);
    (side * side == texels).then_some(side)
}


pub fn pack_f32s_to_u32(upper: f32, lower: f32) -> u32 {
    pack_f16s_to_u32(
        f16::from_f32(upper),
        f16::from_f32(lower),
    )
}

pub fn pack_f16s_to_u32(upper: f16, lower: f16) -> u32 {
    let upper_bits = (upper.to_bits() as u32) << 16;
    let lower_bits = lower.to_bits() as u32;
    upper_bits | lower_bits
}

pub fn unpack_u32_to_f32s(value: u32) -> (f32, f32) {
    let upper = f16::from_bits((value >> 16) as u16);
    let lower = f16::from_bits((value & 0xFFFF) as u16);
    (upper.to_f32(), lower.to_f32())
}


/// Packs per-splat rest coefficients into square SH textures.
///
/// `coefficients` holds `rest_coefficient_count(degree)` values per splat,
/// splat after splat. Splat `i` lands on texel `i` of every texture, texture
/// `t` carrying coefficients `8t .. 8t + 8`.
pub fn pack_sh_textures(
    coefficients: &[f32],
    degree: usize,
    splat_count: usize,
) -> Vec<Vec<u8>> {
    let per_splat = rest_coefficient_count(degree);
    let texture_count = sh_texture_count(degree);
    let side = texture_side(splat_count);

    let mut textures = vec![vec![0_u8; texture_bytes(side)]; texture_count];

    for (splat, splat_coefficients) in coefficients
        .chunks_exact(per_splat)
        .take(splat_count)
        .enumerate()
    {
        for (texture_index, texture) in textures.iter_mut().enumerate() {
            let start = texture_index * SH_COEFFICIENTS_PER_TEXEL;
            let coefficient = |i: usize| splat_coefficients.get(start + i).copied().unwrap_or(0.0);

            let texel_offset = splat * SH_TEXEL_BYTES;
            for channel in 0..SH_TEXEL_CHANNELS {
                let packed = pack_f32s_to_u32(coefficient(channel * 2), coefficient(channel * 2 + 1));
                let offset = texel_offset + channel * 4;
                texture[offset..offset + 4].copy_from_slice(&packed.to_le_bytes());
            }
        }
    }

    textures
}

/// Inverse of [`pack_sh_textures`] for a single splat.
pub fn unpack_sh_texel(
    textures: &[Vec<u8>],
    splat: usize,
    degree: usize,
) -> Vec<f32> {
    let per_splat = rest_coefficient_count(degree);
    let mut coefficients = Vec::with_capacity(per_splat);

    for texture in textures {
        let texel_offset = splat * SH_TEXEL_BYTES;
        let Some(texel) = texture.get(texel_offset..texel_offset + SH_TEXEL_BYTES) else {
            break;
        };

        for channel in texel.chunks_exact(4) {
            let value = u32::from_le_bytes([channel[0], channel[1], channel[2], channel[3]]);
            let (upper, lower) = unpack_u32_to_f32s(value);
            coefficients.push(upper);
            coefficients.push(lower);
        }
    }

    coefficients.truncate(per_splat);
    coefficients
}
