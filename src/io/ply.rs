use std::io::{
    BufRead,
    ErrorKind,
};

use bevy::prelude::*;
use ply_rs::{
    parser::Parser,
    ply::{Property, PropertyAccess},
};

use crate::splat::{
    buffer::SplatBuffer,
    harmonics::{
        SH_CHANNELS,
        degree_from_rest_count,
        pack_sh_textures,
        rest_coefficient_count,
        MAX_SH_DEGREE,
    },
    packed::{
        PackedSplat,
        SH_C0,
    },
};

pub const MAX_SIZE_VARIANCE: f32 = 4.0;

const MAX_REST_COEFFICIENTS: usize = rest_coefficient_count(MAX_SH_DEGREE);


/// One `vertex` element of a 3DGS training ply, in file space.
#[derive(Clone, Debug, Default)]
pub struct PlySplat {
    pub position: [f32; 3],
    pub f_dc: [f32; 3],
    pub f_rest: Vec<f32>,
    pub scale: [f32; 3],
    pub opacity: f32,
    pub rotation: [f32; 4],
}

impl PropertyAccess for PlySplat {
    fn new() -> Self {
        PlySplat::default()
    }

    fn set_property(&mut self, key: String, property: Property) {
        let value = match property {
            Property::Float(v) => v,
            Property::Double(v) => v as f32,
            _ => return,
        };

        match key.as_ref() {
            "x" => self.position[0] = value,
            "y" => self.position[1] = value,
            "z" => self.position[2] = value,
            "f_dc_0" => self.f_dc[0] = value,
            "f_dc_1" => self.f_dc[1] = value,
            "f_dc_2" => self.f_dc[2] = value,
            "scale_0" => self.scale[0] = value,
            "scale_1" => self.scale[1] = value,
            "scale_2" => self.scale[2] = value,
            "opacity" => self.opacity = value,
            "rot_0" => self.rotation[0] = value,
            "rot_1" => self.rotation[1] = value,
            "rot_2" => self.rotation[2] = value,
            "rot_3" => self.rotation[3] = value,
            _ if key.starts_with("f_rest_") => {
                let Ok(i) = key[7..].parse::<usize>() else {
                    return;
                };

                if i < MAX_REST_COEFFICIENTS {
                    if self.f_rest.len() <= i {
                        self.f_rest.resize(i + 1, 0.0);
                    }
                    self.f_rest[i] = value;
                }
            }
            _ => {}
        }
    }
}

impl PlySplat {
    pub fn to_packed(&self) -> PackedSplat {
        let mean_scale = self.scale.iter().sum::<f32>() / 3.0;
        let scale = Vec3::from_array(self.scale.map(|s| {
            s.max(mean_scale - MAX_SIZE_VARIANCE)
                .min(mean_scale + MAX_SIZE_VARIANCE)
                .exp()
        }));

        let [w, x, y, z] = self.rotation;
        let rotation = Quat::from_xyzw(x, y, z, w);
        let rotation = if rotation.length_squared() > 0.0 {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };

        let color = Vec3::from_array(self.f_dc).mul_add(Vec3::splat(SH_C0), Vec3::splat(0.5));
        let opacity = 1.0 / (1.0 + (-self.opacity).exp());

        PackedSplat::new(
            Vec3::from_array(self.position),
            scale,
            rotation,
            color,
            opacity,
        )
    }

    /// Rest coefficients reordered from channel-major file layout to coefficient-major.
    pub fn interleaved_rest(&self, degree: usize) -> Vec<f32> {
        let per_channel = rest_coefficient_count(degree) / SH_CHANNELS;
        let mut interleaved = vec![0.0; per_channel * SH_CHANNELS];

        for channel in 0..SH_CHANNELS {
            for coefficient in 0..per_channel {
                let file_index = channel * per_channel + coefficient;
                interleaved[coefficient * SH_CHANNELS + channel] =
                    self.f_rest.get(file_index).copied().unwrap_or(0.0);
            }
        }

        interleaved
    }
}


pub fn parse_ply(mut reader: &mut dyn BufRead) -> Result<SplatBuffer, std::io::Error> {
    let splat_parser = Parser::<PlySplat>::new();
    let header = splat_parser.read_header(&mut reader)?;

    let mut splats = Vec::new();
    let mut rest_count = 0;

    let required_properties = [
        "x", "y", "z", "f_dc_0", "f_dc_1", "f_dc_2", "scale_0", "scale_1", "scale_2", "opacity",
        "rot_0", "rot_1", "rot_2", "rot_3",
    ];

    for (_key, element) in &header.elements {
        if element.name == "vertex" {
            let missing = required_properties
                .iter()
                .filter(|property| !element.properties.contains_key(**property))
                .collect::<Vec<_>>();

            if !missing.is_empty() {
                return Err(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("missing required properties: {missing:?}"),
                ));
            }

            rest_count = element
                .properties
                .keys()
                .filter(|key| key.starts_with("f_rest_"))
                .count();

            splats = splat_parser.read_payload_for_element(&mut reader, element, &header)?;
        }
    }

    let packed = splats.iter().map(PlySplat::to_packed).collect::<Vec<_>>();
    let buffer = SplatBuffer::from_splats(&packed);

    let degree = match rest_count {
        0 => None,
        count => {
            let degree = degree_from_rest_count(count.min(MAX_REST_COEFFICIENTS));
            if degree.is_none() {
                warn!(rest_count, "unsupported spherical harmonic layout, loading without sh");
            }
            degree
        }
    };

    let Some(degree) = degree else {
        return Ok(buffer);
    };

    let coefficients = splats
        .iter()
        .flat_map(|splat| splat.interleaved_rest(degree))
        .collect::<Vec<_>>();

    Ok(buffer.with_sh_data(pack_sh_textures(&coefficients, degree, splats.len())))
}
