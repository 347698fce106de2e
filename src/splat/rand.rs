use rand::{
    Rng,
    prelude::Distribution,
};

use crate::splat::{
    buffer::SplatBuffer,
    harmonics::{
        pack_sh_textures,
        rest_coefficient_count,
    },
    packed::PackedSplat,
};


impl Distribution<PackedSplat> for rand::distributions::Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PackedSplat {
        PackedSplat {
            position: [
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            ],
            scale: [
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
            ],
            color: rng.r#gen(),
            rotation: rng.r#gen(),
        }
    }
}

pub fn random_splats(n: usize) -> Vec<PackedSplat> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.r#gen()).collect()
}

/// Random single-node buffer; `sh_degree` of `Some(d)` adds degree `d` SH textures.
pub fn random_splat_buffer(n: usize, sh_degree: Option<usize>) -> SplatBuffer {
    let buffer = SplatBuffer::from_splats(&random_splats(n));

    match sh_degree {
        Some(degree) => {
            let mut rng = rand::thread_rng();
            let coefficients = (0..n * rest_coefficient_count(degree))
                .map(|_| rng.gen_range(-1.0..1.0))
                .collect::<Vec<f32>>();

            buffer.with_sh_data(pack_sh_textures(&coefficients, degree, n))
        }
        None => buffer,
    }
}
