use std::io::Write;

use crate::{
    io::codec::SplatCodec,
    splat::buffer::SplatBuffer,
};


pub fn write_splat_buffer_to_file(
    buffer: &SplatBuffer,
    path: &str,
) -> Result<(), std::io::Error> {
    let gsplat_file = std::fs::File::create(path)?;
    let mut gsplat_writer = std::io::BufWriter::new(gsplat_file);

    let data = buffer.encode()?;
    gsplat_writer.write_all(data.as_slice())?;
    gsplat_writer.flush()
}
