use std::io::ErrorKind;

use crate::splat::{
    buffer::SplatBuffer,
    packed::ATTRIBUTE_STRIDE,
};


/// Decodes a raw `.splat` file: back to back packed records, no SH.
pub fn parse_splat(bytes: Vec<u8>) -> Result<SplatBuffer, std::io::Error> {
    if bytes.len() % ATTRIBUTE_STRIDE != 0 {
        return Err(std::io::Error::new(
            ErrorKind::InvalidData,
            format!(
                ".splat payload of {} bytes is not a multiple of {ATTRIBUTE_STRIDE}",
                bytes.len(),
            ),
        ));
    }

    let splat_count = u32::try_from(bytes.len() / ATTRIBUTE_STRIDE)
        .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

    Ok(SplatBuffer {
        splat_count,
        attribute_data: bytes,
        ..Default::default()
    })
}
