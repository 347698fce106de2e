use std::io::ErrorKind;
#[cfg(feature = "io_ply")]
use std::io::{
    BufReader,
    Cursor,
};

use bevy::asset::{
    AssetLoader,
    LoadContext,
    io::Reader,
};

use crate::splat::buffer::SplatBuffer;


#[derive(Default)]
pub struct SplatBufferLoader;

impl AssetLoader for SplatBufferLoader {
    type Asset = SplatBuffer;
    type Settings = ();
    type Error = std::io::Error;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;

        let buffer = match load_context.path().extension() {
            Some(ext) if ext == "ply" => {
                #[cfg(feature = "io_ply")]
                {
                    let cursor = Cursor::new(bytes);
                    let mut f = BufReader::new(cursor);

                    crate::io::ply::parse_ply(&mut f)?
                }

                #[cfg(not(feature = "io_ply"))]
                {
                    return Err(std::io::Error::other("ply support not enabled, enable with io_ply feature"));
                }
            }
            Some(ext) if ext == "splat" => crate::io::splat::parse_splat(bytes)?,
            Some(ext) if ext == "gsplat" => {
                #[cfg(feature = "io_flexbuffers")]
                {
                    use crate::io::codec::SplatCodec;

                    SplatBuffer::decode(bytes.as_slice())?
                }

                #[cfg(not(feature = "io_flexbuffers"))]
                {
                    return Err(std::io::Error::other("gsplat support not enabled, enable with io_flexbuffers feature"));
                }
            }
            _ => return Err(std::io::Error::other("only .ply, .splat and .gsplat supported")),
        };

        buffer.validate()
            .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

        bevy::log::info!(
            path = %load_context.path().display(),
            splat_count = buffer.splat_count,
            sh = buffer.sh_data.is_some(),
            "loaded splat asset"
        );

        Ok(buffer)
    }

    fn extensions(&self) -> &[&str] {
        &["ply", "splat", "gsplat"]
    }
}
