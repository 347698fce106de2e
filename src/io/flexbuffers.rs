use std::io::ErrorKind;

use flexbuffers::{FlexbufferSerializer, Reader};
use serde::{Deserialize, Serialize};

use crate::{
    io::codec::SplatCodec,
    splat::buffer::SplatBuffer,
};

impl SplatCodec for SplatBuffer {
    fn encode(&self) -> Result<Vec<u8>, std::io::Error> {
        let mut serializer = FlexbufferSerializer::new();
        self.serialize(&mut serializer)
            .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

        Ok(serializer.view().to_vec())
    }

    fn decode(data: &[u8]) -> Result<Self, std::io::Error> {
        let reader = Reader::get_root(data)
            .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;
        let buffer = Self::deserialize(reader)
            .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

        buffer.validate()
            .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

        Ok(buffer)
    }
}
