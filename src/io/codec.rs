// TODO: support streamed codecs
pub trait SplatCodec: Sized {
    fn encode(&self) -> Result<Vec<u8>, std::io::Error>;
    fn decode(data: &[u8]) -> Result<Self, std::io::Error>;
}
