pub mod codec;
pub mod loader;
pub mod scene;
pub mod splat;

#[cfg(feature = "io_flexbuffers")]
pub mod flexbuffers;

#[cfg(feature = "io_flexbuffers")]
pub mod writer;

#[cfg(feature = "io_ply")]
pub mod ply;
