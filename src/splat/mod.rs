pub mod buffer;
pub mod harmonics;
pub mod packed;
pub mod rand;
