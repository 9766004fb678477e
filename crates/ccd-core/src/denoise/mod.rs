pub mod geometry;
pub mod kernel;
pub mod params;

pub use geometry::{KernelGeometry, ReciprocalTable};
pub use kernel::{denoise, mirror_index, DenoiseKernel};
pub use params::{threshold_to_sq, DenoiseParams};
