pub mod clip;
pub mod consts;
pub mod denoise;
pub mod error;
pub mod filter;
pub mod frame;
pub mod io;
pub mod pipeline;
