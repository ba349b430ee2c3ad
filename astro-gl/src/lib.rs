pub mod errors;
pub mod gl_api;
pub mod gl_fancy;
pub mod gl_helper;
pub mod linear;
#[cfg(any(test, feature = "recording"))]
pub mod recording;
