use astro_gl::errors::GLErrorWrapper;
use std::fmt::{Debug, Display, Formatter};

pub enum SceneError {
    GL(GLErrorWrapper),
    #[cfg(feature = "png")]
    Png(png::DecodingError),
    /// decoded fine, but not a layout we can hand to `glTexImage2D`
    UnsupportedImage(String),
    /// a lifecycle callback arrived before the one it depends on
    NotReady(&'static str),
}

impl SceneError {
    /// Everything but a callback arriving early ends the host loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SceneError::NotReady(_))
    }
}

impl From<GLErrorWrapper> for SceneError {
    fn from(value: GLErrorWrapper) -> Self {
        SceneError::GL(value)
    }
}

#[cfg(feature = "png")]
impl From<png::DecodingError> for SceneError {
    fn from(value: png::DecodingError) -> Self {
        SceneError::Png(value)
    }
}

impl Debug for SceneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::GL(e) => write!(f, "{:?}", e),
            #[cfg(feature = "png")]
            SceneError::Png(e) => write!(f, "failed to decode background image: {}", e),
            SceneError::UnsupportedImage(msg) => write!(f, "unsupported image: {}", msg),
            SceneError::NotReady(what) => write!(f, "not ready: {}", what),
        }
    }
}

impl Display for SceneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <Self as Debug>::fmt(self, f)
    }
}

impl std::error::Error for SceneError {}
