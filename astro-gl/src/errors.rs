use gl::types::GLenum;
use std::fmt::{Debug, Display, Formatter};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

//

#[derive(Clone, PartialEq)]
pub enum GLErrorWrapper {
    /// whatever `glGetError` reported last
    Code(GLenum),
    ShaderCompile {
        stage: ShaderStage,
        log: String,
    },
    ShaderLink {
        log: String,
    },
    /// `glGenTextures` handed back 0
    TextureAllocation,
    InvalidGeometry(String),
    Message(String),
}

impl GLErrorWrapper {
    pub fn new(code: GLenum) -> Self {
        GLErrorWrapper::Code(code)
    }

    pub fn with_message(msg: impl Into<String>) -> Self {
        GLErrorWrapper::Message(msg.into())
    }
}

impl Debug for GLErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GLErrorWrapper::Code(code) => write!(f, "GL error 0x{:x}", code),
            GLErrorWrapper::ShaderCompile { stage, log } => {
                write!(f, "{} shader failed to compile: {}", stage, log.trim_end())
            }
            GLErrorWrapper::ShaderLink { log } => {
                write!(f, "program failed to link: {}", log.trim_end())
            }
            GLErrorWrapper::TextureAllocation => f.write_str("failed to allocate a texture object"),
            GLErrorWrapper::InvalidGeometry(msg) => write!(f, "invalid geometry: {}", msg),
            GLErrorWrapper::Message(msg) => f.write_str(msg),
        }
    }
}

impl Display for GLErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <Self as Debug>::fmt(self, f)
    }
}

impl std::error::Error for GLErrorWrapper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_names_the_stage() {
        let err = GLErrorWrapper::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:3: syntax error\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "fragment shader failed to compile: 0:3: syntax error"
        );
    }

    #[test]
    fn raw_codes_print_in_hex() {
        assert_eq!(GLErrorWrapper::new(0x502).to_string(), "GL error 0x502");
    }
}
