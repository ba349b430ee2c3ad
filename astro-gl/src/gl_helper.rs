use crate::errors::{GLErrorWrapper, ShaderStage};
use crate::gl_api::GlApi;
use crate::gl_fancy::GPUState;
use gl::types::{GLenum, GLfloat, GLint, GLsizei, GLuint, GLushort};
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;

/// Drain the GL error queue; the last code wins.
pub fn explode_if_gl_error(gl: &dyn GlApi) -> Result<(), GLErrorWrapper> {
    let mut last_err = None;
    loop {
        let err = gl.get_error();
        if err == gl::NO_ERROR {
            break;
        } else {
            last_err = Some(err);
        }
    }

    match last_err {
        Some(e) => Err(GLErrorWrapper::new(e)),
        None => Ok(()),
    }
}

//

pub trait BufferTarget {
    const TARGET: GLenum;
}

pub struct ArrayBufferType {}
impl BufferTarget for ArrayBufferType {
    const TARGET: GLenum = gl::ARRAY_BUFFER;
}

pub struct ElementArrayBufferType {}
impl BufferTarget for ElementArrayBufferType {
    const TARGET: GLenum = gl::ELEMENT_ARRAY_BUFFER;
}

//

pub trait GLBufferType: bytemuck::Pod {
    const TYPE_CODE: GLenum;
}

impl GLBufferType for GLfloat {
    const TYPE_CODE: GLenum = gl::FLOAT;
}

impl GLBufferType for u8 {
    const TYPE_CODE: GLenum = gl::UNSIGNED_BYTE;
}

impl GLBufferType for GLushort {
    const TYPE_CODE: GLenum = gl::UNSIGNED_SHORT;
}

//

/// A GL buffer object holding an immutable copy of `T`s, uploaded with `STATIC_DRAW`.
pub struct Buffer<B, T> {
    handle: Option<GLuint>,
    len: usize,
    gpu_state: GPUState,
    phantom_data: PhantomData<(B, T)>,
}

impl<B: BufferTarget, T: GLBufferType> Buffer<B, T> {
    /// Allocate a buffer object and upload `values` once, in native byte order.
    pub fn upload(gpu_state: &GPUState, values: &[T]) -> Result<Self, GLErrorWrapper> {
        let gl = gpu_state.gl();
        let handle = gl.gen_buffer();
        explode_if_gl_error(gl)?;
        if handle == 0 {
            return Err(GLErrorWrapper::with_message("glGenBuffers returned 0"));
        }
        let rval = Self {
            handle: Some(handle),
            len: values.len(),
            gpu_state: gpu_state.clone(),
            phantom_data: Default::default(),
        };

        rval.bind()?;
        gl.buffer_data(B::TARGET, bytemuck::cast_slice(values), gl::STATIC_DRAW);
        explode_if_gl_error(gl)?;
        gl.bind_buffer(B::TARGET, 0);

        Ok(rval)
    }

    pub fn bind(&self) -> Result<(), GLErrorWrapper> {
        let gl = self.gpu_state.gl();
        gl.bind_buffer(B::TARGET, self.borrow_raw()?);
        explode_if_gl_error(gl)
    }
}

impl<B, T> Buffer<B, T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn borrow_raw(&self) -> Result<GLuint, GLErrorWrapper> {
        self.handle
            .ok_or_else(|| GLErrorWrapper::with_message("buffer already released"))
    }

    /// Delete the GL object now; later calls (and `Drop`) do nothing.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.gpu_state.gl().delete_buffer(handle);
        }
    }
}

impl<B, T> Drop for Buffer<B, T> {
    fn drop(&mut self) {
        self.release()
    }
}

//

pub trait ShaderFlavor {
    const FLAVOR: GLenum;
    const STAGE: ShaderStage;
}

pub struct VertexShader {}
impl ShaderFlavor for VertexShader {
    const FLAVOR: GLenum = gl::VERTEX_SHADER;
    const STAGE: ShaderStage = ShaderStage::Vertex;
}

pub struct FragmentShader {}
impl ShaderFlavor for FragmentShader {
    const FLAVOR: GLenum = gl::FRAGMENT_SHADER;
    const STAGE: ShaderStage = ShaderStage::Fragment;
}

//

pub struct Shader<T> {
    handle: Option<GLuint>,
    gpu_state: GPUState,
    phantom_data: PhantomData<T>,
}

impl<F: ShaderFlavor> Shader<F> {
    pub fn new_raw(gpu_state: &GPUState) -> Result<Self, GLErrorWrapper> {
        let gl = gpu_state.gl();
        let rval = gl.create_shader(F::FLAVOR);
        explode_if_gl_error(gl)?;
        if rval == 0 {
            return Err(GLErrorWrapper::with_message(format!(
                "glCreateShader({}) returned 0",
                F::STAGE
            )));
        }
        Ok(Self {
            handle: Some(rval),
            gpu_state: gpu_state.clone(),
            phantom_data: Default::default(),
        })
    }

    /// On failure the shader object is deleted before the error comes back.
    pub fn compile(gpu_state: &GPUState, source: impl AsRef<str>) -> Result<Self, GLErrorWrapper> {
        let gl = gpu_state.gl();
        let rval = Self::new_raw(gpu_state)?;
        gl.shader_source(rval.borrow(), source.as_ref());
        explode_if_gl_error(gl)?;
        gl.compile_shader(rval.borrow());
        explode_if_gl_error(gl)?;

        let is_compiled = gl.get_shader_iv(rval.borrow(), gl::COMPILE_STATUS);
        if is_compiled == 0 {
            let log = gl.get_shader_info_log(rval.borrow());
            Err(GLErrorWrapper::ShaderCompile {
                stage: F::STAGE,
                log,
            })
        } else {
            Ok(rval)
        }
    }
}

impl<F> Shader<F> {
    /// get access to the GL handle in case you need to call some low-level stuff
    pub fn borrow(&self) -> GLuint {
        self.handle.unwrap_or(0)
    }
}

impl<F> Drop for Shader<F> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.gpu_state.gl().delete_shader(handle)
        }
    }
}

//

/// A linked vertex+fragment program.
///
/// Attribute and uniform locations are looked up the first time they are asked
/// for and cached for the lifetime of the program. A name the linker did not
/// keep resolves to `None`, which callers are expected to tolerate.
pub struct Program {
    handle: Option<GLuint>,
    gpu_state: GPUState,
    attribute_locations: RefCell<HashMap<String, Option<GLuint>>>,
    uniform_locations: RefCell<HashMap<String, Option<GLint>>>,
}

impl Program {
    pub fn new_empty(gpu_state: &GPUState) -> Result<Self, GLErrorWrapper> {
        let gl = gpu_state.gl();
        let rval = gl.create_program();
        explode_if_gl_error(gl)?;
        if rval == 0 {
            return Err(GLErrorWrapper::with_message("glCreateProgram returned 0"));
        }
        Ok(Self {
            handle: Some(rval),
            gpu_state: gpu_state.clone(),
            attribute_locations: Default::default(),
            uniform_locations: Default::default(),
        })
    }

    pub fn compile(
        gpu_state: &GPUState,
        vertex_shader: impl AsRef<str>,
        fragment_shader: impl AsRef<str>,
    ) -> Result<Self, GLErrorWrapper> {
        let gl = gpu_state.gl();
        let vertex_shader = Shader::<VertexShader>::compile(gpu_state, vertex_shader.as_ref())?;
        let fragment_shader =
            Shader::<FragmentShader>::compile(gpu_state, fragment_shader.as_ref())?;

        let mut rval = Self::new_empty(gpu_state)?;
        rval.attach(&vertex_shader)?;
        rval.attach(&fragment_shader)?;

        gl.link_program(rval.borrow());
        explode_if_gl_error(gl)?;

        let link_status = gl.get_program_iv(rval.borrow(), gl::LINK_STATUS);
        explode_if_gl_error(gl)?;
        if link_status == 0 {
            return Err(GLErrorWrapper::ShaderLink {
                log: gl.get_program_info_log(rval.borrow()),
            });
        }

        rval.detach(&vertex_shader);
        rval.detach(&fragment_shader);

        log::debug!("linked program {}", rval.borrow());

        Ok(rval)
    }

    pub fn borrow(&self) -> GLuint {
        self.handle.unwrap_or(0)
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    fn attach<T>(&mut self, shader: &Shader<T>) -> Result<(), GLErrorWrapper> {
        let gl = self.gpu_state.gl();
        gl.attach_shader(self.borrow(), shader.borrow());
        explode_if_gl_error(gl)
    }

    fn detach<T>(&mut self, shader: &Shader<T>) {
        self.gpu_state
            .gl()
            .detach_shader(self.borrow(), shader.borrow());
    }

    pub fn use_(&self) -> Result<(), GLErrorWrapper> {
        let handle = self
            .handle
            .ok_or_else(|| GLErrorWrapper::with_message("program already released"))?;
        let gl = self.gpu_state.gl();
        gl.use_program(handle);
        explode_if_gl_error(gl)
    }

    pub fn attribute_location(&self, name: &str) -> Option<GLuint> {
        if let Some(cached) = self.attribute_locations.borrow().get(name) {
            return *cached;
        }
        let raw = self.gpu_state.gl().get_attrib_location(self.borrow(), name);
        let rval = if raw < 0 { None } else { Some(raw as GLuint) };
        if rval.is_none() {
            log::debug!("no attribute named {} on program {}", name, self.borrow());
        }
        self.attribute_locations
            .borrow_mut()
            .insert(name.to_string(), rval);
        rval
    }

    pub fn uniform_location(&self, name: &str) -> Option<GLint> {
        if let Some(cached) = self.uniform_locations.borrow().get(name) {
            return *cached;
        }
        let raw = self.gpu_state.gl().get_uniform_location(self.borrow(), name);
        let rval = if raw < 0 { None } else { Some(raw) };
        if rval.is_none() {
            log::debug!("no uniform named {} on program {}", name, self.borrow());
        }
        self.uniform_locations
            .borrow_mut()
            .insert(name.to_string(), rval);
        rval
    }

    //

    /// Silently skipped when the uniform is absent from the program.
    pub fn set_uniform_1i(&self, name: &str, v0: GLint) -> Result<(), GLErrorWrapper> {
        if let Some(location) = self.uniform_location(name) {
            let gl = self.gpu_state.gl();
            gl.uniform_1i(location, v0);
            explode_if_gl_error(gl)?;
        }
        Ok(())
    }

    /// Column-major, as produced by [`crate::linear::Matrix4x4f`].
    pub fn set_mat4u(&self, name: &str, val: &[f32; 16]) -> Result<(), GLErrorWrapper> {
        if let Some(location) = self.uniform_location(name) {
            let gl = self.gpu_state.gl();
            gl.uniform_matrix_4fv(location, val);
            explode_if_gl_error(gl)?;
        }
        Ok(())
    }

    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.gpu_state.gl().delete_program(handle);
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        self.release()
    }
}

//

pub struct Texture {
    handle: Option<GLuint>,
    gpu_state: GPUState,
}

impl Texture {
    /// A zero handle means the driver is out of texture objects; not retried.
    pub fn new(gpu_state: &GPUState) -> Result<Self, GLErrorWrapper> {
        let gl = gpu_state.gl();
        let rval = gl.gen_texture();
        explode_if_gl_error(gl)?;
        if rval == 0 {
            return Err(GLErrorWrapper::TextureAllocation);
        }
        Ok(Self {
            handle: Some(rval),
            gpu_state: gpu_state.clone(),
        })
    }

    pub fn borrow(&self) -> GLuint {
        self.handle.unwrap_or(0)
    }

    pub fn bind(&self, target: GLenum) -> Result<(), GLErrorWrapper> {
        let handle = self
            .handle
            .ok_or_else(|| GLErrorWrapper::with_message("texture already released"))?;
        let gl = self.gpu_state.gl();
        gl.bind_texture(target, handle);
        explode_if_gl_error(gl)
    }

    /// Bind to `unit` so a `sampler2D` set to the same unit reads this texture.
    pub fn bind_to_unit(&self, unit: GLuint, target: GLenum) -> Result<(), GLErrorWrapper> {
        let gl = self.gpu_state.gl();
        gl.active_texture(gl::TEXTURE0 + unit);
        explode_if_gl_error(gl)?;
        self.bind(target)
    }

    /// bind before calling this
    pub fn set_filters(&self, target: GLenum, min: GLenum, mag: GLenum) -> Result<(), GLErrorWrapper> {
        let gl = self.gpu_state.gl();
        gl.tex_parameter_i(target, gl::TEXTURE_MIN_FILTER, min as GLint);
        gl.tex_parameter_i(target, gl::TEXTURE_MAG_FILTER, mag as GLint);
        explode_if_gl_error(gl)
    }

    /// bind before calling this
    pub fn set_wrap(&self, target: GLenum, wrap: GLenum) -> Result<(), GLErrorWrapper> {
        let gl = self.gpu_state.gl();
        gl.tex_parameter_i(target, gl::TEXTURE_WRAP_S, wrap as GLint);
        gl.tex_parameter_i(target, gl::TEXTURE_WRAP_T, wrap as GLint);
        explode_if_gl_error(gl)
    }

    /// Upload level 0 of a bound texture, checking the pixel count against the dimensions.
    pub fn write_pixels(
        &mut self,
        target: GLenum,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        pixels: &[u8],
    ) -> Result<(), GLErrorWrapper> {
        let bpp = bytes_per_pixel::<u8>(format)?;
        let expected = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .and_then(|n| n.checked_mul(bpp));
        if expected != Some(pixels.len()) {
            return Err(GLErrorWrapper::with_message(format!(
                "size mismatch : {}*{}*{} != {}",
                width,
                height,
                bpp,
                pixels.len()
            )));
        }
        self.bind(target)?;
        let gl = self.gpu_state.gl();
        // rows of RGB data are not 4-byte aligned in general
        gl.pixel_store_i(gl::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            target,
            0,
            format as GLint,
            width,
            height,
            format,
            <u8 as GLBufferType>::TYPE_CODE,
            pixels,
        );
        explode_if_gl_error(gl)
    }

    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.gpu_state.gl().delete_texture(handle);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.release()
    }
}

//

pub fn bytes_per_pixel<T: GLBufferType>(format: GLenum) -> Result<usize, GLErrorWrapper> {
    let channels = match format {
        gl::RGB => 3,
        gl::RGBA => 4,
        _ => {
            // there are so many variants I am missing ...
            return Err(GLErrorWrapper::with_message(format!(
                "unhandled format 0x{:x}",
                format
            )));
        }
    };

    Ok(channels * std::mem::size_of::<T>())
}
