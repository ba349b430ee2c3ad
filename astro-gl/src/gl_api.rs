use gl::types::{
    GLbitfield, GLboolean, GLchar, GLenum, GLfloat, GLint, GLsizei, GLsizeiptr, GLuint,
};
use std::ffi::{c_void, CString};
use std::ptr::null;

/// The slice of OpenGL ES 2.0 this workspace talks to.
///
/// Everything that touches the driver goes through one of these methods, so the
/// order of state changes is visible at the call site instead of hiding in
/// global bind state. [`NativeGl`] forwards to the `gl` crate; tests use
/// `RecordingGl` from the `recording` feature.
pub trait GlApi {
    fn get_error(&self) -> GLenum;

    fn create_shader(&self, kind: GLenum) -> GLuint;
    fn shader_source(&self, shader: GLuint, source: &str);
    fn compile_shader(&self, shader: GLuint);
    fn get_shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint;
    fn get_shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);

    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn detach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint);
    fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint;
    fn get_program_info_log(&self, program: GLuint) -> String;
    fn use_program(&self, program: GLuint);
    fn delete_program(&self, program: GLuint);

    /// -1 when the linked program has no active attribute of that name
    fn get_attrib_location(&self, program: GLuint, name: &str) -> GLint;
    /// -1 when the linked program has no active uniform of that name
    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint;
    fn uniform_1i(&self, location: GLint, v0: GLint);
    fn uniform_matrix_4fv(&self, location: GLint, value: &[GLfloat; 16]);

    fn gen_buffer(&self) -> GLuint;
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum);
    fn delete_buffer(&self, buffer: GLuint);

    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn disable_vertex_attrib_array(&self, index: GLuint);
    /// `offset` is a byte offset into the bound `ARRAY_BUFFER`
    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );

    fn gen_texture(&self) -> GLuint;
    fn active_texture(&self, unit: GLenum);
    fn bind_texture(&self, target: GLenum, texture: GLuint);
    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint);
    fn pixel_store_i(&self, pname: GLenum, param: GLint);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        kind: GLenum,
        pixels: &[u8],
    );
    fn delete_texture(&self, texture: GLuint);

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    /// `offset` is a byte offset into the bound `ELEMENT_ARRAY_BUFFER`
    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize);

    fn enable(&self, capability: GLenum);
    fn blend_func(&self, sfactor: GLenum, dfactor: GLenum);
    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    fn clear(&self, mask: GLbitfield);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
}

//

/// Forwards to the driver through the `gl` crate's loaded function pointers.
pub struct NativeGl {
    _private: (),
}

impl NativeGl {
    /// Resolve the GL entry points for the context that is current on this thread.
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self { _private: () }
    }
}

fn from_glchar_to_string(src: Vec<GLchar>) -> String {
    let bytes: Vec<u8> = src
        .into_iter()
        .map(|x| x as u8)
        .take_while(|x| *x != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn gl_bool(value: bool) -> GLboolean {
    if value {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

impl GlApi for NativeGl {
    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        unsafe { gl::CreateShader(kind) }
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let bytes = source.as_bytes();
        let strings = [bytes.as_ptr() as *const GLchar];
        let lengths = [bytes.len() as GLint];
        unsafe { gl::ShaderSource(shader, 1, strings.as_ptr(), lengths.as_ptr()) };
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) }
    }

    fn get_shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint {
        let mut rval = 0;
        unsafe { gl::GetShaderiv(shader, pname, &mut rval) };
        rval
    }

    fn get_shader_info_log(&self, shader: GLuint) -> String {
        let mut max_length = self.get_shader_iv(shader, gl::INFO_LOG_LENGTH);
        let mut error_log: Vec<GLchar> = vec![0; max_length.max(0) as usize];
        unsafe {
            gl::GetShaderInfoLog(shader, max_length, &mut max_length, error_log.as_mut_ptr());
        }
        error_log.truncate(max_length.max(0) as usize);
        from_glchar_to_string(error_log)
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) }
    }

    fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint {
        let mut rval = 0;
        unsafe { gl::GetProgramiv(program, pname, &mut rval) };
        rval
    }

    fn get_program_info_log(&self, program: GLuint) -> String {
        let mut max_length = self.get_program_iv(program, gl::INFO_LOG_LENGTH);
        let mut error_log: Vec<GLchar> = vec![0; max_length.max(0) as usize];
        unsafe {
            gl::GetProgramInfoLog(program, max_length, &mut max_length, error_log.as_mut_ptr());
        }
        error_log.truncate(max_length.max(0) as usize);
        from_glchar_to_string(error_log)
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn get_attrib_location(&self, program: GLuint, name: &str) -> GLint {
        match CString::new(name) {
            Ok(c_name) => unsafe { gl::GetAttribLocation(program, c_name.as_ptr()) },
            Err(_) => -1,
        }
    }

    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        match CString::new(name) {
            Ok(c_name) => unsafe { gl::GetUniformLocation(program, c_name.as_ptr()) },
            Err(_) => -1,
        }
    }

    fn uniform_1i(&self, location: GLint, v0: GLint) {
        unsafe { gl::Uniform1i(location, v0) }
    }

    fn uniform_matrix_4fv(&self, location: GLint, value: &[GLfloat; 16]) {
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, value.as_ptr()) }
    }

    fn gen_buffer(&self) -> GLuint {
        let mut rval = 0;
        unsafe { gl::GenBuffers(1, &mut rval) };
        rval
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        unsafe { gl::BindBuffer(target, buffer) }
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        unsafe {
            gl::BufferData(
                target,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
                usage,
            )
        }
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::EnableVertexAttribArray(index) }
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::DisableVertexAttribArray(index) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        // with a buffer bound, the "pointer" is really a byte offset
        unsafe {
            gl::VertexAttribPointer(
                index,
                size,
                kind,
                gl_bool(normalized),
                stride,
                offset as *const c_void,
            )
        }
    }

    fn gen_texture(&self) -> GLuint {
        let mut rval = 0;
        unsafe { gl::GenTextures(1, &mut rval) };
        rval
    }

    fn active_texture(&self, unit: GLenum) {
        unsafe { gl::ActiveTexture(unit) }
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        unsafe { gl::BindTexture(target, texture) }
    }

    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint) {
        unsafe { gl::TexParameteri(target, pname, param) }
    }

    fn pixel_store_i(&self, pname: GLenum, param: GLint) {
        unsafe { gl::PixelStorei(pname, param) }
    }

    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        kind: GLenum,
        pixels: &[u8],
    ) {
        let data = if pixels.is_empty() {
            null()
        } else {
            pixels.as_ptr() as *const c_void
        };
        unsafe {
            gl::TexImage2D(
                target,
                level,
                internal_format,
                width,
                height,
                0,
                format,
                kind,
                data,
            )
        }
    }

    fn delete_texture(&self, texture: GLuint) {
        unsafe { gl::DeleteTextures(1, &texture) }
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        unsafe { gl::DrawArrays(mode, first, count) }
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize) {
        unsafe { gl::DrawElements(mode, count, kind, offset as *const c_void) }
    }

    fn enable(&self, capability: GLenum) {
        unsafe { gl::Enable(capability) }
    }

    fn blend_func(&self, sfactor: GLenum, dfactor: GLenum) {
        unsafe { gl::BlendFunc(sfactor, dfactor) }
    }

    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        unsafe { gl::ClearColor(red, green, blue, alpha) }
    }

    fn clear(&self, mask: GLbitfield) {
        unsafe { gl::Clear(mask) }
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe { gl::Viewport(x, y, width, height) }
    }
}
