//! An in-memory [`GlApi`] for tests.
//!
//! Every call is appended to a log that tests can inspect. Handles are handed
//! out from a counter, and attribute/uniform locations are resolved by reading
//! the `attribute` / `uniform` declarations of the shaders attached to a
//! program, so missing names come back as -1 just like a real driver.

use crate::gl_api::GlApi;
use gl::types::{GLbitfield, GLenum, GLfloat, GLint, GLsizei, GLuint};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub enum GlCall {
    CreateShader { kind: GLenum, shader: GLuint },
    CompileShader(GLuint),
    DeleteShader(GLuint),
    CreateProgram(GLuint),
    AttachShader { program: GLuint, shader: GLuint },
    DetachShader { program: GLuint, shader: GLuint },
    LinkProgram(GLuint),
    UseProgram(GLuint),
    DeleteProgram(GLuint),
    Uniform1i { location: GLint, value: GLint },
    UniformMatrix4fv { location: GLint, value: [GLfloat; 16] },
    GenBuffer(GLuint),
    BindBuffer { target: GLenum, buffer: GLuint },
    BufferData { target: GLenum, bytes: Vec<u8>, usage: GLenum },
    DeleteBuffer(GLuint),
    EnableVertexAttribArray(GLuint),
    DisableVertexAttribArray(GLuint),
    VertexAttribPointer {
        index: GLuint,
        size: GLint,
        kind: GLenum,
        stride: GLsizei,
        offset: usize,
    },
    GenTexture(GLuint),
    ActiveTexture(GLenum),
    BindTexture { target: GLenum, texture: GLuint },
    TexParameteri { pname: GLenum, param: GLint },
    PixelStorei { pname: GLenum, param: GLint },
    TexImage2D {
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        byte_count: usize,
    },
    DeleteTexture(GLuint),
    DrawArrays { mode: GLenum, first: GLint, count: GLsizei },
    DrawElements { mode: GLenum, count: GLsizei, kind: GLenum, offset: usize },
    Enable(GLenum),
    BlendFunc { sfactor: GLenum, dfactor: GLenum },
    ClearColor([GLfloat; 4]),
    Clear(GLbitfield),
    Viewport { x: GLint, y: GLint, width: GLsizei, height: GLsizei },
}

impl GlCall {
    pub fn is_draw(&self) -> bool {
        matches!(self, GlCall::DrawArrays { .. } | GlCall::DrawElements { .. })
    }
}

#[derive(Default)]
pub struct RecordingGl {
    calls: RefCell<Vec<GlCall>>,
    next_handle: Cell<GLuint>,
    pending_errors: RefCell<Vec<GLenum>>,
    shader_sources: RefCell<HashMap<GLuint, String>>,
    attached: RefCell<HashMap<GLuint, Vec<GLuint>>>,
    fail_compile_marker: Option<String>,
    fail_link: bool,
    refuse_textures: bool,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any shader whose source contains `marker` reports a failed compile.
    pub fn failing_compile_on(marker: impl Into<String>) -> Self {
        Self {
            fail_compile_marker: Some(marker.into()),
            ..Self::default()
        }
    }

    /// Every `link_program` reports a failed link with a non-empty log.
    pub fn failing_link() -> Self {
        Self {
            fail_link: true,
            ..Self::default()
        }
    }

    /// `gen_texture` returns 0, as an exhausted driver would.
    pub fn refusing_textures() -> Self {
        Self {
            refuse_textures: true,
            ..Self::default()
        }
    }

    /// queue an error code for the next `get_error` drain
    pub fn push_error(&self, code: GLenum) {
        self.pending_errors.borrow_mut().push(code);
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }

    fn fresh_handle(&self) -> GLuint {
        let rval = self.next_handle.get() + 1;
        self.next_handle.set(rval);
        rval
    }

    fn compile_succeeds(&self, shader: GLuint) -> bool {
        let sources = self.shader_sources.borrow();
        let source = sources.get(&shader).map(String::as_str).unwrap_or("");
        match &self.fail_compile_marker {
            Some(marker) => !source.contains(marker.as_str()),
            None => true,
        }
    }

    /// index of `name` among the declarations introduced by `qualifier`
    fn declared_location(&self, program: GLuint, qualifier: &str, name: &str) -> GLint {
        let attached = self.attached.borrow();
        let sources = self.shader_sources.borrow();
        let mut declared: Vec<String> = Vec::new();
        for shader in attached.get(&program).into_iter().flatten() {
            let Some(source) = sources.get(shader) else {
                continue;
            };
            for line in source.lines() {
                let mut words = line.split_whitespace();
                if words.next() != Some(qualifier) {
                    continue;
                }
                if let Some(declared_name) = words.nth(1) {
                    let declared_name = declared_name.trim_end_matches(';').to_string();
                    if !declared.contains(&declared_name) {
                        declared.push(declared_name);
                    }
                }
            }
        }
        declared
            .iter()
            .position(|n| n == name)
            .map(|i| i as GLint)
            .unwrap_or(-1)
    }
}

impl GlApi for RecordingGl {
    fn get_error(&self) -> GLenum {
        let mut pending = self.pending_errors.borrow_mut();
        if pending.is_empty() {
            gl::NO_ERROR
        } else {
            pending.remove(0)
        }
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        let shader = self.fresh_handle();
        self.record(GlCall::CreateShader { kind, shader });
        shader
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        self.shader_sources
            .borrow_mut()
            .insert(shader, source.to_string());
    }

    fn compile_shader(&self, shader: GLuint) {
        self.record(GlCall::CompileShader(shader));
    }

    fn get_shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint {
        match pname {
            gl::COMPILE_STATUS => self.compile_succeeds(shader) as GLint,
            gl::INFO_LOG_LENGTH => self.get_shader_info_log(shader).len() as GLint,
            _ => 0,
        }
    }

    fn get_shader_info_log(&self, shader: GLuint) -> String {
        if self.compile_succeeds(shader) {
            String::new()
        } else {
            "0:1: error: syntax error".to_string()
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        self.record(GlCall::DeleteShader(shader));
    }

    fn create_program(&self) -> GLuint {
        let program = self.fresh_handle();
        self.record(GlCall::CreateProgram(program));
        program
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.attached
            .borrow_mut()
            .entry(program)
            .or_default()
            .push(shader);
        self.record(GlCall::AttachShader { program, shader });
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        // a real driver keeps the linked locations after detach
        self.record(GlCall::DetachShader { program, shader });
    }

    fn link_program(&self, program: GLuint) {
        self.record(GlCall::LinkProgram(program));
    }

    fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint {
        match pname {
            gl::LINK_STATUS => !self.fail_link as GLint,
            gl::INFO_LOG_LENGTH => self.get_program_info_log(program).len() as GLint,
            _ => 0,
        }
    }

    fn get_program_info_log(&self, _program: GLuint) -> String {
        if self.fail_link {
            "error: varying vColor not written by vertex shader".to_string()
        } else {
            String::new()
        }
    }

    fn use_program(&self, program: GLuint) {
        self.record(GlCall::UseProgram(program));
    }

    fn delete_program(&self, program: GLuint) {
        self.record(GlCall::DeleteProgram(program));
    }

    fn get_attrib_location(&self, program: GLuint, name: &str) -> GLint {
        self.declared_location(program, "attribute", name)
    }

    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        self.declared_location(program, "uniform", name)
    }

    fn uniform_1i(&self, location: GLint, value: GLint) {
        self.record(GlCall::Uniform1i { location, value });
    }

    fn uniform_matrix_4fv(&self, location: GLint, value: &[GLfloat; 16]) {
        self.record(GlCall::UniformMatrix4fv {
            location,
            value: *value,
        });
    }

    fn gen_buffer(&self) -> GLuint {
        let buffer = self.fresh_handle();
        self.record(GlCall::GenBuffer(buffer));
        buffer
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.record(GlCall::BindBuffer { target, buffer });
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        self.record(GlCall::BufferData {
            target,
            bytes: data.to_vec(),
            usage,
        });
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.record(GlCall::EnableVertexAttribArray(index));
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        self.record(GlCall::DisableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        _normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        self.record(GlCall::VertexAttribPointer {
            index,
            size,
            kind,
            stride,
            offset,
        });
    }

    fn gen_texture(&self) -> GLuint {
        if self.refuse_textures {
            return 0;
        }
        let texture = self.fresh_handle();
        self.record(GlCall::GenTexture(texture));
        texture
    }

    fn active_texture(&self, unit: GLenum) {
        self.record(GlCall::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        self.record(GlCall::BindTexture { target, texture });
    }

    fn tex_parameter_i(&self, _target: GLenum, pname: GLenum, param: GLint) {
        self.record(GlCall::TexParameteri { pname, param });
    }

    fn pixel_store_i(&self, pname: GLenum, param: GLint) {
        self.record(GlCall::PixelStorei { pname, param });
    }

    fn tex_image_2d(
        &self,
        _target: GLenum,
        _level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        _kind: GLenum,
        pixels: &[u8],
    ) {
        self.record(GlCall::TexImage2D {
            internal_format,
            width,
            height,
            format,
            byte_count: pixels.len(),
        });
    }

    fn delete_texture(&self, texture: GLuint) {
        self.record(GlCall::DeleteTexture(texture));
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.record(GlCall::DrawArrays { mode, first, count });
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize) {
        self.record(GlCall::DrawElements {
            mode,
            count,
            kind,
            offset,
        });
    }

    fn enable(&self, capability: GLenum) {
        self.record(GlCall::Enable(capability));
    }

    fn blend_func(&self, sfactor: GLenum, dfactor: GLenum) {
        self.record(GlCall::BlendFunc { sfactor, dfactor });
    }

    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        self.record(GlCall::ClearColor([red, green, blue, alpha]));
    }

    fn clear(&self, mask: GLbitfield) {
        self.record(GlCall::Clear(mask));
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(GlCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }
}
