use crate::errors::GLErrorWrapper;
use crate::gl_api::GlApi;
use crate::gl_helper::{
    explode_if_gl_error, ArrayBufferType, Buffer, ElementArrayBufferType, GLBufferType, Program,
};
use gl::types::{GLbitfield, GLenum, GLfloat, GLint, GLsizei, GLuint, GLushort};
use std::mem::size_of;
use std::rc::Rc;

/// The GL context as seen by the rest of the workspace.
///
/// Cloning is cheap; every GPU object keeps a clone so it can delete itself
/// when dropped. The `Rc` keeps the whole family on the thread that owns the
/// context.
#[derive(Clone)]
pub struct GPUState {
    gl: Rc<dyn GlApi>,
}

impl GPUState {
    pub fn new(gl: Rc<dyn GlApi>) -> Self {
        Self { gl }
    }

    pub fn gl(&self) -> &dyn GlApi {
        self.gl.as_ref()
    }

    pub fn enable(&self, capability: GLenum) -> Result<(), GLErrorWrapper> {
        self.gl.enable(capability);
        explode_if_gl_error(self.gl())
    }

    pub fn blend_func(&self, sfactor: GLenum, dfactor: GLenum) -> Result<(), GLErrorWrapper> {
        self.gl.blend_func(sfactor, dfactor);
        explode_if_gl_error(self.gl())
    }

    pub fn clear_color(&self, rgba: &[GLfloat; 4]) -> Result<(), GLErrorWrapper> {
        self.gl.clear_color(rgba[0], rgba[1], rgba[2], rgba[3]);
        explode_if_gl_error(self.gl())
    }

    pub fn clear(&self, mask: GLbitfield) -> Result<(), GLErrorWrapper> {
        self.gl.clear(mask);
        explode_if_gl_error(self.gl())
    }

    pub fn viewport(&self, width: GLsizei, height: GLsizei) -> Result<(), GLErrorWrapper> {
        self.gl.viewport(0, 0, width, height);
        explode_if_gl_error(self.gl())
    }

    /// Start a draw bracket. Every attribute rigged through the returned guard is
    /// disabled again when the guard goes away, even if the draw in between failed.
    pub fn enabled_attributes(&self) -> EnabledAttributes<'_> {
        EnabledAttributes {
            gpu_state: self,
            enabled: Vec::new(),
        }
    }
}

//

pub struct EnabledAttributes<'g> {
    gpu_state: &'g GPUState,
    enabled: Vec<GLuint>,
}

impl<'g> EnabledAttributes<'g> {
    /// Enable `location` and point it at the currently bound `ARRAY_BUFFER`.
    ///
    /// `stride` and `offset` count values of `T`, not bytes: an XYZUV record has
    /// stride 5, and its UV pair sits at offset 3 with width 2.
    pub fn rig_one_attribute<T: GLBufferType>(
        &mut self,
        location: GLuint,
        width: GLint,
        stride: GLsizei,
        offset: GLsizei,
    ) -> Result<(), GLErrorWrapper> {
        let gl = self.gpu_state.gl();
        gl.enable_vertex_attrib_array(location);
        self.enabled.push(location);
        explode_if_gl_error(gl)?;

        gl.vertex_attrib_pointer(
            location,
            width,
            T::TYPE_CODE,
            false,
            stride * size_of::<T>() as GLsizei,
            offset as usize * size_of::<T>(),
        );
        explode_if_gl_error(gl)
    }

    pub fn enabled(&self) -> &[GLuint] {
        &self.enabled
    }
}

impl<'g> Drop for EnabledAttributes<'g> {
    fn drop(&mut self) {
        let gl = self.gpu_state.gl();
        for location in self.enabled.drain(..) {
            gl.disable_vertex_attrib_array(location);
        }
        gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, 0);
        gl.bind_buffer(gl::ARRAY_BUFFER, 0);
    }
}

//

/// One named vertex attribute inside an interleaved record, measured in floats.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub offset: GLsizei,
    pub component_count: GLint,
}

impl AttributeSpec {
    pub const fn new(name: &'static str, offset: GLsizei, component_count: GLint) -> Self {
        Self {
            name,
            offset,
            component_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VertexLayout {
    /// floats per vertex record
    pub stride: GLsizei,
    pub attributes: Vec<AttributeSpec>,
}

impl VertexLayout {
    pub fn new(stride: GLsizei, attributes: &[AttributeSpec]) -> Self {
        Self {
            stride,
            attributes: attributes.to_vec(),
        }
    }

    pub fn stride_bytes(&self) -> usize {
        self.stride as usize * size_of::<GLfloat>()
    }

    fn validate(&self) -> Result<(), GLErrorWrapper> {
        if self.stride <= 0 {
            return Err(GLErrorWrapper::InvalidGeometry(format!(
                "stride must be positive, got {}",
                self.stride
            )));
        }
        for attribute in &self.attributes {
            if attribute.component_count < 1 || attribute.component_count > 4 {
                return Err(GLErrorWrapper::InvalidGeometry(format!(
                    "{} has {} components",
                    attribute.name, attribute.component_count
                )));
            }
            if attribute.offset < 0
                || attribute.offset + attribute.component_count > self.stride
            {
                return Err(GLErrorWrapper::InvalidGeometry(format!(
                    "{} at offset {} overruns a {}-float record",
                    attribute.name, attribute.offset, self.stride
                )));
            }
        }
        Ok(())
    }
}

//

/// Static vertex data (and optionally `u16` indices) living in GPU buffers.
///
/// Contents are fixed at construction. Drawing goes through an
/// [`EnabledAttributes`] bracket supplied by the caller.
pub struct GeometryBuffer {
    layout: VertexLayout,
    vertex_buffer: Buffer<ArrayBufferType, GLfloat>,
    index_buffer: Option<Buffer<ElementArrayBufferType, GLushort>>,
}

impl GeometryBuffer {
    pub fn new(
        gpu_state: &GPUState,
        vertex_data: &[GLfloat],
        index_data: Option<&[GLushort]>,
        layout: VertexLayout,
    ) -> Result<Self, GLErrorWrapper> {
        layout.validate()?;
        let stride = layout.stride as usize;
        if vertex_data.is_empty() || vertex_data.len() % stride != 0 {
            return Err(GLErrorWrapper::InvalidGeometry(format!(
                "{} floats is not a whole number of {}-float records",
                vertex_data.len(),
                stride
            )));
        }
        let vertex_count = vertex_data.len() / stride;
        if let Some(indices) = index_data {
            if let Some(bad) = indices.iter().find(|i| **i as usize >= vertex_count) {
                return Err(GLErrorWrapper::InvalidGeometry(format!(
                    "index {} out of range for {} vertices",
                    bad, vertex_count
                )));
            }
        }

        let vertex_buffer = Buffer::upload(gpu_state, vertex_data)?;
        let index_buffer = match index_data {
            Some(indices) => Some(Buffer::upload(gpu_state, indices)?),
            None => None,
        };

        log::debug!(
            "geometry uploaded: {} vertices x {} floats, {} indices",
            vertex_count,
            stride,
            index_buffer.as_ref().map(|b| b.len()).unwrap_or(0)
        );

        Ok(Self {
            layout,
            vertex_buffer,
            index_buffer,
        })
    }

    pub fn vertex_count(&self) -> GLsizei {
        (self.vertex_buffer.len() / self.layout.stride as usize) as GLsizei
    }

    /// Point every attribute of the layout that `program` actually uses at this buffer.
    pub fn rig_attributes(
        &self,
        program: &Program,
        attributes: &mut EnabledAttributes,
    ) -> Result<(), GLErrorWrapper> {
        self.vertex_buffer.bind()?;
        for spec in &self.layout.attributes {
            match program.attribute_location(spec.name) {
                Some(location) => attributes.rig_one_attribute::<GLfloat>(
                    location,
                    spec.component_count,
                    self.layout.stride,
                    spec.offset,
                )?,
                None => log::trace!("skipping unused attribute {}", spec.name),
            }
        }
        Ok(())
    }

    pub fn draw_arrays(&self, gpu_state: &GPUState, mode: GLenum) -> Result<(), GLErrorWrapper> {
        let gl = gpu_state.gl();
        gl.draw_arrays(mode, 0, self.vertex_count());
        explode_if_gl_error(gl)
    }

    pub fn draw_elements(&self, gpu_state: &GPUState, mode: GLenum) -> Result<(), GLErrorWrapper> {
        let index_buffer = self.index_buffer.as_ref().ok_or_else(|| {
            GLErrorWrapper::InvalidGeometry("draw_elements without an index buffer".to_string())
        })?;
        index_buffer.bind()?;
        let gl = gpu_state.gl();
        gl.draw_elements(
            mode,
            index_buffer.len() as GLsizei,
            <GLushort as GLBufferType>::TYPE_CODE,
            0,
        );
        explode_if_gl_error(gl)
    }

    pub fn release(&mut self) {
        self.vertex_buffer.release();
        if let Some(index_buffer) = self.index_buffer.as_mut() {
            index_buffer.release();
        }
    }
}
