use crate::errors::SceneError;
use astro_gl::errors::GLErrorWrapper;
use astro_gl::gl_fancy::GPUState;
use astro_gl::gl_helper::Texture;
use gl::types::{GLenum, GLsizei};

/// Tightly packed 8-bit pixels, top row first.
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// `gl::RGB` or `gl::RGBA`
    pub format: GLenum,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn channels(&self) -> usize {
        if self.format == gl::RGBA {
            4
        } else {
            3
        }
    }
}

//

#[cfg(feature = "png")]
pub fn galaxy_png() -> &'static [u8] {
    include_bytes!("galaxy_texture.png")
}

/// The bitmap painted on the background square.
pub fn background_bitmap() -> Result<Bitmap, SceneError> {
    #[cfg(feature = "png")]
    {
        decode_png(galaxy_png())
    }
    #[cfg(not(feature = "png"))]
    {
        Ok(starfield(64, 64))
    }
}

/// Decode at the image's own size; palettes and low bit depths are expanded to 8-bit RGB(A).
#[cfg(feature = "png")]
pub fn decode_png(raw: &[u8]) -> Result<Bitmap, SceneError> {
    use png::{BitDepth, ColorType, Transformations};

    let mut decoder = png::Decoder::new(raw);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != BitDepth::Eight {
        return Err(SceneError::UnsupportedImage(format!(
            "{:?} bit samples",
            info.bit_depth
        )));
    }

    let (format, pixels) = match info.color_type {
        ColorType::Rgb => (gl::RGB, buf),
        ColorType::Rgba => (gl::RGBA, buf),
        ColorType::Grayscale => (gl::RGB, buf.iter().flat_map(|g| [*g, *g, *g]).collect()),
        ColorType::GrayscaleAlpha => (
            gl::RGBA,
            buf.chunks_exact(2)
                .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
                .collect(),
        ),
        ColorType::Indexed => {
            return Err(SceneError::UnsupportedImage(
                "palette survived expansion".to_string(),
            ))
        }
    };

    log::debug!(
        "decoded {}x{} {:?} image",
        info.width,
        info.height,
        info.color_type
    );

    Ok(Bitmap {
        width: info.width,
        height: info.height,
        format,
        pixels,
    })
}

/// Scattered white points on a dark blue field, for builds without PNG support.
pub fn starfield(width: u32, height: u32) -> Bitmap {
    let mut seed: u32 = 0x2545_f491;
    let count = (width as usize).saturating_mul(height as usize);
    let mut pixels = Vec::with_capacity(count.saturating_mul(3));
    for _ in 0..count {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        if seed >> 24 < 3 {
            pixels.extend_from_slice(&[255, 255, 255]);
        } else {
            pixels.extend_from_slice(&[4, 6, 24]);
        }
    }
    Bitmap {
        width,
        height,
        format: gl::RGB,
        pixels,
    }
}

/// Upload `bitmap` into a new linear-filtered, edge-clamped 2D texture.
/// The bitmap is consumed; nothing is kept on the CPU side.
pub fn load_texture(gpu_state: &GPUState, bitmap: Bitmap) -> Result<Texture, GLErrorWrapper> {
    let target = gl::TEXTURE_2D;
    let mut texture = Texture::new(gpu_state)?;
    texture.bind(target)?;
    texture.set_filters(target, gl::LINEAR, gl::LINEAR)?;
    texture.set_wrap(target, gl::CLAMP_TO_EDGE)?;
    texture.write_pixels(
        target,
        bitmap.width as GLsizei,
        bitmap.height as GLsizei,
        bitmap.format,
        &bitmap.pixels,
    )?;
    log::debug!(
        "texture {} holds a {}x{} bitmap",
        texture.borrow(),
        bitmap.width,
        bitmap.height
    );
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use astro_gl::recording::{GlCall, RecordingGl};
    use std::rc::Rc;

    #[cfg(feature = "png")]
    #[test]
    fn bundled_galaxy_decodes_at_native_size() {
        let bitmap = decode_png(galaxy_png()).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (128, 128));
        assert_eq!(bitmap.format, gl::RGB);
        assert_eq!(bitmap.pixels.len(), 128 * 128 * 3);
    }

    #[cfg(feature = "png")]
    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_png(b"definitely not a png").err();
        assert!(matches!(err, Some(SceneError::Png(_))));
    }

    #[test]
    fn starfield_is_tightly_packed() {
        let bitmap = starfield(8, 4);
        assert_eq!(bitmap.channels(), 3);
        assert_eq!(bitmap.pixels.len(), 8 * 4 * 3);
    }

    #[test]
    fn absurd_dimensions_are_rejected_before_upload() {
        let gl = Rc::new(RecordingGl::new());
        let gpu_state = GPUState::new(gl.clone());
        let bitmap = Bitmap {
            width: u32::MAX,
            height: 3,
            format: gl::RGB,
            pixels: vec![0; 9],
        };
        let err = load_texture(&gpu_state, bitmap).err();
        assert!(format!("{:?}", err).contains("size mismatch"));
        assert_eq!(gl.count(|c| matches!(c, GlCall::TexImage2D { .. })), 0);
    }

    #[test]
    fn upload_sets_filters_before_pixels() {
        let gl = Rc::new(RecordingGl::new());
        let gpu_state = GPUState::new(gl.clone());
        let texture = load_texture(&gpu_state, starfield(4, 2)).unwrap();

        let params: Vec<GlCall> = gl
            .calls()
            .into_iter()
            .filter(|c| matches!(c, GlCall::TexParameteri { .. }))
            .collect();
        assert_eq!(
            params,
            vec![
                GlCall::TexParameteri {
                    pname: gl::TEXTURE_MIN_FILTER,
                    param: gl::LINEAR as i32
                },
                GlCall::TexParameteri {
                    pname: gl::TEXTURE_MAG_FILTER,
                    param: gl::LINEAR as i32
                },
                GlCall::TexParameteri {
                    pname: gl::TEXTURE_WRAP_S,
                    param: gl::CLAMP_TO_EDGE as i32
                },
                GlCall::TexParameteri {
                    pname: gl::TEXTURE_WRAP_T,
                    param: gl::CLAMP_TO_EDGE as i32
                },
            ]
        );

        let calls = gl.calls();
        let last_param = calls
            .iter()
            .rposition(|c| matches!(c, GlCall::TexParameteri { .. }))
            .unwrap();
        let upload = calls
            .iter()
            .position(|c| matches!(c, GlCall::TexImage2D { .. }))
            .unwrap();
        assert!(last_param < upload);
        assert_eq!(
            calls[upload],
            GlCall::TexImage2D {
                internal_format: gl::RGB as i32,
                width: 4,
                height: 2,
                format: gl::RGB,
                byte_count: 24,
            }
        );
        assert_eq!(gl.count(|c| matches!(c, GlCall::TexImage2D { .. })), 1);
        drop(texture);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteTexture(_))), 1);
    }

    #[test]
    fn zero_handle_is_fatal() {
        let gl = Rc::new(RecordingGl::refusing_textures());
        let gpu_state = GPUState::new(gl.clone());
        let err = load_texture(&gpu_state, starfield(2, 2)).err();
        assert_eq!(err, Some(GLErrorWrapper::TextureAllocation));
        assert_eq!(gl.count(|c| matches!(c, GlCall::TexImage2D { .. })), 0);
    }
}
