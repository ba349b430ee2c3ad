use crate::config::SceneConfig;
use crate::scene::RenderLoop;
use crate::{Drawable, SurfaceRenderer};
use astro_gl::gl_api::NativeGl;
use astro_gl::gl_fancy::GPUState;
use glutin::config::{Api, Config, ConfigTemplate, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use log::debug;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use std::error::Error;
use std::ffi::CString;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

//

/// A window with a current GLES 2.0 context and the scene drawn into it.
pub struct ActiveRenderer {
    // fields drop in declaration order; GPU objects must go while the context is alive
    pub render_loop: RenderLoop,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
    frame_interval: Option<Duration>,
}

impl ActiveRenderer {
    /// Create template to find an OpenGL ES 2 config with a depth buffer.
    pub fn config_template(raw_window_handle: RawWindowHandle) -> ConfigTemplate {
        ConfigTemplateBuilder::new()
            .with_api(Api::GLES2)
            .with_depth_size(16)
            .compatible_with_native_window(raw_window_handle)
            .build()
    }

    pub fn new(event_loop: &ActiveEventLoop, config: SceneConfig) -> Result<Self, Box<dyn Error>> {
        let window = event_loop
            .create_window(Window::default_attributes().with_title(config.window_title.clone()))?;
        let raw_display = window.display_handle()?.as_raw();
        let raw_window_handle = window.window_handle()?.as_raw();

        let display = unsafe { Display::new(raw_display, DisplayApiPreference::Egl) }?;

        let gl_config = Self::pick_config(&display, raw_window_handle)?;

        let not_current = {
            let attr = ContextAttributesBuilder::new()
                .with_context_api(ContextApi::Gles(Some(Version::new(2, 0))))
                .build(Some(raw_window_handle));
            unsafe { display.create_context(&gl_config, &attr) }
        }?;

        let size = window.inner_size();
        let surface = {
            let attr = SurfaceAttributesBuilder::<WindowSurface>::new().build(
                raw_window_handle,
                non_zero(size.width),
                non_zero(size.height),
            );
            unsafe { display.create_window_surface(&gl_config, &attr) }
        }?;

        let context = not_current.make_current(&surface)?;

        let gl = NativeGl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => display.get_proc_address(symbol.as_c_str()),
            Err(_) => std::ptr::null(),
        });
        let gpu_state = GPUState::new(Rc::new(gl));

        let frame_interval = config.frame_interval;
        let mut render_loop = RenderLoop::new(gpu_state, config);
        render_loop.on_surface_created()?;
        render_loop.on_surface_resized(size.width, size.height)?;

        window.request_redraw();

        Ok(Self {
            render_loop,
            surface,
            context,
            window,
            frame_interval,
        })
    }

    fn pick_config(
        display: &Display,
        raw_window_handle: RawWindowHandle,
    ) -> Result<Config, Box<dyn Error>> {
        let template = Self::config_template(raw_window_handle);
        let configs_list: Vec<_> = unsafe { display.find_configs(template) }?.collect();
        debug!("glutin display configs [{}]", configs_list.len());
        for config in &configs_list {
            debug!(
                "config {:?} depth {}",
                config.config_surface_types(),
                config.depth_size()
            );
        }
        configs_list
            .into_iter()
            .reduce(|accum, config| {
                // prefer multisampling when the driver offers it
                if config.num_samples() > accum.num_samples() {
                    config
                } else {
                    accum
                }
            })
            .ok_or_else(|| "no GLES 2.0 config with a depth buffer".into())
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl Drawable for ActiveRenderer {
    fn handle_events_and_draw(&mut self) -> Result<(), Box<dyn Error>> {
        if let Err(e) = self.render_loop.on_draw_frame() {
            if e.is_fatal() {
                return Err(e.into());
            }
            debug!("skipping frame: {}", e);
            return Ok(());
        }
        self.surface.swap_buffers(&self.context)?;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
        if let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, w, h);
        }
        self.render_loop.on_surface_resized(width, height)?;
        self.window.request_redraw();
        Ok(())
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }

    fn frame_interval(&self) -> Option<Duration> {
        self.frame_interval
    }

    fn suspend(&mut self) {
        self.render_loop.release_gpu_resources();
    }
}
