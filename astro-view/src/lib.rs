// The host loop is loosely based on
// android-activity's examples-na-winit-glutin

use crate::config::SceneConfig;
use crate::drawcore::ActiveRenderer;
use crate::errors::SceneError;
use std::error::Error;
use std::ops::Add;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

pub mod camera;
pub mod config;
pub mod cube;
pub mod drawcore;
pub mod errors;
pub mod logging;
pub mod scene;
pub mod square;
pub mod texture;

//

/// The three callbacks a drawing surface forwards to the render core, all on the GL thread.
pub trait SurfaceRenderer {
    fn on_surface_created(&mut self) -> Result<(), SceneError>;

    fn on_surface_resized(&mut self, width: u32, height: u32) -> Result<(), SceneError>;

    fn on_draw_frame(&mut self) -> Result<(), SceneError>;
}

pub trait Drawable {
    fn handle_events_and_draw(&mut self) -> Result<(), Box<dyn Error>>;

    fn resize(&mut self, width: u32, height: u32) -> Result<(), Box<dyn Error>>;

    fn request_redraw(&self);

    /// `None` redraws continuously
    fn frame_interval(&self) -> Option<Duration>;

    fn suspend(&mut self);
}

pub enum AppState<T: Drawable> {
    Paused,
    Active(T),
}

impl<T: Drawable> Default for AppState<T> {
    fn default() -> Self {
        Self::Paused
    }
}

pub struct MyApp<T: Drawable, F>
where
    F: Fn(&ActiveEventLoop) -> Result<T, Box<dyn Error>>,
{
    state: AppState<T>,
    factory: F,
    /// the error that stopped the event loop, if any
    failure: Option<Box<dyn Error>>,
}

impl<T: Drawable, F> MyApp<T, F>
where
    F: Fn(&ActiveEventLoop) -> Result<T, Box<dyn Error>>,
{
    pub fn new(factory: F) -> Self {
        Self {
            state: AppState::default(),
            factory,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: Box<dyn Error>) {
        log::error!("{}", e);
        // tear the scene down while the context still exists
        self.state = AppState::Paused;
        self.failure = Some(e);
        event_loop.exit();
    }
}

impl<T: Drawable, F> ApplicationHandler for MyApp<T, F>
where
    F: Fn(&ActiveEventLoop) -> Result<T, Box<dyn Error>>,
{
    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if let (StartCause::ResumeTimeReached { .. }, AppState::Active(app)) =
            (cause, &self.state)
        {
            app.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        match (self.factory)(event_loop) {
            Ok(x) => {
                log::debug!("surface created");
                self.state = AppState::Active(x);
            }
            Err(e) => {
                log::error!("malfunction building drawable");
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        log::trace!("Received Winit event: {event:?}");

        let AppState::Active(app) = &mut self.state else {
            event_loop.set_control_flow(ControlFlow::Wait);
            if let WindowEvent::CloseRequested = event {
                event_loop.exit();
            }
            return;
        };

        let outcome = match event {
            WindowEvent::Resized(size) => app.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let rval = app.handle_events_and_draw();
                let control_flow = control_flow_after_frame(app.frame_interval(), Instant::now());
                if control_flow == ControlFlow::Poll {
                    app.request_redraw();
                }
                event_loop.set_control_flow(control_flow);
                rval
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(e) = outcome {
            self.fail(event_loop, e);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::debug!("suspend");
        if let AppState::Active(app) = &mut self.state {
            app.suspend();
        }
        self.state = AppState::Paused;
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.state = AppState::Paused;
    }
}

//

/// Continuous redraw, or sleep until the next frame is due.
pub fn control_flow_after_frame(frame_interval: Option<Duration>, now: Instant) -> ControlFlow {
    match frame_interval {
        None => ControlFlow::Poll,
        Some(interval) => ControlFlow::WaitUntil(now.add(interval)),
    }
}

/// Drive the galaxy view until the window closes or a fatal error stops it.
pub fn run_with(event_loop: EventLoop<()>, config: SceneConfig) -> Result<(), Box<dyn Error>> {
    let mut app = MyApp::new(move |event_loop: &ActiveEventLoop| {
        ActiveRenderer::new(event_loop, config.clone())
    });
    event_loop.run_app(&mut app)?;
    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub fn run_desktop() -> Result<(), Box<dyn Error>> {
    logging::init_logging();
    let event_loop = EventLoop::new()?;
    run_with(event_loop, SceneConfig::from_env())
}

#[cfg(target_os = "android")]
#[no_mangle]
fn android_main(android_app: android_activity::AndroidApp) {
    use winit::platform::android::EventLoopBuilderExtAndroid;

    logging::init_logging();

    let event_loop = match EventLoop::builder().with_android_app(android_app).build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to build event loop: {}", e);
            return;
        }
    };
    log::debug!("got event loop");

    if let Err(e) = run_with(event_loop, SceneConfig::from_env()) {
        log::error!("galaxy view stopped: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_frames_poll() {
        assert_eq!(
            control_flow_after_frame(None, Instant::now()),
            ControlFlow::Poll
        );
    }

    #[test]
    fn capped_frames_wait_for_the_interval() {
        let now = Instant::now();
        let interval = Duration::from_millis(6);
        assert_eq!(
            control_flow_after_frame(Some(interval), now),
            ControlFlow::WaitUntil(now + interval)
        );
    }
}
