use astro_gl::linear::Vector3f;
use std::time::Duration;

pub const FRAME_INTERVAL_ENV: &str = "ASTRO_FRAME_INTERVAL_MS";

/// Tunables for the galaxy view. `Default` reproduces the stock scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub window_title: String,
    pub clear_color: [f32; 4],
    /// degrees added to the cube's rotation after every frame
    pub rotation_step: f32,
    pub rotation_axis: Vector3f,
    pub cube_scale: f32,
    /// x/y scale of the background square, placed at `backdrop_depth`
    pub backdrop_scale: f32,
    pub backdrop_depth: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vector3f,
    pub target: Vector3f,
    pub up: Vector3f,
    /// `None` redraws as fast as the surface allows
    pub frame_interval: Option<Duration>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            window_title: "Astronomy guide".to_string(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            rotation_step: 0.5,
            rotation_axis: Vector3f::new(1.0, 1.0, 0.0),
            cube_scale: 0.5,
            backdrop_scale: 6.0,
            backdrop_depth: -1.0,
            near: 1.0,
            far: 10.0,
            eye: Vector3f::new(0.0, 0.0, 3.0),
            target: Vector3f::default(),
            up: Vector3f::new(0.0, 1.0, 0.0),
            frame_interval: None,
        }
    }
}

impl SceneConfig {
    /// [`Default`] plus whatever the environment overrides.
    pub fn from_env() -> Self {
        let mut rval = Self::default();
        if let Ok(raw) = std::env::var(FRAME_INTERVAL_ENV) {
            rval.frame_interval = parse_frame_interval(&raw);
        }
        rval
    }
}

/// Milliseconds; 0 or garbage means uncapped.
fn parse_frame_interval(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(e) => {
            log::warn!("ignoring {}={:?}: {}", FRAME_INTERVAL_ENV, raw, e);
            None
        }
    }
}
