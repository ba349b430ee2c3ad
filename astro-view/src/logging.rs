use std::sync::Once;

static INIT: Once = Once::new();

/// Install the platform logger once; later calls are ignored.
///
/// On desktop the filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    INIT.call_once(|| {
        #[cfg(target_os = "android")]
        android_logger::init_once(
            android_logger::Config::default().with_max_level(log::LevelFilter::Debug),
        );

        #[cfg(not(target_os = "android"))]
        {
            let mut builder = env_logger::Builder::new();
            match std::env::var("RUST_LOG") {
                Ok(filter) => {
                    builder.parse_filters(&filter);
                }
                Err(_) => {
                    builder.filter_level(log::LevelFilter::Info);
                }
            }
            // a test harness may have installed one already
            let _ = builder.try_init();
        }

        log::debug!("logging initialized");
    });
}
