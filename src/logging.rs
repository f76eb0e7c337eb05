//! Logger setup
//!
//! Android builds log to logcat through `android_logger`, everything else
//! through `env_logger` (honours `RUST_LOG`, defaults to `info`). Calling
//! [`init`] more than once is harmless.

/// Install the platform logger.
pub fn init() {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Info)
            .with_tag("HmdStereo"),
    );

    #[cfg(not(target_os = "android"))]
    {
        // A logger may already be installed by the host application.
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}
