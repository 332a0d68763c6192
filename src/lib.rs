//! Bridge between an Arturia BeatStep style controller and a session's
//! track, device and mixer parameters.

pub mod config;
pub mod error;
pub mod general;
pub mod io;
pub mod remote;
pub mod session;
pub mod surface;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use config::Config;

// Global exit flag, set by the console thread
pub static EXIT_FLAG: AtomicBool = AtomicBool::new(false);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Install the loaded config. Only the first call has an effect.
pub fn init_config(config: Config) -> &'static Config {
    CONFIG.get_or_init(|| config)
}

pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

pub fn set_debug_enabled(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    log::set_max_level(if enabled { log::LevelFilter::Debug } else { log::LevelFilter::Info });
}
