//! Shared utilities for the clock binaries: config persistence and the
//! local time engine.

pub mod config;
pub mod time_engine;

pub use config::{
    config_dir, config_path, load_config, load_config_from, save_config, save_config_to,
    ConfigError, CONFIG_DIR_ENV,
};
pub use time_engine::{
    compute_clock_time_at, hour_hand_angle_at, ordinal_suffix, parse_timezone, system_timezone,
    ClockTime, HALF_DAY_SECONDS,
};
