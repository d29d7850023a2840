//! Runtime plumbing shared by the harvest library and the CLI: settings,
//! the bounded worker pool, and the event-draining task driver.

pub mod async_util;
pub mod settings;
pub mod worker_pool;

pub use settings::{
    HarvestSettings, PathSettings, Settings, SettingsError, load_settings_string, settings_path,
};
pub use worker_pool::WorkerPool;
