//! Incremental change detection for scenario files.
//!
//! A JSON cache maps each scenario file to the BLAKE3 digest of the bytes
//! that last ran. Files whose digest differs (or is absent) are reported as
//! whole-file changes.

pub mod cache;
pub mod detector;
pub mod errors;
pub mod hash;
pub mod monitor;

pub use cache::ChangeCache;
pub use detector::{
    cache_key, list_scenario_files, ChangeDetector, ScenarioChange, CONTENT_CHANGE, WHOLE_FILE,
};
pub use errors::CacheError;
pub use hash::{hash_bytes, hash_file};
pub use monitor::{MonitorOptions, ScenarioMonitor};
