//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Application name
pub const APP_NAME: &str = "recapture";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory under the home directory holding config and logs
pub const CONFIG_DIR_NAME: &str = ".recapture";

/// Config file inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default log file name
pub const DEFAULT_LOG_FILE: &str = "recapture.log";

/// Environment variable holding the tracing filter
pub const LOG_ENV_VAR: &str = "RECAPTURE_LOG";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
