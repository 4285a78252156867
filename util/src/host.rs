//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable pointing at the software root, which holds the
/// `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "FOLLOW_SW_ROOT";

/// Get the software root directory.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Get a short description of the host, for logging.
pub fn get_description() -> String {
    format!("{} ({})", env::consts::OS, env::consts::ARCH)
}
