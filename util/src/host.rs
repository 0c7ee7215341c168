//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software installation.
pub const SW_ROOT_ENV_VAR: &str = "OPENARM_TELEOP_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software installation.
///
/// The root is read from the `OPENARM_TELEOP_ROOT` environment variable and
/// contains the `params` and `sessions` directories.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    Ok(PathBuf::from(std::env::var(SW_ROOT_ENV_VAR)?))
}

/// Get a short description of the host platform.
pub fn get_platform_desc() -> String {
    format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH)
}
