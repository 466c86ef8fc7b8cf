use std::path::PathBuf;

use crate::core::error::CliError;

pub const HOME_VAR: &str = "BERTH_HOME";

/// `$BERTH_HOME`, or `~/.berth`.
pub fn berth_home() -> Result<PathBuf, CliError> {
    if let Some(home) = std::env::var_os(HOME_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|home| home.join(".berth"))
        .ok_or(CliError::NoHome)
}

pub fn layers_dir() -> Result<PathBuf, CliError> {
    Ok(berth_home()?.join("layers"))
}
