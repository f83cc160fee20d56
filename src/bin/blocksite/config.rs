use std::env;
use std::path::PathBuf;

use anyhow::Result;

use blocksite::config::{read_config, Config};

use crate::CFG_FILE_NAME;

/// Looks for the site file next to the executable, in the current directory
/// and in the user config directory, in that order.
fn find_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()));
    let cur_dir = env::current_dir().ok();
    let cfg_dir = dirs::config_dir();

    [exe_dir, cur_dir, cfg_dir].into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let config_path = cfg_path.or_else(find_config_path);

    match config_path {
        Some(ref path) => println!("Reading config from {}", path.display()),
        None => println!("No {} found. Using defaults", CFG_FILE_NAME),
    }
    let config = read_config(config_path.as_deref())?;

    match config.log.as_ref().and_then(|log| log.location.as_ref()) {
        Some(location) => println!("Log enabled. Files will be written in {}", location.display()),
        None => println!("Logging to the console"),
    }

    Ok(config)
}
