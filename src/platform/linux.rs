// watchlog platform paths for Linux
// Config: ~/.config/watchlog
// Data:   ~/.local/share/watchlog

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "watchlog";

/// Picks `$XDG_*/watchlog` when the variable is set, otherwise `$HOME/<fallback>/watchlog`.
fn resolve(xdg: Option<String>, home: Option<String>, fallback: &[&str]) -> PathBuf {
    match xdg.filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir).join(APP_DIR),
        None => {
            let mut path = PathBuf::from(home.unwrap_or_else(|| String::from("/tmp")));
            for part in fallback {
                path.push(part);
            }
            path.join(APP_DIR)
        }
    }
}

pub fn get_config_dir() -> PathBuf {
    resolve(
        env::var("XDG_CONFIG_HOME").ok(),
        env::var("HOME").ok(),
        &[".config"],
    )
}

pub fn get_data_dir() -> PathBuf {
    resolve(
        env::var("XDG_DATA_HOME").ok(),
        env::var("HOME").ok(),
        &[".local", "share"],
    )
}
