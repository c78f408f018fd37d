use std::path::PathBuf;

/// Port shared by the player companion's feed socket and its control API.
pub const COMPANION_PORT: u16 = 24123;
const COMPANION_HOST: &str = "localhost";

pub fn feed_url() -> String {
    format!("ws://{}:{}", COMPANION_HOST, COMPANION_PORT)
}

pub fn api_base_url() -> String {
    format!("http://{}:{}", COMPANION_HOST, COMPANION_PORT)
}

/// Local WebSocket endpoint of the control-surface host.
pub fn host_socket_url(port: u16) -> String {
    format!("ws://127.0.0.1:{}", port)
}

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/tidal-deck/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("tidal-deck")
    }
    #[cfg(windows)]
    {
        // Plugin folders are self-contained; prefer a data/ dir beside the exe
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let portable_data = exe_dir.join("data");
                if portable_data.exists() {
                    return portable_data;
                }
            }
        }

        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tidal-deck")
    }
}

pub fn config_dir() -> PathBuf {
    // A config.toml shipped inside the plugin bundle wins
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            if exe_dir.join("config.toml").exists() {
                return exe_dir.to_path_buf();
            }
        }
    }

    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("tidal-deck")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tidal-deck")
    }
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}
