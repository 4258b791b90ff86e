use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_HTTP_PORT: u16 = 4500;
const DEFAULT_WS_PORT: u16 = 4501;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── BoardConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// HTTP JSON API port (default: 4500).
    pub http_port: u16,
    /// WebSocket push-channel port (default: 4501).
    pub ws_port: u16,
    /// Bind address for both servers (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    pub bind_address: String,
    /// Data directory for the SQLite database and config.toml.
    pub data_dir: PathBuf,
    /// Log level filter string, e.g. "debug", "info,boardd=trace".
    pub log: String,
    /// Log output format: "pretty" (default) | "json" (structured for log aggregators).
    pub log_format: String,
}

impl BoardConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        http_port: Option<u16>,
        ws_port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let http_port = http_port.or(toml.http_port).unwrap_or(DEFAULT_HTTP_PORT);
        let ws_port = ws_port.or(toml.ws_port).unwrap_or(DEFAULT_WS_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = std::env::var("BOARDD_BIND")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("BOARDD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        Self {
            http_port,
            ws_port,
            bind_address,
            data_dir,
            log,
            log_format,
        }
    }
}

// ─── TOML layer ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    /// HTTP JSON API port (default: 4500).
    http_port: Option<u16>,
    /// WebSocket push-channel port (default: 4501).
    ws_port: Option<u16>,
    /// Bind address for both servers (default: "127.0.0.1").
    bind_address: Option<String>,
    /// Log level filter string (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" | "json".
    log_format: Option<String>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("boardd");
        }
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            if !xdg.is_empty() {
                return PathBuf::from(xdg).join("boardd");
            }
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("boardd");
        }
    }
    #[cfg(windows)]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("boardd");
        }
    }
    PathBuf::from(".boardd")
}
