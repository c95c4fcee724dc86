//! TOML configuration for execdash.
//!
//! Layered lookup: an explicit path (from `--config`), the `EXECDASH_CONFIG`
//! environment variable, the system location, then compiled-in defaults.
//! The resolved value is handed to [`crate::serve`]; nothing here is global.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "EXECDASH_CONFIG";

/// System-wide config location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/execdash/execdash.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the dashboard process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DashboardConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the configuration.
    ///
    /// An explicit path must load, since the operator asked for it. The
    /// environment and system locations are best effort and fall through to
    /// defaults; what was skipped is kept in [`ResolvedConfig::skipped`].
    /// Runs before logging is set up, so nothing is logged here; call
    /// [`ResolvedConfig::log_summary`] once the subscriber exists.
    pub fn resolve(explicit: Option<&Path>) -> Result<ResolvedConfig> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::resolve_from(explicit, env_path.as_deref(), Path::new(SYSTEM_CONFIG_PATH))
    }

    fn resolve_from(
        explicit: Option<&Path>,
        env_path: Option<&Path>,
        system_path: &Path,
    ) -> Result<ResolvedConfig> {
        if let Some(path) = explicit {
            return Ok(ResolvedConfig {
                config: Self::load(path)?,
                source: Some(path.to_path_buf()),
                skipped: Vec::new(),
            });
        }

        let mut skipped = Vec::new();
        let candidates = env_path
            .into_iter()
            .chain(Some(system_path).filter(|p| p.exists()));
        for path in candidates {
            match Self::load(path) {
                Ok(config) => {
                    return Ok(ResolvedConfig {
                        config,
                        source: Some(path.to_path_buf()),
                        skipped,
                    })
                }
                Err(e) => skipped.push((path.to_path_buf(), format!("{e:#}"))),
            }
        }

        Ok(ResolvedConfig {
            config: Self::default(),
            source: None,
            skipped,
        })
    }
}

/// Outcome of [`DashboardConfig::resolve`].
#[derive(Debug)]
pub struct ResolvedConfig {
    pub config: DashboardConfig,
    /// File the config came from; `None` means compiled-in defaults.
    pub source: Option<PathBuf>,
    /// Candidate files that existed but failed to load, with the error.
    pub skipped: Vec<(PathBuf, String)>,
}

impl ResolvedConfig {
    pub fn log_summary(&self) {
        for (path, error) in &self.skipped {
            warn!(path = %path.display(), %error, "config file could not be loaded, trying fallback");
        }
        match &self.source {
            Some(path) => info!(path = %path.display(), "loaded dashboard configuration"),
            None => debug!("no config file found, using compiled-in defaults"),
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address and port the dashboard listens on.
    pub bind: String,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
    /// Largest request body accepted (applies to `POST /api/execute`).
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            static_dir: PathBuf::from("static"),
            max_body_bytes: 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Upstream
// ---------------------------------------------------------------------------

/// Remote code-execution API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL, e.g. `http://127.0.0.1:2000/api/v2`. Routes are appended.
    pub base_url: String,
    /// Timeout for every call except `execute`.
    pub timeout_secs: u64,
    /// Timeout for `POST /execute`; running user code takes a while.
    pub execute_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:2000/api/v2".to_string(),
            timeout_secs: 5,
            execute_timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.server.bind, "0.0.0.0:5000");
        assert_eq!(cfg.upstream.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.upstream.execute_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let toml_str = r#"
            [upstream]
            base_url = "http://runner.internal:2000/api/v2"

            [logging]
            format = "json"
        "#;
        let cfg: DashboardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.upstream.base_url, "http://runner.internal:2000/api/v2");
        assert_eq!(cfg.upstream.timeout_secs, 5);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.server.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_explicit_path_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"127.0.0.1:8088\"").unwrap();

        let resolved = DashboardConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(resolved.config.server.bind, "127.0.0.1:8088");
        assert_eq!(resolved.source.as_deref(), Some(file.path()));
        assert!(resolved.skipped.is_empty());
    }

    #[test]
    fn test_broken_env_file_falls_back_and_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[server\n").unwrap();
        let system = dir.path().join("system.toml");
        std::fs::write(&system, "[server]\nbind = \"127.0.0.1:7000\"\n").unwrap();

        let resolved =
            DashboardConfig::resolve_from(None, Some(&broken), &system).unwrap();
        assert_eq!(resolved.config.server.bind, "127.0.0.1:7000");
        assert_eq!(resolved.source.as_deref(), Some(system.as_path()));
        assert_eq!(resolved.skipped.len(), 1);
        assert_eq!(resolved.skipped[0].0, broken);
        assert!(resolved.skipped[0].1.contains("failed to parse config file"));
    }

    #[test]
    fn test_no_files_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved =
            DashboardConfig::resolve_from(None, None, &dir.path().join("absent.toml")).unwrap();
        assert!(resolved.source.is_none());
        assert!(resolved.skipped.is_empty());
        assert_eq!(resolved.config.server.bind, "0.0.0.0:5000");
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(DashboardConfig::resolve(Some(&missing)).is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream\nbase_url = ").unwrap();
        let err = DashboardConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
