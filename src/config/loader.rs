//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ProxyConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load a configuration document. Files ending in `.toml` are parsed as
/// TOML, everything else as JSON.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolve a file named on the command line.
///
/// Absolute paths are returned as is. Relative paths are looked up next to
/// the running executable first, then in the working directory. When neither
/// exists the working-directory candidate is returned so the caller reports
/// a meaningful path.
pub fn resolve_path(name: &Path) -> PathBuf {
    if name.is_absolute() {
        return name.to_path_buf();
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();

    resolve_in(name, exe_dir.as_deref(), cwd.as_deref())
}

fn resolve_in(name: &Path, exe_dir: Option<&Path>, cwd: Option<&Path>) -> PathBuf {
    if let Some(candidate) = exe_dir.map(|dir| dir.join(name)) {
        if candidate.is_file() {
            return candidate;
        }
        tracing::debug!(
            file = %name.display(),
            "Not found next to the executable, trying the working directory"
        );
    }

    match cwd {
        Some(dir) => dir.join(name),
        None => name.to_path_buf(),
    }
}
