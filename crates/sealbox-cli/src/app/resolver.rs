//! Path resolution for config, credential store and secret files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{default_config_path, resolve_path};
use crate::constants::SEALED_SUFFIX;

/// Resolve the config file path: `--config`/`SEALBOX_CONFIG`, else the XDG default.
pub fn resolve_config_path(flag: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(value) = flag {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Sealed counterpart of a plaintext path: `<plain>.enc`.
pub fn sealed_path_for(plain: &Path) -> PathBuf {
    let mut name = OsString::from(plain.as_os_str());
    name.push(SEALED_SUFFIX);
    PathBuf::from(name)
}

/// Plaintext and sealed locations of the OAuth client secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecretPaths {
    pub plain: PathBuf,
    pub sealed: PathBuf,
}

/// Plaintext and sealed locations of the OAuth token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPaths {
    pub plain: PathBuf,
    pub sealed: PathBuf,
}

/// Pick a path from a CLI flag (cwd-relative), then config (config-relative),
/// then a default.
pub(crate) fn pick_path(
    flag: Option<&str>,
    configured: Option<&str>,
    config_dir: &Path,
    fallback: impl FnOnce() -> PathBuf,
) -> anyhow::Result<PathBuf> {
    if let Some(value) = flag.filter(|v| !v.trim().is_empty()) {
        return resolve_path(value, Path::new(""));
    }
    if let Some(value) = configured.filter(|v| !v.trim().is_empty()) {
        return resolve_path(value, config_dir);
    }
    Ok(fallback())
}

/// First `client_secret*.json` in `dir` (sorted), else `client_secret.json`.
pub(crate) fn default_client_secret(dir: &Path) -> PathBuf {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .and_then(|name| name.to_str())
                        .map(|name| name.starts_with("client_secret") && name.ends_with(".json"))
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .unwrap_or_else(|| dir.join("client_secret.json"))
}
