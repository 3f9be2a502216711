//! Runtime configuration

use crate::error::{ClusterError, Result};
use regex::{Captures, Regex};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Default host directory, expanded against the environment
pub const DEFAULT_HOST_DIR: &str = "${HOME}/.clusterkit/hosts";

/// Default SQL port of a cluster node
pub const DEFAULT_BASE_PORT: u16 = 26257;

/// Environment variable overriding the host directory
pub const HOST_DIR_ENV: &str = "CLUSTERKIT_HOST_DIR";

/// Environment variable overriding the default login user
pub const USER_ENV: &str = "CLUSTERKIT_USER";

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("env var pattern is valid")
});

/// clusterkit configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host directory template, may reference environment variables
    pub host_dir: String,
    /// Login user for host lines that do not name one
    pub os_user: String,
    /// Base SQL port
    pub base_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_dir: DEFAULT_HOST_DIR.to_string(),
            os_user: current_os_user(),
            base_port: DEFAULT_BASE_PORT,
        }
    }
}

impl Config {
    /// Load configuration from defaults and environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(HOST_DIR_ENV) {
            if !dir.is_empty() {
                config.host_dir = dir;
            }
        }
        if let Ok(user) = std::env::var(USER_ENV) {
            if !user.is_empty() {
                config.os_user = user;
            }
        }
        config
    }

    /// Set host directory template
    pub fn host_dir(mut self, dir: &str) -> Self {
        self.host_dir = dir.to_string();
        self
    }

    /// Set default login user
    pub fn os_user(mut self, user: &str) -> Self {
        self.os_user = user.to_string();
        self
    }

    /// Host directory with environment references expanded
    pub fn host_dir_path(&self) -> Result<PathBuf> {
        let expanded = expand_env(&self.host_dir);
        if expanded.trim().is_empty() {
            return Err(ClusterError::InvalidConfig(format!(
                "host directory {:?} expands to an empty path",
                self.host_dir
            )));
        }
        Ok(PathBuf::from(expanded))
    }
}

/// Expand `${VAR}` and `$VAR` references from the process environment.
///
/// Unset variables expand to the empty string. `HOME` falls back to the
/// platform home directory when it is not set.
pub fn expand_env(s: &str) -> String {
    expand_vars(s, |name| match std::env::var(name) {
        Ok(v) => Some(v),
        Err(_) if name == "HOME" => dirs::home_dir().map(|p| p.to_string_lossy().into_owned()),
        Err(_) => None,
    })
}

/// Expand variable references using `lookup`
pub fn expand_vars<F>(s: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR_RE
        .replace_all(s, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}

/// Name of the user running this process
pub fn current_os_user() -> String {
    ["USER", "LOGNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|v| !v.is_empty())
        .or_else(passwd_user)
        .unwrap_or_else(|| "root".to_string())
}

#[cfg(unix)]
fn passwd_user() -> Option<String> {
    // SAFETY: getpwuid returns null or a pointer to a static passwd entry,
    // which is copied out before any other passwd call can overwrite it.
    unsafe {
        let pw = libc::getpwuid(libc::getuid());
        if pw.is_null() || (*pw).pw_name.is_null() {
            return None;
        }
        let name = std::ffi::CStr::from_ptr((*pw).pw_name);
        Some(name.to_string_lossy().into_owned())
    }
}

#[cfg(not(unix))]
fn passwd_user() -> Option<String> {
    None
}
