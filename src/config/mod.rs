//! Runtime configuration.
//!
//! A [`Config`] is assembled once at startup (see [`Cli`]) and then handed to every
//! component. It never changes while the process runs.
use std::path::{Path, PathBuf};
use std::time::Duration;

mod cli;
mod error;

pub use cli::Cli;
pub use error::{ConfigError, Result};

/// Default Graphite carbon plaintext port.
pub const DEFAULT_SINK_PORT: u16 = 2003;
/// Default poll interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
/// Default mount point of the cgroup v1 hierarchies.
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup/";
/// Default parent cgroup under which the container runtime creates its entities.
pub const DEFAULT_PARENT: &str = "docker";

/// Immutable process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host of the carbon-cache daemon.
    pub sink_host: String,
    /// Plaintext port of the carbon-cache daemon.
    pub sink_port: u16,
    /// Global metric prefix, empty for none: `[prefix.]<entity>.<group>.<metric>`.
    pub prefix: String,
    /// Time between two poll cycles of one entity.
    pub interval: Duration,
    /// Use the 12 character form of the entity name.
    pub short_id: bool,
    /// Mount point of the cgroup hierarchies.
    pub cgroup_root: PathBuf,
    /// Parent cgroup below each controller hierarchy.
    pub parent: String,
}

impl Config {
    /// Checks the values a [`Cli`] cannot reject on its own.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingHost`] if the sink host is empty.
    /// - [`ConfigError::ZeroInterval`] if the poll interval is zero.
    pub fn validate(self) -> Result<Self> {
        if self.sink_host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(self)
    }

    /// Returns the entity root for a cgroup controller, e.g. `/sys/fs/cgroup/memory/docker`.
    pub fn controller_root(&self, controller: impl AsRef<Path>) -> PathBuf {
        self.cgroup_root.join(controller).join(&self.parent)
    }

    /// Returns the global prefix, or `None` if metrics are sent unprefixed.
    pub fn global_prefix(&self) -> Option<&str> {
        let prefix = self.prefix.trim_matches('.');
        (!prefix.is_empty()).then_some(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            sink_host: "carbon".to_owned(),
            sink_port: DEFAULT_SINK_PORT,
            prefix: String::new(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            short_id: true,
            cgroup_root: PathBuf::from(DEFAULT_CGROUP_ROOT),
            parent: DEFAULT_PARENT.to_owned(),
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let cfg = Config {
            sink_host: "  ".to_owned(),
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingHost)));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let cfg = Config {
            interval: Duration::ZERO,
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroInterval)));
    }

    #[test]
    fn test_controller_root() {
        assert_eq!(
            config().controller_root("cpuacct"),
            PathBuf::from("/sys/fs/cgroup/cpuacct/docker")
        );
    }

    #[test]
    fn test_global_prefix() {
        assert_eq!(config().global_prefix(), None);
        let cfg = Config {
            prefix: "prod.".to_owned(),
            ..config()
        };
        assert_eq!(cfg.global_prefix(), Some("prod"));
    }
}
