use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::{Config, DEFAULT_CGROUP_ROOT, DEFAULT_INTERVAL_SECS, DEFAULT_PARENT, DEFAULT_SINK_PORT};

/// Forwards per-container cgroup accounting to a Graphite carbon-cache.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Graphite carbon-cache host
    #[arg(short = 'H', long, env = "CREO_CARBON_HOST")]
    pub host: String,

    /// Graphite carbon-cache plaintext port
    #[arg(short = 'P', long, env = "CREO_CARBON_PORT", default_value_t = DEFAULT_SINK_PORT)]
    pub port: u16,

    /// Graphite metric prefix: [prefix].<container>.<metric>
    #[arg(short = 'p', long, env = "CREO_CARBON_PREFIX", default_value = "")]
    pub prefix: String,

    /// Push interval in seconds, generally equal to the whisper file resolution
    #[arg(short = 'i', long, env = "CREO_CARBON_INTERVAL", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Path of the cgroup mount in sysfs
    #[arg(short = 'c', long, env = "CREO_CARBON_CGROUP_ROOT", default_value = DEFAULT_CGROUP_ROOT)]
    pub cgroup_root: PathBuf,

    /// Use the 12 character form of the container id in metric paths
    #[arg(
        short = 's',
        long,
        env = "CREO_CARBON_SHORT_ID",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub short_id: bool,

    /// Parent cgroup holding one directory per container
    #[arg(long, env = "CREO_CARBON_PARENT", default_value = DEFAULT_PARENT)]
    pub parent: String,
}

impl Cli {
    /// Converts the parsed arguments into a validated [`Config`].
    ///
    /// # Errors
    ///
    /// See [`Config::validate`].
    pub fn into_config(self) -> super::Result<Config> {
        Config {
            sink_host: self.host,
            sink_port: self.port,
            prefix: self.prefix,
            interval: Duration::from_secs(self.interval),
            short_id: self.short_id,
            cgroup_root: self.cgroup_root,
            parent: self.parent,
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Cli::try_parse_from(["creo-carbon", "-H", "carbon.local"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(cfg.sink_host, "carbon.local");
        assert_eq!(cfg.sink_port, 2003);
        assert_eq!(cfg.prefix, "");
        assert_eq!(cfg.interval, Duration::from_secs(10));
        assert!(cfg.short_id);
        assert_eq!(cfg.cgroup_root, PathBuf::from("/sys/fs/cgroup/"));
        assert_eq!(cfg.parent, "docker");
    }

    #[test]
    fn test_all_flags() {
        let cfg = Cli::try_parse_from([
            "creo-carbon",
            "-H",
            "10.0.0.1",
            "-P",
            "2103",
            "-p",
            "prod",
            "-i",
            "60",
            "-c",
            "/rootfs/sys/fs/cgroup",
            "-s",
            "false",
            "--parent",
            "system.slice",
        ])
        .unwrap()
        .into_config()
        .unwrap();
        assert_eq!(cfg.sink_port, 2103);
        assert_eq!(cfg.prefix, "prod");
        assert_eq!(cfg.interval, Duration::from_secs(60));
        assert!(!cfg.short_id);
        assert_eq!(cfg.cgroup_root, PathBuf::from("/rootfs/sys/fs/cgroup"));
        assert_eq!(cfg.parent, "system.slice");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let res = Cli::try_parse_from(["creo-carbon", "-H", "carbon", "-i", "0"])
            .unwrap()
            .into_config();
        assert!(matches!(res, Err(super::super::ConfigError::ZeroInterval)));
    }
}
